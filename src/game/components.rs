use bevy::prelude::*;

// ── Marker components ───────────────────────────────────────────────

#[derive(Component)]
pub struct Player;

// ── Scene phase state ───────────────────────────────────────────────

#[derive(States, Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ScenePhase {
    #[default]
    Loading,
    Running,
    Failed,
}

// ── Draw order ──────────────────────────────────────────────────────

pub const BELOW_LAYER_Z: f32 = 0.0;
pub const WORLD_LAYER_Z: f32 = 1.0;
pub const PLAYER_Z: f32 = 2.0;

// ── Player runtime state ────────────────────────────────────────────

/// Map-space velocity (pixels per second, +y down).
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Velocity(pub Vec2);

/// Map-space position of the sprite centre (pixels, +y down).
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct MapPosition(pub Vec2);

/// Axis-aligned physics body, relative to the sprite centre.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub size: Vec2,
    /// From the sprite centre to the body's top-left corner.
    pub offset: Vec2,
}

impl Body {
    /// Scale a hitbox authored in source-frame pixels to a sprite drawn at
    /// `display_size`.
    pub fn from_frame(frame_size: Vec2, display_size: Vec2, hitbox_size: Vec2, hitbox_offset: Vec2) -> Self {
        let scale = display_size / frame_size.max(Vec2::ONE);
        Self {
            size: hitbox_size * scale,
            offset: -display_size * 0.5 + hitbox_offset * scale,
        }
    }

    pub fn rect(&self, center: Vec2) -> Rect {
        let min = center + self.offset;
        Rect::from_corners(min, min + self.size)
    }
}

/// Map space has +y down; Bevy world space has +y up.
pub fn map_to_world(p: Vec2) -> Vec2 {
    Vec2::new(p.x, -p.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_scales_with_display_size() {
        // 130px frame drawn at 65px: everything halves.
        let body = Body::from_frame(
            Vec2::splat(130.0),
            Vec2::splat(65.0),
            Vec2::new(106.0, 86.0),
            Vec2::new(44.0, 96.0),
        );
        assert_eq!(body.size, Vec2::new(53.0, 43.0));
        assert_eq!(body.offset, Vec2::new(-32.5 + 22.0, -32.5 + 48.0));
        let r = body.rect(Vec2::new(100.0, 100.0));
        assert_eq!(r.min, Vec2::new(89.5, 115.5));
        assert_eq!(r.max, Vec2::new(142.5, 158.5));
    }

    #[test]
    fn map_y_is_flipped() {
        assert_eq!(map_to_world(Vec2::new(3.0, 4.0)), Vec2::new(3.0, -4.0));
    }
}
