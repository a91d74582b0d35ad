use bevy::math::Isometry2d;
use bevy::prelude::*;

use crate::config::tuning::Tuning;
use crate::game::components::*;
use crate::game::tilemap::CollisionGrid;

const COLLIDING_TILE_COLOR: Color = Color::srgba(243.0 / 255.0, 134.0 / 255.0, 48.0 / 255.0, 0.75);
const FACE_COLOR: Color = Color::srgba(40.0 / 255.0, 39.0 / 255.0, 37.0 / 255.0, 0.75);
const BODY_COLOR: Color = Color::srgb(1.0, 0.0, 1.0);
const VELOCITY_COLOR: Color = Color::srgb(0.0, 1.0, 0.0);

/// Hitbox overlay. Turned on by the first `D` press and left on.
#[derive(Resource, Default)]
pub struct DebugOverlay {
    pub enabled: bool,
}

pub struct DebugPlugin;

impl Plugin for DebugPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DebugOverlay>();
        app.add_systems(
            Update,
            (
                enable_debug_overlay,
                draw_debug_overlay.run_if(|overlay: Res<DebugOverlay>| overlay.enabled),
            )
                .chain()
                .run_if(in_state(ScenePhase::Running)),
        );
    }
}

fn enable_debug_overlay(
    mut commands: Commands,
    keyboard: Res<ButtonInput<KeyCode>>,
    tuning: Res<Tuning>,
    grid: Option<Res<CollisionGrid>>,
    mut overlay: ResMut<DebugOverlay>,
) {
    if overlay.enabled || !keyboard.just_pressed(KeyCode::KeyD) {
        return;
    }
    overlay.enabled = true;

    let Some(grid) = grid else {
        return;
    };
    let mut tinted = 0;
    for cell in grid.solid_cells() {
        let center = map_to_world(cell.center());
        commands.spawn((
            Sprite::from_color(COLLIDING_TILE_COLOR, cell.size()),
            Transform::from_translation(center.extend(tuning.debug_depth)),
        ));
        tinted += 1;
    }
    info!("Debug overlay enabled ({tinted} colliding tiles)");
}

fn draw_debug_overlay(
    mut gizmos: Gizmos,
    grid: Option<Res<CollisionGrid>>,
    bodies: Query<(&MapPosition, &Velocity, &Body)>,
) {
    if let Some(grid) = grid {
        for face in grid.faces() {
            gizmos.line_2d(map_to_world(face.start), map_to_world(face.end), FACE_COLOR);
        }
    }

    for (position, velocity, body) in &bodies {
        let rect = body.rect(position.0);
        let center = map_to_world(rect.center());
        gizmos.rect_2d(Isometry2d::from_translation(center), rect.size(), BODY_COLOR);
        gizmos.line_2d(center, center + map_to_world(velocity.0 * 0.5), VELOCITY_COLOR);
    }
}
