use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use super::components::*;
use crate::config::tuning::Tuning;

/// Camera that tracks the player inside map-space `bounds`.
#[derive(Component, Debug, Clone, Copy)]
pub struct FollowCamera {
    pub bounds: Rect,
}

/// Centre the view on `target` without showing anything outside `bounds`.
/// On an axis where the view is larger than the bounds, the view pins to the
/// bounds' min edge.
pub fn clamp_camera_center(target: Vec2, view: Vec2, bounds: Rect) -> Vec2 {
    let half = view * 0.5;
    let lo = bounds.min + half;
    let hi = (bounds.max - half).max(lo);
    target.clamp(lo, hi)
}

pub fn follow_player(
    tuning: Res<Tuning>,
    windows: Query<&Window, With<PrimaryWindow>>,
    player: Query<&MapPosition, With<Player>>,
    mut cameras: Query<(&mut Transform, &FollowCamera)>,
) {
    let Some(target) = player.iter().next() else {
        return;
    };

    let view = windows
        .single()
        .map(|w| w.size())
        .unwrap_or(Vec2::new(tuning.window_width as f32, tuning.window_height as f32));

    for (mut transform, follow) in &mut cameras {
        let center = map_to_world(clamp_camera_center(target.0, view, follow.bounds));
        transform.translation.x = center.x;
        transform.translation.y = center.y;
    }
}
