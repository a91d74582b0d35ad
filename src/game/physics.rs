use bevy::prelude::*;

use super::components::*;
use super::tilemap::CollisionGrid;

/// PhysicsSet: integrate velocity → position, one axis at a time, stopping at solid tiles.
/// Inside `FixedUpdate`, `Time` is the fixed clock.
pub fn integrate_bodies(
    time: Res<Time>,
    grid: Option<Res<CollisionGrid>>,
    mut query: Query<(&mut MapPosition, &mut Velocity, &Body)>,
) {
    let dt = time.delta_secs();
    for (mut position, mut velocity, body) in &mut query {
        let (p, v) = step_body(position.0, velocity.0, body, grid.as_deref(), dt);
        position.0 = p;
        velocity.0 = v;
    }
}

/// Move a body for one step. A blocked axis is pushed back to the tile edge
/// and its velocity zeroed.
pub fn step_body(
    position: Vec2,
    velocity: Vec2,
    body: &Body,
    grid: Option<&CollisionGrid>,
    dt: f32,
) -> (Vec2, Vec2) {
    let mut position = position;
    let mut velocity = velocity;

    position.x += velocity.x * dt;
    if let Some(grid) = grid {
        if let Some(push) = separate_x(grid, body.rect(position), velocity.x) {
            position.x += push;
            velocity.x = 0.0;
        }
    }

    position.y += velocity.y * dt;
    if let Some(grid) = grid {
        if let Some(push) = separate_y(grid, body.rect(position), velocity.y) {
            position.y += push;
            velocity.y = 0.0;
        }
    }

    (position, velocity)
}

fn separate_x(grid: &CollisionGrid, rect: Rect, vx: f32) -> Option<f32> {
    let cells = grid.solid_cells_in(rect);
    if vx > 0.0 {
        let wall = cells.iter().map(|c| c.min.x).reduce(f32::min)?;
        Some(wall - rect.max.x)
    } else if vx < 0.0 {
        let wall = cells.iter().map(|c| c.max.x).reduce(f32::max)?;
        Some(wall - rect.min.x)
    } else {
        None
    }
}

fn separate_y(grid: &CollisionGrid, rect: Rect, vy: f32) -> Option<f32> {
    let cells = grid.solid_cells_in(rect);
    if vy > 0.0 {
        let wall = cells.iter().map(|c| c.min.y).reduce(f32::min)?;
        Some(wall - rect.max.y)
    } else if vy < 0.0 {
        let wall = cells.iter().map(|c| c.max.y).reduce(f32::max)?;
        Some(wall - rect.min.y)
    } else {
        None
    }
}

/// Mirror map-space positions into Bevy transforms, keeping each entity's depth.
pub fn sync_map_transforms(mut query: Query<(&MapPosition, &mut Transform), Changed<MapPosition>>) {
    for (position, mut transform) in &mut query {
        let world = map_to_world(position.0);
        transform.translation.x = world.x;
        transform.translation.y = world.y;
    }
}
