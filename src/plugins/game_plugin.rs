use bevy::prelude::*;

use crate::config::tuning::Tuning;
use crate::game::{
    animation,
    atlas::{SpriteAtlas, SpriteAtlasLoader},
    camera,
    components::*,
    controller::DirectionalInput,
    physics,
    tilemap::{TiledMap, TiledMapLoader},
};

// ── SystemSets (strict FixedUpdate ordering, running phase only) ────

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum FixedGameSet {
    InputSet,
    TickSet,
    PhysicsSet,
}

pub struct GamePlugin;

impl Plugin for GamePlugin {
    fn build(&self, app: &mut App) {
        app.init_asset::<TiledMap>()
            .register_asset_loader(TiledMapLoader)
            .init_asset::<SpriteAtlas>()
            .register_asset_loader(SpriteAtlasLoader);

        app.configure_sets(
            FixedUpdate,
            (
                FixedGameSet::InputSet.run_if(in_state(ScenePhase::Running)),
                FixedGameSet::TickSet.run_if(in_state(ScenePhase::Running)),
                FixedGameSet::PhysicsSet.run_if(in_state(ScenePhase::Running)),
            )
                .chain(),
        );

        // InputSet: snapshot held keys for this step
        app.add_systems(
            FixedUpdate,
            read_directional_input.in_set(FixedGameSet::InputSet),
        );

        // PhysicsSet: runs after the scene tick has set velocities
        app.add_systems(
            FixedUpdate,
            physics::integrate_bodies.in_set(FixedGameSet::PhysicsSet),
        );

        // ── Presentation (Update) ───────────────────────────────────────
        app.add_systems(
            Update,
            (
                animation::animate_sprites,
                physics::sync_map_transforms,
                camera::follow_player,
            )
                .chain()
                .run_if(in_state(ScenePhase::Running)),
        );

        // ── Always-on ───────────────────────────────────────────────────
        app.add_systems(Update, tuning_reload_input);
    }
}

/// Arrow keys → per-step input snapshot on the player.
fn read_directional_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut query: Query<&mut DirectionalInput, With<Player>>,
) {
    let snapshot = DirectionalInput {
        up: keyboard.pressed(KeyCode::ArrowUp),
        down: keyboard.pressed(KeyCode::ArrowDown),
        left: keyboard.pressed(KeyCode::ArrowLeft),
        right: keyboard.pressed(KeyCode::ArrowRight),
    };
    for mut input in &mut query {
        *input = snapshot;
    }
}

/// Reload tuning with F5. The fixed step follows the reloaded `dt`.
fn tuning_reload_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut tuning: ResMut<Tuning>,
    mut fixed: ResMut<Time<Fixed>>,
) {
    if keyboard.just_pressed(KeyCode::F5) {
        tuning.reload();
        fixed.set_timestep_seconds(tuning.dt as f64);
    }
}
