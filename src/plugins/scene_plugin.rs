use std::marker::PhantomData;

use bevy::asset::{LoadState, UntypedHandle};
use bevy::prelude::*;

use crate::game::components::ScenePhase;
use crate::game::error::AssetError;
use crate::plugins::game_plugin::FixedGameSet;

/// A scene driven by the app: assets are requested in `load`, the world is
/// built in `initialize` once every requested asset is ready, and `tick` runs
/// once per fixed step afterwards.
pub trait SceneLifecycle: Resource {
    fn load(&mut self, world: &mut World) -> Result<(), AssetError>;
    fn initialize(&mut self, world: &mut World) -> Result<(), AssetError>;
    fn tick(&mut self, world: &mut World);
}

/// Assets requested during `load`, with the path they were requested by.
#[derive(Resource, Default)]
pub struct PendingAssets(pub Vec<(String, UntypedHandle)>);

impl PendingAssets {
    pub fn request<A: Asset>(&mut self, server: &AssetServer, path: &str) -> Handle<A> {
        let handle: Handle<A> = server.load(path.to_string());
        self.0.push((path.to_string(), handle.clone().untyped()));
        handle
    }
}

pub struct ScenePlugin<S> {
    marker: PhantomData<fn() -> S>,
}

impl<S> Default for ScenePlugin<S> {
    fn default() -> Self {
        Self { marker: PhantomData }
    }
}

impl<S: SceneLifecycle + Default> Plugin for ScenePlugin<S> {
    fn build(&self, app: &mut App) {
        app.init_state::<ScenePhase>();
        app.init_resource::<S>();
        app.init_resource::<PendingAssets>();

        app.add_systems(Startup, run_load::<S>);
        app.add_systems(
            Update,
            wait_for_assets.run_if(in_state(ScenePhase::Loading)),
        );
        app.add_systems(OnEnter(ScenePhase::Running), run_initialize::<S>);
        app.add_systems(
            FixedUpdate,
            run_tick::<S>
                .in_set(FixedGameSet::TickSet)
                .run_if(in_state(ScenePhase::Running)),
        );
    }
}

fn fail(world: &mut World, stage: &str, err: AssetError) {
    error!("Scene {stage} failed: {err}");
    world
        .resource_mut::<NextState<ScenePhase>>()
        .set(ScenePhase::Failed);
}

fn run_load<S: SceneLifecycle>(world: &mut World) {
    let result = world.resource_scope(|world, mut scene: Mut<S>| scene.load(world));
    if let Err(e) = result {
        fail(world, "load", e);
    }
}

fn run_initialize<S: SceneLifecycle>(world: &mut World) {
    let result = world.resource_scope(|world, mut scene: Mut<S>| scene.initialize(world));
    match result {
        Ok(()) => info!("Scene initialized"),
        Err(e) => fail(world, "initialize", e),
    }
}

fn run_tick<S: SceneLifecycle>(world: &mut World) {
    world.resource_scope(|world, mut scene: Mut<S>| scene.tick(world));
}

/// Loading → Running once every pending asset (and its dependencies) is in.
fn wait_for_assets(
    asset_server: Res<AssetServer>,
    pending: Res<PendingAssets>,
    mut next_state: ResMut<NextState<ScenePhase>>,
) {
    for (path, handle) in &pending.0 {
        if let Some(LoadState::Failed(err)) = asset_server.get_load_state(handle) {
            error!("{}: {err}", AssetError::LoadFailed(path.clone()));
            next_state.set(ScenePhase::Failed);
            return;
        }
    }

    if pending
        .0
        .iter()
        .all(|(_, handle)| asset_server.is_loaded_with_dependencies(handle))
    {
        info!("All {} scene assets loaded", pending.0.len());
        next_state.set(ScenePhase::Running);
    }
}
