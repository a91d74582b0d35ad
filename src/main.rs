mod assets_map;
mod config;
mod game;
mod plugins;

use bevy::prelude::*;

use assets_map::AssetsMap;
use config::tuning::Tuning;
use game::town_scene::TownScene;
use plugins::{debug_plugin::DebugPlugin, game_plugin::GamePlugin, scene_plugin::ScenePlugin, ui_plugin::UiPlugin};

fn main() {
    let tuning = Tuning::load_or_default();

    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Tile Town".into(),
                        resolution: (tuning.window_width, tuning.window_height).into(),
                        ..default()
                    }),
                    ..default()
                })
                .set(AssetPlugin {
                    file_path: tuning.assets.root.clone(),
                    ..default()
                })
                // Pixel art: no smoothing between texels
                .set(ImagePlugin::default_nearest()),
        )
        .insert_resource(ClearColor(Color::BLACK))
        .insert_resource(Time::<Fixed>::from_seconds(tuning.dt as f64))
        .insert_resource(tuning)
        .insert_resource(AssetsMap::with_defaults())
        .add_plugins(ScenePlugin::<TownScene>::default())
        .add_plugins(GamePlugin)
        .add_plugins(UiPlugin)
        .add_plugins(DebugPlugin)
        .run();
}
