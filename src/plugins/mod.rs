pub mod debug_plugin;
pub mod game_plugin;
pub mod scene_plugin;
pub mod ui_plugin;
