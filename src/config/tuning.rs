use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All tunable game parameters, loaded from tuning.ron.
#[derive(Debug, Clone, Resource, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub dt: f32,
    pub window_width: u32,
    pub window_height: u32,
    /// Player walking speed (map pixels per second).
    pub player_speed: f32,
    pub walk_frame_rate: f32,
    /// On-screen width/height of the player sprite.
    pub player_display_size: f32,
    /// Physics body size, in source-frame pixels.
    pub hitbox_size: [f32; 2],
    /// Physics body offset from the frame's top-left corner, in source-frame pixels.
    pub hitbox_offset: [f32; 2],
    pub above_layer_depth: f32,
    pub debug_depth: f32,
    pub help_text: String,
    pub assets: AssetManifest,
}

/// Where the scene's assets live and how the map names its layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetManifest {
    /// `AssetServer` root; the paths below are relative to it.
    pub root: String,
    pub map: String,
    /// Tileset name as authored in Tiled.
    pub tileset_name: String,
    pub tileset_image: String,
    pub atlas_image: String,
    pub atlas_json: String,
    pub below_layer: String,
    pub world_layer: String,
    pub above_layer: String,
    pub object_layer: String,
    pub spawn_object: String,
    /// Boolean tile property that marks a tile as solid.
    pub collision_property: String,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            window_width: 800,
            window_height: 600,
            player_speed: 170.0,
            walk_frame_rate: 10.0,
            player_display_size: 65.0,
            hitbox_size: [105.0, 85.0],
            hitbox_offset: [44.0, 95.0],
            above_layer_depth: 10.0,
            debug_depth: 20.0,
            help_text: "Use arrow keys to move\nPress \"D\" to show hitboxes".into(),
            assets: AssetManifest::default(),
        }
    }
}

impl Default for AssetManifest {
    fn default() -> Self {
        Self {
            root: "assets".into(),
            map: "maps/town.tmj".into(),
            tileset_name: "tuxmon-sample-32px-extruded".into(),
            tileset_image: "tilesets/tuxmon-sample-32px-extruded.png".into(),
            atlas_image: "atlas/oskar.png".into(),
            atlas_json: "atlas/oskar.json".into(),
            below_layer: "Below Player".into(),
            world_layer: "World".into(),
            above_layer: "Above Player".into(),
            object_layer: "Objects".into(),
            spawn_object: "Spawn Point".into(),
            collision_property: "collides".into(),
        }
    }
}

impl Tuning {
    /// Get the data directory for tuning files.
    pub fn data_dir() -> PathBuf {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("tile_town")
    }

    /// Path to the tuning file.
    pub fn file_path() -> PathBuf {
        Self::data_dir().join("tuning.ron")
    }

    /// Load from file, or create default if not found.
    pub fn load_or_default() -> Self {
        let path = Self::file_path();
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match Self::from_ron(&contents) {
                    Ok(tuning) => return tuning,
                    Err(e) => {
                        warn!("Failed to parse tuning.ron: {e}, using defaults");
                        return Self::default();
                    }
                },
                Err(e) => {
                    warn!("Failed to read tuning.ron: {e}, using defaults");
                    return Self::default();
                }
            }
        }
        let tuning = Self::default();
        tuning.save();
        tuning
    }

    pub fn from_ron(contents: &str) -> Result<Self, ron::error::SpannedError> {
        let tuning: Self = ron::from_str(contents)?;
        Ok(tuning.sanitized())
    }

    /// The fixed step must be a positive, finite duration.
    fn sanitized(mut self) -> Self {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            let dt = Self::default().dt;
            warn!("Invalid dt {} in tuning.ron, using {dt}", self.dt);
            self.dt = dt;
        }
        self
    }

    /// Save current tuning to file.
    pub fn save(&self) {
        let path = Self::file_path();
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let pretty = ron::ser::PrettyConfig::default();
        match ron::ser::to_string_pretty(self, pretty) {
            Ok(s) => {
                if let Err(e) = std::fs::write(&path, s) {
                    warn!("Failed to write tuning.ron: {e}");
                }
            }
            Err(e) => {
                warn!("Failed to serialize tuning: {e}");
            }
        }
    }

    /// Reload from file (called by key press).
    pub fn reload(&mut self) {
        *self = Self::load_or_default();
        info!("Tuning reloaded");
    }
}
