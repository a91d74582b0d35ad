use bevy::prelude::*;
use std::collections::HashMap;

use crate::game::atlas::frame_names;
use crate::game::controller::{AnimationKey, FacingPose};

/// Maps walk cycles and idle poses to frame names in the player atlas.
#[derive(Resource, Debug, Clone)]
pub struct AssetsMap {
    pub walk_prefixes: HashMap<AnimationKey, String>,
    pub idle_frames: HashMap<FacingPose, String>,
    pub frame_suffix: String,
    pub first_walk_frame: u32,
    pub last_walk_frame: u32,
    pub zero_pad: usize,
    /// Frame shown when the player spawns.
    pub spawn_frame: String,
}

impl AssetsMap {
    pub fn with_defaults() -> Self {
        let mut walk = HashMap::new();
        walk.insert(AnimationKey::WalkLeft, "oskar-left-walk.".into());
        walk.insert(AnimationKey::WalkRight, "oskar-right-walk.".into());
        walk.insert(AnimationKey::WalkBack, "oskar-back-walk.".into());
        walk.insert(AnimationKey::WalkFront, "oskar-front-walk.".into());

        let mut idle = HashMap::new();
        idle.insert(FacingPose::Left, "oskar-left.png".into());
        idle.insert(FacingPose::Right, "oskar-right.png".into());
        idle.insert(FacingPose::Back, "oskar-back.png".into());
        idle.insert(FacingPose::Front, "oskar-front.png".into());

        Self {
            walk_prefixes: walk,
            idle_frames: idle,
            frame_suffix: ".png".into(),
            first_walk_frame: 0,
            last_walk_frame: 3,
            zero_pad: 3,
            spawn_frame: "oskar-front.png".into(),
        }
    }

    pub fn walk_frames(&self, key: AnimationKey) -> Vec<String> {
        match self.walk_prefixes.get(&key) {
            Some(prefix) => frame_names(
                prefix,
                &self.frame_suffix,
                self.first_walk_frame,
                self.last_walk_frame,
                self.zero_pad,
            ),
            None => Vec::new(),
        }
    }
}
