use std::collections::HashMap;

use bevy::prelude::*;

use super::atlas::SpriteAtlas;
use super::controller::{AnimationKey, FacingPose, PoseSelection};
use crate::assets_map::AssetsMap;

/// Looping sequence of atlas frames.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub frames: Vec<usize>,
    pub frame_rate: f32,
}

impl AnimationClip {
    fn frame_duration(&self) -> f32 {
        1.0 / self.frame_rate.max(f32::EPSILON)
    }
}

/// Walk cycles and standing frames of the player, as atlas indices.
#[derive(Resource, Debug, Default)]
pub struct AnimationLibrary {
    clips: HashMap<AnimationKey, AnimationClip>,
    poses: HashMap<FacingPose, usize>,
}

impl AnimationLibrary {
    /// Resolve every named frame against the atlas. Missing frames are
    /// skipped; a walk cycle left with no frames is not registered.
    pub fn build(atlas: &SpriteAtlas, names: &AssetsMap, frame_rate: f32) -> Self {
        let mut library = Self::default();

        for key in AnimationKey::ALL {
            let frames: Vec<usize> = names
                .walk_frames(key)
                .iter()
                .filter_map(|name| {
                    let index = atlas.index(name);
                    if index.is_none() {
                        warn!("Atlas frame {name:?} missing, skipped in {key:?}");
                    }
                    index
                })
                .collect();
            if frames.is_empty() {
                warn!("Animation {key:?} has no frames");
                continue;
            }
            library.insert_clip(key, AnimationClip { frames, frame_rate });
        }

        for (pose, name) in &names.idle_frames {
            match atlas.index(name) {
                Some(index) => {
                    library.poses.insert(*pose, index);
                }
                None => warn!("Idle frame {name:?} missing for {pose:?}"),
            }
        }

        library
    }

    pub fn insert_clip(&mut self, key: AnimationKey, clip: AnimationClip) {
        self.clips.insert(key, clip);
    }

    pub fn clip(&self, key: AnimationKey) -> Option<&AnimationClip> {
        self.clips.get(&key)
    }

    pub fn pose_frame(&self, pose: FacingPose) -> Option<usize> {
        self.poses.get(&pose).copied()
    }
}

/// Playback state of an atlas sprite.
#[derive(Component, Debug, Clone)]
pub struct SpriteAnimator {
    current: Option<AnimationKey>,
    playing: bool,
    cursor: usize,
    elapsed: f32,
    frame: usize,
}

impl SpriteAnimator {
    pub fn new(frame: usize) -> Self {
        Self {
            current: None,
            playing: false,
            cursor: 0,
            elapsed: 0.0,
            frame,
        }
    }

    /// Atlas index currently shown.
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Start `key` from its first frame, unless it is already playing.
    pub fn play(&mut self, key: AnimationKey, library: &AnimationLibrary) {
        if self.playing && self.current == Some(key) {
            return;
        }
        let Some(clip) = library.clip(key) else {
            return;
        };
        self.current = Some(key);
        self.playing = true;
        self.cursor = 0;
        self.elapsed = 0.0;
        self.frame = clip.frames[0];
    }

    /// Freeze on the frame currently shown.
    pub fn stop(&mut self) {
        self.playing = false;
    }

    /// Show a static frame.
    pub fn set_frame(&mut self, frame: usize) {
        self.frame = frame;
    }

    /// Apply one tick of controller output.
    pub fn apply(&mut self, selection: PoseSelection, library: &AnimationLibrary) {
        match selection {
            PoseSelection::Walk(key) => self.play(key, library),
            PoseSelection::Idle(pose) => {
                self.stop();
                if let Some(frame) = pose.and_then(|p| library.pose_frame(p)) {
                    self.set_frame(frame);
                }
            }
        }
    }

    pub fn advance(&mut self, dt: f32, library: &AnimationLibrary) {
        if !self.playing {
            return;
        }
        let Some(clip) = self.current.and_then(|key| library.clip(key)) else {
            return;
        };
        let step = clip.frame_duration();
        self.elapsed += dt;
        while self.elapsed >= step {
            self.elapsed -= step;
            self.cursor = (self.cursor + 1) % clip.frames.len();
        }
        self.frame = clip.frames[self.cursor];
    }
}

/// Step running animations and push the shown frame into the sprite.
pub fn animate_sprites(
    time: Res<Time>,
    library: Res<AnimationLibrary>,
    mut query: Query<(&mut SpriteAnimator, &mut Sprite)>,
) {
    let dt = time.delta_secs();
    for (mut animator, mut sprite) in &mut query {
        animator.advance(dt, &library);
        let frame = animator.frame();
        if let Some(atlas) = sprite.texture_atlas.as_mut()
            && atlas.index != frame
        {
            atlas.index = frame;
        }
    }
}
