//! Texture-packer style sprite atlas (`.json` + `.png`).

use std::collections::{BTreeMap, HashMap};

use bevy::asset::{io::Reader, AssetLoader, LoadContext};
use bevy::prelude::*;
use serde::Deserialize;

use super::error::AssetError;

#[derive(Debug, Deserialize)]
struct AtlasFile {
    frames: AtlasFrames,
    #[serde(default)]
    meta: Option<AtlasMeta>,
}

/// Both layouts texture packers emit: `{"name": {...}}` and `[{"filename": ...}]`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AtlasFrames {
    Hash(BTreeMap<String, FrameEntry>),
    Array(Vec<NamedFrame>),
}

#[derive(Debug, Deserialize)]
struct FrameEntry {
    frame: FrameRect,
}

#[derive(Debug, Deserialize)]
struct NamedFrame {
    filename: String,
    frame: FrameRect,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct FrameRect {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
}

#[derive(Debug, Deserialize)]
struct AtlasMeta {
    #[serde(default)]
    size: Option<AtlasSize>,
}

#[derive(Debug, Deserialize)]
struct AtlasSize {
    w: u32,
    h: u32,
}

/// Named frames of one atlas image.
#[derive(Asset, TypePath, Debug, Clone)]
pub struct SpriteAtlas {
    pub layout: TextureAtlasLayout,
    frames: HashMap<String, usize>,
}

impl SpriteAtlas {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, AssetError> {
        let file: AtlasFile = serde_json::from_slice(bytes)?;
        Ok(Self::from_file(file))
    }

    fn from_file(file: AtlasFile) -> Self {
        let named: Vec<(String, FrameRect)> = match file.frames {
            AtlasFrames::Hash(map) => map.into_iter().map(|(name, e)| (name, e.frame)).collect(),
            AtlasFrames::Array(list) => list.into_iter().map(|f| (f.filename, f.frame)).collect(),
        };

        let size = match file.meta.and_then(|m| m.size) {
            Some(size) => UVec2::new(size.w, size.h),
            None => named.iter().fold(UVec2::ZERO, |acc, (_, r)| {
                acc.max(UVec2::new(r.x + r.w, r.y + r.h))
            }),
        };

        let mut layout = TextureAtlasLayout::new_empty(size);
        let mut frames = HashMap::with_capacity(named.len());
        for (name, r) in named {
            let index = layout.add_texture(URect::new(r.x, r.y, r.x + r.w, r.y + r.h));
            frames.insert(name, index);
        }
        Self { layout, frames }
    }

    pub fn index(&self, name: &str) -> Option<usize> {
        self.frames.get(name).copied()
    }

    /// Pixel size of a frame in the source image.
    pub fn frame_size(&self, name: &str) -> Option<Vec2> {
        let index = self.index(name)?;
        self.layout.textures.get(index).map(|r| r.size().as_vec2())
    }
}

/// Reads texture-packer `.json` files through the `AssetServer`.
#[derive(Default, TypePath)]
pub struct SpriteAtlasLoader;

impl AssetLoader for SpriteAtlasLoader {
    type Asset = SpriteAtlas;
    type Settings = ();
    type Error = AssetError;

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &(),
        _load_context: &mut LoadContext<'_>,
    ) -> Result<SpriteAtlas, AssetError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        SpriteAtlas::from_slice(&bytes)
    }

    fn extensions(&self) -> &[&str] {
        &["json"]
    }
}

/// Frame names `prefix` + zero-padded number + `suffix`, for `start..=end`.
pub fn frame_names(prefix: &str, suffix: &str, start: u32, end: u32, zero_pad: usize) -> Vec<String> {
    (start..=end)
        .map(|i| format!("{prefix}{i:0>zero_pad$}{suffix}"))
        .collect()
}
