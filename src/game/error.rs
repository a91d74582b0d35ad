use std::fmt;

/// Failures while reading or assembling the scene's assets.
#[derive(Debug)]
pub enum AssetError {
    Io(std::io::Error),
    Json(serde_json::Error),
    MissingLayer(String),
    MissingTileset(String),
    /// Tilesets stored in a separate `.tsj` file are not supported.
    ExternalTileset(String),
    MissingObject {
        layer: String,
        name: String,
    },
    MissingFrame(String),
    /// An asset the scene requested failed to load.
    LoadFailed(String),
    /// `initialize` ran without a successful `load`.
    NotLoaded,
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(source) => write!(f, "cannot read asset: {source}"),
            Self::Json(source) => write!(f, "cannot parse asset: {source}"),
            Self::MissingLayer(name) => write!(f, "map has no layer named {name:?}"),
            Self::MissingTileset(name) => write!(f, "map has no tileset named {name:?}"),
            Self::ExternalTileset(source) => {
                write!(f, "external tileset {source:?} must be embedded in the map")
            }
            Self::MissingObject { layer, name } => {
                write!(f, "object layer {layer:?} has no object named {name:?}")
            }
            Self::MissingFrame(name) => write!(f, "atlas has no frame named {name:?}"),
            Self::LoadFailed(path) => write!(f, "asset {path:?} failed to load"),
            Self::NotLoaded => write!(f, "scene initialized before its assets were loaded"),
        }
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(source) => Some(source),
            Self::Json(source) => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for AssetError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for AssetError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}
