use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can abort loading a map, a sprite definition or an atlas.
///
/// Runtime refusals (a full atlas, a vetoed step, an out-of-bounds tile) are
/// not errors; those calls return `Option` or `bool` instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("<{element}> is missing required attribute '{attribute}'")]
    MissingAttribute { element: &'static str, attribute: &'static str },

    #[error("invalid value '{value}' for attribute '{attribute}' on <{element}>")]
    InvalidAttribute { element: &'static str, attribute: &'static str, value: String },

    #[error("unsupported tile data encoding '{0}'")]
    UnsupportedEncoding(String),

    #[error("unsupported tile data compression '{0}'")]
    UnsupportedCompression(String),

    #[error("invalid base64 tile data: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("failed to decompress tile data: {0}")]
    Decompress(#[source] io::Error),

    #[error("layer '{layer}' holds {actual} tiles, expected {expected}")]
    LayerSize { layer: String, expected: usize, actual: usize },

    #[error("invalid tile id '{0}'")]
    InvalidTileId(String),

    #[error("unsupported sprite definition version {0} (only version 1 is supported)")]
    UnsupportedVersion(u32),

    #[error("movement '{movement}' uses tile mode but is missing '{field}'")]
    MissingAdvance { movement: String, field: &'static str },

    #[error("movement '{movement}' has unknown mode '{mode}'")]
    UnknownMovementMode { movement: String, mode: String },

    #[error("rect {x},{y} {width}x{height} lies outside the {sheet_w}x{sheet_h} sprite sheet")]
    FrameOutOfBounds { x: u32, y: u32, width: u32, height: u32, sheet_w: u32, sheet_h: u32 },

    #[error("a {width}x{height} image does not fit in a {size}x{size} atlas")]
    AtlasOverflow { width: u32, height: u32, size: u32 },

    #[error("cannot create a {width}x{height} tilemap with {tile_w}x{tile_h} tiles")]
    Tilemap { width: u32, height: u32, tile_w: u32, tile_h: u32 },

    #[error("external tileset '{0}' cannot be resolved")]
    ExternalTileset(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }
}
