// One error type for the whole crate.
// Every variant states *where* things went wrong.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // --- startup: atlas extraction ---
    #[error("atlas layout `{layout}` could not be loaded: {reason}")]
    LayoutLoad { layout: String, reason: String },

    #[error("texture `{texture}` is not listed in atlas layout `{layout}`")]
    TextureNotInLayout { layout: String, texture: String },

    #[error("texture `{0}` could not be opened at any supported resolution")]
    TextureLoad(String),

    #[error("atlas layout `{layout}` has {found} indicator parts for `{texture}`, need {needed}")]
    MissingParts {
        layout: String,
        texture: String,
        found: usize,
        needed: usize,
    },

    // --- contract violations ---
    #[error("slice out of bounds: {0}")]
    SliceBounds(String),

    #[error("atlas part index {0} is out of range (0..4)")]
    PartIndex(usize),

    #[error("pixel data holds {actual} bytes, {width}x{height} RGBA8 needs {expected}")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    // --- per-frame ---
    #[error("nameplate position of target {0:#x} could not be resolved")]
    TargetUnresolved(u64),

    #[error("no active camera")]
    CameraUnavailable,

    #[error("texture upload failed: {0}")]
    Upload(String),

    // --- settings ---
    #[error("config error: {0}")]
    Config(String),

    // --- demo window ---
    #[error("window init error: {0}")]
    WindowInit(String),

    #[error("window update error: {0}")]
    WindowUpdate(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;
