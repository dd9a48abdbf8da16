// Edge-of-screen cursors that point at the current target and focus target.
//
// Start-up: `atlas` cuts four sprites out of a shared sheet.
// Each frame: `overlay` asks `projection` which way each target lies, gets a
// tinted copy of the right sprites from `tint_cache` and lays them out on the
// padded viewport edge with `geometry`.

pub mod atlas;
pub mod camera;
pub mod config;
pub mod draw;
pub mod error;
pub mod geometry;
pub mod overlay;
pub mod pixel;
pub mod projection;
pub mod target;
pub mod tint_cache;
pub mod types;
#[cfg(feature = "demo")]
pub mod window;

pub use atlas::{AtlasPart, AtlasParts, AtlasRequest, AtlasSource, FsAtlasSource, MemoryAtlasSource};
pub use config::IndicatorConfig;
pub use error::{Error, Result};
pub use overlay::{FrameReport, IndicatorOverlay};
pub use pixel::PixelBuffer;
pub use projection::{Direction, Viewport, WorldView};
pub use target::{EntityId, HostConditions, TargetColors, TargetProvider, TrackedEntity};
pub use tint_cache::{TextureUploader, TintCache};
pub use types::{FrameBuffer, Rgb24};
