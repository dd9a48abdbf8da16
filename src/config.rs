// User settings: which targets get an indicator and how it's laid out.
// Stored as JSON; missing keys fall back to defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const CONFIG_VERSION: u32 = 1;

/// Allowed range for `padding`, pixels from the window edge.
pub const PADDING_RANGE: (f32, f32) = (0.0, 64.0);
/// Allowed range for `width`, pixels across the cursor.
pub const WIDTH_RANGE: (f32, f32) = (8.0, 288.0);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub version: u32,
    pub display_for_target: bool,
    pub display_for_focus_target: bool,
    pub width: f32,
    pub padding: f32,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            display_for_target: true,
            display_for_focus_target: true,
            width: 72.0,
            padding: 8.0,
        }
    }
}

impl IndicatorConfig {
    /// Copy with `width` and `padding` pulled into their ranges. NaN takes the default.
    pub fn clamped(&self) -> Self {
        let defaults = Self::default();
        let clamp = |value: f32, (lo, hi): (f32, f32), fallback: f32| {
            if value.is_nan() { fallback } else { value.clamp(lo, hi) }
        };
        Self {
            width: clamp(self.width, WIDTH_RANGE, defaults.width),
            padding: clamp(self.padding, PADDING_RANGE, defaults.padding),
            ..self.clone()
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        if config.version > CONFIG_VERSION {
            return Err(Error::Config(format!(
                "config version {} is newer than supported version {CONFIG_VERSION}",
                config.version
            )));
        }
        Ok(config.clamped())
    }

    /// Read settings from `path`. A missing file gives the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(text) => Self::from_json(&text)
                .map_err(|e| Error::Config(format!("{}: {e}", path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("no config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
