// Sprite sheet -> the four indicator parts.
//
// A layout file names rectangles over a shared texture. At startup we find
// the texture in the layout, open it (high resolution first), and cut out the
// outline and fill sprites for the target and focus-target cursors.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pixel::PixelBuffer;
use crate::types::Rgb24;

pub const DEFAULT_LAYOUT: &str = "indicator.layout.json";
pub const DEFAULT_TEXTURE: &str = "indicator.png";

/// The first two rectangles on the sheet are the on-screen cursor frames.
pub const FIRST_INDICATOR_PART: usize = 2;

pub const PART_COUNT: usize = 4;

/// One of the four sprites an indicator is built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AtlasPart {
    TargetEdge,
    TargetFill,
    FocusEdge,
    FocusFill,
}

impl AtlasPart {
    /// Sheet order.
    pub const ALL: [AtlasPart; PART_COUNT] = [
        AtlasPart::TargetEdge,
        AtlasPart::TargetFill,
        AtlasPart::FocusEdge,
        AtlasPart::FocusFill,
    ];

    pub const fn index(self) -> usize {
        match self {
            AtlasPart::TargetEdge => 0,
            AtlasPart::TargetFill => 1,
            AtlasPart::FocusEdge => 2,
            AtlasPart::FocusFill => 3,
        }
    }

    pub fn from_index(index: usize) -> Result<Self> {
        Self::ALL.get(index).copied().ok_or(Error::PartIndex(index))
    }

    pub const fn edge(focus: bool) -> Self {
        if focus { AtlasPart::FocusEdge } else { AtlasPart::TargetEdge }
    }

    pub const fn fill(focus: bool) -> Self {
        if focus { AtlasPart::FocusFill } else { AtlasPart::TargetFill }
    }

    /// Outlines take the tint as-is; fills are anchored at mid-gray.
    pub const fn bias(self) -> Rgb24 {
        match self {
            AtlasPart::TargetEdge | AtlasPart::FocusEdge => Rgb24::BLACK,
            AtlasPart::TargetFill | AtlasPart::FocusFill => Rgb24::FILL_BIAS,
        }
    }
}

/* ---------- layout model ---------- */

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtlasAsset {
    pub id: u32,
    pub path: String,
}

/// A rectangle in base-resolution texture pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartRect {
    pub texture_id: u32,
    pub u: i32,
    pub v: i32,
    pub w: i32,
    pub h: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartList {
    pub id: u32,
    pub parts: Vec<PartRect>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtlasLayout {
    pub assets: Vec<AtlasAsset>,
    pub part_lists: Vec<PartList>,
}

impl AtlasLayout {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Id of the first asset whose path agrees with `path` over their common length.
    pub fn texture_id(&self, path: &str) -> Option<u32> {
        self.assets
            .iter()
            .find(|asset| {
                let n = asset.path.len().min(path.len());
                asset.path.as_bytes()[..n] == path.as_bytes()[..n]
            })
            .map(|asset| asset.id)
    }

    /// All rectangles over `texture_id`, across every part list, in file order.
    pub fn rects_for(&self, texture_id: u32) -> impl Iterator<Item = &PartRect> {
        self.part_lists
            .iter()
            .flat_map(|list| list.parts.iter())
            .filter(move |rect| rect.texture_id == texture_id)
    }
}

/* ---------- sources ---------- */

/// Which layout to read and which texture in it holds the indicator sprites.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AtlasRequest {
    pub layout: String,
    pub texture: String,
}

impl Default for AtlasRequest {
    fn default() -> Self {
        Self {
            layout: DEFAULT_LAYOUT.to_owned(),
            texture: DEFAULT_TEXTURE.to_owned(),
        }
    }
}

/// Where layouts and textures come from.
pub trait AtlasSource {
    fn load_layout(&self, layout: &str) -> Result<AtlasLayout>;

    /// `None` if the texture is absent or can't be decoded.
    fn load_texture(&self, path: &str) -> Option<PixelBuffer>;

    /// Hook for texture replacement packs. Identity by default.
    fn substitute_path(&self, path: &str) -> String {
        path.to_owned()
    }
}

/// `dir/name.ext` -> `dir/name_hr1.ext`
pub fn high_res_path(path: &str) -> String {
    let file_start = path.rfind('/').map_or(0, |i| i + 1);
    match path[file_start..].rfind('.') {
        Some(dot) => {
            let dot = file_start + dot;
            format!("{}_hr1{}", &path[..dot], &path[dot..])
        }
        None => format!("{path}_hr1"),
    }
}

/// Layouts and textures under a directory on disk.
pub struct FsAtlasSource {
    root: PathBuf,
}

impl FsAtlasSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn decode(&self, path: &Path) -> Result<PixelBuffer> {
        let image = image::ImageReader::open(path)?.with_guessed_format()?.decode()?;
        Ok(PixelBuffer::from_image(&image))
    }
}

impl AtlasSource for FsAtlasSource {
    fn load_layout(&self, layout: &str) -> Result<AtlasLayout> {
        let path = self.root.join(layout);
        let text = fs::read_to_string(&path).map_err(|e| Error::LayoutLoad {
            layout: layout.to_owned(),
            reason: format!("{}: {e}", path.display()),
        })?;
        AtlasLayout::from_json(&text).map_err(|e| Error::LayoutLoad {
            layout: layout.to_owned(),
            reason: e.to_string(),
        })
    }

    fn load_texture(&self, path: &str) -> Option<PixelBuffer> {
        let full = self.root.join(path);
        match self.decode(&full) {
            Ok(image) => Some(image),
            Err(e) => {
                log::debug!("texture {} unavailable: {e}", full.display());
                None
            }
        }
    }
}

/// In-memory layouts and textures. Used by tests and the demo's built-in sheet.
#[derive(Default)]
pub struct MemoryAtlasSource {
    layouts: HashMap<String, AtlasLayout>,
    textures: HashMap<String, PixelBuffer>,
}

impl MemoryAtlasSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layout(mut self, name: impl Into<String>, layout: AtlasLayout) -> Self {
        self.layouts.insert(name.into(), layout);
        self
    }

    pub fn with_texture(mut self, path: impl Into<String>, image: PixelBuffer) -> Self {
        self.textures.insert(path.into(), image);
        self
    }
}

impl AtlasSource for MemoryAtlasSource {
    fn load_layout(&self, layout: &str) -> Result<AtlasLayout> {
        self.layouts.get(layout).cloned().ok_or_else(|| Error::LayoutLoad {
            layout: layout.to_owned(),
            reason: "not found".to_owned(),
        })
    }

    fn load_texture(&self, path: &str) -> Option<PixelBuffer> {
        self.textures.get(path).cloned()
    }
}

/* ---------- extraction ---------- */

/// Cut one part out of the sheet.
///
/// The rectangle is scaled by `pixel_ratio`, then its size is clamped to the
/// sheet. A rectangle that ends up with no area gives an empty buffer; a
/// negative origin is a `SliceBounds` error.
pub fn extract_part(sheet: &PixelBuffer, rect: &PartRect, pixel_ratio: i32) -> Result<PixelBuffer> {
    let u = rect.u.saturating_mul(pixel_ratio);
    let v = rect.v.saturating_mul(pixel_ratio);
    if u < 0 || v < 0 {
        return Err(Error::SliceBounds(format!("negative part origin ({u}, {v})")));
    }

    let sheet_w = i32::try_from(sheet.width()).unwrap_or(i32::MAX);
    let sheet_h = i32::try_from(sheet.height()).unwrap_or(i32::MAX);
    let w = rect.w.saturating_mul(pixel_ratio).min(sheet_w - u.min(sheet_w)).max(0);
    let h = rect.h.saturating_mul(pixel_ratio).min(sheet_h - v.min(sheet_h)).max(0);
    if w == 0 || h == 0 {
        return Ok(PixelBuffer::empty());
    }

    sheet.slice(u, v, w, h)
}

/// The four indicator sprites, cut once at startup and immutable afterwards.
#[derive(Debug)]
pub struct AtlasParts {
    pixel_ratio: u32,
    images: [PixelBuffer; PART_COUNT],
}

impl AtlasParts {
    /// Resolve the request against `source` and cut the parts out.
    pub fn load<S: AtlasSource + ?Sized>(source: &S, request: &AtlasRequest) -> Result<Self> {
        let layout = source.load_layout(&request.layout)?;

        let texture_id = layout
            .texture_id(&request.texture)
            .ok_or_else(|| Error::TextureNotInLayout {
                layout: request.layout.clone(),
                texture: request.texture.clone(),
            })?;

        let (sheet, pixel_ratio) = Self::open_sheet(source, &request.texture)?;

        let rects: Vec<PartRect> = layout
            .rects_for(texture_id)
            .skip(FIRST_INDICATOR_PART)
            .take(PART_COUNT)
            .copied()
            .collect();
        if rects.len() < PART_COUNT {
            return Err(Error::MissingParts {
                layout: request.layout.clone(),
                texture: request.texture.clone(),
                found: rects.len(),
                needed: PART_COUNT,
            });
        }

        let parts = Self::from_sheet(&sheet, &rects, pixel_ratio)?;
        log::info!(
            "atlas {} loaded at {}x: {:?}",
            request.texture,
            pixel_ratio,
            parts.images.iter().map(|p| (p.width(), p.height())).collect::<Vec<_>>()
        );
        Ok(parts)
    }

    /// Cut parts from an already opened sheet. `rects` are in role order.
    pub fn from_sheet(sheet: &PixelBuffer, rects: &[PartRect], pixel_ratio: u32) -> Result<Self> {
        if rects.len() < PART_COUNT {
            return Err(Error::MissingParts {
                layout: String::from("<inline>"),
                texture: String::from("<inline>"),
                found: rects.len(),
                needed: PART_COUNT,
            });
        }
        let ratio = i32::try_from(pixel_ratio).unwrap_or(i32::MAX);
        let [a, b, c, d] = [&rects[0], &rects[1], &rects[2], &rects[3]];
        Ok(Self {
            pixel_ratio,
            images: [
                extract_part(sheet, a, ratio)?,
                extract_part(sheet, b, ratio)?,
                extract_part(sheet, c, ratio)?,
                extract_part(sheet, d, ratio)?,
            ],
        })
    }

    /// High resolution first, then base resolution. One of them must open.
    fn open_sheet<S: AtlasSource + ?Sized>(source: &S, texture: &str) -> Result<(PixelBuffer, u32)> {
        let hr = source.substitute_path(&high_res_path(texture));
        if let Some(sheet) = source.load_texture(&hr) {
            return Ok((sheet, 2));
        }

        let base = source.substitute_path(texture);
        match source.load_texture(&base) {
            Some(sheet) => {
                log::info!("{hr} unavailable, using {base}");
                Ok((sheet, 1))
            }
            None => Err(Error::TextureLoad(texture.to_owned())),
        }
    }

    pub fn pixel_ratio(&self) -> u32 {
        self.pixel_ratio
    }

    pub fn get(&self, part: AtlasPart) -> &PixelBuffer {
        &self.images[part.index()]
    }

    pub fn into_images(self) -> [PixelBuffer; PART_COUNT] {
        self.images
    }
}
