// Per-part tinted textures, recomputed only when the requested tint changes.
//
// Each part owns at most one live texture. Tinting with a new color uploads a
// fresh texture and releases the old one through the same uploader.

use crate::atlas::{AtlasPart, AtlasParts, PART_COUNT};
use crate::error::{Error, Result};
use crate::pixel::{PixelBuffer, TextureSpec};
use crate::types::Rgb24;

/// Turns pixel buffers into something a renderer can draw.
pub trait TextureUploader {
    type Handle;

    /// `spec` describes the meaningful part of `image.data()`; any bytes past
    /// it are lane padding.
    fn upload(&mut self, image: &PixelBuffer, spec: TextureSpec, label: &str) -> Result<Self::Handle>;

    /// Called exactly once for every handle `upload` returned.
    fn release(&mut self, handle: Self::Handle);
}

/// A live texture plus the size needed to draw it undistorted.
#[derive(Debug)]
pub struct TintedTexture<H> {
    pub handle: H,
    pub width: u32,
    pub height: u32,
}

impl<H> TintedTexture<H> {
    /// height / width, 0 for an empty texture.
    pub fn aspect(&self) -> f32 {
        if self.width == 0 {
            return 0.0;
        }
        self.height as f32 / self.width as f32
    }
}

/// Holds the texture for the most recently requested tint, if any.
pub struct TextureSlot<H> {
    // Tint and texture live and die together.
    current: Option<(Rgb24, TintedTexture<H>)>,
}

impl<H> Default for TextureSlot<H> {
    fn default() -> Self {
        Self { current: None }
    }
}

impl<H> TextureSlot<H> {
    pub fn tint(&self) -> Option<Rgb24> {
        self.current.as_ref().map(|(tint, _)| *tint)
    }

    pub fn texture(&self) -> Option<&TintedTexture<H>> {
        self.current.as_ref().map(|(_, texture)| texture)
    }

    /// Return the held texture if it was made with `tint`. Otherwise render,
    /// upload, install the new texture and release the one it replaces.
    /// A failed upload leaves the slot as it was.
    pub fn get_or_replace<U>(
        &mut self,
        tint: Rgb24,
        uploader: &mut U,
        label: impl FnOnce() -> String,
        render: impl FnOnce() -> PixelBuffer,
    ) -> Result<&TintedTexture<H>>
    where
        U: TextureUploader<Handle = H>,
    {
        if self.tint() != Some(tint) {
            let image = render();
            let spec = image.spec();
            let handle = uploader.upload(&image, spec, &label())?;
            let texture = TintedTexture {
                handle,
                width: spec.width,
                height: spec.height,
            };
            if let Some((_, old)) = self.current.replace((tint, texture)) {
                uploader.release(old.handle);
            }
        }
        self.texture()
            .ok_or_else(|| Error::Upload(format!("no texture held for tint {tint}")))
    }

    /// Give up the held texture, if any.
    pub fn clear<U>(&mut self, uploader: &mut U)
    where
        U: TextureUploader<Handle = H>,
    {
        if let Some((_, old)) = self.current.take() {
            uploader.release(old.handle);
        }
    }
}

struct CacheEntry<H> {
    base: PixelBuffer,
    slot: TextureSlot<H>,
}

/// The four indicator parts and their current tinted textures.
///
/// Owns the uploader; every handle it hands out stays owned by the cache and
/// is released on replacement or when the cache is dropped.
pub struct TintCache<U: TextureUploader> {
    uploader: U,
    entries: [CacheEntry<U::Handle>; PART_COUNT],
}

impl<U: TextureUploader> TintCache<U> {
    pub fn new(parts: AtlasParts, uploader: U) -> Self {
        let entries = parts.into_images().map(|base| CacheEntry {
            base,
            slot: TextureSlot::default(),
        });
        Self { uploader, entries }
    }

    /// Texture for `part` tinted with `tint` (masked to 24 bits).
    pub fn get_tinted_part(
        &mut self,
        part: AtlasPart,
        tint: impl Into<Rgb24>,
    ) -> Result<&TintedTexture<U::Handle>> {
        let tint = tint.into();
        let entry = &mut self.entries[part.index()];
        let base = &entry.base;
        entry.slot.get_or_replace(
            tint,
            &mut self.uploader,
            || format!("{part:?} tinted {tint}"),
            || {
                log::debug!("tint cache miss: {part:?} {tint}");
                base.tint(tint, part.bias())
            },
        )
    }

    /// Same as [`TintCache::get_tinted_part`] for callers holding a raw index.
    pub fn get_tinted_part_at(
        &mut self,
        index: usize,
        tint: impl Into<Rgb24>,
    ) -> Result<&TintedTexture<U::Handle>> {
        let part = AtlasPart::from_index(index)?;
        self.get_tinted_part(part, tint)
    }

    pub fn current_tint(&self, part: AtlasPart) -> Option<Rgb24> {
        self.entries[part.index()].slot.tint()
    }

    pub fn base_image(&self, part: AtlasPart) -> &PixelBuffer {
        &self.entries[part.index()].base
    }

    pub fn uploader(&self) -> &U {
        &self.uploader
    }
}

impl<U: TextureUploader> Drop for TintCache<U> {
    fn drop(&mut self) {
        for entry in &mut self.entries {
            entry.slot.clear(&mut self.uploader);
        }
    }
}
