// RGBA8 pixel buffers: cutting parts out of a sprite sheet and recoloring them.
//
// Buffers are values. Slicing and tinting always hand back a new buffer and
// never touch the source.

use std::fmt;

use crate::error::{Error, Result};
use crate::types::Rgb24;

/// Bytes handled per batch by `tint` (four RGBA pixels).
pub const LANE_BYTES: usize = 16;

/// Layout of the bytes handed to a texture uploader.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Rgba8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureSpec {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

/// A `width x height` RGBA8 image.
///
/// Only the first `width * height * 4` bytes are pixels. Buffers produced by
/// [`PixelBuffer::slice`] are padded up to a whole number of 16-byte lanes;
/// the padding is scratch space and carries no meaning.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Buffer length for `pixels` pixels, rounded up to whole 4-pixel lanes.
#[inline]
fn padded_len(pixels: usize) -> usize {
    ((pixels + 3) & !3) * 4
}

impl PixelBuffer {
    pub const fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            data: Vec::new(),
        }
    }

    /// Wrap tightly packed RGBA8 rows. Extra trailing bytes are allowed.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() < expected {
            return Err(Error::BufferSize {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Convert any decoded image to RGBA8.
    pub fn from_image(image: &image::DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self {
            width,
            height,
            data: rgba.into_raw(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whole backing buffer, padding included.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Just the meaningful pixel bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.data[..self.width as usize * self.height as usize * 4]
    }

    pub fn spec(&self) -> TextureSpec {
        TextureSpec {
            width: self.width,
            height: self.height,
            format: PixelFormat::Rgba8,
        }
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]])
    }

    /// Copy out the `w x h` rectangle whose top-left corner is `(u, v)`.
    ///
    /// The rectangle must lie fully inside the image; anything else is a
    /// `SliceBounds` error. A zero-area rectangle gives [`PixelBuffer::empty`].
    pub fn slice(&self, u: i32, v: i32, w: i32, h: i32) -> Result<PixelBuffer> {
        // i64 so `u + w` can't overflow.
        let (width, height) = (i64::from(self.width), i64::from(self.height));
        let (u, v, w, h) = (i64::from(u), i64::from(v), i64::from(w), i64::from(h));
        if u < 0 || u > width {
            return Err(Error::SliceBounds(format!("u={u} outside 0..={width}")));
        }
        if v < 0 || v > height {
            return Err(Error::SliceBounds(format!("v={v} outside 0..={height}")));
        }
        if w < 0 || u + w > width {
            return Err(Error::SliceBounds(format!("w={w} at u={u} exceeds width {width}")));
        }
        if h < 0 || v + h > height {
            return Err(Error::SliceBounds(format!("h={h} at v={v} exceeds height {height}")));
        }
        if w == 0 || h == 0 {
            return Ok(Self::empty());
        }

        let (u, v, w, h) = (u as usize, v as usize, w as usize, h as usize);
        let src_stride = self.width as usize * 4;
        let row_bytes = w * 4;
        let mut out = vec![0u8; padded_len(w * h)];

        // Row by row; the output stride is the slice width, not the sheet's.
        for (y, dst) in out.chunks_exact_mut(row_bytes).take(h).enumerate() {
            let start = (v + y) * src_stride + u * 4;
            dst.copy_from_slice(&self.data[start..start + row_bytes]);
        }

        Ok(PixelBuffer {
            width: w as u32,
            height: h as u32,
            data: out,
        })
    }

    /// Bytewise saturated fused `self + addend - bias`, batched over 16-byte lanes.
    pub fn tint(&self, addend: Rgb24, bias: Rgb24) -> PixelBuffer {
        self.tint_lanes::<LANE_BYTES>(addend, bias)
    }

    /// One byte at a time. Reference for [`PixelBuffer::tint`].
    pub fn tint_scalar(&self, addend: Rgb24, bias: Rgb24) -> PixelBuffer {
        let word = TintWord::new(addend, bias);
        let data = self
            .data
            .iter()
            .enumerate()
            .map(|(i, &x)| tint_byte(x, word.add[i % 4], word.sub[i % 4]))
            .collect();
        PixelBuffer { data, ..*self }
    }

    /// Same result as `tint_scalar`, `N` bytes per step. `N` must be a
    /// positive multiple of 4 so every lane starts on a pixel boundary.
    pub fn tint_lanes<const N: usize>(&self, addend: Rgb24, bias: Rgb24) -> PixelBuffer {
        const { assert!(N > 0 && N % 4 == 0) };

        let word = TintWord::new(addend, bias);
        let add: [u8; N] = std::array::from_fn(|i| word.add[i % 4]);
        let sub: [u8; N] = std::array::from_fn(|i| word.sub[i % 4]);

        let mut out = vec![0u8; self.data.len()];
        let body = self.data.len() / N * N;

        for (src, dst) in self.data[..body]
            .chunks_exact(N)
            .zip(out[..body].chunks_exact_mut(N))
        {
            for i in 0..N {
                dst[i] = tint_byte(src[i], add[i], sub[i]);
            }
        }

        // Unpadded buffers can end mid-lane. `body` is pixel-aligned.
        for (i, (&x, o)) in self.data[body..].iter().zip(&mut out[body..]).enumerate() {
            *o = tint_byte(x, word.add[i % 4], word.sub[i % 4]);
        }

        PixelBuffer { data: out, ..*self }
    }

    /// For debugging and the demo's `--dump-parts`. `None` for empty buffers.
    pub fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        if self.is_empty() {
            return None;
        }
        image::RgbaImage::from_raw(self.width, self.height, self.pixels().to_vec())
    }
}

/// Per-byte constants of the fused add/subtract, for one RGBA word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct TintWord {
    add: [u8; 4],
    sub: [u8; 4],
}

impl TintWord {
    fn new(addend: Rgb24, bias: Rgb24) -> Self {
        let a = addend.to_word();
        let b = bias.to_word();
        let mut add = [0u8; 4];
        let mut sub = [0u8; 4];
        for i in 0..4 {
            // Amount above the bias, and the complementary amount below it.
            add[i] = a[i].max(b[i]) - b[i];
            sub[i] = (!a[i]).max(!b[i]) - !b[i];
        }
        Self { add, sub }
    }
}

#[inline(always)]
fn tint_byte(x: u8, add: u8, sub: u8) -> u8 {
    // x.min(!add) keeps the add <= 255; max(.., sub) keeps the subtract >= 0.
    (add + x.min(!add)).max(sub) - sub
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// `w x h` image whose bytes count up from `seed`.
    fn ramp(w: u32, h: u32, seed: u8) -> PixelBuffer {
        let data = (0..w * h * 4).map(|i| seed.wrapping_add(i as u8)).collect();
        PixelBuffer::from_rgba(w, h, data).unwrap()
    }

    fn solid(w: u32, h: u32, px: [u8; 4]) -> PixelBuffer {
        PixelBuffer::from_rgba(w, h, px.repeat((w * h) as usize)).unwrap()
    }

    #[test]
    fn from_rgba_rejects_short_data() {
        let err = PixelBuffer::from_rgba(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(err, Error::BufferSize { expected: 16, actual: 15, .. }));
    }

    #[test]
    fn slice_copies_rows_with_own_stride() {
        let sheet = ramp(4, 3, 0);
        let part = sheet.slice(1, 1, 2, 2).unwrap();
        assert_eq!((part.width(), part.height()), (2, 2));
        assert_eq!(part.pixel(0, 0), sheet.pixel(1, 1));
        assert_eq!(part.pixel(1, 0), sheet.pixel(2, 1));
        assert_eq!(part.pixel(0, 1), sheet.pixel(1, 2));
        assert_eq!(part.pixel(1, 1), sheet.pixel(2, 2));
    }

    #[test]
    fn slice_pads_to_whole_lanes() {
        let sheet = ramp(8, 8, 3);
        let part = sheet.slice(0, 0, 3, 3).unwrap();
        assert_eq!(part.pixels().len(), 36);
        assert_eq!(part.data().len(), 48);
        assert_eq!(part.data().len() % LANE_BYTES, 0);
    }

    #[test]
    fn slice_rejects_out_of_bounds() {
        let sheet = ramp(4, 4, 0);
        assert!(matches!(sheet.slice(-1, 0, 1, 1), Err(Error::SliceBounds(_))));
        assert!(matches!(sheet.slice(0, -1, 1, 1), Err(Error::SliceBounds(_))));
        assert!(matches!(sheet.slice(3, 0, 2, 1), Err(Error::SliceBounds(_))));
        assert!(matches!(sheet.slice(0, 3, 1, 2), Err(Error::SliceBounds(_))));
        assert!(matches!(sheet.slice(5, 0, 0, 0), Err(Error::SliceBounds(_))));
        assert!(matches!(sheet.slice(i32::MAX, 0, i32::MAX, 1), Err(Error::SliceBounds(_))));
    }

    #[test]
    fn zero_area_slice_is_empty() {
        let sheet = ramp(4, 4, 0);
        let part = sheet.slice(4, 4, 0, 0).unwrap();
        assert!(part.is_empty());
        assert!(part.data().is_empty());
        assert_eq!(sheet.slice(1, 1, 0, 3).unwrap(), PixelBuffer::empty());
    }

    #[test]
    fn zero_tint_zero_bias_is_identity() {
        let img = ramp(5, 3, 17);
        assert_eq!(img.tint(Rgb24::BLACK, Rgb24::BLACK), img);
    }

    #[test]
    fn tint_equal_to_bias_is_identity() {
        let img = ramp(4, 4, 200);
        assert_eq!(img.tint(Rgb24::FILL_BIAS, Rgb24::FILL_BIAS), img);
    }

    #[test]
    fn edge_tint_adds_and_saturates() {
        let img = solid(1, 1, [0x10, 0xF0, 0x80, 0x7F]);
        let out = img.tint(Rgb24::new(0x00_4020), Rgb24::BLACK);
        // red + 0x20, green + 0x40 (clamped), blue + 0, alpha untouched
        assert_eq!(out.pixel(0, 0), Some([0x30, 0xFF, 0x80, 0x7F]));
    }

    #[test]
    fn fill_bias_pushes_both_ways() {
        let img = solid(1, 1, [0x80, 0x80, 0x20, 0xFF]);
        // red: above bias by 0x20; green: below bias by 0x40; blue: below by 0x40, clamps at 0
        let out = img.tint(Rgb24::new(0x60_60C0), Rgb24::FILL_BIAS);
        assert_eq!(out.pixel(0, 0), Some([0xA0, 0x40, 0x00, 0xFF]));
    }

    #[test]
    fn tint_keeps_dimensions_and_padding_length() {
        let part = ramp(8, 8, 0).slice(1, 2, 3, 5).unwrap();
        let out = part.tint(Rgb24::new(0x123456), Rgb24::FILL_BIAS);
        assert_eq!((out.width(), out.height()), (3, 5));
        assert_eq!(out.data().len(), part.data().len());
    }

    #[test]
    fn tint_handles_unpadded_tail() {
        // 5 pixels = 20 bytes: one full lane plus a 4-byte tail.
        let img = ramp(5, 1, 90);
        let tint = Rgb24::new(0x0A0B0C);
        assert_eq!(img.tint(tint, Rgb24::BLACK), img.tint_scalar(tint, Rgb24::BLACK));
    }

    #[test]
    fn rgba_image_round_trip_drops_padding() {
        let part = ramp(6, 6, 0).slice(0, 0, 3, 1).unwrap();
        let image = part.to_rgba_image().unwrap();
        assert_eq!(image.dimensions(), (3, 1));
        assert_eq!(image.as_raw().as_slice(), part.pixels());
        assert!(PixelBuffer::empty().to_rgba_image().is_none());
    }

    proptest! {
        #[test]
        fn tint_matches_widened_clamp(x in any::<u8>(), addend in any::<u32>(), bias in any::<u32>()) {
            let (addend, bias) = (Rgb24::new(addend), Rgb24::new(bias));
            let img = solid(1, 1, [x, x, x, x]);
            let out = img.tint_scalar(addend, bias);
            let (a, b) = (addend.to_word(), bias.to_word());
            for c in 0..4 {
                // Reference in i32: add the part of the tint above the bias,
                // subtract the part below it, clamp after each step.
                let (a, b) = (i32::from(a[c]), i32::from(b[c]));
                let up = (a - b).max(0);
                let down = (b - a).max(0);
                let expected = ((i32::from(x) + up).min(255) - down).max(0);
                prop_assert_eq!(i32::from(out.data()[c]), expected);
            }
        }

        #[test]
        fn batched_tint_equals_scalar(
            data in proptest::collection::vec(any::<u8>(), 0..64usize).prop_map(|mut d| { d.truncate(d.len() / 4 * 4); d }),
            addend in any::<u32>(),
            bias in prop_oneof![Just(0u32), Just(0xA0A0A0u32), any::<u32>()],
        ) {
            let w = (data.len() / 4) as u32;
            let img = PixelBuffer::from_rgba(w, 1, data).unwrap();
            let (addend, bias) = (Rgb24::new(addend), Rgb24::new(bias));
            let scalar = img.tint_scalar(addend, bias);
            prop_assert_eq!(&img.tint(addend, bias), &scalar);
            prop_assert_eq!(&img.tint_lanes::<4>(addend, bias), &scalar);
            prop_assert_eq!(&img.tint_lanes::<64>(addend, bias), &scalar);
        }
    }
}
