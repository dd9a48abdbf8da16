// Small value types shared by the tint pipeline and the software renderer.

use std::fmt;

/// A 24-bit tint color. Only the low 24 bits are ever kept.
///
/// The bytes are applied in memory order: the lowest byte tints the first
/// channel of an RGBA8 pixel (red), the next one green, the next one blue.
/// The alpha byte of the word is always zero, so alpha passes through a tint.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb24(u32);

impl Rgb24 {
    pub const BLACK: Rgb24 = Rgb24(0);
    /// Reference color used by fill parts; a fill tinted with it is unchanged.
    pub const FILL_BIAS: Rgb24 = Rgb24(0x00A0_A0A0);

    /// Masks `raw` down to 24 bits.
    pub const fn new(raw: u32) -> Self {
        Rgb24(raw & 0x00FF_FFFF)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The color as a 4-byte RGBA word (alpha byte is 0).
    pub const fn to_word(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

impl From<u32> for Rgb24 {
    fn from(raw: u32) -> Self {
        Rgb24::new(raw)
    }
}

impl fmt::Debug for Rgb24 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rgb24(0x{:06X})", self.0)
    }
}

impl fmt::Display for Rgb24 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:06X}", self.0)
    }
}

/// Software screen. Each pixel is 0x00RRGGBB, ready to hand to a window.
#[derive(Clone)]
pub struct FrameBuffer {
    pub width: usize,     // pixels per row
    pub height: usize,    // rows
    pub pixels: Vec<u32>, // width * height entries
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u32; width * height],
        }
    }

    pub fn clear(&mut self, color: u32) {
        self.pixels.fill(color);
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y * self.width + x])
    }
}
