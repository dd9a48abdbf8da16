// Software drawing into a FrameBuffer.
// Visual effects provided here:
// 1) Tinted indicator sprites, drawn as textured quads with alpha blending.
// 2) A crosshair over targets that are on screen.
// 3) A tiny 5x7 bitmap font for the HUD line.
//
// `SoftwareUploader` + `FrameCanvas` are the CPU stand-ins for a GPU texture
// store and a background draw list.

use std::rc::Rc;

use cgmath::Vector2;

use crate::error::{Error, Result};
use crate::geometry::{ImageQuad, QuadSink};
use crate::pixel::{PixelBuffer, TextureSpec};
use crate::tint_cache::TextureUploader;
use crate::types::FrameBuffer;

/* ---------- textures ---------- */

/// A texture living in main memory. Cloning shares the pixels.
#[derive(Clone, Debug)]
pub struct SoftTexture {
    pub id: u64,
    pub spec: TextureSpec,
    pub image: Rc<PixelBuffer>,
}

/// Hands out `SoftTexture`s and counts how many are alive.
#[derive(Default)]
pub struct SoftwareUploader {
    next_id: u64,
    live: usize,
}

impl SoftwareUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploaded and not yet released.
    pub fn live_textures(&self) -> usize {
        self.live
    }
}

impl TextureUploader for SoftwareUploader {
    type Handle = SoftTexture;

    fn upload(&mut self, image: &PixelBuffer, spec: TextureSpec, label: &str) -> Result<SoftTexture> {
        if spec != image.spec() {
            return Err(Error::Upload(format!(
                "{label}: declared {}x{} but image is {}x{}",
                spec.width,
                spec.height,
                image.width(),
                image.height()
            )));
        }
        let id = self.next_id;
        self.next_id += 1;
        self.live += 1;
        log::trace!("upload #{id} {label} ({}x{} {:?})", spec.width, spec.height, spec.format);
        Ok(SoftTexture {
            id,
            spec,
            image: Rc::new(image.clone()),
        })
    }

    fn release(&mut self, handle: SoftTexture) {
        self.live = self.live.saturating_sub(1);
        log::trace!("release #{}", handle.id);
    }
}

/// Draws quads straight into a frame, in submission order.
pub struct FrameCanvas<'a> {
    frame: &'a mut FrameBuffer,
}

impl<'a> FrameCanvas<'a> {
    pub fn new(frame: &'a mut FrameBuffer) -> Self {
        Self { frame }
    }
}

impl QuadSink<SoftTexture> for FrameCanvas<'_> {
    fn add_image_quad(&mut self, quad: ImageQuad<'_, SoftTexture>) {
        draw_textured_quad(self.frame, &quad.texture.image, &quad.corners(), quad.color);
    }
}

/* ---------- pixels ---------- */

/// Put a pixel on the framebuffer if (x,y) is inside bounds.
/// Visual: the exact pixel at (x,y) changes color.
#[inline]
fn put_pixel(fb: &mut FrameBuffer, x: i32, y: i32, color: u32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }
    let idx = y * fb.width + x;
    fb.pixels[idx] = color;
}

/// Straight-alpha `src over dst` for one channel.
#[inline]
fn blend_channel(src: u8, dst: u8, alpha: u8) -> u32 {
    let (s, d, a) = (u32::from(src), u32::from(dst), u32::from(alpha));
    (s * a + d * (255 - a) + 127) / 255
}

/// Blend an RGBA pixel over the 0x00RRGGBB pixel at (x,y).
#[inline]
fn blend_pixel(fb: &mut FrameBuffer, x: usize, y: usize, [r, g, b, a]: [u8; 4]) {
    if a == 0 {
        return;
    }
    let idx = y * fb.width + x;
    let old = fb.pixels[idx];
    let nr = blend_channel(r, (old >> 16) as u8, a);
    let ng = blend_channel(g, (old >> 8) as u8, a);
    let nb = blend_channel(b, old as u8, a);
    fb.pixels[idx] = (nr << 16) | (ng << 8) | nb;
}

/// Multiply an RGBA texel by a 0xAABBGGRR color.
#[inline]
fn modulate(texel: [u8; 4], color: u32) -> [u8; 4] {
    if color == u32::MAX {
        return texel;
    }
    let c = color.to_le_bytes();
    std::array::from_fn(|i| ((u32::from(texel[i]) * u32::from(c[i]) + 127) / 255) as u8)
}

/// Map `image` onto the parallelogram spanned by `corners`
/// (top-left, top-right, bottom-right, bottom-left), nearest sampling.
/// Visual: the sprite appears rotated and scaled on top of the frame.
pub fn draw_textured_quad(fb: &mut FrameBuffer, image: &PixelBuffer, corners: &[Vector2<f32>; 4], color: u32) {
    if image.is_empty() || fb.width == 0 || fb.height == 0 {
        return;
    }
    let [top_left, top_right, _, bottom_left] = *corners;
    let ex = top_right - top_left;
    let ey = bottom_left - top_left;
    let det = ex.x * ey.y - ex.y * ey.x;
    if det.abs() < 1e-6 {
        return;
    }

    // Screen bounding box, clipped to the frame.
    let (mut min, mut max) = (corners[0], corners[0]);
    for c in &corners[1..] {
        min = Vector2::new(min.x.min(c.x), min.y.min(c.y));
        max = Vector2::new(max.x.max(c.x), max.y.max(c.y));
    }
    let x0 = min.x.floor().max(0.0) as usize;
    let y0 = min.y.floor().max(0.0) as usize;
    let x1 = (max.x.ceil().max(0.0) as usize).min(fb.width);
    let y1 = (max.y.ceil().max(0.0) as usize).min(fb.height);

    let (w, h) = (image.width(), image.height());
    for y in y0..y1 {
        for x in x0..x1 {
            // Solve p = s*ex + t*ey for the pixel center.
            let p = Vector2::new(x as f32 + 0.5, y as f32 + 0.5) - top_left;
            let s = (p.x * ey.y - p.y * ey.x) / det;
            let t = (ex.x * p.y - ex.y * p.x) / det;
            if !(0.0..1.0).contains(&s) || !(0.0..1.0).contains(&t) {
                continue;
            }
            let tx = ((s * w as f32) as u32).min(w - 1);
            let ty = ((t * h as f32) as u32).min(h - 1);
            if let Some(texel) = image.pixel(tx, ty) {
                blend_pixel(fb, x, y, modulate(texel, color));
            }
        }
    }
}

/// Draw a thin line between (x0,y0) and (x1,y1) using Bresenham.
/// Visual: a straight 1-pixel line appears on top of the scene.
fn draw_line(fb: &mut FrameBuffer, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
    let (mut x0, mut y0) = (x0, y0);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        put_pixel(fb, x0, y0, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Draw a small crosshair centered at (cx,cy).
/// Visual: a "+" with a tiny gap marks an on-screen target.
pub fn draw_crosshair(fb: &mut FrameBuffer, cx: i32, cy: i32, size: i32, color: u32) {
    draw_line(fb, cx - size, cy, cx - 2, cy, color);
    draw_line(fb, cx + 2, cy, cx + size, cy, color);
    draw_line(fb, cx, cy - size, cx, cy - 2, color);
    draw_line(fb, cx, cy + 2, cx, cy + size, color);
    put_pixel(fb, cx, cy, color);
}

/* ---------- 5x7 bitmap font ---------- */

/// Return a 5x7 glyph bitmap. Each u8 is a row; bit 4 is the leftmost pixel.
/// Lowercase letters draw as uppercase.
fn glyph5x7(ch: char) -> Option<[u8; 7]> {
    macro_rules! g { ($a:expr,$b:expr,$c:expr,$d:expr,$e:expr,$f:expr,$g:expr) => {
        Some([$a,$b,$c,$d,$e,$f,$g])
    }; }

    match ch.to_ascii_uppercase() {
        '0' => g!(0b01110,0b10001,0b10011,0b10101,0b11001,0b10001,0b01110),
        '1' => g!(0b00100,0b01100,0b00100,0b00100,0b00100,0b00100,0b01110),
        '2' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b01000,0b11111),
        '3' => g!(0b11110,0b00001,0b00001,0b01110,0b00001,0b00001,0b11110),
        '4' => g!(0b00010,0b00110,0b01010,0b10010,0b11111,0b00010,0b00010),
        '5' => g!(0b11111,0b10000,0b11110,0b00001,0b00001,0b10001,0b01110),
        '6' => g!(0b00110,0b01000,0b10000,0b11110,0b10001,0b10001,0b01110),
        '7' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b01000,0b01000),
        '8' => g!(0b01110,0b10001,0b10001,0b01110,0b10001,0b10001,0b01110),
        '9' => g!(0b01110,0b10001,0b10001,0b01111,0b00001,0b00010,0b01100),

        'A' => g!(0b01110,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'B' => g!(0b11110,0b10001,0b10001,0b11110,0b10001,0b10001,0b11110),
        'C' => g!(0b01110,0b10001,0b10000,0b10000,0b10000,0b10001,0b01110),
        'D' => g!(0b11100,0b10010,0b10001,0b10001,0b10001,0b10010,0b11100),
        'E' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b11111),
        'F' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b10000),
        'G' => g!(0b01110,0b10001,0b10000,0b10111,0b10001,0b10001,0b01111),
        'H' => g!(0b10001,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'I' => g!(0b01110,0b00100,0b00100,0b00100,0b00100,0b00100,0b01110),
        'K' => g!(0b10001,0b10010,0b10100,0b11000,0b10100,0b10010,0b10001),
        'L' => g!(0b10000,0b10000,0b10000,0b10000,0b10000,0b10000,0b11111),
        'M' => g!(0b10001,0b11011,0b10101,0b10101,0b10001,0b10001,0b10001),
        'N' => g!(0b10001,0b10001,0b11001,0b10101,0b10011,0b10001,0b10001),
        'O' => g!(0b01110,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'P' => g!(0b11110,0b10001,0b10001,0b11110,0b10000,0b10000,0b10000),
        'R' => g!(0b11110,0b10001,0b10001,0b11110,0b10100,0b10010,0b10001),
        'S' => g!(0b01111,0b10000,0b10000,0b01110,0b00001,0b00001,0b11110),
        'T' => g!(0b11111,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        'U' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'V' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b01010,0b00100),
        'W' => g!(0b10001,0b10001,0b10001,0b10101,0b10101,0b10101,0b01010),
        'X' => g!(0b10001,0b10001,0b01010,0b00100,0b01010,0b10001,0b10001),
        'Y' => g!(0b10001,0b10001,0b01010,0b00100,0b00100,0b00100,0b00100),

        ' ' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b00000),
        '|' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        ':' => g!(0b00000,0b00100,0b00000,0b00000,0b00100,0b00000,0b00000),
        '.' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00100,0b00000),
        '-' => g!(0b00000,0b00000,0b00000,0b11111,0b00000,0b00000,0b00000),
        '/' => g!(0b00001,0b00010,0b00010,0b00100,0b01000,0b01000,0b10000),

        _ => None,
    }
}

/// Draw a single 5x7 character at (x,y).
/// Visual: a tiny glyph with a 1-pixel black shadow for contrast.
fn draw_char_5x7(fb: &mut FrameBuffer, x: i32, y: i32, ch: char, color: u32) {
    let Some(rows) = glyph5x7(ch) else {
        return;
    };
    for (offset, shade) in [(1, 0x0000_0000), (0, color)] {
        for (ry, rowbits) in rows.iter().enumerate() {
            for rx in 0..5 {
                if (rowbits & (1 << (4 - rx))) != 0 {
                    put_pixel(fb, x + rx + offset, y + ry as i32 + offset, shade);
                }
            }
        }
    }
}

/// Draw a text string using 5x7 glyphs, 1 pixel apart.
pub fn draw_text_5x7(fb: &mut FrameBuffer, mut x: i32, y: i32, text: &str, color: u32) {
    for ch in text.chars() {
        draw_char_5x7(fb, x, y, ch, color);
        x += 6;
    }
}
