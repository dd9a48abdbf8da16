// Direction -> a point on the padded viewport edge -> two textured quads.

use cgmath::{InnerSpace, Vector2};

use crate::atlas::AtlasPart;
use crate::config::IndicatorConfig;
use crate::error::Result;
use crate::projection::Viewport;
use crate::target::TargetColors;
use crate::tint_cache::{TextureUploader, TintCache, TintedTexture};

/// Per-quad color multiplier that leaves the texture as is.
pub const WHITE: u32 = 0xFFFF_FFFF;

/// A textured quad for the background draw list. Corners go clockwise from
/// the top-left of the texture.
#[derive(Debug)]
pub struct ImageQuad<'a, H> {
    pub texture: &'a H,
    pub top_left: Vector2<f32>,
    pub top_right: Vector2<f32>,
    pub bottom_right: Vector2<f32>,
    pub bottom_left: Vector2<f32>,
    pub color: u32,
}

impl<H> ImageQuad<'_, H> {
    pub fn corners(&self) -> [Vector2<f32>; 4] {
        [self.top_left, self.top_right, self.bottom_right, self.bottom_left]
    }
}

/// Consumes quads in submission order; later quads draw on top.
pub trait QuadSink<H> {
    fn add_image_quad(&mut self, quad: ImageQuad<'_, H>);
}

/// Where the cursor sits and how it is oriented.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgePlacement {
    /// Absolute screen position of the cursor's base, on the padded edge.
    pub position: Vector2<f32>,
    /// Across the cursor, `width` long.
    pub x_axis: Vector2<f32>,
    /// Toward the target, `width` long.
    pub y_axis: Vector2<f32>,
}

/// Half the viewport minus `padding`, never below one pixel.
pub fn usable_half_extent(viewport: &Viewport, padding: f32) -> Vector2<f32> {
    let half = viewport.half_size() - Vector2::new(padding, padding);
    Vector2::new(half.x.max(1.0), half.y.max(1.0))
}

/// Scale `direction` along its ray until it touches the rectangle
/// `[-half_extent, half_extent]`. `None` for a zero direction.
pub fn clamp_to_edge(direction: Vector2<f32>, half_extent: Vector2<f32>) -> Option<Vector2<f32>> {
    let ratio = (direction.x.abs() / half_extent.x).max(direction.y.abs() / half_extent.y);
    if !(ratio.is_finite() && ratio > 0.0) {
        return None;
    }
    Some(direction / ratio)
}

impl EdgePlacement {
    pub fn new(direction: Vector2<f32>, viewport: &Viewport, padding: f32, width: f32) -> Option<Self> {
        let edge = clamp_to_edge(direction, usable_half_extent(viewport, padding))?;
        let y_axis = edge.normalize() * width;
        Some(Self {
            position: viewport.center() + edge,
            x_axis: Vector2::new(y_axis.y, -y_axis.x),
            y_axis,
        })
    }

    /// The cursor's base straddles `position`; the sprite extends back toward
    /// the screen center by `width * height / width` of the texture, so it
    /// keeps its own proportions.
    pub fn quad<'a, H>(&self, texture: &'a TintedTexture<H>) -> ImageQuad<'a, H> {
        let bottom_left = self.position - self.x_axis * 0.5;
        let bottom_right = self.position + self.x_axis * 0.5;
        let depth = self.y_axis * texture.aspect();
        ImageQuad {
            texture: &texture.handle,
            top_left: bottom_left - depth,
            top_right: bottom_right - depth,
            bottom_right,
            bottom_left,
            color: WHITE,
        }
    }
}

/// Lay out one target's cursor and submit outline, then fill.
///
/// Returns whether anything was drawn.
pub fn build_and_submit<U, S>(
    cache: &mut TintCache<U>,
    sink: &mut S,
    direction: Vector2<f32>,
    viewport: &Viewport,
    config: &IndicatorConfig,
    colors: TargetColors,
    is_focus: bool,
) -> Result<bool>
where
    U: TextureUploader,
    S: QuadSink<U::Handle> + ?Sized,
{
    let Some(placement) = EdgePlacement::new(direction, viewport, config.padding, config.width) else {
        return Ok(false);
    };

    let outline = cache.get_tinted_part(AtlasPart::edge(is_focus), colors.outline())?;
    sink.add_image_quad(placement.quad(outline));

    let fill = cache.get_tinted_part(AtlasPart::fill(is_focus), colors.fill())?;
    sink.add_image_quad(placement.quad(fill));

    Ok(true)
}
