// Which way should the indicator point?
//
// Two estimates are blended. Projecting the target to the screen is accurate
// while the target is roughly in front of the camera but falls apart once it
// moves behind. The camera-relative yaw/pitch angle stays stable all the way
// around. The target's forward depth in view space picks the mix.

use cgmath::{InnerSpace, Matrix4, Vector2, Vector3, VectorSpace, Zero};
use std::f32::consts::{PI, TAU};

use crate::error::{Error, Result};
use crate::target::TargetSnapshot;

/// Screen rectangle in pixels, y down.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub position: Vector2<f32>,
    pub size: Vector2<f32>,
}

impl Viewport {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            position: Vector2::new(x, y),
            size: Vector2::new(width, height),
        }
    }

    pub fn half_size(&self) -> Vector2<f32> {
        self.size * 0.5
    }

    pub fn center(&self) -> Vector2<f32> {
        self.position + self.half_size()
    }
}

/// Result of a world-to-screen projection. `screen` is filled in even when the
/// point is outside the viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenProjection {
    pub in_view: bool,
    pub screen: Vector2<f32>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraState {
    pub position: Vector3<f32>,
    pub look_at: Vector3<f32>,
    /// World -> view transform. The camera looks down -Z in view space.
    pub view: Matrix4<f32>,
}

/// World, camera and viewport as the host sees them this frame.
pub trait WorldView {
    /// `None` if the host can't project the point at all.
    fn world_to_screen(&self, world: Vector3<f32>) -> Option<ScreenProjection>;
    fn active_camera(&self) -> Option<CameraState>;
    fn viewport(&self) -> Viewport;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Direction {
    /// The target is visible; the game's own marker is enough.
    NoIndicator,
    /// Unit vector from the viewport center toward the target, y down.
    Toward(Vector2<f32>),
}

#[inline]
pub fn saturate(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

#[inline]
pub fn smoothstep(x: f32) -> f32 {
    x * x * (3.0 - 2.0 * x)
}

/// Into (-PI, PI]. Inputs are differences of two `atan2` results.
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    if angle > PI {
        angle - TAU
    } else if angle <= -PI {
        angle + TAU
    } else {
        angle
    }
}

fn normalize_or_zero<V: InnerSpace<Scalar = f32> + Zero>(v: V) -> V {
    if v.magnitude2() > f32::EPSILON * f32::EPSILON {
        v.normalize()
    } else {
        V::zero()
    }
}

/// 0 = all screen-space, 1 = all angular.
pub fn blend_weight(view_z: f32) -> f32 {
    smoothstep(saturate(view_z * 0.5 + 0.5))
}

pub fn blend(screen: Vector2<f32>, angular: Vector2<f32>, mix: f32) -> Vector2<f32> {
    screen.lerp(angular, mix)
}

/// Projected point relative to the viewport center, normalized.
pub fn screen_space_estimate(projected: Vector2<f32>, viewport: &Viewport) -> Vector2<f32> {
    normalize_or_zero(projected - viewport.center())
}

/// `(yaw, -pitch)` difference between where the camera looks and where the
/// target is, normalized.
pub fn angular_estimate(camera: &CameraState, point: Vector3<f32>) -> Vector2<f32> {
    let look = normalize_or_zero(camera.look_at - camera.position);
    let toward = normalize_or_zero(point - camera.position);

    let yaw = wrap_angle(toward.x.atan2(-toward.z) - look.x.atan2(-look.z));
    let roll = toward.y.clamp(-1.0, 1.0).asin() - look.y.clamp(-1.0, 1.0).asin();

    normalize_or_zero(Vector2::new(yaw, -roll))
}

/// Forward component of the normalized view-space direction to `point`.
/// Positive is behind the camera.
pub fn view_space_z(camera: &CameraState, point: Vector3<f32>) -> f32 {
    let view = camera.view * point.extend(1.0);
    normalize_or_zero(view.truncate()).z
}

/// Decide whether `target` needs an indicator and which way it points.
///
/// Errors are per-target and per-frame: the caller skips this target and
/// carries on.
pub fn estimate<W: WorldView + ?Sized>(world: &W, target: &TargetSnapshot<'_>) -> Result<Direction> {
    let entity = target.entity;
    let unresolved = || Error::TargetUnresolved(entity.id.0);

    let nameplate = entity.nameplate.ok_or_else(unresolved)?;
    let projected = world.world_to_screen(nameplate).ok_or_else(unresolved)?;
    if projected.in_view {
        return Ok(Direction::NoIndicator);
    }

    // The primary target's body may still be on screen with its nameplate off it.
    if target.is_same_as_primary
        && entity.is_character
        && world.world_to_screen(entity.position).is_some_and(|p| p.in_view)
    {
        return Ok(Direction::NoIndicator);
    }

    let camera = world.active_camera().ok_or(Error::CameraUnavailable)?;
    let screen = screen_space_estimate(projected.screen, &world.viewport());
    let angular = angular_estimate(&camera, nameplate);
    let mix = blend_weight(view_space_z(&camera, nameplate));

    // Opposite estimates at an even mix cancel out; nothing sensible to draw.
    let direction = normalize_or_zero(blend(screen, angular, mix));
    if direction.is_zero() {
        return Ok(Direction::NoIndicator);
    }
    Ok(Direction::Toward(direction))
}
