// A plain perspective camera that answers the `WorldView` questions.
// The demo orbits it around the scene; tests use it as a realistic host.

use cgmath::{perspective, EuclideanSpace, InnerSpace, Matrix4, Point3, Rad, Vector2, Vector3};

use crate::projection::{CameraState, ScreenProjection, Viewport, WorldView};

pub struct PerspectiveView {
    pub eye: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov_y: Rad<f32>,
    pub near: f32,
    pub far: f32,
    pub viewport: Viewport,
}

impl PerspectiveView {
    /// 60 degree vertical FOV, looking from `eye` at `target`.
    pub fn new(eye: Point3<f32>, target: Point3<f32>, viewport: Viewport) -> Self {
        Self {
            eye,
            target,
            up: Vector3::unit_y(),
            fov_y: Rad(std::f32::consts::FRAC_PI_3),
            near: 0.1,
            far: 1000.0,
            viewport,
        }
    }

    /// Place the eye on a sphere around `target`. Yaw 0 looks down -Z;
    /// positive pitch raises the eye and looks down at the target. Pitch is
    /// clamped short of straight up/down so `up` stays usable.
    pub fn orbit(&mut self, yaw: f32, pitch: f32, distance: f32) {
        let pitch = pitch.clamp(-1.5, 1.5);
        let offset = Vector3::new(
            -yaw.sin() * pitch.cos(),
            pitch.sin(),
            yaw.cos() * pitch.cos(),
        ) * distance;
        self.eye = self.target + offset;
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        let aspect = self.viewport.size.x / self.viewport.size.y.max(1.0);
        perspective(self.fov_y, aspect, self.near, self.far)
    }

    pub fn forward(&self) -> Vector3<f32> {
        (self.target - self.eye).normalize()
    }
}

impl WorldView for PerspectiveView {
    fn world_to_screen(&self, world: Vector3<f32>) -> Option<ScreenProjection> {
        let clip = self.projection_matrix() * self.view_matrix() * world.extend(1.0);
        if clip.w.abs() <= f32::EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;

        // Behind the camera the divide mirrors the point; it's still reported
        // (out of view) so callers get a coordinate either way.
        let in_view = clip.w > 0.0
            && (-1.0..=1.0).contains(&ndc.x)
            && (-1.0..=1.0).contains(&ndc.y)
            && (-1.0..=1.0).contains(&ndc.z);

        let vp = &self.viewport;
        let screen = Vector2::new(
            vp.position.x + (ndc.x + 1.0) * 0.5 * vp.size.x,
            vp.position.y + (1.0 - ndc.y) * 0.5 * vp.size.y,
        );
        Some(ScreenProjection { in_view, screen })
    }

    fn active_camera(&self) -> Option<CameraState> {
        Some(CameraState {
            position: self.eye.to_vec(),
            look_at: self.target.to_vec(),
            view: self.view_matrix(),
        })
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> PerspectiveView {
        PerspectiveView::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, -1.0),
            Viewport::new(0.0, 0.0, 800.0, 600.0),
        )
    }

    #[test]
    fn point_ahead_projects_to_center() {
        let p = view().world_to_screen(Vector3::new(0.0, 0.0, -10.0)).unwrap();
        assert!(p.in_view);
        assert!((p.screen - Vector2::new(400.0, 300.0)).magnitude() < 1e-3);
    }

    #[test]
    fn point_far_right_is_out_of_view_on_the_right() {
        let p = view().world_to_screen(Vector3::new(50.0, 0.0, -10.0)).unwrap();
        assert!(!p.in_view);
        assert!(p.screen.x > 800.0);
        assert!((p.screen.y - 300.0).abs() < 1e-3);
    }

    #[test]
    fn point_above_has_smaller_y() {
        let p = view().world_to_screen(Vector3::new(0.0, 1.0, -10.0)).unwrap();
        assert!(p.in_view);
        assert!(p.screen.y < 300.0);
    }

    #[test]
    fn point_behind_is_out_of_view() {
        let p = view().world_to_screen(Vector3::new(0.0, 0.0, 10.0)).unwrap();
        assert!(!p.in_view);
    }

    #[test]
    fn orbit_keeps_distance_and_faces_target() {
        let mut v = view();
        v.target = Point3::new(1.0, 2.0, 3.0);
        v.orbit(0.7, 0.3, 12.0);
        assert!(((v.eye - v.target).magnitude() - 12.0).abs() < 1e-3);
        let camera = v.active_camera().unwrap();
        assert_eq!(camera.look_at, Vector3::new(1.0, 2.0, 3.0));

        // Yaw 0, pitch 0: eye sits on +Z, looking down -Z.
        v.orbit(0.0, 0.0, 5.0);
        assert!((v.forward() - Vector3::new(0.0, 0.0, -1.0)).magnitude() < 1e-5);
    }

    #[test]
    fn positive_pitch_looks_down_from_above() {
        let mut v = view();
        v.target = Point3::new(0.0, 1.0, 0.0);
        v.orbit(0.0, 0.35, 12.0);
        assert!((v.eye.y - (1.0 + 12.0 * 0.35f32.sin())).abs() < 1e-4);
        assert!(v.eye.z > 0.0);
        assert!(v.forward().y < 0.0);

        // More pitch, higher eye.
        let low = v.eye.y;
        v.orbit(0.0, 0.8, 12.0);
        assert!(v.eye.y > low);

        // A point on the ground in front of the target lands below screen center.
        v.orbit(0.0, 0.35, 12.0);
        let p = v.world_to_screen(Vector3::new(0.0, 0.0, 4.0)).unwrap();
        assert!(p.in_view);
        assert!(p.screen.y > 300.0);
    }
}
