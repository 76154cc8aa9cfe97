use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Perspective projection parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Projection {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            near: 1.0,
            far: 100.0,
        }
    }
}

impl Projection {
    /// Projection for a surface of the given size. A zero height is treated
    /// as one pixel.
    pub fn matrix(&self, width: u32, height: u32) -> Mat4 {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        Mat4::perspective_rh(self.fov_degrees.to_radians(), aspect, self.near, self.far)
    }

    /// Field of view strictly inside `(0, 180)` and `0 < near < far`.
    pub fn check(&self) -> Result<(), String> {
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(format!(
                "fov_degrees must be in (0, 180), got {}",
                self.fov_degrees
            ));
        }
        if !(self.near > 0.0 && self.near.is_finite()) {
            return Err(format!("near must be positive, got {}", self.near));
        }
        if !(self.far > self.near && self.far.is_finite()) {
            return Err(format!(
                "far must exceed near ({}), got {}",
                self.near, self.far
            ));
        }
        Ok(())
    }
}

/// Camera that orbits the scene origin under drag input.
///
/// Rotation angles are in degrees. The vertical angle is clamped to
/// `[-90, 90]`; the horizontal angle is free.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    x_rotation: f32,
    y_rotation: f32,
    eye_offset: Vec3,
    drag_sensitivity: f32,
    view: Mat4,
    rotation_only: Mat4,
}

impl OrbitCamera {
    pub const Y_LIMIT: f32 = 90.0;

    pub fn new(eye_offset: Vec3, drag_sensitivity: f32) -> Self {
        let mut camera = Self {
            x_rotation: 0.0,
            y_rotation: 0.0,
            eye_offset,
            drag_sensitivity,
            view: Mat4::IDENTITY,
            rotation_only: Mat4::IDENTITY,
        };
        camera.update_view();
        camera
    }

    pub fn x_rotation(&self) -> f32 {
        self.x_rotation
    }

    pub fn y_rotation(&self) -> f32 {
        self.y_rotation
    }

    /// Apply a drag delta in pixels and recompute the view. A delta that
    /// would not give a finite rotation is dropped.
    pub fn handle_drag(&mut self, dx: f32, dy: f32) {
        let (step_x, step_y) = (dx / self.drag_sensitivity, dy / self.drag_sensitivity);
        if !(step_x.is_finite() && step_y.is_finite()) {
            tracing::warn!(dx, dy, sensitivity = self.drag_sensitivity, "drag ignored");
            return;
        }
        self.x_rotation += step_x;
        self.y_rotation = (self.y_rotation + step_y).clamp(-Self::Y_LIMIT, Self::Y_LIMIT);
        self.update_view();
    }

    pub fn update_view(&mut self) {
        self.rotation_only = Mat4::from_rotation_x((-self.y_rotation).to_radians())
            * Mat4::from_rotation_y((-self.x_rotation).to_radians());
        self.view = self.rotation_only * Mat4::from_translation(self.eye_offset);
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    /// The view without its translation, so far-away geometry like a skybox
    /// stays centred on the eye.
    pub fn rotation_only(&self) -> Mat4 {
        self.rotation_only
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OFFSET: Vec3 = Vec3::new(0.0, -1.5, -5.0);

    fn expected_view(x: f32, y: f32) -> Mat4 {
        Mat4::from_rotation_x((-y).to_radians())
            * Mat4::from_rotation_y((-x).to_radians())
            * Mat4::from_translation(OFFSET)
    }

    #[test]
    fn initial_view_is_just_the_offset() {
        let cam = OrbitCamera::new(OFFSET, 50.0);
        assert!(cam.view().abs_diff_eq(Mat4::from_translation(OFFSET), 1e-6));
        assert_eq!(cam.rotation_only(), Mat4::IDENTITY);
    }

    #[test]
    fn view_composes_rotations_then_offset() {
        let mut cam = OrbitCamera::new(OFFSET, 1.0);
        for (dx, dy) in [(30.0, 10.0), (-75.0, 20.0), (400.0, -35.0)] {
            cam.handle_drag(dx, dy);
            let want = expected_view(cam.x_rotation(), cam.y_rotation());
            assert!(cam.view().abs_diff_eq(want, 1e-5));
        }
    }

    #[test]
    fn rotation_only_drops_translation() {
        let mut cam = OrbitCamera::new(OFFSET, 1.0);
        cam.handle_drag(20.0, 15.0);
        let r = cam.rotation_only();
        assert!(r.w_axis.abs_diff_eq(glam::Vec4::W, 1e-6));
        assert!(
            (r * Mat4::from_translation(OFFSET)).abs_diff_eq(cam.view(), 1e-6)
        );
    }

    #[test]
    fn vertical_rotation_is_clamped() {
        let mut cam = OrbitCamera::new(OFFSET, 50.0);
        for _ in 0..100 {
            cam.handle_drag(0.0, 500.0);
            assert!(cam.y_rotation() <= 90.0);
        }
        assert_eq!(cam.y_rotation(), 90.0);
        for _ in 0..100 {
            cam.handle_drag(0.0, -731.0);
            assert!(cam.y_rotation() >= -90.0);
        }
        assert_eq!(cam.y_rotation(), -90.0);
    }

    #[test]
    fn horizontal_rotation_is_not_clamped() {
        let mut cam = OrbitCamera::new(OFFSET, 50.0);
        for _ in 0..10 {
            cam.handle_drag(5000.0, 0.0);
        }
        assert_eq!(cam.x_rotation(), 1000.0);
    }

    #[test]
    fn drag_is_scaled_by_sensitivity() {
        let mut cam = OrbitCamera::new(OFFSET, 50.0);
        cam.handle_drag(100.0, -25.0);
        assert_eq!(cam.x_rotation(), 2.0);
        assert_eq!(cam.y_rotation(), -0.5);
    }

    #[test]
    fn projection_uses_aspect_and_planes() {
        let p = Projection::default();
        let want = Mat4::perspective_rh(45f32.to_radians(), 1.6, 1.0, 100.0);
        assert!(p.matrix(1600, 1000).abs_diff_eq(want, 1e-6));
    }

    #[test]
    fn degenerate_sensitivity_leaves_the_view_finite() {
        for sensitivity in [0.0, f32::NAN, -0.0] {
            let mut cam = OrbitCamera::new(OFFSET, sensitivity);
            cam.handle_drag(10.0, 10.0);
            cam.handle_drag(0.0, 0.0);
            assert!((-90.0..=90.0).contains(&cam.y_rotation()));
            assert!(cam.x_rotation().is_finite());
            assert!(cam.view().is_finite());
        }
    }

    #[test]
    fn projection_check_rejects_bad_planes_and_fov() {
        assert!(Projection::default().check().is_ok());
        let bad = [
            Projection { fov_degrees: 0.0, ..Projection::default() },
            Projection { fov_degrees: 180.0, ..Projection::default() },
            Projection { fov_degrees: f32::NAN, ..Projection::default() },
            Projection { near: 0.0, ..Projection::default() },
            Projection { near: -1.0, ..Projection::default() },
            Projection { near: 5.0, far: 5.0, ..Projection::default() },
            Projection { far: f32::INFINITY, ..Projection::default() },
        ];
        for p in bad {
            assert!(p.check().is_err(), "{p:?} accepted");
        }
    }

    #[test]
    fn projection_survives_zero_height() {
        let m = Projection::default().matrix(640, 0);
        assert!(m.is_finite());
    }
}
