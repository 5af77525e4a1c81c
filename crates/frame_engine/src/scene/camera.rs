//! # First-Person Camera
//!
//! A free-flying camera described by a position and an orthonormal basis
//! (right, up, look). View and projection follow the left-handed Direct3D
//! convention with depth in `[0, 1]`.
//!
//! ## Design Principles
//! - **Matrix on demand**: the view matrix is rebuilt from the basis when
//!   asked for, so movement methods only touch vectors
//! - **Pass constants**: [`Camera::pass_constants`] is the single bridge from
//!   camera and timer state to the per-pass constant buffer

use crate::foundation::math::{Mat4, Mat4Ext, Unit, Vec3};
use crate::foundation::time::Timer;
use crate::render::constants::PassConstants;

/// First-person camera with a perspective lens
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    right: Vec3,
    up: Vec3,
    look: Vec3,
    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,
}

impl Camera {
    /// Create a camera at `position` looking down +Z
    ///
    /// # Arguments
    /// * `position` - Camera position in world space
    /// * `fov_y` - Vertical field of view in radians
    /// * `aspect` - Viewport width / height
    /// * `near` - Distance to the near plane (must be > 0)
    /// * `far` - Distance to the far plane (must be > near)
    pub fn new(position: Vec3, fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            right: Vec3::x(),
            up: Vec3::y(),
            look: Vec3::z(),
            fov_y,
            aspect,
            near,
            far,
        }
    }

    /// Change the projection
    pub fn set_lens(&mut self, fov_y: f32, aspect: f32, near: f32, far: f32) {
        self.fov_y = fov_y;
        self.aspect = aspect;
        self.near = near;
        self.far = far;
    }

    /// Move the camera without changing its orientation
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        log::trace!("Camera position updated to: {:?}", position);
    }

    /// Turn the camera to face `target`, keeping world up as the reference
    pub fn look_at(&mut self, target: Vec3) {
        let look = (target - self.position).normalize();
        let right = Vec3::y().cross(&look).normalize();
        self.look = look;
        self.right = right;
        self.up = look.cross(&right);
    }

    /// Move along the look vector
    pub fn walk(&mut self, distance: f32) {
        self.position += self.look * distance;
    }

    /// Move along the right vector
    pub fn strafe(&mut self, distance: f32) {
        self.position += self.right * distance;
    }

    /// Move along world up
    pub fn pedestal(&mut self, distance: f32) {
        self.position.y += distance;
    }

    /// Rotate up and look around the right vector
    pub fn pitch(&mut self, angle: f32) {
        let rotation = Mat4::from_axis_angle(&Unit::new_normalize(self.right), angle);
        self.up = rotation.transform_vector(&self.up);
        self.look = rotation.transform_vector(&self.look);
    }

    /// Rotate the whole basis around world up
    pub fn rotate_y(&mut self, angle: f32) {
        let rotation = Mat4::rotation_y(angle);
        self.right = rotation.transform_vector(&self.right);
        self.up = rotation.transform_vector(&self.up);
        self.look = rotation.transform_vector(&self.look);
    }

    /// Camera position in world space
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Unit look direction
    pub fn look(&self) -> Vec3 {
        self.look
    }

    /// Unit right direction
    pub fn right(&self) -> Vec3 {
        self.right
    }

    /// World-to-view transform
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::view_lh(self.position, self.position + self.look, self.up)
    }

    /// View-to-clip transform
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_lh(self.fov_y, self.aspect, self.near, self.far)
    }

    /// Camera and timing part of the per-pass constants. Lights and the
    /// ambient term are left to the caller.
    pub fn pass_constants(&self, viewport: (u32, u32), timer: &Timer) -> PassConstants {
        PassConstants::from_camera(
            &self.view_matrix(),
            &self.projection_matrix(),
            self.position,
            viewport,
            self.near,
            self.far,
        )
        .with_time(timer.total_time(), timer.delta_time())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::constants::QUARTER_PI;
    use approx::assert_relative_eq;
    use std::time::Duration;

    fn camera() -> Camera {
        Camera::new(Vec3::new(0.0, 30.0, -155.0), QUARTER_PI, 4.0 / 3.0, 1.0, 1000.0)
    }

    #[test]
    fn test_walk_and_strafe_follow_basis() {
        let mut camera = camera();
        camera.walk(5.0);
        camera.strafe(-2.0);
        camera.pedestal(1.0);

        assert_relative_eq!(camera.position(), Vec3::new(-2.0, 31.0, -150.0), epsilon = 1e-5);
    }

    #[test]
    fn test_rotations_keep_basis_orthonormal() {
        let mut camera = camera();
        camera.rotate_y(0.3);
        camera.pitch(-0.2);

        assert_relative_eq!(camera.look.norm(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(camera.look.dot(&camera.up), 0.0, epsilon = 1e-5);
        assert_relative_eq!(camera.look.dot(&camera.right), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_view_places_look_target_on_positive_z() {
        let mut camera = camera();
        camera.look_at(Vec3::zeros());

        let target = camera.view_matrix().transform_point(&crate::foundation::math::Point3::origin());
        assert_relative_eq!(target.x, 0.0, epsilon = 1e-3);
        assert_relative_eq!(target.y, 0.0, epsilon = 1e-3);
        assert!(target.z > 0.0);
    }

    #[test]
    fn test_pass_constants_carry_camera_and_time() {
        let mut timer = Timer::new();
        timer.tick(Duration::from_millis(250));
        let pass = camera().pass_constants((800, 600), &timer);

        assert_eq!(pass.eye_position, [0.0, 30.0, -155.0]);
        assert_eq!(pass.near_z, 1.0);
        assert_eq!(pass.far_z, 1000.0);
        assert_relative_eq!(pass.delta_time, 0.25);
        assert_relative_eq!(pass.total_time, 0.25);
    }
}
