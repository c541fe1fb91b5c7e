use glam::{Mat4, Vec3, Vec4};

use crate::math::Ray;

/// Perspective camera looking at a target point.
///
/// Uses an OpenGL-style clip space (z in [-1, 1]) so unprojection matches
/// the usual normalized device coordinates of pointer picking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees
    pub fov_y_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
}

impl PerspectiveCamera {
    pub fn new(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov_y_degrees,
            aspect,
            near,
            far,
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Ignores non-positive or non-finite aspects so a minimized window
    /// cannot poison the projection.
    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    /// Maps a normalized device coordinate back to world space
    pub fn unproject(&self, ndc: Vec3) -> Vec3 {
        let inverse = (self.projection_matrix() * self.view_matrix()).inverse();
        let world = inverse * Vec4::new(ndc.x, ndc.y, ndc.z, 1.0);
        world.truncate() / world.w
    }

    /// World-space ray from the eye through the pointer at `(x, y)` in NDC.
    /// Coordinates outside [-1, 1] are not clamped.
    pub fn ray_through(&self, x: f32, y: f32) -> Ray {
        let point = self.unproject(Vec3::new(x, y, 0.5));
        Ray::new(self.position, point - self.position)
    }
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(45.0, 1.0, 0.1, 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_ray_follows_view_direction() {
        let mut camera = PerspectiveCamera::new(45.0, 16.0 / 9.0, 0.1, 1000.0).with_position(Vec3::new(-10.0, 30.0, 30.0));
        camera.look_at(Vec3::ZERO);
        let ray = camera.ray_through(0.0, 0.0);
        assert_eq!(ray.origin, camera.position);
        assert!((ray.direction - camera.forward()).length() < 1e-4);
    }

    #[test]
    fn test_top_right_ray_leans_up_and_right() {
        let camera = PerspectiveCamera::default();
        let ray = camera.ray_through(1.0, 1.0);
        assert!(ray.direction.x > 0.0);
        assert!(ray.direction.y > 0.0);
        assert!(ray.direction.z < 0.0);
    }

    #[test]
    fn test_out_of_range_pointer_still_yields_finite_ray() {
        let camera = PerspectiveCamera::default();
        let ray = camera.ray_through(3.5, -7.0);
        assert!(ray.direction.is_finite());
        assert!((ray.direction.length() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_set_aspect_ignores_degenerate_values() {
        let mut camera = PerspectiveCamera::default();
        camera.set_aspect(2.0);
        camera.set_aspect(0.0);
        camera.set_aspect(f32::NAN);
        assert_eq!(camera.aspect, 2.0);
    }
}
