use glam::{Vec2, Vec3};

use super::PerspectiveCamera;

const ROTATE_SPEED: f32 = 0.005;
const ZOOM_STEP: f32 = 0.95;
const MIN_POLAR: f32 = 0.01;
const MAX_POLAR: f32 = std::f32::consts::PI - 0.01;

/// Drag-to-orbit camera control around the camera target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitController {
    pub min_distance: f32,
    pub max_distance: f32,
    dragging: bool,
    last_cursor: Option<Vec2>,
}

impl OrbitController {
    pub fn new() -> Self {
        Self {
            min_distance: 0.5,
            max_distance: 500.0,
            dragging: false,
            last_cursor: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging;
        if !dragging {
            self.last_cursor = None;
        }
    }

    /// Feeds a cursor position in pixels; rotates while dragging
    pub fn cursor_moved(&mut self, cursor: Vec2, camera: &mut PerspectiveCamera) {
        if self.dragging {
            if let Some(last) = self.last_cursor {
                let delta = cursor - last;
                self.rotate(camera, -delta.x * ROTATE_SPEED, -delta.y * ROTATE_SPEED);
            }
            self.last_cursor = Some(cursor);
        }
    }

    /// Rotates the camera position about the target on a sphere
    pub fn rotate(&self, camera: &mut PerspectiveCamera, azimuth: f32, polar: f32) {
        let offset = camera.position - camera.target;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return;
        }
        let theta = offset.x.atan2(offset.z) + azimuth;
        let phi = ((offset.y / radius).clamp(-1.0, 1.0).acos() + polar).clamp(MIN_POLAR, MAX_POLAR);
        let offset = Vec3::new(phi.sin() * theta.sin(), phi.cos(), phi.sin() * theta.cos()) * radius;
        camera.position = camera.target + offset;
    }

    /// Positive `steps` move towards the target
    pub fn zoom(&self, camera: &mut PerspectiveCamera, steps: f32) {
        let offset = camera.position - camera.target;
        let radius = (offset.length() * ZOOM_STEP.powf(steps)).clamp(self.min_distance, self.max_distance);
        camera.position = camera.target + offset.normalize_or_zero() * radius;
    }
}

impl Default for OrbitController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_keeps_distance() {
        let mut camera = PerspectiveCamera::default().with_position(Vec3::new(-10.0, 30.0, 30.0));
        let before = camera.position.distance(camera.target);
        OrbitController::new().rotate(&mut camera, 0.7, -0.3);
        assert!((camera.position.distance(camera.target) - before).abs() < 1e-3);
    }

    #[test]
    fn test_drag_only_rotates_while_pressed() {
        let mut camera = PerspectiveCamera::default();
        let start = camera.position;
        let mut orbit = OrbitController::new();
        orbit.cursor_moved(Vec2::new(0.0, 0.0), &mut camera);
        orbit.cursor_moved(Vec2::new(50.0, 0.0), &mut camera);
        assert_eq!(camera.position, start);

        orbit.set_dragging(true);
        orbit.cursor_moved(Vec2::new(0.0, 0.0), &mut camera);
        orbit.cursor_moved(Vec2::new(50.0, 0.0), &mut camera);
        assert_ne!(camera.position, start);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut camera = PerspectiveCamera::default();
        let orbit = OrbitController::new();
        orbit.zoom(&mut camera, 1000.0);
        assert!((camera.position.distance(camera.target) - orbit.min_distance).abs() < 1e-4);
    }
}
