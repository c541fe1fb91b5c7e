use glam::Vec2;

use super::Viewport;

/// Last known pointer position in normalized device coordinates.
///
/// `revision` increases on every write so readers can tell whether the
/// pointer moved since they last looked.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerState {
    position: Vec2,
    revision: u64,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn set_normalized(&mut self, position: Vec2) {
        self.position = position;
        self.revision = self.revision.wrapping_add(1);
    }

    /// Stores a window pixel position, normalized against `viewport`
    pub fn set_from_pixels(&mut self, x: f32, y: f32, viewport: Viewport) {
        self.set_normalized(Self::normalize(x, y, viewport));
    }

    /// Pixel coordinates (origin top-left) to NDC (origin center, +y up).
    /// Positions outside the viewport map outside [-1, 1].
    pub fn normalize(x: f32, y: f32, viewport: Viewport) -> Vec2 {
        let width = viewport.width.max(1) as f32;
        let height = viewport.height.max(1) as f32;
        Vec2::new(x / width * 2.0 - 1.0, -(y / height) * 2.0 + 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_corners() {
        let viewport = Viewport::new(800, 600);
        assert_eq!(PointerState::normalize(0.0, 0.0, viewport), Vec2::new(-1.0, 1.0));
        assert_eq!(PointerState::normalize(800.0, 600.0, viewport), Vec2::new(1.0, -1.0));
        assert_eq!(PointerState::normalize(400.0, 300.0, viewport), Vec2::ZERO);
    }

    #[test]
    fn test_normalize_outside_viewport() {
        let viewport = Viewport::new(100, 100);
        let p = PointerState::normalize(150.0, -50.0, viewport);
        assert_eq!(p, Vec2::new(2.0, 2.0));
    }

    #[test]
    fn test_revision_advances() {
        let mut pointer = PointerState::new();
        assert_eq!(pointer.position(), Vec2::ZERO);
        pointer.set_from_pixels(10.0, 10.0, Viewport::new(20, 20));
        pointer.set_normalized(Vec2::ONE);
        assert_eq!(pointer.revision(), 2);
        assert_eq!(pointer.position(), Vec2::ONE);
    }
}
