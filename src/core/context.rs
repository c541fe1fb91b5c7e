use super::{ControlPanelState, PerspectiveCamera, PointerState, Viewport};
use crate::scene::SceneGraph;

/// Everything a frame tick reads or mutates, passed explicitly to the
/// loop and the picking service.
#[derive(Debug, Clone)]
pub struct SceneContext {
    pub scene: SceneGraph,
    pub camera: PerspectiveCamera,
    pub pointer: PointerState,
    pub panel: ControlPanelState,
    pub viewport: Viewport,
}

impl SceneContext {
    pub fn new(scene: SceneGraph, mut camera: PerspectiveCamera, viewport: Viewport) -> Self {
        camera.set_aspect(viewport.aspect());
        Self {
            scene,
            camera,
            pointer: PointerState::new(),
            panel: ControlPanelState::new(),
            viewport,
        }
    }

    /// Applies a new surface size to the viewport and the camera aspect
    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = Viewport::new(width, height);
        self.camera.set_aspect(self.viewport.aspect());
    }

    /// Records a pointer position given in window pixels
    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        self.pointer.set_from_pixels(x, y, self.viewport);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_resize_updates_camera_aspect() {
        let mut ctx = SceneContext::new(SceneGraph::new(), PerspectiveCamera::default(), Viewport::new(100, 100));
        assert_eq!(ctx.camera.aspect, 1.0);
        ctx.resize(200, 100);
        assert_eq!(ctx.viewport, Viewport::new(200, 100));
        assert_eq!(ctx.camera.aspect, 2.0);
    }

    #[test]
    fn test_pointer_uses_current_viewport() {
        let mut ctx = SceneContext::new(SceneGraph::new(), PerspectiveCamera::default(), Viewport::new(100, 100));
        ctx.resize(400, 200);
        ctx.pointer_moved(400.0, 0.0);
        assert_eq!(ctx.pointer.position(), Vec2::new(1.0, 1.0));
    }
}
