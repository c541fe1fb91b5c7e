mod panel;
mod present;
mod software;

pub use panel::{draw_panel, FrameStats};
pub use present::Presenter;
pub use software::{Guide, SoftwareRenderer};

use crate::core::{PerspectiveCamera, Viewport};
use crate::scene::SceneGraph;

/// Draws the current scene from a camera. Called exactly once per tick.
pub trait SceneRenderer {
    fn render(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera) -> anyhow::Result<()>;

    /// Viewport changed; the next frame renders at the new size
    fn resize(&mut self, _viewport: Viewport) {}
}
