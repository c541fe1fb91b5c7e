mod camera;
mod clock;
mod context;
mod control_panel;
mod frame_loop;
mod orbit;
mod picking;
mod pointer;
mod viewport;

pub use camera::PerspectiveCamera;
pub use clock::Clock;
pub use context::SceneContext;
pub use control_panel::{Control, ControlPanelState, ControlValue};
pub use frame_loop::{
    Animation, Binding, BindingTarget, Component, FrameLoop, HighlightTarget, LoopConfig, LoopState, NodeMatcher,
    PickPolicy, Speed, TickReport,
};
pub use orbit::OrbitController;
pub use picking::{PickHit, PickResult, PickingService};
pub use pointer::PointerState;
pub use viewport::Viewport;
