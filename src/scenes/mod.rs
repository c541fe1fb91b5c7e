mod birthday;
mod tutorial;

pub use birthday::BirthdayDemo;
pub use tutorial::TutorialDemo;

use serde::{Deserialize, Serialize};

use crate::core::{FrameLoop, PerspectiveCamera, SceneContext};
use crate::error::SceneError;
use crate::loaders::{LoadOutcome, ParsedResource};
use crate::render::Guide;

/// Built-in scenes selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DemoKind {
    #[default]
    Tutorial,
    Birthday,
}

impl DemoKind {
    pub fn create(self) -> Box<dyn Demo> {
        match self {
            DemoKind::Tutorial => Box::new(TutorialDemo::new()),
            DemoKind::Birthday => Box::new(BirthdayDemo::new()),
        }
    }
}

/// Scene content: startup nodes, per-tick behavior and asset installation
pub trait Demo {
    fn title(&self) -> &'static str;

    /// Camera at its starting pose; aspect is set from the viewport later
    fn camera(&self) -> PerspectiveCamera;

    /// Populates the scene and registers animations, control bindings and
    /// highlight targets
    fn build(&mut self, ctx: &mut SceneContext, frame_loop: &mut FrameLoop);

    /// Assets to request once the scene is built
    fn assets(&self) -> Vec<&'static str>;

    /// Places a loaded asset into the scene
    fn install(
        &mut self,
        ctx: &mut SceneContext,
        frame_loop: &mut FrameLoop,
        name: &str,
        resource: ParsedResource,
    ) -> Result<(), SceneError>;

    fn guides(&self) -> Vec<Guide> {
        Vec::new()
    }

    /// Whether the camera orbits the origin under mouse drag
    fn orbit(&self) -> bool {
        false
    }
}

/// Installs a settled load. Failed loads leave the scene untouched.
/// Returns true if the asset made it into the scene.
pub fn install_outcome(
    demo: &mut dyn Demo,
    ctx: &mut SceneContext,
    frame_loop: &mut FrameLoop,
    outcome: LoadOutcome,
) -> bool {
    let LoadOutcome { ticket, name, result } = outcome;
    let resource = match result {
        Ok(resource) => resource,
        Err(err) => {
            log::warn!("{} ({}) not installed: {}", name, ticket, err);
            return false;
        }
    };
    match demo.install(ctx, frame_loop, &name, resource) {
        Ok(()) => {
            log::info!("{} installed into {}", name, demo.title());
            true
        }
        Err(err) => {
            log::error!("{} could not be installed: {}", name, err);
            false
        }
    }
}
