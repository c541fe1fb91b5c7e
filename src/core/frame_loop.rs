use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{ControlValue, PickResult, PickingService, SceneContext};
use crate::error::FrameMutationError;
use crate::math::Color;
use crate::render::SceneRenderer;
use crate::scene::{Geometry, NodeId, SceneGraph, SceneNode, UniformValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopped,
}

/// When the pointer ray is cast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickPolicy {
    /// Every tick, whether or not the pointer moved
    #[default]
    EveryTick,
    /// Only on ticks where the pointer moved since the previous pick
    OnPointerMove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    pub pick_policy: PickPolicy,
    /// Put back the pre-highlight color once a node is no longer picked.
    /// Off by default: a highlighted node keeps its color.
    pub restore_unpicked: bool,
}

/// Per-tick increment of a bounce animation
#[derive(Debug, Clone, PartialEq)]
pub enum Speed {
    Fixed(f32),
    /// Read from the named numeric control on every tick
    Control(String),
}

/// Index into a mesh's flattened position array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Start(usize),
    /// Counted back from the last component, `End(0)` being the last
    End(usize),
}

impl Component {
    fn resolve(self, count: usize) -> Option<usize> {
        match self {
            Component::Start(i) => (i < count).then_some(i),
            Component::End(i) => count.checked_sub(i + 1),
        }
    }
}

/// Time-driven mutation applied once per tick
#[derive(Debug, Clone, PartialEq)]
pub enum Animation {
    /// `rotation += delta`
    Spin { node: NodeId, delta: Vec3 },
    /// `step += speed; position.y = amplitude * |sin(step)|`
    Bounce {
        node: NodeId,
        amplitude: f32,
        speed: Speed,
        step: f32,
    },
    /// Overwrites mesh position components with values in `[0, amplitude)`
    Jitter {
        node: NodeId,
        components: Vec<Component>,
        amplitude: f32,
    },
}

impl Animation {
    pub fn spin(node: NodeId, delta: Vec3) -> Self {
        Animation::Spin { node, delta }
    }

    pub fn bounce(node: NodeId, amplitude: f32, speed: Speed) -> Self {
        Animation::Bounce {
            node,
            amplitude,
            speed,
            step: 0.0,
        }
    }

    pub fn jitter(node: NodeId, components: Vec<Component>, amplitude: f32) -> Self {
        Animation::Jitter {
            node,
            components,
            amplitude,
        }
    }

    pub fn node(&self) -> NodeId {
        match self {
            Animation::Spin { node, .. } | Animation::Bounce { node, .. } | Animation::Jitter { node, .. } => *node,
        }
    }
}

/// Node field overwritten from a control value
#[derive(Debug, Clone, PartialEq)]
pub enum BindingTarget {
    MaterialColor(NodeId),
    Wireframe(NodeId),
    LightIntensity(NodeId),
    SpotAngle(NodeId),
    SpotPenumbra(NodeId),
    Uniform { node: NodeId, name: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub control: String,
    pub target: BindingTarget,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeMatcher {
    Id(NodeId),
    Name(String),
}

impl NodeMatcher {
    fn matches(&self, id: NodeId, node: &SceneNode) -> bool {
        match self {
            NodeMatcher::Id(target) => *target == id,
            NodeMatcher::Name(name) => node.name() == Some(name.as_str()),
        }
    }
}

/// Node recolored whenever the pointer ray crosses it
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightTarget {
    pub matcher: NodeMatcher,
    pub color: Color,
}

/// Outcome of one tick
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub number: u64,
    /// `None` when the pick policy skipped this tick
    pub picked: Option<PickResult>,
    pub highlighted: Vec<NodeId>,
    pub restored: Vec<NodeId>,
    /// Mutations skipped this tick
    pub errors: Vec<FrameMutationError>,
    pub rendered: bool,
}

/// Drives animation, control bindings, picking and rendering, one tick per
/// display refresh.
pub struct FrameLoop {
    state: LoopState,
    config: LoopConfig,
    picking: PickingService,
    animations: Vec<Animation>,
    bindings: Vec<Binding>,
    highlights: Vec<HighlightTarget>,
    /// Colors to put back, keyed by highlighted node
    originals: HashMap<NodeId, Color>,
    last_pointer_revision: Option<u64>,
    ticks: u64,
    rng: StdRng,
}

impl FrameLoop {
    pub fn new(config: LoopConfig) -> Self {
        Self {
            state: LoopState::Idle,
            config,
            picking: PickingService::new(),
            animations: Vec::new(),
            bindings: Vec::new(),
            highlights: Vec::new(),
            originals: HashMap::new(),
            last_pointer_revision: None,
            ticks: 0,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_picking(mut self, picking: PickingService) -> Self {
        self.picking = picking;
        self
    }

    /// Deterministic jitter for tests and snapshots
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn animations(&self) -> &[Animation] {
        &self.animations
    }

    pub fn add_animation(&mut self, animation: Animation) -> &mut Self {
        self.animations.push(animation);
        self
    }

    pub fn bind(&mut self, control: &str, target: BindingTarget) -> &mut Self {
        self.bindings.push(Binding {
            control: control.to_string(),
            target,
        });
        self
    }

    pub fn highlight(&mut self, matcher: NodeMatcher, color: Color) -> &mut Self {
        self.highlights.push(HighlightTarget { matcher, color });
        self
    }

    /// Moves `Idle` to `Running` and queues every control for the first
    /// tick, so bound fields start in sync with the panel. Returns false if
    /// the loop was already started or has been stopped.
    pub fn start(&mut self, ctx: &mut SceneContext) -> bool {
        if self.state != LoopState::Idle {
            log::warn!("Frame loop start ignored in state {:?}", self.state);
            return false;
        }
        ctx.panel.mark_all_pending();
        self.state = LoopState::Running;
        log::info!(
            "Frame loop running: {} animation(s), {} binding(s), {} highlight target(s)",
            self.animations.len(),
            self.bindings.len(),
            self.highlights.len()
        );
        true
    }

    /// Leaves the refresh schedule. Calling it again does nothing.
    pub fn stop(&mut self) {
        if self.state != LoopState::Stopped {
            log::info!("Frame loop stopped after {} tick(s)", self.ticks);
            self.state = LoopState::Stopped;
        }
    }

    /// Runs one tick. Returns `None` unless the loop is running.
    ///
    /// Failing mutations are logged, collected in the report and skipped;
    /// the render pass runs regardless.
    pub fn tick(&mut self, ctx: &mut SceneContext, renderer: &mut dyn SceneRenderer) -> Option<TickReport> {
        if !self.is_running() {
            return None;
        }
        self.ticks += 1;
        let mut report = TickReport {
            number: self.ticks,
            ..TickReport::default()
        };

        self.animate(ctx, &mut report.errors);
        self.apply_controls(ctx, &mut report.errors);

        if let Some(picked) = self.pick(ctx) {
            self.apply_highlights(&mut ctx.scene, &picked, &mut report);
            report.picked = Some(picked);
        }

        for err in &report.errors {
            log::warn!("Tick {} skipped a mutation: {}", report.number, err);
        }

        match renderer.render(&ctx.scene, &ctx.camera) {
            Ok(()) => report.rendered = true,
            Err(err) => log::error!("Render failed on tick {}: {:#}", report.number, err),
        }
        Some(report)
    }

    fn animate(&mut self, ctx: &mut SceneContext, errors: &mut Vec<FrameMutationError>) {
        let SceneContext { scene, panel, .. } = ctx;
        let rng = &mut self.rng;
        for animation in &mut self.animations {
            let result = match animation {
                Animation::Spin { node, delta } => scene
                    .try_node_mut(*node)
                    .map(|n| n.transform.rotation += *delta)
                    .map_err(FrameMutationError::from),
                Animation::Bounce {
                    node,
                    amplitude,
                    speed,
                    step,
                } => Self::bounce(scene, panel, *node, *amplitude, speed, step),
                Animation::Jitter {
                    node,
                    components,
                    amplitude,
                } => Self::jitter(scene, rng, *node, components, *amplitude),
            };
            if let Err(err) = result {
                errors.push(err);
            }
        }
    }

    fn bounce(
        scene: &mut SceneGraph,
        panel: &super::ControlPanelState,
        node: NodeId,
        amplitude: f32,
        speed: &Speed,
        step: &mut f32,
    ) -> Result<(), FrameMutationError> {
        let increment = match speed {
            Speed::Fixed(v) => *v,
            Speed::Control(name) => panel.number(name)?,
        };
        let target = scene.try_node_mut(node)?;
        *step += increment;
        target.transform.position.y = amplitude * step.sin().abs();
        Ok(())
    }

    fn jitter(
        scene: &mut SceneGraph,
        rng: &mut StdRng,
        node: NodeId,
        components: &[Component],
        amplitude: f32,
    ) -> Result<(), FrameMutationError> {
        let target = scene.try_node_mut(node)?;
        let Some(Geometry::Mesh(mesh)) = target.geometry.as_mut() else {
            return Err(FrameMutationError::MissingComponent {
                node,
                component: "triangle mesh",
            });
        };
        let count = mesh.component_count();
        for component in components {
            let value = rng.gen::<f32>() * amplitude;
            let written = component.resolve(count).is_some_and(|index| mesh.set_component(index, value));
            if !written {
                return Err(FrameMutationError::MissingComponent {
                    node,
                    component: "vertex component",
                });
            }
        }
        Ok(())
    }

    fn apply_controls(&mut self, ctx: &mut SceneContext, errors: &mut Vec<FrameMutationError>) {
        for name in ctx.panel.take_pending() {
            for binding in self.bindings.iter().filter(|b| b.control == name) {
                let result = ctx
                    .panel
                    .value(&name)
                    .and_then(|value| Self::apply_binding(&mut ctx.scene, &mut self.originals, binding, value));
                if let Err(err) = result {
                    errors.push(err);
                }
            }
        }
    }

    fn apply_binding(
        scene: &mut SceneGraph,
        originals: &mut HashMap<NodeId, Color>,
        binding: &Binding,
        value: ControlValue,
    ) -> Result<(), FrameMutationError> {
        let expect = |expected: &'static str| FrameMutationError::ControlType {
            name: binding.control.clone(),
            expected,
            found: value.kind_name(),
        };

        match (&binding.target, value) {
            (BindingTarget::MaterialColor(id), ControlValue::Color(color)) => {
                Self::material_mut(scene, *id)?.color = color;
                // A restore must bring back the newly chosen color
                if let Some(original) = originals.get_mut(id) {
                    *original = color;
                }
                Ok(())
            }
            (BindingTarget::MaterialColor(_), _) => Err(expect("color")),
            (BindingTarget::Wireframe(id), ControlValue::Toggle(on)) => {
                Self::material_mut(scene, *id)?.wireframe = on;
                Ok(())
            }
            (BindingTarget::Wireframe(_), _) => Err(expect("toggle")),
            (BindingTarget::LightIntensity(id), ControlValue::Number(v)) => {
                Self::light_mut(scene, *id)?.intensity = v;
                Ok(())
            }
            (BindingTarget::SpotAngle(id), ControlValue::Number(v)) => {
                Self::spot_result(*id, Self::light_mut(scene, *id)?.set_spot_angle(v))
            }
            (BindingTarget::SpotPenumbra(id), ControlValue::Number(v)) => {
                Self::spot_result(*id, Self::light_mut(scene, *id)?.set_spot_penumbra(v))
            }
            (BindingTarget::LightIntensity(_) | BindingTarget::SpotAngle(_) | BindingTarget::SpotPenumbra(_), _) => {
                Err(expect("number"))
            }
            (BindingTarget::Uniform { node, name }, value) => {
                let uniform = match value {
                    ControlValue::Number(v) => UniformValue::Float(v),
                    ControlValue::Toggle(on) => UniformValue::Float(if on { 1.0 } else { 0.0 }),
                    ControlValue::Color(c) => UniformValue::Color(c),
                };
                Self::material_mut(scene, *node)?.set_uniform(name.as_str(), uniform);
                Ok(())
            }
        }
    }

    fn material_mut(scene: &mut SceneGraph, id: NodeId) -> Result<&mut crate::scene::Material, FrameMutationError> {
        scene
            .try_node_mut(id)?
            .material
            .as_mut()
            .ok_or(FrameMutationError::MissingComponent {
                node: id,
                component: "material",
            })
    }

    fn light_mut(scene: &mut SceneGraph, id: NodeId) -> Result<&mut crate::scene::Light, FrameMutationError> {
        scene
            .try_node_mut(id)?
            .light
            .as_mut()
            .ok_or(FrameMutationError::MissingComponent { node: id, component: "light" })
    }

    fn spot_result(node: NodeId, applied: bool) -> Result<(), FrameMutationError> {
        if applied {
            Ok(())
        } else {
            Err(FrameMutationError::MissingComponent {
                node,
                component: "spot light",
            })
        }
    }

    fn pick(&mut self, ctx: &SceneContext) -> Option<PickResult> {
        let revision = ctx.pointer.revision();
        let moved = self.last_pointer_revision != Some(revision);
        if self.config.pick_policy == PickPolicy::OnPointerMove && !moved {
            return None;
        }
        self.last_pointer_revision = Some(revision);
        Some(self.picking.pick(&ctx.pointer, &ctx.camera, &ctx.scene))
    }

    fn apply_highlights(&mut self, scene: &mut SceneGraph, picked: &PickResult, report: &mut TickReport) {
        for hit in picked {
            if report.highlighted.contains(&hit.node) {
                continue;
            }
            let Some(node) = scene.node(hit.node) else {
                report.errors.push(FrameMutationError::MissingNode(hit.node));
                continue;
            };
            let Some(target) = self.highlights.iter().find(|t| t.matcher.matches(hit.node, node)) else {
                continue;
            };
            let color = target.color;
            match Self::material_mut(scene, hit.node) {
                Ok(material) => {
                    if self.config.restore_unpicked {
                        self.originals.entry(hit.node).or_insert(material.color);
                    }
                    material.color = color;
                    report.highlighted.push(hit.node);
                }
                Err(err) => report.errors.push(err),
            }
        }

        if !self.config.restore_unpicked {
            return;
        }
        let released: Vec<NodeId> = self
            .originals
            .keys()
            .filter(|id| !report.highlighted.contains(id))
            .copied()
            .collect();
        for id in released {
            let Some(original) = self.originals.remove(&id) else {
                continue;
            };
            match Self::material_mut(scene, id) {
                Ok(material) => {
                    material.color = original;
                    report.restored.push(id);
                }
                Err(err) => report.errors.push(err),
            }
        }
    }
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new(LoopConfig::default())
    }
}
