use glam::Vec3;

use super::Demo;
use crate::core::{Animation, FrameLoop, PerspectiveCamera, SceneContext};
use crate::error::SceneError;
use crate::loaders::{ParsedResource, TextStyle};
use crate::math::Color;
use crate::scene::{Background, Geometry, Light, Material, NodeId, SceneNode};

pub const CAKE: &str = "Cake Birthday.glb";
pub const FONT: &str = "Noto Serif_Regular.json";

pub const GREETING: &str = "Happy Birthday!";
const LILAC: u32 = 0xcc76f7;
/// Rotation added to the cake on every tick, radians about Y
pub const CAKE_SPIN: f32 = 0.01;

/// Greeting card: extruded text over a cube with a spinning cake model
#[derive(Debug, Default)]
pub struct BirthdayDemo {
    cake: Option<NodeId>,
    text: Option<NodeId>,
}

impl BirthdayDemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Top node of the cake model once it is installed
    pub fn cake(&self) -> Option<NodeId> {
        self.cake
    }

    pub fn text(&self) -> Option<NodeId> {
        self.text
    }
}

impl Demo for BirthdayDemo {
    fn title(&self) -> &'static str {
        "Birthday"
    }

    fn camera(&self) -> PerspectiveCamera {
        let mut camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 1000.0).with_position(Vec3::new(0.0, -0.4, 5.0));
        camera.look_at(Vec3::new(0.0, 1.5, 0.0));
        camera
    }

    fn build(&mut self, ctx: &mut SceneContext, _frame_loop: &mut FrameLoop) {
        let scene = &mut ctx.scene;
        scene.background = Background::Transparent;

        scene.add_to_root(
            SceneNode::light(Light::directional(Color::WHITE, 1.5)).with_position(Vec3::new(0.0, 1.0, 1.0)),
        );
        scene.add_to_root(SceneNode::light(Light::ambient(Color::WHITE, 3.0)));
        scene.add_to_root(
            SceneNode::mesh(Geometry::cube(1.5), Material::basic(Color::from_hex(LILAC)))
                .with_position(Vec3::new(0.0, -0.7, 0.0)),
        );
    }

    fn assets(&self) -> Vec<&'static str> {
        vec![FONT, CAKE]
    }

    fn install(
        &mut self,
        ctx: &mut SceneContext,
        frame_loop: &mut FrameLoop,
        name: &str,
        resource: ParsedResource,
    ) -> Result<(), SceneError> {
        let root = ctx.scene.root();
        match (name, resource) {
            (CAKE, ParsedResource::Model(model)) => {
                if self.cake.is_some() {
                    log::warn!("{} is already in the scene", CAKE);
                    return Ok(());
                }
                let cake = ctx.scene.insert_tree(root, model.root)?;
                frame_loop.add_animation(Animation::spin(cake, Vec3::new(0.0, CAKE_SPIN, 0.0)));
                self.cake = Some(cake);
            }
            (FONT, ParsedResource::Font(font)) => {
                if self.text.is_some() {
                    log::warn!("{} is already in the scene", FONT);
                    return Ok(());
                }
                let text = font.layout(GREETING, TextStyle { size: 0.4, depth: 0.1 });
                let id = ctx.scene.add(
                    root,
                    SceneNode::mesh(Geometry::Text(text), Material::basic(Color::from_hex(LILAC)))
                        .with_name(GREETING)
                        .with_position(Vec3::new(-2.1, 1.5, 0.0)),
                )?;
                self.text = Some(id);
            }
            (_, resource) => {
                return Err(SceneError::UnexpectedAsset {
                    name: name.to_string(),
                    kind: resource.kind().label(),
                })
            }
        }
        Ok(())
    }
}
