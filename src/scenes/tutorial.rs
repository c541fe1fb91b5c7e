use glam::Vec3;
use std::f32::consts::FRAC_PI_2;

use super::Demo;
use crate::core::{Animation, BindingTarget, Component, FrameLoop, NodeMatcher, PerspectiveCamera, SceneContext, Speed};
use crate::error::SceneError;
use crate::loaders::ParsedResource;
use crate::math::Color;
use crate::render::Guide;
use crate::scene::{Background, Fog, Geometry, Light, Material, NodeId, SceneNode, TriangleMesh, UniformValue};

pub const MODEL: &str = "scene.gltf";
pub const BACKGROUND: &str = "background.png";
pub const WOOD: &str = "woodTexture.png";

const SPHERE_COLOR: u32 = 0x0000ff;
const TINT_COLOR: u32 = 0xff0000;

/// Ids of the nodes the tutorial talks to after startup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TutorialNodes {
    pub spinning_box: NodeId,
    pub ground: NodeId,
    pub sphere: NodeId,
    pub spot_light: NodeId,
    pub wood_box: NodeId,
    pub jitter_plane: NodeId,
    pub shader_sphere: NodeId,
}

/// Primitives, lights, fog, a textured box, a jittering wireframe plane,
/// a shader sphere and a glTF model, with a control panel and pointer
/// highlights
#[derive(Debug, Default)]
pub struct TutorialDemo {
    nodes: Option<TutorialNodes>,
}

impl TutorialDemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` until [`Demo::build`] has run
    pub fn nodes(&self) -> Option<TutorialNodes> {
        self.nodes
    }
}

impl Demo for TutorialDemo {
    fn title(&self) -> &'static str {
        "Tutorial"
    }

    fn camera(&self) -> PerspectiveCamera {
        PerspectiveCamera::new(45.0, 1.0, 0.1, 1000.0).with_position(Vec3::new(-10.0, 30.0, 30.0))
    }

    fn build(&mut self, ctx: &mut SceneContext, frame_loop: &mut FrameLoop) {
        let scene = &mut ctx.scene;
        scene.fog = Some(Fog::Exp2 {
            color: Color::WHITE,
            density: 0.01,
        });

        let spinning_box = scene.add_to_root(SceneNode::mesh(Geometry::cube(1.0), Material::basic(Color::from_hex(0x00ff00))));

        let ground = scene.add_to_root(
            SceneNode::mesh(
                Geometry::Plane { width: 30.0, height: 30.0 },
                Material::basic(Color::from_hex(0xaaaaaa)).double_sided(),
            )
            .with_rotation(Vec3::new(-FRAC_PI_2, 0.0, 0.0))
            .receiving_shadow(),
        );

        let sphere = scene.add_to_root(
            SceneNode::mesh(Geometry::Sphere { radius: 4.0 }, Material::standard(Color::from_hex(SPHERE_COLOR)))
                .with_position(Vec3::new(-10.0, 10.0, 0.0))
                .casting_shadow(),
        );

        scene.add_to_root(SceneNode::light(Light::ambient(Color::from_hex(0x333333), 1.0)));

        let mut spot = Light::spot(Color::WHITE, 0.8).with_shadow();
        spot.set_spot_angle(0.2);
        let spot_light = scene.add_to_root(SceneNode::light(spot).with_position(Vec3::new(-100.0, 100.0, 0.0)));

        let wood_box = scene.add_to_root(
            SceneNode::mesh(Geometry::cube(4.0), Material::basic(Color::WHITE))
                .with_name("theBox")
                .with_position(Vec3::new(0.0, 2.1, 10.0)),
        );

        let jitter_plane = scene.add_to_root(
            SceneNode::mesh(
                Geometry::Mesh(TriangleMesh::plane(10.0, 10.0)),
                Material::basic(Color::from_hex(0xaaaaaa)).with_wireframe(true),
            )
            .with_position(Vec3::new(0.0, 0.0, 10.0)),
        );

        let shader_sphere = scene.add_to_root(
            SceneNode::mesh(
                Geometry::Sphere { radius: 4.0 },
                Material::shader([("tint", UniformValue::Color(Color::from_hex(TINT_COLOR)))]),
            )
            .with_position(Vec3::new(-5.0, 10.0, 10.0)),
        );

        ctx.panel
            .add_color("sphereColor", Color::from_hex(SPHERE_COLOR))
            .add_toggle("wireframe", false)
            .add_number("speed", 0.01, 0.0, 0.1)
            .add_number("angle", 0.2, 0.0, 1.0)
            .add_number("penumbra", 0.0, 0.0, 1.0)
            .add_number("intensity", 1.0, 0.0, 1.0)
            .add_color("tint", Color::from_hex(TINT_COLOR))
            .with_step("speed", 0.001);

        frame_loop
            .add_animation(Animation::spin(spinning_box, Vec3::new(0.01, 0.01, 0.0)))
            .add_animation(Animation::bounce(sphere, 10.0, Speed::Control("speed".into())))
            .add_animation(Animation::jitter(
                jitter_plane,
                vec![Component::Start(0), Component::Start(1), Component::Start(2), Component::End(0)],
                10.0,
            ))
            .bind("sphereColor", BindingTarget::MaterialColor(sphere))
            .bind("wireframe", BindingTarget::Wireframe(sphere))
            .bind("angle", BindingTarget::SpotAngle(spot_light))
            .bind("penumbra", BindingTarget::SpotPenumbra(spot_light))
            .bind("intensity", BindingTarget::LightIntensity(spot_light))
            .bind(
                "tint",
                BindingTarget::Uniform {
                    node: shader_sphere,
                    name: "tint".into(),
                },
            )
            .highlight(NodeMatcher::Id(sphere), Color::from_hex(0xff0000))
            .highlight(NodeMatcher::Name("theBox".into()), Color::from_hex(0x00ff00));

        self.nodes = Some(TutorialNodes {
            spinning_box,
            ground,
            sphere,
            spot_light,
            wood_box,
            jitter_plane,
            shader_sphere,
        });
    }

    fn assets(&self) -> Vec<&'static str> {
        vec![MODEL, BACKGROUND, WOOD]
    }

    fn install(
        &mut self,
        ctx: &mut SceneContext,
        _frame_loop: &mut FrameLoop,
        name: &str,
        resource: ParsedResource,
    ) -> Result<(), SceneError> {
        let unexpected = |resource: &ParsedResource| SceneError::UnexpectedAsset {
            name: name.to_string(),
            kind: resource.kind().label(),
        };

        match (name, resource) {
            (MODEL, ParsedResource::Model(mut model)) => {
                model.root.node.transform.position = Vec3::new(10.0, 0.0, 0.0);
                let root = ctx.scene.root();
                ctx.scene.insert_tree(root, model.root)?;
            }
            (BACKGROUND, ParsedResource::Texture(texture)) => {
                ctx.scene.background = Background::Texture(texture);
            }
            (WOOD, ParsedResource::Texture(texture)) => {
                let wood_box = self
                    .nodes
                    .map(|nodes| nodes.wood_box)
                    .ok_or_else(|| SceneError::UnexpectedAsset {
                        name: name.to_string(),
                        kind: "texture",
                    })?;
                if let Some(material) = ctx.scene.try_node_mut(wood_box)?.material.as_mut() {
                    material.map = Some(texture);
                }
            }
            (_, resource) => return Err(unexpected(&resource)),
        }
        Ok(())
    }

    fn guides(&self) -> Vec<Guide> {
        vec![
            Guide::Axes { size: 5.0 },
            Guide::Grid {
                size: 30.0,
                divisions: 10,
            },
        ]
    }

    fn orbit(&self) -> bool {
        true
    }
}
