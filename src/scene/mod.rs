mod bvh;
mod geometry;
mod graph;
mod light;
mod material;
mod node;
mod raycast;

pub use bvh::{Bvh, BvhStats};
pub use geometry::{Geometry, LocalHit, TextGeometry, TriangleMesh};
pub use graph::{Background, Fog, PlacedLight, SceneGraph};
pub use light::{Light, LightKind};
pub use material::{Material, MaterialKind, Side, Texture, UniformValue};
pub use node::{NodeId, NodeTree, SceneNode, Transform};
pub use raycast::{RaycastView, SurfaceHit};
