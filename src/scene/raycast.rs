use glam::{Mat4, Vec2, Vec3};

use super::{Geometry, NodeId, SceneGraph, SceneNode};
use crate::math::{intersect_aabb, Ray, AABB};

/// World-space intersection with a node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    pub node: NodeId,
    pub distance: f32,
    pub point: Vec3,
    /// Geometric normal in world space, not flipped towards the viewer
    pub normal: Vec3,
    pub uv: Vec2,
    pub wire: f32,
}

struct Placed<'a> {
    id: NodeId,
    node: &'a SceneNode,
    geometry: &'a Geometry,
    world: Mat4,
    inverse: Mat4,
    world_bounds: AABB,
}

/// Snapshot of every intersectable node with its world transform,
/// built once and reused for many rays.
pub struct RaycastView<'a> {
    placed: Vec<Placed<'a>>,
}

impl<'a> RaycastView<'a> {
    pub fn new(scene: &'a SceneGraph) -> Self {
        let mut placed = Vec::new();
        scene.visit(|id, node, world| {
            let Some(geometry) = node.geometry.as_ref() else {
                return;
            };
            let Some(local_bounds) = geometry.local_bounds() else {
                return;
            };
            // Degenerate transforms cannot be inverted
            if world.determinant().abs() <= f32::EPSILON {
                log::debug!("Skipping node {} with a singular transform", id);
                return;
            }
            let bounds = local_bounds.transformed(world);
            placed.push(Placed {
                id,
                node,
                geometry,
                world: *world,
                inverse: world.inverse(),
                world_bounds: AABB::new(bounds.min - Vec3::splat(1e-4), bounds.max + Vec3::splat(1e-4)),
            });
        });
        Self { placed }
    }

    pub fn len(&self) -> usize {
        self.placed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placed.is_empty()
    }

    /// Every hit with `near <= distance <= far`, in traversal order
    pub fn hits(&self, ray: &Ray, near: f32, far: f32) -> Vec<SurfaceHit> {
        self.placed
            .iter()
            .filter_map(|placed| Self::intersect(placed, ray))
            .filter(|hit| hit.distance >= near && hit.distance <= far)
            .collect()
    }

    pub fn nearest(&self, ray: &Ray, near: f32, far: f32) -> Option<SurfaceHit> {
        self.hits(ray, near, far)
            .into_iter()
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    /// True when a shadow-casting node other than `ignore` blocks the ray
    /// before `max_distance`
    pub fn occluded(&self, ray: &Ray, max_distance: f32, ignore: NodeId) -> bool {
        self.placed
            .iter()
            .filter(|placed| placed.node.cast_shadow && placed.id != ignore)
            .filter_map(|placed| Self::intersect(placed, ray))
            .any(|hit| hit.distance > 1e-3 && hit.distance < max_distance)
    }

    fn intersect(placed: &Placed<'_>, ray: &Ray) -> Option<SurfaceHit> {
        if intersect_aabb(ray, &placed.world_bounds).is_none() && !placed.world_bounds.contains(ray.origin) {
            return None;
        }

        let cull = placed.node.material.as_ref().map_or(true, |m| m.culls_back_faces());
        let local_ray = ray.transformed(&placed.inverse);
        let hit = placed.geometry.intersect_local(&local_ray, cull)?;

        let point = ray.at(hit.t);
        let distance = point.distance(ray.origin);
        if !distance.is_finite() {
            return None;
        }
        let normal = placed
            .inverse
            .transpose()
            .transform_vector3(hit.normal)
            .normalize_or_zero();

        Some(SurfaceHit {
            node: placed.id,
            distance,
            point,
            normal,
            uv: hit.uv,
            wire: hit.wire,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Color;
    use crate::scene::Material;

    #[test]
    fn test_hits_transformed_sphere() {
        let mut scene = SceneGraph::new();
        let id = scene.add_to_root(
            SceneNode::mesh(Geometry::Sphere { radius: 1.0 }, Material::basic(Color::WHITE))
                .with_position(Vec3::new(0.0, 0.0, -10.0)),
        );
        let view = RaycastView::new(&scene);
        assert_eq!(view.len(), 1);

        let hit = view
            .nearest(&Ray::new(Vec3::ZERO, Vec3::NEG_Z), 0.0, f32::INFINITY)
            .expect("hit");
        assert_eq!(hit.node, id);
        assert!((hit.distance - 9.0).abs() < 1e-3);
        assert!((hit.normal - Vec3::Z).length() < 1e-3);
        assert!((hit.point - Vec3::new(0.0, 0.0, -9.0)).length() < 1e-3);
    }

    #[test]
    fn test_far_limit_filters_hits() {
        let mut scene = SceneGraph::new();
        scene.add_to_root(
            SceneNode::mesh(Geometry::cube(1.0), Material::basic(Color::WHITE))
                .with_position(Vec3::new(0.0, 0.0, -10.0)),
        );
        let view = RaycastView::new(&scene);
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        assert!(view.hits(&ray, 0.0, 5.0).is_empty());
        assert_eq!(view.hits(&ray, 0.0, 50.0).len(), 1);
    }

    #[test]
    fn test_occlusion_requires_caster() {
        let mut scene = SceneGraph::new();
        let blocker = scene.add_to_root(
            SceneNode::mesh(Geometry::cube(1.0), Material::basic(Color::WHITE))
                .with_position(Vec3::new(0.0, 5.0, 0.0)),
        );
        let ray = Ray::new(Vec3::ZERO, Vec3::Y);
        assert!(!RaycastView::new(&scene).occluded(&ray, 100.0, NodeId(999)));

        scene.node_mut(blocker).unwrap().cast_shadow = true;
        let view = RaycastView::new(&scene);
        assert!(view.occluded(&ray, 100.0, NodeId(999)));
        assert!(!view.occluded(&ray, 100.0, blocker));
        assert!(!view.occluded(&ray, 2.0, NodeId(999)));
    }

    #[test]
    fn test_zero_scale_node_is_skipped() {
        let mut scene = SceneGraph::new();
        let id = scene.add_to_root(SceneNode::mesh(Geometry::cube(1.0), Material::basic(Color::WHITE)));
        scene.node_mut(id).unwrap().transform.scale = Vec3::ZERO;
        assert!(RaycastView::new(&scene).is_empty());
    }
}
