use glam::{Vec2, Vec3};
use scene_loop::core::{PerspectiveCamera, PickingService, PointerState, Viewport};
use scene_loop::math::{Color, Ray};
use scene_loop::scene::{Geometry, Material, SceneGraph, SceneNode, TriangleMesh};
use std::collections::HashSet;

#[cfg(test)]
mod picking_tests {
    use super::*;

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(45.0, 1.0, 0.1, 1000.0).with_position(Vec3::new(0.0, 0.0, 10.0))
    }

    fn pointer_at(x: f32, y: f32) -> PointerState {
        let mut pointer = PointerState::new();
        pointer.set_normalized(Vec2::new(x, y));
        pointer
    }

    fn sphere(z: f32) -> SceneNode {
        SceneNode::mesh(Geometry::Sphere { radius: 1.0 }, Material::basic(Color::WHITE)).with_position(Vec3::new(0.0, 0.0, z))
    }

    #[test]
    fn test_hits_sorted_nearest_first() {
        let mut scene = SceneGraph::new();
        let far = scene.add_to_root(sphere(-6.0));
        let near = scene.add_to_root(sphere(2.0));
        let middle = scene.add_to_root(sphere(-2.0));

        let result = PickingService::new().pick(&pointer_at(0.0, 0.0), &camera(), &scene);

        let order: Vec<_> = result.iter().map(|hit| hit.node).collect();
        assert_eq!(order, vec![near, middle, far]);
        let distances: Vec<f32> = result.iter().map(|hit| hit.distance).collect();
        assert!(distances.windows(2).all(|pair| pair[0] <= pair[1]));
        assert!((distances[0] - 7.0).abs() < 1e-3, "front of the near sphere is 7 units away");
    }

    #[test]
    fn test_empty_scene_gives_empty_result() {
        let scene = SceneGraph::new();
        let result = PickingService::new().pick(&pointer_at(0.0, 0.0), &camera(), &scene);
        assert!(result.is_empty());
        assert!(result.first().is_none());
    }

    #[test]
    fn test_miss_off_to_the_side() {
        let mut scene = SceneGraph::new();
        scene.add_to_root(sphere(0.0));
        let result = PickingService::new().pick(&pointer_at(0.9, 0.9), &camera(), &scene);
        assert!(result.is_empty());
    }

    #[test]
    fn test_pointer_outside_viewport_is_not_clamped() {
        let viewport = Viewport::new(100, 100);
        let outside = PointerState::normalize(150.0, 50.0, viewport);
        assert_eq!(outside, Vec2::new(2.0, 0.0));

        // A sphere only reachable through NDC x = 2 is still hit
        let mut scene = SceneGraph::new();
        let cam = camera();
        let target = cam.ray_through(2.0, 0.0).at(10.0);
        let id = scene.add_to_root(
            SceneNode::mesh(Geometry::Sphere { radius: 0.5 }, Material::basic(Color::WHITE)).with_position(target),
        );

        let mut pointer = PointerState::new();
        pointer.set_from_pixels(150.0, 50.0, viewport);
        let result = PickingService::new().pick(&pointer, &cam, &scene);
        assert_eq!(result.first().map(|hit| hit.node), Some(id));
    }

    #[test]
    fn test_invisible_and_group_nodes_are_skipped() {
        let mut scene = SceneGraph::new();
        let hidden = scene.add_to_root(sphere(0.0));
        scene.node_mut(hidden).unwrap().visible = false;
        scene.add_to_root(SceneNode::group().with_name("empty"));

        let result = PickingService::new().pick(&pointer_at(0.0, 0.0), &camera(), &scene);
        assert!(result.is_empty());
    }

    #[test]
    fn test_range_limits_drop_far_hits() {
        let mut scene = SceneGraph::new();
        scene.add_to_root(sphere(-50.0));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);

        assert_eq!(PickingService::new().cast(&ray, &scene).len(), 1);
        assert!(PickingService::with_range(0.1, 20.0).cast(&ray, &scene).is_empty());
    }

    #[test]
    fn test_child_hit_uses_world_transform() {
        let mut scene = SceneGraph::new();
        let parent = scene.add_to_root(SceneNode::group().with_position(Vec3::new(3.0, 0.0, 0.0)));
        let child = scene
            .add(parent, SceneNode::mesh(Geometry::cube(1.0), Material::basic(Color::WHITE)))
            .unwrap();

        let straight = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        assert!(PickingService::new().cast(&straight, &scene).is_empty());

        let offset = Ray::new(Vec3::new(3.0, 0.0, 10.0), Vec3::NEG_Z);
        let result = PickingService::new().cast(&offset, &scene);
        assert_eq!(result.first().map(|hit| hit.node), Some(child));
        assert!((result.hits()[0].point.z - 0.5).abs() < 1e-4);
    }

    /// Interpenetrating shapes around the origin, one of them nested under a
    /// moved group
    fn overlapping_scene() -> SceneGraph {
        let mut scene = SceneGraph::new();
        let white = Material::basic(Color::WHITE);
        scene.add_to_root(SceneNode::mesh(Geometry::cube(3.0), white.clone()));
        scene.add_to_root(
            SceneNode::mesh(Geometry::Sphere { radius: 2.0 }, white.clone()).with_position(Vec3::new(1.0, 0.5, 0.5)),
        );
        scene.add_to_root(
            SceneNode::mesh(Geometry::Mesh(TriangleMesh::plane(6.0, 6.0)), white.clone().double_sided())
                .with_position(Vec3::new(0.0, 0.0, 0.25)),
        );
        let group = scene.add_to_root(SceneNode::group().with_position(Vec3::new(-0.5, -0.5, 0.0)));
        scene
            .add(group, SceneNode::mesh(Geometry::cube(2.0), white).with_rotation(Vec3::new(0.3, 0.6, 0.0)))
            .unwrap();
        scene
    }

    #[test]
    fn test_pointer_sweep_is_ordered_without_duplicates() {
        let scene = overlapping_scene();
        let service = PickingService::new();
        let cam = camera();
        let mut deepest = 0;

        for i in 0..=20 {
            for j in 0..=20 {
                let (x, y) = (-1.0 + i as f32 * 0.1, -1.0 + j as f32 * 0.1);
                let result = service.pick(&pointer_at(x, y), &cam, &scene);

                let distances: Vec<f32> = result.iter().map(|hit| hit.distance).collect();
                assert!(
                    distances.windows(2).all(|pair| pair[0] <= pair[1]),
                    "unordered hits at ({x}, {y}): {distances:?}"
                );
                let unique: HashSet<_> = result.iter().map(|hit| hit.node).collect();
                assert_eq!(unique.len(), result.len(), "duplicate node at ({x}, {y})");
                assert!(result.iter().all(|hit| scene.contains(hit.node)));
                deepest = deepest.max(result.len());
            }
        }
        assert_eq!(deepest, 4, "some pointer should cross every shape");
    }
}
