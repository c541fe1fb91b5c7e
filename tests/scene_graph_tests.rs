use glam::Vec3;
use scene_loop::math::Color;
use scene_loop::scene::{Geometry, Material, NodeTree, SceneGraph, SceneNode};
use scene_loop::SceneError;

#[cfg(test)]
mod scene_graph_tests {
    use super::*;

    fn model() -> NodeTree {
        NodeTree::leaf(SceneNode::group().with_name("model"))
            .with_child(NodeTree::leaf(
                SceneNode::mesh(Geometry::cube(1.0), Material::basic(Color::WHITE)).with_name("body"),
            ))
            .with_child(
                NodeTree::leaf(SceneNode::group().with_name("arm"))
                    .with_child(NodeTree::leaf(SceneNode::group().with_name("hand"))),
            )
    }

    #[test]
    fn test_new_graph_has_only_root() {
        let scene = SceneGraph::new();
        assert_eq!(scene.node_count(), 1);
        assert!(scene.children(scene.root()).is_empty());
        assert_eq!(scene.parent(scene.root()), None);
    }

    #[test]
    fn test_insert_tree_keeps_shape() {
        let mut scene = SceneGraph::new();
        let top = scene.insert_tree(scene.root(), model()).unwrap();

        assert_eq!(scene.node_count(), 5);
        assert_eq!(scene.parent(top), Some(scene.root()));
        assert_eq!(scene.descendants(top).len(), 3);

        let hand = scene.find_by_name("hand").unwrap();
        let arm = scene.find_by_name("arm").unwrap();
        assert_eq!(scene.parent(hand), Some(arm));
        assert_eq!(scene.parent(arm), Some(top));
    }

    #[test]
    fn test_descendants_in_pre_order() {
        let mut scene = SceneGraph::new();
        let top = scene.insert_tree(scene.root(), model()).unwrap();
        let names: Vec<_> = scene
            .descendants(top)
            .into_iter()
            .filter_map(|id| scene.node(id).and_then(|n| n.name()).map(str::to_string))
            .collect();
        assert_eq!(names, vec!["body", "arm", "hand"]);
    }

    #[test]
    fn test_add_under_missing_parent_fails() {
        let mut other = SceneGraph::new();
        other.add_to_root(SceneNode::group());
        let stranger = other.add_to_root(SceneNode::group());

        let mut scene = SceneGraph::new();
        let err = scene.add(stranger, SceneNode::group()).unwrap_err();
        assert_eq!(err, SceneError::NodeNotFound(stranger));
        assert_eq!(scene.node_count(), 1);
    }

    #[test]
    fn test_world_matrix_composes_parents() {
        let mut scene = SceneGraph::new();
        let parent = scene.add_to_root(SceneNode::group().with_position(Vec3::new(10.0, 0.0, 0.0)));
        let child = scene
            .add(parent, SceneNode::group().with_position(Vec3::new(0.0, 2.0, 0.0)))
            .unwrap();

        let world = scene.world_matrix(child).unwrap();
        let origin = world.transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(10.0, 2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_find_by_name_prefers_shallow_match() {
        let mut scene = SceneGraph::new();
        let group = scene.add_to_root(SceneNode::group());
        scene.add(group, SceneNode::group().with_name("theBox")).unwrap();
        let shallow = scene.add_to_root(SceneNode::group().with_name("theBox"));

        assert_eq!(scene.find_by_name("theBox"), Some(shallow));
        assert_eq!(scene.find_by_name("nothing"), None);
    }

    #[test]
    fn test_lights_are_placed_in_world_space() {
        use scene_loop::scene::{Light, LightKind};

        let mut scene = SceneGraph::new();
        let rig = scene.add_to_root(SceneNode::group().with_position(Vec3::new(0.0, 5.0, 0.0)));
        scene
            .add(rig, SceneNode::light(Light::spot(Color::WHITE, 0.8)).with_position(Vec3::new(1.0, 0.0, 0.0)))
            .unwrap();
        scene.add_to_root(SceneNode::light(Light::ambient(Color::from_hex(0x333333), 1.0)));

        let lights = scene.lights();
        assert_eq!(lights.len(), 2);
        let spot = lights
            .iter()
            .find(|l| matches!(l.light.kind, LightKind::Spot { .. }))
            .unwrap();
        assert!((spot.position - Vec3::new(1.0, 5.0, 0.0)).length() < 1e-5);
    }
}
