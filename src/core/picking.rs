use glam::Vec3;

use super::{PerspectiveCamera, PointerState};
use crate::math::Ray;
use crate::scene::{NodeId, RaycastView, SceneGraph};

/// One node crossed by a pick ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub node: NodeId,
    pub distance: f32,
    pub point: Vec3,
}

/// Hits ordered nearest first. An empty result is a normal miss.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PickResult {
    hits: Vec<PickHit>,
}

impl PickResult {
    fn from_unsorted(mut hits: Vec<PickHit>) -> Self {
        // Stable, so equal distances keep traversal order
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Self { hits }
    }

    pub fn hits(&self) -> &[PickHit] {
        &self.hits
    }

    pub fn first(&self) -> Option<&PickHit> {
        self.hits.first()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.hits.iter().any(|hit| hit.node == node)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PickHit> {
        self.hits.iter()
    }
}

impl<'a> IntoIterator for &'a PickResult {
    type Item = &'a PickHit;
    type IntoIter = std::slice::Iter<'a, PickHit>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.iter()
    }
}

/// Casts pointer rays into the scene.
///
/// Hits closer than `near` or farther than `far` are dropped. The default
/// range keeps every hit in front of the ray origin; pass the camera clip
/// planes to `with_range` to pick only what the camera draws.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickingService {
    pub near: f32,
    pub far: f32,
}

impl PickingService {
    pub fn new() -> Self {
        Self {
            near: 0.0,
            far: f32::INFINITY,
        }
    }

    pub fn with_range(near: f32, far: f32) -> Self {
        Self { near, far }
    }

    pub fn pick(&self, pointer: &PointerState, camera: &PerspectiveCamera, scene: &SceneGraph) -> PickResult {
        let position = pointer.position();
        let ray = camera.ray_through(position.x, position.y);
        self.cast(&ray, scene)
    }

    /// Every renderable node the ray crosses, nearest first
    pub fn cast(&self, ray: &Ray, scene: &SceneGraph) -> PickResult {
        let view = RaycastView::new(scene);
        if view.is_empty() {
            return PickResult::default();
        }
        let hits = view
            .hits(ray, self.near, self.far)
            .into_iter()
            .map(|hit| PickHit {
                node: hit.node,
                distance: hit.distance,
                point: hit.point,
            })
            .collect();
        let result = PickResult::from_unsorted(hits);
        log::debug!("Pick ray from {:?} hit {} node(s)", ray.origin, result.len());
        result
    }
}

impl Default for PickingService {
    fn default() -> Self {
        Self::new()
    }
}
