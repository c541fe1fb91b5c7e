use glam::Vec3;

use crate::math::{Ray, AABB};

/// Maximum primitives per leaf node before splitting
const MAX_LEAF_SIZE: usize = 4;

/// Number of SAH buckets for binned building
const SAH_BUCKETS: usize = 12;

/// Keeps axis-aligned triangles from producing zero-thickness boxes
const BOUNDS_MARGIN: f32 = 1e-4;

#[derive(Clone, Debug)]
enum BvhNode {
    Leaf {
        bounds: AABB,
        primitives: Vec<u32>,
    },
    Internal {
        bounds: AABB,
        left: Box<BvhNode>,
        right: Box<BvhNode>,
    },
}

/// Shape of a built hierarchy, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BvhStats {
    pub nodes: usize,
    pub leaves: usize,
    pub max_depth: usize,
    pub primitives: usize,
}

/// Bounding volume hierarchy over primitive bounds, queried for the
/// nearest hit along a ray.
#[derive(Clone, Debug, Default)]
pub struct Bvh {
    root: Option<BvhNode>,
}

impl Bvh {
    /// Builds with the surface area heuristic. Primitive `i` is identified by
    /// its position in `bounds`.
    pub fn build(bounds: &[AABB]) -> Self {
        if bounds.is_empty() {
            return Self { root: None };
        }
        let padded: Vec<AABB> = bounds.iter().map(|b| b.padded(BOUNDS_MARGIN)).collect();
        let indices = (0..padded.len() as u32).collect();
        Self {
            root: Some(BvhNode::build(&padded, indices)),
        }
    }

    pub fn bounds(&self) -> Option<AABB> {
        self.root.as_ref().map(|node| *node.bounds())
    }

    pub fn stats(&self) -> BvhStats {
        let mut stats = BvhStats::default();
        if let Some(root) = &self.root {
            root.gather_stats(&mut stats, 0);
        }
        stats
    }

    /// Nearest primitive hit along `ray`.
    ///
    /// `test` intersects one primitive and returns the ray distance with a
    /// payload. Subtrees entered beyond the best distance so far are skipped.
    pub fn nearest<H>(&self, ray: &Ray, mut test: impl FnMut(u32) -> Option<(f32, H)>) -> Option<H> {
        let root = self.root.as_ref()?;
        let inv_dir = ray.inverse_direction();
        let mut best: Option<(f32, H)> = None;
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            let limit = best.as_ref().map_or(f32::INFINITY, |(t, _)| *t);
            if entry_distance(ray.origin, inv_dir, node.bounds(), limit).is_none() {
                continue;
            }
            match node {
                BvhNode::Leaf { primitives, .. } => {
                    for &index in primitives {
                        let Some((t, hit)) = test(index) else {
                            continue;
                        };
                        if best.as_ref().map_or(true, |(current, _)| t < *current) {
                            best = Some((t, hit));
                        }
                    }
                }
                BvhNode::Internal { left, right, .. } => {
                    let to_left = entry_distance(ray.origin, inv_dir, left.bounds(), limit);
                    let to_right = entry_distance(ray.origin, inv_dir, right.bounds(), limit);
                    // The last push is visited first
                    match (to_left, to_right) {
                        (Some(l), Some(r)) if l <= r => {
                            stack.push(right.as_ref());
                            stack.push(left.as_ref());
                        }
                        (Some(_), Some(_)) => {
                            stack.push(left.as_ref());
                            stack.push(right.as_ref());
                        }
                        (Some(_), None) => stack.push(left.as_ref()),
                        (None, Some(_)) => stack.push(right.as_ref()),
                        (None, None) => {}
                    }
                }
            }
        }
        best.map(|(_, hit)| hit)
    }
}

/// Distance at which the ray enters `bounds` (zero from inside), if that
/// happens no farther than `limit`
fn entry_distance(origin: Vec3, inv_dir: Vec3, bounds: &AABB, limit: f32) -> Option<f32> {
    let t0 = (bounds.min - origin) * inv_dir;
    let t1 = (bounds.max - origin) * inv_dir;
    let near = t0.min(t1).max_element().max(0.0);
    let far = t0.max(t1).min_element();
    (near <= far && near <= limit).then_some(near)
}

impl BvhNode {
    fn build(primitives: &[AABB], mut indices: Vec<u32>) -> Self {
        let bounds = indices
            .iter()
            .skip(1)
            .fold(primitives[indices[0] as usize], |acc, &i| acc.union(&primitives[i as usize]));

        if indices.len() <= MAX_LEAF_SIZE {
            return BvhNode::Leaf {
                bounds,
                primitives: indices,
            };
        }

        let (axis, split) = Self::find_best_split(primitives, &indices, &bounds);
        let mid = Self::partition(primitives, &mut indices, axis, split);

        // All centroids on one side: splitting further cannot help
        if mid == 0 || mid == indices.len() {
            return BvhNode::Leaf {
                bounds,
                primitives: indices,
            };
        }

        let right_indices = indices.split_off(mid);
        BvhNode::Internal {
            bounds,
            left: Box::new(Self::build(primitives, indices)),
            right: Box::new(Self::build(primitives, right_indices)),
        }
    }

    fn find_best_split(primitives: &[AABB], indices: &[u32], bounds: &AABB) -> (usize, f32) {
        let mut best_cost = f32::INFINITY;
        let mut best_axis = 0;
        let mut best_pos = 0.0;

        for axis in 0..3 {
            let (cost, pos) = Self::evaluate_sah_axis(primitives, indices, bounds, axis);
            if cost < best_cost {
                best_cost = cost;
                best_axis = axis;
                best_pos = pos;
            }
        }
        (best_axis, best_pos)
    }

    fn evaluate_sah_axis(primitives: &[AABB], indices: &[u32], bounds: &AABB, axis: usize) -> (f32, f32) {
        let axis_extent = bounds.size()[axis];
        if axis_extent < 1e-6 {
            return (f32::INFINITY, 0.0);
        }

        let mut bucket_bounds: [Option<AABB>; SAH_BUCKETS] = [None; SAH_BUCKETS];
        let mut bucket_counts = [0usize; SAH_BUCKETS];
        for &index in indices {
            let primitive = &primitives[index as usize];
            let offset = (primitive.center()[axis] - bounds.min[axis]) / axis_extent;
            let bucket = ((offset * SAH_BUCKETS as f32) as usize).min(SAH_BUCKETS - 1);
            bucket_counts[bucket] += 1;
            bucket_bounds[bucket] = Some(match bucket_bounds[bucket] {
                Some(b) => b.union(primitive),
                None => *primitive,
            });
        }

        let mut best_cost = f32::INFINITY;
        let mut best_split = 0;
        for split in 1..SAH_BUCKETS {
            let (left, left_count) = Self::accumulate(&bucket_bounds[..split], &bucket_counts[..split]);
            let (right, right_count) = Self::accumulate(&bucket_bounds[split..], &bucket_counts[split..]);
            if let (Some(left), Some(right)) = (left, right) {
                let cost = Self::sah_cost(left.surface_area(), left_count, right.surface_area(), right_count);
                if cost < best_cost {
                    best_cost = cost;
                    best_split = split;
                }
            }
        }

        let split_pos = bounds.min[axis] + (best_split as f32 / SAH_BUCKETS as f32) * axis_extent;
        (best_cost, split_pos)
    }

    fn accumulate(bucket_bounds: &[Option<AABB>], bucket_counts: &[usize]) -> (Option<AABB>, usize) {
        bucket_bounds
            .iter()
            .zip(bucket_counts)
            .fold((None, 0), |(combined, count), (bounds, n)| match bounds {
                Some(b) => (Some(combined.map_or(*b, |c: AABB| c.union(b))), count + n),
                None => (combined, count),
            })
    }

    fn sah_cost(left_area: f32, left_count: usize, right_area: f32, right_count: usize) -> f32 {
        const TRAVERSAL_COST: f32 = 0.125;
        const INTERSECTION_COST: f32 = 1.0;
        TRAVERSAL_COST + INTERSECTION_COST * (left_area * left_count as f32 + right_area * right_count as f32)
    }

    /// Moves centroids below `split` to the front, returning the boundary
    fn partition(primitives: &[AABB], indices: &mut [u32], axis: usize, split: f32) -> usize {
        let mut left = 0;
        let mut right = indices.len();
        while left < right {
            if primitives[indices[left] as usize].center()[axis] < split {
                left += 1;
            } else {
                right -= 1;
                indices.swap(left, right);
            }
        }
        left
    }

    fn bounds(&self) -> &AABB {
        match self {
            BvhNode::Leaf { bounds, .. } | BvhNode::Internal { bounds, .. } => bounds,
        }
    }

    fn gather_stats(&self, stats: &mut BvhStats, depth: usize) {
        stats.nodes += 1;
        stats.max_depth = stats.max_depth.max(depth);
        match self {
            BvhNode::Leaf { primitives, .. } => {
                stats.leaves += 1;
                stats.primitives += primitives.len();
            }
            BvhNode::Internal { left, right, .. } => {
                left.gather_stats(stats, depth + 1);
                right.gather_stats(stats, depth + 1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Unit boxes spaced along X, ten units apart
    fn row(count: usize) -> Vec<AABB> {
        (0..count)
            .map(|i| {
                let x = i as f32 * 10.0;
                AABB::new(Vec3::new(x, 0.0, 0.0), Vec3::new(x + 1.0, 1.0, 1.0))
            })
            .collect()
    }

    fn hit_box(boxes: &[AABB], ray: &Ray, index: u32) -> Option<(f32, u32)> {
        crate::math::intersect_aabb(ray, &boxes[index as usize]).map(|t| (t, index))
    }

    #[test]
    fn test_empty_build() {
        let bvh = Bvh::build(&[]);
        assert!(bvh.bounds().is_none());
        assert_eq!(bvh.stats(), BvhStats::default());
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert!(bvh.nearest(&ray, |i| Some((0.0, i))).is_none());
    }

    #[test]
    fn test_small_set_is_one_leaf() {
        let bvh = Bvh::build(&row(3));
        let stats = bvh.stats();
        assert_eq!(stats.nodes, 1);
        assert_eq!(stats.leaves, 1);
        assert_eq!(stats.primitives, 3);
    }

    #[test]
    fn test_split_keeps_every_primitive() {
        let bvh = Bvh::build(&row(40));
        let stats = bvh.stats();
        assert_eq!(stats.primitives, 40);
        assert!(stats.max_depth > 0);
        assert!(stats.leaves > 1);

        let bounds = bvh.bounds().unwrap();
        assert!(bounds.min.x <= 0.0 && bounds.max.x >= 391.0);
    }

    #[test]
    fn test_nearest_along_the_row() {
        let boxes = row(40);
        let bvh = Bvh::build(&boxes);

        let from_left = Ray::new(Vec3::new(-5.0, 0.5, 0.5), Vec3::X);
        assert_eq!(bvh.nearest(&from_left, |i| hit_box(&boxes, &from_left, i)), Some(0));

        let from_right = Ray::new(Vec3::new(500.0, 0.5, 0.5), Vec3::NEG_X);
        assert_eq!(bvh.nearest(&from_right, |i| hit_box(&boxes, &from_right, i)), Some(39));

        let down_onto_seventh = Ray::new(Vec3::new(70.5, 10.0, 0.5), Vec3::NEG_Y);
        assert_eq!(
            bvh.nearest(&down_onto_seventh, |i| hit_box(&boxes, &down_onto_seventh, i)),
            Some(7)
        );

        let miss = Ray::new(Vec3::new(5.0, 10.0, 0.5), Vec3::NEG_Y);
        assert_eq!(bvh.nearest(&miss, |i| hit_box(&boxes, &miss, i)), None);
    }

    #[test]
    fn test_sah_cost_prefers_small_children() {
        let cost = BvhNode::sah_cost(100.0, 5, 200.0, 10);
        assert!(BvhNode::sah_cost(50.0, 2, 50.0, 2) < cost);
    }
}
