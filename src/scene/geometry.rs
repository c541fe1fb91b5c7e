use glam::{Vec2, Vec3};
use std::f32::consts::PI;
use std::sync::OnceLock;

use super::bvh::{Bvh, BvhStats};
use crate::math::{intersect_aabb, intersect_sphere, moller_trumbore_intersect, Ray, AABB};

/// Segments used to place wireframe lines on analytic shapes
const SPHERE_WIRE_SEGMENTS: Vec2 = Vec2::new(24.0, 16.0);

/// Intersection in the geometry's local space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalHit {
    /// Ray parameter, shared with the ray this local ray was derived from
    pub t: f32,
    pub normal: Vec3,
    pub uv: Vec2,
    /// Closeness to a tessellation edge, 0.0 on the edge
    pub wire: f32,
}

/// Shape attached to a node, expressed in the node's local space
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Box { size: Vec3 },
    Sphere { radius: f32 },
    /// Rectangle in the local XY plane facing +Z
    Plane { width: f32, height: f32 },
    Mesh(TriangleMesh),
    Text(TextGeometry),
}

impl Geometry {
    pub fn cube(size: f32) -> Self {
        Geometry::Box { size: Vec3::splat(size) }
    }

    pub fn local_bounds(&self) -> Option<AABB> {
        match self {
            Geometry::Box { size } => Some(AABB::centered(*size)),
            Geometry::Sphere { radius } => Some(AABB::centered(Vec3::splat(radius * 2.0))),
            Geometry::Plane { width, height } => Some(AABB::centered(Vec3::new(*width, *height, 0.0))),
            Geometry::Mesh(mesh) => (mesh.triangle_count() > 0).then(|| mesh.bounds()),
            Geometry::Text(text) => text.bounds(),
        }
    }

    /// Nearest hit along the local ray. With `cull_back_faces`, surfaces whose
    /// normal faces away from the ray origin are ignored.
    pub fn intersect_local(&self, ray: &Ray, cull_back_faces: bool) -> Option<LocalHit> {
        let hit = match self {
            Geometry::Box { size } => intersect_box(ray, &AABB::centered(*size)),
            Geometry::Sphere { radius } => intersect_sphere(ray, Vec3::ZERO, *radius).map(|t| {
                let normal = ray.at(t).normalize_or_zero();
                let uv = sphere_uv(normal);
                LocalHit {
                    t,
                    normal,
                    uv,
                    wire: grid_distance(uv, SPHERE_WIRE_SEGMENTS),
                }
            }),
            Geometry::Plane { width, height } => intersect_plane(ray, *width, *height),
            Geometry::Mesh(mesh) => return mesh.intersect(ray, cull_back_faces),
            Geometry::Text(text) => text.intersect(ray),
        }?;

        if cull_back_faces && hit.normal.dot(ray.direction) > 0.0 {
            return None;
        }
        Some(hit)
    }
}

fn intersect_box(ray: &Ray, bounds: &AABB) -> Option<LocalHit> {
    let t = intersect_aabb(ray, bounds)?;
    let point = ray.at(t);
    let normal = bounds.face_normal(point);
    let rel = (point - bounds.min) / bounds.size().max(Vec3::splat(f32::EPSILON));

    let uv = if normal.x != 0.0 {
        Vec2::new(if normal.x > 0.0 { 1.0 - rel.z } else { rel.z }, rel.y)
    } else if normal.y != 0.0 {
        Vec2::new(rel.x, if normal.y > 0.0 { 1.0 - rel.z } else { rel.z })
    } else {
        Vec2::new(if normal.z > 0.0 { rel.x } else { 1.0 - rel.x }, rel.y)
    };

    Some(LocalHit {
        t,
        normal,
        uv,
        wire: grid_distance(uv, Vec2::ONE),
    })
}

fn intersect_plane(ray: &Ray, width: f32, height: f32) -> Option<LocalHit> {
    if ray.direction.z.abs() < 1e-8 {
        return None;
    }
    let t = -ray.origin.z / ray.direction.z;
    if t <= 1e-6 {
        return None;
    }
    let point = ray.at(t);
    if point.x.abs() > width * 0.5 || point.y.abs() > height * 0.5 {
        return None;
    }
    let uv = Vec2::new(point.x / width + 0.5, point.y / height + 0.5);
    Some(LocalHit {
        t,
        normal: Vec3::Z,
        uv,
        wire: grid_distance(uv, Vec2::ONE),
    })
}

fn sphere_uv(normal: Vec3) -> Vec2 {
    let u = 0.5 + normal.z.atan2(normal.x) / (2.0 * PI);
    let v = 0.5 - normal.y.clamp(-1.0, 1.0).asin() / PI;
    Vec2::new(u, v)
}

/// Distance from `uv` to the nearest line of a `segments` grid, in cell units
fn grid_distance(uv: Vec2, segments: Vec2) -> f32 {
    let cell = uv * segments;
    let fx = cell.x - cell.x.floor();
    let fy = cell.y - cell.y.floor();
    fx.min(1.0 - fx).min(fy).min(1.0 - fy)
}

/// Indexed triangle list with cached bounds and hierarchy
#[derive(Debug, Clone)]
pub struct TriangleMesh {
    positions: Vec<Vec3>,
    indices: Vec<u32>,
    bounds: AABB,
    /// Rebuilt on the next intersection after a vertex moves
    bvh: OnceLock<Bvh>,
}

impl PartialEq for TriangleMesh {
    fn eq(&self, other: &Self) -> bool {
        self.positions == other.positions && self.indices == other.indices
    }
}

impl TriangleMesh {
    /// Triangles referencing missing vertices are dropped
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let vertex_count = positions.len() as u32;
        let indices: Vec<u32> = indices
            .chunks_exact(3)
            .filter(|tri| tri.iter().all(|&i| i < vertex_count))
            .flatten()
            .copied()
            .collect();
        let bounds = AABB::from_points(positions.iter().copied()).unwrap_or(AABB::new(Vec3::ZERO, Vec3::ZERO));
        let mut mesh = Self {
            positions,
            indices,
            bounds,
            bvh: OnceLock::new(),
        };
        // Built here so loaders pay for it instead of the first frame
        mesh.bvh = OnceLock::from(mesh.build_bvh());
        mesh
    }

    /// Non-indexed triangle soup
    pub fn from_triangles(positions: Vec<Vec3>) -> Self {
        let indices = (0..(positions.len() - positions.len() % 3) as u32).collect();
        Self::new(positions, indices)
    }

    /// Single-segment rectangle in the XY plane, vertices ordered
    /// top-left, top-right, bottom-left, bottom-right.
    pub fn plane(width: f32, height: f32) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        Self::new(
            vec![
                Vec3::new(-hw, hh, 0.0),
                Vec3::new(hw, hh, 0.0),
                Vec3::new(-hw, -hh, 0.0),
                Vec3::new(hw, -hh, 0.0),
            ],
            vec![0, 2, 1, 2, 3, 1],
        )
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn bounds(&self) -> AABB {
        self.bounds
    }

    /// Number of scalar position components (three per vertex)
    pub fn component_count(&self) -> usize {
        self.positions.len() * 3
    }

    /// Overwrites one scalar of the flattened position array.
    /// Returns false when the index is out of range.
    pub fn set_component(&mut self, index: usize, value: f32) -> bool {
        let Some(vertex) = self.positions.get_mut(index / 3) else {
            return false;
        };
        vertex[index % 3] = value;
        self.bounds = AABB::from_points(self.positions.iter().copied()).unwrap_or(self.bounds);
        self.bvh = OnceLock::new();
        true
    }

    pub fn bvh_stats(&self) -> BvhStats {
        self.bvh().stats()
    }

    pub fn triangles(&self) -> impl Iterator<Item = (Vec3, Vec3, Vec3)> + '_ {
        self.indices.chunks_exact(3).map(move |tri| {
            (
                self.positions[tri[0] as usize],
                self.positions[tri[1] as usize],
                self.positions[tri[2] as usize],
            )
        })
    }

    fn bvh(&self) -> &Bvh {
        self.bvh.get_or_init(|| self.build_bvh())
    }

    fn build_bvh(&self) -> Bvh {
        let bounds: Vec<AABB> = self
            .triangles()
            .map(|(v0, v1, v2)| AABB::new(v0.min(v1).min(v2), v0.max(v1).max(v2)))
            .collect();
        Bvh::build(&bounds)
    }

    fn triangle(&self, index: u32) -> (Vec3, Vec3, Vec3) {
        let base = index as usize * 3;
        (
            self.positions[self.indices[base] as usize],
            self.positions[self.indices[base + 1] as usize],
            self.positions[self.indices[base + 2] as usize],
        )
    }

    fn intersect(&self, ray: &Ray, cull_back_faces: bool) -> Option<LocalHit> {
        self.bvh().nearest(ray, |index| {
            let (v0, v1, v2) = self.triangle(index);
            let hit = moller_trumbore_intersect(ray, v0, v1, v2)?;
            if cull_back_faces && hit.normal.dot(ray.direction) > 0.0 {
                return None;
            }
            let local = LocalHit {
                t: hit.t,
                normal: hit.normal,
                uv: Vec2::new(hit.u, hit.v),
                wire: hit.edge_distance(),
            };
            Some((hit.t, local))
        })
    }
}

/// Extruded text laid out as one box per glyph
#[derive(Debug, Clone, PartialEq)]
pub struct TextGeometry {
    pub content: String,
    glyph_boxes: Vec<AABB>,
}

impl TextGeometry {
    pub fn new(content: impl Into<String>, glyph_boxes: Vec<AABB>) -> Self {
        Self {
            content: content.into(),
            glyph_boxes,
        }
    }

    pub fn glyph_boxes(&self) -> &[AABB] {
        &self.glyph_boxes
    }

    pub fn bounds(&self) -> Option<AABB> {
        let (first, rest) = self.glyph_boxes.split_first()?;
        Some(rest.iter().fold(*first, |acc, b| acc.union(b)))
    }

    fn intersect(&self, ray: &Ray) -> Option<LocalHit> {
        self.glyph_boxes
            .iter()
            .filter_map(|bounds| intersect_box(ray, bounds))
            .min_by(|a, b| a.t.total_cmp(&b.t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_hit_front_face() {
        let geometry = Geometry::cube(2.0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let hit = geometry.intersect_local(&ray, true).expect("hit");
        assert!((hit.t - 4.0).abs() < 1e-4);
        assert_eq!(hit.normal, Vec3::Z);
    }

    #[test]
    fn test_sphere_culls_from_inside() {
        let geometry = Geometry::Sphere { radius: 2.0 };
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert!(geometry.intersect_local(&ray, true).is_none());
        assert!(geometry.intersect_local(&ray, false).is_some());
    }

    #[test]
    fn test_plane_bounds_and_hit() {
        let geometry = Geometry::Plane { width: 4.0, height: 2.0 };
        let inside = Ray::new(Vec3::new(1.5, 0.5, 3.0), Vec3::NEG_Z);
        let outside = Ray::new(Vec3::new(2.5, 0.5, 3.0), Vec3::NEG_Z);
        assert!(geometry.intersect_local(&inside, false).is_some());
        assert!(geometry.intersect_local(&outside, false).is_none());
    }

    #[test]
    fn test_single_sided_plane_ignores_back() {
        let geometry = Geometry::Plane { width: 4.0, height: 4.0 };
        let from_back = Ray::new(Vec3::new(0.0, 0.0, -3.0), Vec3::Z);
        assert!(geometry.intersect_local(&from_back, true).is_none());
        assert!(geometry.intersect_local(&from_back, false).is_some());
    }

    #[test]
    fn test_mesh_plane_matches_analytic_plane() {
        let mesh = Geometry::Mesh(TriangleMesh::plane(10.0, 10.0));
        let ray = Ray::new(Vec3::new(1.0, -2.0, 6.0), Vec3::NEG_Z);
        let hit = mesh.intersect_local(&ray, true).expect("hit");
        assert!((hit.t - 6.0).abs() < 1e-4);
        assert!(hit.normal.z > 0.99);
    }

    #[test]
    fn test_mesh_drops_invalid_triangles() {
        let mesh = TriangleMesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 2, 0, 1, 7]);
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_set_component_updates_bounds() {
        let mut mesh = TriangleMesh::plane(10.0, 10.0);
        let last = mesh.component_count() - 1;
        assert!(mesh.set_component(last, 7.5));
        assert!((mesh.bounds().max.z - 7.5).abs() < 1e-6);
        assert!(!mesh.set_component(mesh.component_count(), 1.0));
    }

    /// `n` by `n` quads over [-1, 1] in XY with a ripple in Z
    fn wavy_grid(n: u32) -> TriangleMesh {
        let step = 2.0 / n as f32;
        let mut positions = Vec::new();
        for row in 0..=n {
            for col in 0..=n {
                let (x, y) = (-1.0 + col as f32 * step, -1.0 + row as f32 * step);
                positions.push(Vec3::new(x, y, 0.2 * (x * 5.0).sin() * (y * 3.0).cos()));
            }
        }
        let mut indices = Vec::new();
        for row in 0..n {
            for col in 0..n {
                let i = row * (n + 1) + col;
                indices.extend_from_slice(&[i, i + 1, i + n + 1, i + 1, i + n + 2, i + n + 1]);
            }
        }
        TriangleMesh::new(positions, indices)
    }

    fn brute_force(mesh: &TriangleMesh, ray: &Ray) -> Option<f32> {
        mesh.triangles()
            .filter_map(|(v0, v1, v2)| moller_trumbore_intersect(ray, v0, v1, v2))
            .map(|hit| hit.t)
            .min_by(f32::total_cmp)
    }

    #[test]
    fn test_dense_mesh_matches_brute_force() {
        let mesh = wavy_grid(60);
        assert_eq!(mesh.triangle_count(), 7200);
        assert!(mesh.bvh_stats().max_depth > 4);

        let mut hits = 0;
        for i in 0..23 {
            for j in 0..23 {
                let x = -1.1 + i as f32 * 0.1003;
                let y = -1.1 + j as f32 * 0.0997;
                let ray = Ray::new(Vec3::new(x, y, 3.0), Vec3::new(0.05, -0.03, -1.0));
                let expected = brute_force(&mesh, &ray);
                let actual = mesh.intersect(&ray, false).map(|hit| hit.t);
                match (expected, actual) {
                    (Some(e), Some(a)) => {
                        assert!((e - a).abs() < 1e-5, "ray {i},{j}: {e} vs {a}");
                        hits += 1;
                    }
                    (None, None) => {}
                    other => panic!("ray {i},{j} disagrees: {other:?}"),
                }
            }
        }
        assert!(hits > 300);
    }

    #[test]
    fn test_moved_vertex_is_hit_after_rebuild() {
        let mut mesh = TriangleMesh::plane(2.0, 2.0);
        let above = Ray::new(Vec3::new(0.9, 0.5, 5.0), Vec3::NEG_Z);
        assert!((mesh.intersect(&above, true).expect("hit").t - 5.0).abs() < 1e-4);

        // Lift the top-right corner well outside the old hierarchy
        assert!(mesh.set_component(5, 3.0));
        let hit = mesh.intersect(&above, false).expect("hit");
        assert!(hit.t < 5.0);
    }

    #[test]
    fn test_text_hits_nearest_glyph() {
        let text = Geometry::Text(TextGeometry::new(
            "ab",
            vec![
                AABB::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 0.1)),
                AABB::new(Vec3::new(2.0, 0.0, 0.0), Vec3::new(3.0, 1.0, 0.1)),
            ],
        ));
        let between = Ray::new(Vec3::new(1.5, 0.5, 5.0), Vec3::NEG_Z);
        let on_glyph = Ray::new(Vec3::new(2.5, 0.5, 5.0), Vec3::NEG_Z);
        assert!(text.intersect_local(&between, true).is_none());
        assert!(text.intersect_local(&on_glyph, true).is_some());
    }
}
