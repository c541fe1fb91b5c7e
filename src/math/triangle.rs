use glam::Vec3;

use super::Ray;

/// Result of triangle intersection test
#[derive(Debug, Clone, Copy)]
pub struct TriangleIntersection {
    pub t: f32,       // Distance along ray
    pub u: f32,       // Barycentric coordinate u
    pub v: f32,       // Barycentric coordinate v
    pub normal: Vec3, // Geometric normal, counter-clockwise winding
}

impl TriangleIntersection {
    /// Get barycentric coordinates (u, v, w) where w = 1 - u - v
    pub fn barycentric(&self) -> (f32, f32, f32) {
        (self.u, self.v, 1.0 - self.u - self.v)
    }

    /// Smallest barycentric weight, zero on an edge
    pub fn edge_distance(&self) -> f32 {
        let (u, v, w) = self.barycentric();
        u.min(v).min(w)
    }
}

/// Möller-Trumbore ray-triangle intersection, hits from both sides
pub fn moller_trumbore_intersect(ray: &Ray, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<TriangleIntersection> {
    const EPSILON: f32 = 1e-7;

    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let h = ray.direction.cross(edge2);
    let a = edge1.dot(h);

    // Parallel to the triangle plane
    if a.abs() < EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);
    if t < EPSILON {
        return None;
    }

    let normal = edge1.cross(edge2).normalize_or_zero();

    Some(TriangleIntersection { t, u, v, normal })
}
