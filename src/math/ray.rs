use glam::{Mat4, Vec3};

use super::AABB;

/// Ray with an origin and a direction.
///
/// Rays built with [`Ray::new`] have a unit direction, so hit parameters are
/// world distances. Rays produced by [`Ray::transformed`] keep the scaled
/// direction, so parameters stay comparable between spaces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Per-axis reciprocal of the direction for slab tests. Near-zero
    /// components are clamped so the result stays finite.
    pub fn inverse_direction(&self) -> Vec3 {
        const EPSILON: f32 = 1e-8;
        let inv = |d: f32| if d.abs() < EPSILON { 1.0 / EPSILON.copysign(d) } else { 1.0 / d };
        Vec3::new(inv(self.direction.x), inv(self.direction.y), inv(self.direction.z))
    }

    /// Moves the ray into the space described by `matrix` without renormalizing.
    pub fn transformed(&self, matrix: &Mat4) -> Ray {
        Ray {
            origin: matrix.transform_point3(self.origin),
            direction: matrix.transform_vector3(self.direction),
        }
    }
}

/// Slab test against an axis-aligned box.
///
/// Returns the entry distance, or the exit distance when the origin is inside.
pub fn intersect_aabb(ray: &Ray, bounds: &AABB) -> Option<f32> {
    let inv_dir = ray.inverse_direction();

    let t_min = (bounds.min - ray.origin) * inv_dir;
    let t_max = (bounds.max - ray.origin) * inv_dir;

    let t1 = t_min.min(t_max);
    let t2 = t_min.max(t_max);

    let t_near = t1.x.max(t1.y).max(t1.z);
    let t_far = t2.x.min(t2.y).min(t2.z);

    if t_near > t_far || t_far < 0.0 {
        return None;
    }

    if t_near < 0.0 {
        (t_far > 0.001).then_some(t_far)
    } else {
        Some(t_near)
    }
}

/// Nearest positive hit against a sphere; the far root is used from inside.
pub fn intersect_sphere(ray: &Ray, center: Vec3, radius: f32) -> Option<f32> {
    let oc = ray.origin - center;
    let a = ray.direction.dot(ray.direction);
    if a <= f32::EPSILON {
        return None;
    }
    let half_b = oc.dot(ray.direction);
    let c = oc.dot(oc) - radius * radius;

    let discriminant = half_b * half_b - a * c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrt_d = discriminant.sqrt();
    let t = (-half_b - sqrt_d) / a;
    if t > 1e-4 {
        return Some(t);
    }

    let t = (-half_b + sqrt_d) / a;
    (t > 1e-4).then_some(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersect_aabb_hit() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let bounds = AABB::new(Vec3::new(5.0, -1.0, -1.0), Vec3::new(10.0, 1.0, 1.0));
        let t = intersect_aabb(&ray, &bounds).expect("ray should hit");
        assert!((t - 5.0).abs() < 0.01);
    }

    #[test]
    fn test_intersect_aabb_miss() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let bounds = AABB::new(Vec3::new(5.0, 2.0, 2.0), Vec3::new(10.0, 3.0, 3.0));
        assert!(intersect_aabb(&ray, &bounds).is_none());
    }

    #[test]
    fn test_intersect_aabb_inside() {
        let ray = Ray::new(Vec3::new(5.0, 0.0, 0.0), Vec3::X);
        let bounds = AABB::new(Vec3::new(0.0, -1.0, -1.0), Vec3::new(10.0, 1.0, 1.0));
        let t = intersect_aabb(&ray, &bounds).expect("exit distance");
        assert!((t - 5.0).abs() < 0.01);
    }

    #[test]
    fn test_intersect_aabb_behind() {
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_X);
        let bounds = AABB::new(Vec3::new(5.0, -1.0, -1.0), Vec3::new(10.0, 1.0, 1.0));
        assert!(intersect_aabb(&ray, &bounds).is_none());
    }

    #[test]
    fn test_sphere_hit_from_outside() {
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let t = intersect_sphere(&ray, Vec3::new(0.0, 0.0, -5.0), 1.0).expect("hit");
        assert!((t - 4.0).abs() < 0.01);
    }

    #[test]
    fn test_sphere_hit_from_inside() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let t = intersect_sphere(&ray, Vec3::ZERO, 5.0).expect("hit");
        assert!((t - 5.0).abs() < 0.01);
    }

    #[test]
    fn test_sphere_miss() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert!(intersect_sphere(&ray, Vec3::new(0.0, 0.0, -5.0), 1.0).is_none());
    }

    #[test]
    fn test_transformed_ray_keeps_parameterization() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        let scale = Mat4::from_scale(Vec3::splat(0.5));
        let local = ray.transformed(&scale);

        let t = intersect_sphere(&local, Vec3::ZERO, 1.0).expect("hit");
        // Radius 1 in local space is radius 2 in world space
        assert!((ray.at(t).z - 2.0).abs() < 1e-3);
    }
}
