use glam::{Mat4, Vec3};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AABB {
    pub min: Vec3,
    pub max: Vec3,
}

impl AABB {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box of the given size centered on the origin
    pub fn centered(size: Vec3) -> Self {
        let half = size * 0.5;
        Self::new(-half, half)
    }

    /// Tightest box around the points, `None` when there are none
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vec3>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::new(first, first), |acc, p| Self::new(acc.min.min(p), acc.max.max(p))))
    }

    pub fn union(&self, other: &AABB) -> AABB {
        AABB {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn surface_area(&self) -> f32 {
        let d = self.size();
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    /// Box grown by `margin` on every side
    pub fn padded(&self, margin: f32) -> AABB {
        AABB::new(self.min - Vec3::splat(margin), self.max + Vec3::splat(margin))
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Bounds of the eight transformed corners
    pub fn transformed(&self, matrix: &Mat4) -> AABB {
        let corners = (0..8).map(|i| {
            Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        });
        // Eight corners always yield a box
        Self::from_points(corners.map(|c| matrix.transform_point3(c))).unwrap_or(*self)
    }

    /// Outward face normal of the face nearest to `point`
    pub fn face_normal(&self, point: Vec3) -> Vec3 {
        let half = (self.size() * 0.5).max(Vec3::splat(f32::EPSILON));
        let local = (point - self.center()) / half;
        let abs = local.abs();
        if abs.x >= abs.y && abs.x >= abs.z {
            Vec3::X * local.x.signum()
        } else if abs.y >= abs.z {
            Vec3::Y * local.y.signum()
        } else {
            Vec3::Z * local.z.signum()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_area() {
        let aabb = AABB::new(Vec3::ZERO, Vec3::new(2.0, 3.0, 4.0));
        assert!((aabb.surface_area() - 52.0).abs() < 1e-4);
        // Flat boxes still have area
        assert!((AABB::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0)).surface_area() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_aabb_center() {
        let aabb = AABB::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(aabb.center(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_aabb_centered() {
        let aabb = AABB::centered(Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(aabb.min, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_aabb_union_non_overlapping() {
        let aabb1 = AABB::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let aabb2 = AABB::new(Vec3::new(2.0, 2.0, 2.0), Vec3::new(3.0, 3.0, 3.0));
        let union = aabb1.union(&aabb2);
        assert_eq!(union.min, Vec3::ZERO);
        assert_eq!(union.max, Vec3::splat(3.0));
    }

    #[test]
    fn test_from_points() {
        let bounds = AABB::from_points([
            Vec3::new(-1.0, -2.0, -3.0),
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::ZERO,
        ])
        .expect("non-empty");
        assert_eq!(bounds.min, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 2.0, 3.0));
        assert!(AABB::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_transformed_translation() {
        let aabb = AABB::centered(Vec3::ONE);
        let moved = aabb.transformed(&Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)));
        assert!((moved.center() - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-5);
        assert!((moved.size() - Vec3::ONE).length() < 1e-5);
    }

    #[test]
    fn test_face_normal() {
        let aabb = AABB::centered(Vec3::splat(2.0));
        assert_eq!(aabb.face_normal(Vec3::new(1.0, 0.2, -0.3)), Vec3::X);
        assert_eq!(aabb.face_normal(Vec3::new(0.1, -1.0, 0.3)), Vec3::NEG_Y);
        assert_eq!(aabb.face_normal(Vec3::new(0.1, 0.2, 1.0)), Vec3::Z);
    }

    #[test]
    fn test_contains() {
        let aabb = AABB::centered(Vec3::ONE);
        assert!(aabb.contains(Vec3::ZERO));
        assert!(!aabb.contains(Vec3::splat(0.6)));
    }
}
