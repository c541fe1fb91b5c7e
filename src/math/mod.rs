mod aabb;
mod color;
mod ray;
mod triangle;

pub use aabb::AABB;
pub use color::Color;
pub use ray::{intersect_aabb, intersect_sphere, Ray};
pub use triangle::{moller_trumbore_intersect, TriangleIntersection};
