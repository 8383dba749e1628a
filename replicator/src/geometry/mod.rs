//! Geometry queries: boxes, planes, rays and subtree bounds

pub mod aabb;
pub mod bounds;
pub mod plane;
pub mod ray;

pub use aabb::Aabb;
pub use bounds::bounding_box;
pub use plane::Plane;
pub use ray::Ray;
