//! Infinite planes

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Plane through `position` with the given `normal`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    /// Any point on the plane
    pub position: Vec3,
    /// Plane normal, not required to be unit length
    pub normal: Vec3,
}

impl Plane {
    pub const fn new(position: Vec3, normal: Vec3) -> Self {
        Self { position, normal }
    }

    /// Horizontal plane at height `y`, facing up
    pub const fn ground(y: f32) -> Self {
        Self::new(Vec3::new(0.0, y, 0.0), Vec3::Y)
    }

    /// Signed distance along the normal, scaled by its length
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        (point - self.position).dot(self.normal)
    }
}
