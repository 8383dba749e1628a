//! Rays and ray intersection queries
//!
//! Degenerate queries (a ray parallel to a plane, a zero direction) report
//! no hit rather than an error.

use super::aabb::Aabb;
use super::plane::Plane;
use crate::core::camera::{CurrentCamera, ProjectionMode};
use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Half-line starting at `origin`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub const fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// `origin + t * direction`
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + t * self.direction
    }

    /// Hit distance and point against a plane.
    ///
    /// `t` may be negative when the plane lies behind the origin. A ray
    /// parallel to the plane, including one lying inside it, never hits.
    pub fn intersects_plane(&self, plane: &Plane) -> Option<(f32, Vec3)> {
        let denominator = self.direction.dot(plane.normal);
        if denominator == 0.0 {
            return None;
        }
        let t = (plane.position - self.origin).dot(plane.normal) / denominator;
        Some((t, self.point_at(t)))
    }

    /// Entry distance and point against a box.
    ///
    /// Per axis, the face the ray can enter through is picked from the sign
    /// of the direction. The axis with the largest entry distance decides the
    /// hit, which must lie ahead of the origin and inside the box on the two
    /// remaining axes. Axes the ray does not move along impose no entry.
    pub fn intersects_box(&self, aabb: &Aabb) -> Option<(f32, Vec3)> {
        let mut distances = [f32::NEG_INFINITY; 3];
        let mut max_axis = 0;

        for axis in 0..3 {
            let direction = self.direction[axis];
            if direction == 0.0 {
                continue;
            }
            let face = if direction < 0.0 {
                aabb.max[axis]
            } else {
                aabb.min[axis]
            };
            distances[axis] = (face - self.origin[axis]) / direction;
            if distances[axis] > distances[max_axis] {
                max_axis = axis;
            }
        }

        let t = distances[max_axis];
        if t.is_nan() || t < 0.0 {
            return None;
        }

        let point = self.point_at(t);
        let inside = [(max_axis + 1) % 3, (max_axis + 2) % 3]
            .into_iter()
            .all(|axis| point[axis] >= aabb.min[axis] && point[axis] <= aabb.max[axis]);

        inside.then_some((t, point))
    }

    /// Ray through a pixel of the current camera's view.
    ///
    /// `screen` is measured in pixels from the top-left corner of a viewport
    /// of `viewport` pixels. Perspective rays start at the camera position,
    /// orthographic rays on the near plane. Returns `None` without a usable
    /// camera or for an empty viewport.
    pub fn from_screen(
        world: &hecs::World,
        camera: CurrentCamera,
        screen: Vec2,
        viewport: Vec2,
    ) -> Option<Self> {
        if viewport.x <= 0.0 || viewport.y <= 0.0 {
            return None;
        }
        let (camera, camera_world) = camera.resolve(world)?;

        let ndc = 2.0 * screen / viewport - Vec2::ONE;
        let inverse = camera_world * camera.projection_matrix().inverse();
        let unproject = |depth: f32| {
            let point = inverse * Vec4::new(ndc.x, -ndc.y, depth, 1.0);
            point.truncate() / point.w
        };

        // glam projections map depth to [0, 1]
        let near = unproject(0.0);
        let far = unproject(1.0);
        let direction = (far - near).normalize_or_zero();
        if direction == Vec3::ZERO || !direction.is_finite() {
            return None;
        }

        let origin = match camera.projection_mode {
            ProjectionMode::Perspective { .. } => camera_world.transform_point3(Vec3::ZERO),
            ProjectionMode::Orthographic { .. } => near,
        };

        trace!(origin = ?origin, direction = ?direction, "Picked ray from screen");
        Some(Self::new(origin, direction))
    }
}
