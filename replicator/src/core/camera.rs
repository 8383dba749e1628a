//! Camera component and the current-camera context
//!
//! A camera entity carries a [`Camera`] for its projection; its view comes
//! from the world matrix computed by transform propagation.

use crate::core::entity::Transform;
use glam::Mat4;
use hecs::Entity;
use serde::{Deserialize, Serialize};

/// Projection parameters of a camera entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub projection_mode: ProjectionMode,
    /// Viewport width over height
    pub aspect_ratio: f32,
    /// Clip distances along the view direction
    pub z_near: f32,
    pub z_far: f32,
}

/// How view space is mapped to clip space
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum ProjectionMode {
    Perspective { fov_y_radians: f32 },
    /// Parallel projection showing `height` world units vertically
    Orthographic { height: f32 },
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(60.0, 16.0 / 9.0, 0.1, 1000.0)
    }
}

impl Camera {
    /// Perspective camera with a vertical field of view given in degrees
    pub fn perspective(fov_y_degrees: f32, aspect_ratio: f32, z_near: f32, z_far: f32) -> Self {
        let fov_y_radians = fov_y_degrees.to_radians();
        Self::with_mode(ProjectionMode::Perspective { fov_y_radians }, aspect_ratio, z_near, z_far)
    }

    pub fn orthographic(height: f32, aspect_ratio: f32, z_near: f32, z_far: f32) -> Self {
        Self::with_mode(ProjectionMode::Orthographic { height }, aspect_ratio, z_near, z_far)
    }

    fn with_mode(projection_mode: ProjectionMode, aspect_ratio: f32, z_near: f32, z_far: f32) -> Self {
        Self {
            projection_mode,
            aspect_ratio,
            z_near,
            z_far,
        }
    }

    /// Right-handed projection with depth mapped to [0, 1]
    pub fn projection_matrix(&self) -> Mat4 {
        let (near, far) = (self.z_near, self.z_far);
        match self.projection_mode {
            ProjectionMode::Perspective { fov_y_radians } => {
                Mat4::perspective_rh(fov_y_radians, self.aspect_ratio, near, far)
            }
            ProjectionMode::Orthographic { height } => {
                let top = height * 0.5;
                let right = top * self.aspect_ratio;
                Mat4::orthographic_rh(-right, right, -top, top, near, far)
            }
        }
    }

    /// World-to-view matrix for a camera placed by `camera_world`
    pub fn view_matrix(camera_world: Mat4) -> Mat4 {
        camera_world.inverse()
    }
}

/// Which entity currently acts as the camera for picking and rendering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CurrentCamera(pub Option<Entity>);

impl CurrentCamera {
    /// Look up the camera and its world matrix.
    ///
    /// Returns `None` when no camera is selected, the entity is gone, or it
    /// carries no [`Camera`]. A camera without a [`Transform`] sits at the
    /// origin.
    pub fn resolve(&self, world: &hecs::World) -> Option<(Camera, Mat4)> {
        let entity = self.0?;
        let camera = *world.get::<&Camera>(entity).ok()?;
        let camera_world = world
            .get::<&Transform>(entity)
            .map(|transform| transform.world_matrix())
            .unwrap_or(Mat4::IDENTITY);
        Some((camera, camera_world))
    }
}
