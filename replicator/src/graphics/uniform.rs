//! Uniform buffer layouts handed to the renderer
//!
//! These mirror the shader-side structs and are uploaded with
//! `bytemuck::cast_slice`.

use crate::core::camera::Camera;
use crate::core::entity::Transform;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Camera uniform buffer data
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    /// Combined view-projection matrix
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new(view_proj: Mat4) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
        }
    }

    /// Projection times view for a camera placed by `camera_world`
    pub fn from_camera(camera: &Camera, camera_world: Mat4) -> Self {
        Self::new(camera.projection_matrix() * Camera::view_matrix(camera_world))
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY)
    }
}

/// Per-object uniform data
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ObjectUniform {
    /// Model matrix for world transformation
    pub model: [[f32; 4]; 4],
    /// Material color (RGBA)
    pub color: [f32; 4],
}

impl ObjectUniform {
    pub fn new(model: Mat4, color: [f32; 4]) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            color,
        }
    }

    /// Pack the world matrix computed by the last propagation pass
    pub fn from_transform(transform: &Transform, color: [f32; 4]) -> Self {
        Self::new(transform.world_matrix(), color)
    }

    /// Bytes ready for a buffer write
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

impl Default for ObjectUniform {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, [1.0; 4])
    }
}
