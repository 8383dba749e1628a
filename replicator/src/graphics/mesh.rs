//! Shared mesh handles and vertex data
//!
//! A [`Mesh`] is a cheap-to-clone handle to immutable vertex and index
//! buffers. Copies of an entity share the same buffers; the data is freed
//! when the last handle goes away.

use crate::geometry::Aabb;
use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use std::sync::Arc;

/// Vertex layout uploaded to the GPU
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position in model space
    pub position: [f32; 3],
    /// Surface normal vector (normalized)
    pub normal: [f32; 3],
    /// Texture coordinates
    pub uv: [f32; 2],
}

impl Vertex {
    pub const fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Immutable buffers behind a [`Mesh`] handle
#[derive(Debug)]
pub struct MeshData {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    bounds: Aabb,
}

/// Shared handle to mesh data
#[derive(Debug, Clone)]
pub struct Mesh {
    data: Arc<MeshData>,
}

impl Mesh {
    /// Create a mesh from vertices and indices, computing its local bounds
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        let positions: Vec<Vec3> = vertices.iter().map(|v| Vec3::from(v.position)).collect();
        let bounds = Aabb::from_points(&positions);
        Self {
            data: Arc::new(MeshData {
                vertices,
                indices,
                bounds,
            }),
        }
    }

    /// Cube centered at the origin with side length `size`.
    ///
    /// Each face has its own four vertices so normals stay flat.
    pub fn cube(size: f32) -> Self {
        let half = size * 0.5;
        // (normal, u, v) with u x v = normal, so faces wind counter-clockwise
        let faces = [
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        ];
        let corners = [
            (-1.0, -1.0, [0.0, 1.0]),
            (1.0, -1.0, [1.0, 1.0]),
            (1.0, 1.0, [1.0, 0.0]),
            (-1.0, 1.0, [0.0, 0.0]),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u, v) in faces {
            let base = vertices.len() as u32;
            for (su, sv, uv) in corners {
                let position = (normal + u * su + v * sv) * half;
                vertices.push(Vertex::new(position.to_array(), normal.to_array(), uv));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self::new(vertices, indices)
    }

    /// Double-sided quad on the XZ plane, centered at the origin
    pub fn plane(width: f32, depth: f32) -> Self {
        let (hw, hd) = (width * 0.5, depth * 0.5);
        let vertices = vec![
            Vertex::new([-hw, 0.0, -hd], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex::new([hw, 0.0, -hd], [0.0, 1.0, 0.0], [1.0, 0.0]),
            Vertex::new([hw, 0.0, hd], [0.0, 1.0, 0.0], [1.0, 1.0]),
            Vertex::new([-hw, 0.0, hd], [0.0, 1.0, 0.0], [0.0, 1.0]),
        ];
        let indices = vec![0, 1, 2, 0, 2, 3, 0, 2, 1, 0, 3, 2];
        Self::new(vertices, indices)
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.data.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.data.indices
    }

    /// Model-space bounds of the vertices
    pub fn bounds(&self) -> Aabb {
        self.data.bounds
    }

    /// Whether both handles refer to the same buffers
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Number of live handles to these buffers
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.data)
    }
}
