//! Renderable model component

use super::mesh::Mesh;
use super::shader::ShaderProgram;

/// Geometry plus the program that draws it.
///
/// Cloning a model clones the handles, not the buffers: a deep-copied
/// entity draws from the same mesh and program as its source.
#[derive(Debug, Clone)]
pub struct Model {
    pub mesh: Mesh,
    pub program: ShaderProgram,
}

impl Model {
    pub fn new(mesh: Mesh, program: ShaderProgram) -> Self {
        Self { mesh, program }
    }

    /// True if both models draw from the same mesh buffers and program
    pub fn shares_resources_with(&self, other: &Self) -> bool {
        self.mesh.ptr_eq(&other.mesh) && self.program.ptr_eq(&other.program)
    }
}
