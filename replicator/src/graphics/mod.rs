//! Graphics handles consumed by the renderer
//!
//! Only the pieces the scene core touches live here: shared mesh and shader
//! handles, the `Model` component and the uniform layouts.

pub mod mesh;
pub mod model;
pub mod shader;
pub mod uniform;

pub use mesh::{Mesh, MeshData, Vertex};
pub use model::Model;
pub use shader::ShaderProgram;
pub use uniform::{CameraUniform, ObjectUniform};
