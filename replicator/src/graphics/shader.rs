//! Shared shader program handles

use std::sync::Arc;

#[derive(Debug)]
struct ProgramSource {
    name: String,
    vertex: String,
    fragment: String,
}

/// Handle to a shader program, shared by every model drawn with it.
///
/// Compilation belongs to the renderer; this type only carries the sources
/// and the shared ownership.
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    source: Arc<ProgramSource>,
}

impl ShaderProgram {
    /// Program known only by name, e.g. one built into the renderer
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_sources(name, String::new(), String::new())
    }

    pub fn from_sources(
        name: impl Into<String>,
        vertex: impl Into<String>,
        fragment: impl Into<String>,
    ) -> Self {
        Self {
            source: Arc::new(ProgramSource {
                name: name.into(),
                vertex: vertex.into(),
                fragment: fragment.into(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.source.name
    }

    pub fn vertex_source(&self) -> &str {
        &self.source.vertex
    }

    pub fn fragment_source(&self) -> &str {
        &self.source.fragment
    }

    /// Whether both handles refer to the same program
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.source, &other.source)
    }

    /// Number of live handles to this program
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.source)
    }
}
