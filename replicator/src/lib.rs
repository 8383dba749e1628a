//! Scene-graph core for a small 3D engine
//!
//! Provides parent/child relations between entities, a maintained
//! parent-before-child traversal order, transform propagation, whole-subtree
//! copy and delete, and the geometry queries used for picking.

pub mod config;
pub mod core;
pub mod geometry;
pub mod graphics;

// Re-export commonly used types
pub mod prelude {
    // Entity system types
    pub use crate::core::entity::{
        Entity, Hierarchy, HierarchyError, Name, OrderStrategy, Transform, World,
    };

    // Camera types
    pub use crate::core::camera::{Camera, CurrentCamera, ProjectionMode};

    // Geometry types
    pub use crate::geometry::{Aabb, Plane, Ray};

    // Graphics types
    pub use crate::graphics::{Mesh, Model, ObjectUniform, ShaderProgram, Vertex};

    // Config types
    pub use crate::config::{ConfigError, SceneConfig};

    // Math types
    pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};
}

/// Initialize logging.
///
/// `RUST_LOG` wins when set; otherwise `fallback_filter` is used, typically
/// [`config::SceneConfig::log_filter`]. Calling this twice is harmless.
pub fn init_logging(fallback_filter: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
