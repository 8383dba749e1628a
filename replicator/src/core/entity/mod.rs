//! Entity hierarchy, transforms and their per-frame maintenance
//!
//! Entities live in a `hecs::World`. Parent/child structure is an intrusive
//! sibling list stored in [`Hierarchy`] components, a [`HierarchyOrder`]
//! keeps parents ahead of children, and propagation walks that order to
//! compute world matrices.

pub mod component_registry;
pub mod components;
pub mod deepcopy;
pub mod hierarchy;
pub mod order;
pub mod propagation;
pub mod world;

// Re-export commonly used types
pub use component_registry::ComponentRegistry;
pub use components::{Dirty, Hierarchy, Name, Transform};
pub use hierarchy::{HierarchyError, HierarchyIssue, DEFAULT_MAX_DEPTH};
pub use order::{HierarchyOrder, OrderStrategy};
pub use propagation::propagate_transforms;
pub use world::World;

// Re-export hecs types that users will need
pub use hecs::Entity;
