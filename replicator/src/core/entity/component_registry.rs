//! Component registry for duplicating entities
//!
//! hecs stores components type-erased, so copying "every component" of an
//! entity needs a per-type cloner registered up front.

use super::components::Hierarchy;
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A function that clones one component type from an entity into a builder.
/// Returns true if the entity had the component.
pub type ComponentClonerFn =
    Arc<dyn Fn(hecs::EntityRef<'_>, &mut hecs::EntityBuilder) -> bool + Send + Sync>;

/// Registry of cloneable component types
#[derive(Default, Clone)]
pub struct ComponentRegistry {
    /// Maps TypeId to its cloner
    cloners: HashMap<TypeId, ComponentClonerFn>,
    /// Maps TypeId to the type name for diagnostics
    names: HashMap<TypeId, &'static str>,
}

impl ComponentRegistry {
    /// Create a new empty component registry
    pub fn new() -> Self {
        Self {
            cloners: HashMap::new(),
            names: HashMap::new(),
        }
    }

    /// Register a cloneable component type.
    ///
    /// [`Hierarchy`] is never registered: copies get fresh links.
    pub fn register<T: hecs::Component + Clone>(&mut self) {
        let type_id = TypeId::of::<T>();
        if type_id == TypeId::of::<Hierarchy>() {
            debug!("Refusing to register Hierarchy as a cloneable component");
            return;
        }

        let cloner: ComponentClonerFn = Arc::new(
            |entity: hecs::EntityRef<'_>, builder: &mut hecs::EntityBuilder| match entity.get::<&T>() {
                Some(component) => {
                    builder.add((*component).clone());
                    true
                }
                None => false,
            },
        );

        self.cloners.insert(type_id, cloner);
        self.names.insert(type_id, type_name::<T>());
        debug!(type_name = type_name::<T>(), "Registered cloneable component");
    }

    /// Check if a component type is registered
    pub fn is_registered<T: 'static>(&self) -> bool {
        self.cloners.contains_key(&TypeId::of::<T>())
    }

    /// Check if a component type is registered, by TypeId
    pub fn is_registered_id(&self, type_id: TypeId) -> bool {
        self.cloners.contains_key(&type_id)
    }

    /// Name a registered type was registered under
    pub fn type_name(&self, type_id: TypeId) -> Option<&'static str> {
        self.names.get(&type_id).copied()
    }

    /// Clone every registered component of `entity` into `builder`.
    ///
    /// Returns the number of components copied.
    pub fn clone_into(
        &self,
        entity: hecs::EntityRef<'_>,
        builder: &mut hecs::EntityBuilder,
    ) -> usize {
        let mut copied = 0;
        for cloner in self.cloners.values() {
            if cloner(entity, builder) {
                copied += 1;
            }
        }
        copied
    }

    /// Get the number of registered component types
    pub fn len(&self) -> usize {
        self.cloners.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.cloners.is_empty()
    }

    /// Create a registry with all default scene components registered
    pub fn with_default_components() -> Self {
        use super::components::{Name, Transform};
        use crate::core::camera::Camera;
        use crate::graphics::Model;

        let mut registry = Self::new();
        registry.register::<Transform>();
        registry.register::<Name>();
        registry.register::<Camera>();
        registry.register::<Model>();

        debug!(
            component_count = registry.len(),
            "Created registry with default components"
        );
        registry
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("registered_types", &self.names.values().collect::<Vec<_>>())
            .finish()
    }
}
