//! World wrapper owning the entity store and per-frame hierarchy state

use super::component_registry::ComponentRegistry;
use super::components::{Hierarchy, Transform};
use super::deepcopy;
use super::hierarchy::{self, Children, Descendants, HierarchyError, HierarchyIssue};
use super::order::HierarchyOrder;
use super::propagation::propagate_transforms;
use crate::config::SceneConfig;
use crate::core::camera::CurrentCamera;
use crate::geometry::{self, Aabb, Ray};
use glam::Vec2;
use hecs::Entity;
use std::any::{Any, TypeId};
use tracing::{debug, trace, warn};

/// Wrapper around hecs::World that keeps the traversal order in sync with
/// structural edits.
///
/// Structural operations report whether they changed the hierarchy; the
/// wrapper accumulates that into a flag consumed by the next
/// [`World::update`].
pub struct World {
    inner: hecs::World,
    config: SceneConfig,
    order: HierarchyOrder,
    hierarchy_changed: bool,
    registry: ComponentRegistry,
    current_camera: CurrentCamera,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Create a new empty world with the default configuration
    pub fn new() -> Self {
        Self::with_config(SceneConfig::default())
    }

    /// Create a new empty world
    pub fn with_config(config: SceneConfig) -> Self {
        debug!(
            order_strategy = ?config.order_strategy,
            max_hierarchy_depth = config.max_hierarchy_depth,
            "Creating world"
        );
        Self {
            inner: hecs::World::new(),
            order: HierarchyOrder::new(config.order_strategy, config.max_hierarchy_depth),
            config,
            hierarchy_changed: false,
            registry: ComponentRegistry::with_default_components(),
            current_camera: CurrentCamera::default(),
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Spawn a new entity with the given components.
    ///
    /// A [`Hierarchy`] in the bundle is linked like [`World::insert_one`]
    /// links one.
    pub fn spawn(&mut self, components: impl hecs::DynamicBundle) -> Entity {
        let entity = self.inner.spawn(components);
        if let Ok(relation) = self.inner.query_one_mut::<&mut Hierarchy>(entity) {
            let parent = std::mem::take(relation).parent;
            self.link_inserted(entity, parent);
        }
        entity
    }

    /// Get a reference to a component on an entity
    pub fn get<T: hecs::Component>(
        &self,
        entity: Entity,
    ) -> Result<hecs::Ref<'_, T>, hecs::ComponentError> {
        self.inner.get::<&T>(entity)
    }

    /// Get a mutable reference to a component on an entity
    pub fn get_mut<T: hecs::Component>(
        &self,
        entity: Entity,
    ) -> Result<hecs::RefMut<'_, T>, hecs::ComponentError> {
        self.inner.get::<&mut T>(entity)
    }

    /// Query a single entity
    pub fn query_one_mut<Q: hecs::Query>(
        &mut self,
        entity: Entity,
    ) -> Result<Q::Item<'_>, hecs::QueryOneError> {
        self.inner.query_one_mut::<Q>(entity)
    }

    /// Query entities with specific components
    pub fn query<Q: hecs::Query>(&self) -> hecs::QueryBorrow<'_, Q> {
        self.inner.query()
    }

    /// Query entities with specific components (mutable)
    pub fn query_mut<Q: hecs::Query>(&mut self) -> hecs::QueryMut<'_, Q> {
        self.inner.query_mut()
    }

    /// Insert or replace a component on an entity.
    ///
    /// Adding a [`Transform`] or [`Hierarchy`] changes which entities the
    /// traversal order covers, so it marks the hierarchy changed.
    ///
    /// A [`Hierarchy`] is not stored as given: the entity is attached under
    /// the relation's parent and keeps its own children. Its sibling and
    /// child links are ignored. A parent that cannot be used leaves the
    /// entity a root.
    pub fn insert_one<T: hecs::Component>(
        &mut self,
        entity: Entity,
        component: T,
    ) -> Result<(), hecs::NoSuchEntity> {
        if let Some(relation) = (&component as &dyn Any).downcast_ref::<Hierarchy>() {
            if !self.inner.contains(entity) {
                return Err(hecs::NoSuchEntity);
            }
            self.link_inserted(entity, relation.parent);
            return Ok(());
        }
        self.inner.insert_one(entity, component)?;
        if affects_order::<T>() {
            self.hierarchy_changed = true;
        }
        Ok(())
    }

    /// Attach a live `entity` under `parent`, falling back to a root
    fn link_inserted(&mut self, entity: Entity, parent: Option<Entity>) {
        if let Err(err) = self.attach(entity, parent) {
            warn!(entity = ?entity, parent = ?parent, %err, "Relation parent rejected, entity left as root");
            let _ = self.attach(entity, None);
        }
        self.hierarchy_changed = true;
    }

    /// Remove a component from an entity.
    ///
    /// Removing a [`Hierarchy`] unlinks the entity from its parent first.
    pub fn remove_one<T: hecs::Component>(
        &mut self,
        entity: Entity,
    ) -> Result<T, hecs::ComponentError> {
        if TypeId::of::<T>() == TypeId::of::<Hierarchy>() {
            hierarchy::detach(&mut self.inner, entity);
        }
        let component = self.inner.remove_one::<T>(entity)?;
        if affects_order::<T>() {
            self.hierarchy_changed = true;
        }
        Ok(component)
    }

    /// Unlink an entity from the hierarchy and destroy it. Its children stay
    /// alive and become roots.
    pub fn despawn(&mut self, entity: Entity) -> Result<(), hecs::NoSuchEntity> {
        let unlinked = hierarchy::detach(&mut self.inner, entity);
        self.inner.despawn(entity)?;
        self.hierarchy_changed |= unlinked;
        debug!(entity = ?entity, "Despawned entity");
        Ok(())
    }

    /// Check if an entity exists
    pub fn contains(&self, entity: Entity) -> bool {
        self.inner.contains(entity)
    }

    /// Number of live entities
    pub fn len(&self) -> u32 {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Get access to the inner hecs::World for advanced operations
    pub fn inner(&self) -> &hecs::World {
        &self.inner
    }

    /// Get mutable access to the inner hecs::World.
    ///
    /// Structural edits made through it are not tracked; call
    /// [`World::mark_hierarchy_changed`] afterwards.
    pub fn inner_mut(&mut self) -> &mut hecs::World {
        &mut self.inner
    }

    /// Force the next update to rebuild the traversal order
    pub fn mark_hierarchy_changed(&mut self) {
        self.hierarchy_changed = true;
    }

    /// Whether a structural change is pending
    pub fn hierarchy_changed(&self) -> bool {
        self.hierarchy_changed
    }

    /// Attach `entity` under `parent`, or make it a root with `None`
    pub fn attach(&mut self, entity: Entity, parent: Option<Entity>) -> Result<bool, HierarchyError> {
        let changed = hierarchy::attach(
            &mut self.inner,
            entity,
            parent,
            self.config.max_hierarchy_depth,
        )?;
        self.hierarchy_changed |= changed;
        Ok(changed)
    }

    /// Detach `entity` from its parent; it keeps its children
    pub fn detach(&mut self, entity: Entity) -> bool {
        let changed = hierarchy::detach(&mut self.inner, entity);
        self.hierarchy_changed |= changed;
        changed
    }

    /// Detach `entity` and drop its [`Hierarchy`] component
    pub fn remove_hierarchy(&mut self, entity: Entity) -> bool {
        let changed = hierarchy::remove(&mut self.inner, entity);
        self.hierarchy_changed |= changed;
        changed
    }

    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        hierarchy::parent(&self.inner, entity)
    }

    pub fn children(&self, entity: Entity) -> Children<'_> {
        hierarchy::children(&self.inner, entity)
    }

    pub fn descendants(&self, entity: Entity) -> Descendants<'_> {
        hierarchy::descendants(&self.inner, entity)
    }

    /// Parent chain of `entity`, nearest first
    pub fn ancestors(&self, entity: Entity) -> Vec<Entity> {
        hierarchy::ancestors(&self.inner, entity, self.config.max_hierarchy_depth)
    }

    /// True if `ancestor` is `candidate` or lies on its parent chain
    pub fn is_ancestor_of(&self, ancestor: Entity, candidate: Entity) -> bool {
        hierarchy::is_ancestor_of(
            &self.inner,
            ancestor,
            candidate,
            self.config.max_hierarchy_depth,
        )
    }

    /// Check the sibling-list invariants
    pub fn validate(&self) -> Vec<HierarchyIssue> {
        hierarchy::validate_hierarchy(&self.inner)
    }

    /// Mark `T`-bearing entities in the subtree of `entity` as dirty
    pub fn mark_dirty_recursive<T: hecs::Component>(&mut self, entity: Entity) -> usize {
        hierarchy::mark_dirty_recursive::<T>(&mut self.inner, entity)
    }

    /// Drain the `Dirty<T>` markers
    pub fn take_dirty<T: hecs::Component>(&mut self) -> Vec<Entity> {
        hierarchy::take_dirty::<T>(&mut self.inner)
    }

    /// Current traversal order, parents before children
    pub fn order(&self) -> &[Entity] {
        self.order.entities()
    }

    /// Rebuild the traversal order if the hierarchy changed since the last
    /// rebuild, and clear the flag. Returns whether it rebuilt.
    pub fn refresh_order(&mut self) -> bool {
        let changed = std::mem::take(&mut self.hierarchy_changed);
        self.order.refresh(&self.inner, changed)
    }

    /// Recompute every world matrix from the current traversal order.
    ///
    /// Does not refresh the order; see [`World::update`].
    pub fn run_transform_propagation(&mut self) -> usize {
        propagate_transforms(&mut self.inner, self.order.entities())
    }

    /// Per-frame step: refresh the order if needed, then propagate.
    ///
    /// Returns the number of world matrices written.
    pub fn update(&mut self) -> usize {
        self.refresh_order();
        let updated = self.run_transform_propagation();
        trace!(updated, "World update completed");
        updated
    }

    /// Make `T` copyable by [`World::deepcopy`]
    pub fn register_cloneable<T: hecs::Component + Clone>(&mut self) {
        self.registry.register::<T>();
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Copy `entity` and its subtree under `parent`; returns the copy's root
    pub fn deepcopy(&mut self, entity: Entity, parent: Option<Entity>) -> Result<Entity, HierarchyError> {
        let copy = deepcopy::deepcopy(
            &mut self.inner,
            &self.registry,
            entity,
            parent,
            self.config.max_hierarchy_depth,
        )?;
        self.hierarchy_changed = true;
        Ok(copy)
    }

    /// Destroy `entity` and its subtree; returns how many entities went away
    pub fn deepdelete(&mut self, entity: Entity) -> usize {
        let removed = deepcopy::deepdelete(&mut self.inner, entity);
        if removed > 0 {
            self.hierarchy_changed = true;
        }
        removed
    }

    pub fn set_current_camera(&mut self, camera: Option<Entity>) {
        self.current_camera = CurrentCamera(camera);
    }

    pub fn current_camera(&self) -> Option<Entity> {
        self.current_camera.0
    }

    /// World-space bounds of the geometry in the subtree of `entity`
    pub fn bounding_box(&self, entity: Entity) -> Aabb {
        geometry::bounding_box(&self.inner, entity)
    }

    /// Picking ray through a pixel of the current camera
    pub fn ray_from_screen(&self, screen: Vec2, viewport: Vec2) -> Option<Ray> {
        Ray::from_screen(&self.inner, self.current_camera, screen, viewport)
    }
}

fn affects_order<T: 'static>() -> bool {
    let type_id = TypeId::of::<T>();
    type_id == TypeId::of::<Transform>() || type_id == TypeId::of::<Hierarchy>()
}
