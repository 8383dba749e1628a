//! Whole-subtree duplication and destruction

use super::component_registry::ComponentRegistry;
use super::components::Hierarchy;
use super::hierarchy::{self, attach, descendants, first_child, HierarchyError};
use hecs::Entity;
use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Duplicate `entity` and all of its descendants under `new_parent`.
///
/// Every registered component is cloned; the copies get fresh hierarchy
/// links isomorphic to the source subtree, with sibling order preserved.
/// The source subtree is captured before the first copy is made, so copying
/// a subtree below one of its own descendants is well defined.
///
/// A source without a [`Hierarchy`] is copied alone and left unattached.
/// Nothing is spawned when the copy would sit deeper than `max_depth`.
pub fn deepcopy(
    world: &mut hecs::World,
    registry: &ComponentRegistry,
    entity: Entity,
    new_parent: Option<Entity>,
    max_depth: usize,
) -> Result<Entity, HierarchyError> {
    if !world.contains(entity) {
        return Err(HierarchyError::NoSuchEntity(entity));
    }
    if let Some(parent) = new_parent.filter(|&p| !world.contains(p)) {
        return Err(HierarchyError::NoSuchEntity(parent));
    }

    let has_relation = world.satisfies::<&Hierarchy>(entity).unwrap_or(false);
    if has_relation {
        hierarchy::ensure_fits(world, entity, new_parent, max_depth)?;
    }

    // Pre-order snapshot: (source, index of its parent in the snapshot)
    let mut plan: Vec<(Entity, Option<usize>)> = vec![(entity, None)];
    if has_relation {
        let mut index_of = HashMap::from([(entity, 0)]);
        for descendant in descendants(world, entity) {
            let parent_index = hierarchy::parent(world, descendant)
                .and_then(|p| index_of.get(&p).copied());
            index_of.insert(descendant, plan.len());
            plan.push((descendant, parent_index));
        }
    } else if new_parent.is_some() {
        debug!(entity = ?entity, "Source has no hierarchy relation, copy left unattached");
    }

    let mut copies = Vec::with_capacity(plan.len());
    for (source, parent_index) in plan {
        let copy = duplicate(world, registry, source)?;
        if has_relation {
            let parent = match parent_index {
                Some(index) => Some(copies[index]),
                None => new_parent,
            };
            attach(world, copy, parent, max_depth)?;
        }
        copies.push(copy);
    }

    debug!(
        source = ?entity,
        copy = ?copies[0],
        count = copies.len(),
        "Deep-copied subtree"
    );
    Ok(copies[0])
}

/// Spawn a new entity holding clones of the registered components of `source`
fn duplicate(
    world: &mut hecs::World,
    registry: &ComponentRegistry,
    source: Entity,
) -> Result<Entity, HierarchyError> {
    let mut builder = hecs::EntityBuilder::new();
    {
        let source_ref = world
            .entity(source)
            .map_err(|_| HierarchyError::NoSuchEntity(source))?;
        registry.clone_into(source_ref, &mut builder);

        for type_id in source_ref.component_types() {
            if type_id != TypeId::of::<Hierarchy>() && !registry.is_registered_id(type_id) {
                warn!(
                    entity = ?source,
                    type_id = ?type_id,
                    "Component has no registered cloner, not copied"
                );
            }
        }
    }
    Ok(world.spawn(builder.build()))
}

/// Unlink `entity` from the hierarchy and destroy it. Its children are left
/// in place and become roots.
///
/// Returns whether the entity existed.
pub fn despawn(world: &mut hecs::World, entity: Entity) -> bool {
    hierarchy::detach(world, entity);
    world.despawn(entity).is_ok()
}

/// Destroy `entity` and all of its descendants, children before parents.
///
/// The walk keeps the current path on an explicit stack, so chain length is
/// not limited by the call stack.
///
/// Returns the number of entities removed.
pub fn deepdelete(world: &mut hecs::World, entity: Entity) -> usize {
    if !world.contains(entity) {
        return 0;
    }

    let mut removed = 0;
    let mut path = vec![entity];
    let mut on_path = HashSet::from([entity]);
    while let Some(&current) = path.last() {
        match first_child(world, current) {
            Some(child) if on_path.insert(child) => path.push(child),
            _ => {
                path.pop();
                on_path.remove(&current);
                if despawn(world, current) {
                    removed += 1;
                }
            }
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::components::{Name, Transform};
    use crate::core::entity::hierarchy::{children, validate_hierarchy, DEFAULT_MAX_DEPTH};
    use glam::Vec3;

    fn spawn(world: &mut hecs::World, name: &str, parent: Option<Entity>) -> Entity {
        let entity = world.spawn((Name::new(name), Transform::default()));
        attach(world, entity, parent, DEFAULT_MAX_DEPTH).unwrap();
        entity
    }

    fn name(world: &hecs::World, entity: Entity) -> String {
        world.get::<&Name>(entity).unwrap().0.clone()
    }

    fn shape(world: &hecs::World, entity: Entity) -> String {
        let kids: Vec<String> = children(world, entity).map(|c| shape(world, c)).collect();
        if kids.is_empty() {
            name(world, entity)
        } else {
            format!("{}({})", name(world, entity), kids.join(","))
        }
    }

    #[test]
    fn test_deepcopy_preserves_shape() {
        let registry = ComponentRegistry::with_default_components();
        let mut world = hecs::World::new();
        let root = spawn(&mut world, "r", None);
        let a = spawn(&mut world, "a", Some(root));
        spawn(&mut world, "b", Some(root));
        spawn(&mut world, "c", Some(a));
        spawn(&mut world, "d", Some(a));
        let target = spawn(&mut world, "t", None);

        let copy = deepcopy(&mut world, &registry, root, Some(target), DEFAULT_MAX_DEPTH).unwrap();

        assert_ne!(copy, root);
        assert_eq!(shape(&world, copy), "r(a(c,d),b)");
        assert_eq!(shape(&world, target), "t(r(a(c,d),b))");
        assert_eq!(shape(&world, root), "r(a(c,d),b)");
        assert_eq!(world.len(), 11);
        assert!(validate_hierarchy(&world).is_empty());
    }

    #[test]
    fn test_deepcopy_is_a_value_copy() {
        let registry = ComponentRegistry::with_default_components();
        let mut world = hecs::World::new();
        let root = spawn(&mut world, "r", None);
        let child = spawn(&mut world, "c", Some(root));

        let copy = deepcopy(&mut world, &registry, root, None, DEFAULT_MAX_DEPTH).unwrap();
        let copied_child = first_child(&world, copy).unwrap();
        assert_ne!(copied_child, child);

        world
            .get::<&mut Transform>(copied_child)
            .unwrap()
            .translate_global(Vec3::X);

        assert_eq!(world.get::<&Transform>(child).unwrap().translation, Vec3::ZERO);
        assert_eq!(world.get::<&Transform>(copied_child).unwrap().translation, Vec3::X);
    }

    #[test]
    fn test_deepcopy_under_own_descendant_terminates() {
        let registry = ComponentRegistry::with_default_components();
        let mut world = hecs::World::new();
        let root = spawn(&mut world, "r", None);
        let leaf = spawn(&mut world, "l", Some(root));

        deepcopy(&mut world, &registry, root, Some(leaf), DEFAULT_MAX_DEPTH).unwrap();

        assert_eq!(shape(&world, root), "r(l(r(l)))");
        assert_eq!(world.len(), 4);
    }

    #[test]
    fn test_deepcopy_without_relation() {
        let registry = ComponentRegistry::with_default_components();
        let mut world = hecs::World::new();
        let loose = world.spawn((Name::new("loose"),));
        let parent = spawn(&mut world, "p", None);

        let copy = deepcopy(&mut world, &registry, loose, Some(parent), DEFAULT_MAX_DEPTH).unwrap();

        assert_eq!(name(&world, copy), "loose");
        assert!(world.get::<&Hierarchy>(copy).is_err());
        assert_eq!(children(&world, parent).count(), 0);
    }

    #[test]
    fn test_deepcopy_missing_entity() {
        let registry = ComponentRegistry::new();
        let mut world = hecs::World::new();
        let gone = world.spawn(());
        world.despawn(gone).unwrap();

        assert_eq!(
            deepcopy(&mut world, &registry, gone, None, DEFAULT_MAX_DEPTH),
            Err(HierarchyError::NoSuchEntity(gone))
        );
    }

    #[test]
    fn test_deepdelete_removes_exactly_the_subtree() {
        let mut world = hecs::World::new();
        let root = spawn(&mut world, "r", None);
        let a = spawn(&mut world, "a", Some(root));
        let b = spawn(&mut world, "b", Some(root));
        let c = spawn(&mut world, "c", Some(a));
        let other = spawn(&mut world, "o", None);
        let keeper = spawn(&mut world, "k", Some(other));

        assert_eq!(deepdelete(&mut world, root), 4);

        for gone in [root, a, b, c] {
            assert!(!world.contains(gone));
        }
        assert!(world.contains(other));
        assert!(world.contains(keeper));
        assert_eq!(world.len(), 2);
        assert!(validate_hierarchy(&world).is_empty());
    }

    #[test]
    fn test_deepdelete_inner_node_unlinks_from_parent() {
        let mut world = hecs::World::new();
        let root = spawn(&mut world, "r", None);
        let a = spawn(&mut world, "a", Some(root));
        spawn(&mut world, "x", Some(a));
        spawn(&mut world, "b", Some(root));

        assert_eq!(deepdelete(&mut world, a), 2);
        assert_eq!(shape(&world, root), "r(b)");
        assert!(validate_hierarchy(&world).is_empty());
        assert_eq!(deepdelete(&mut world, a), 0);
    }
    /// Chain linked directly through the components, one entity per level
    fn linked_chain(world: &mut hecs::World, len: usize) -> Vec<Entity> {
        let chain: Vec<Entity> = (0..len).map(|_| world.spawn(())).collect();
        for (i, &entity) in chain.iter().enumerate() {
            let relation = Hierarchy {
                parent: i.checked_sub(1).map(|p| chain[p]),
                first_child: chain.get(i + 1).copied(),
                next_sibling: None,
                prev_sibling: None,
            };
            world.insert_one(entity, relation).unwrap();
        }
        chain
    }

    #[test]
    fn test_deepdelete_long_chain() {
        let mut world = hecs::World::new();
        let chain = linked_chain(&mut world, 20_000);
        let other = spawn(&mut world, "o", None);
        assert!(validate_hierarchy(&world).is_empty());

        assert_eq!(deepdelete(&mut world, chain[0]), 20_000);
        assert_eq!(world.len(), 1);
        assert!(world.contains(other));
    }

    #[test]
    fn test_deepdelete_mid_chain_past_depth_cap() {
        let mut world = hecs::World::new();
        let chain = linked_chain(&mut world, DEFAULT_MAX_DEPTH + 100);

        assert_eq!(deepdelete(&mut world, chain[50]), DEFAULT_MAX_DEPTH + 50);
        assert_eq!(world.len(), 50);
        assert_eq!(first_child(&world, chain[49]), None);
        assert!(validate_hierarchy(&world).is_empty());
    }

    #[test]
    fn test_deepdelete_survives_looping_child_links() {
        let mut world = hecs::World::new();
        let chain = linked_chain(&mut world, 3);
        // Leaf points back at the root as its first child
        world.get::<&mut Hierarchy>(chain[2]).unwrap().first_child = Some(chain[0]);

        assert_eq!(deepdelete(&mut world, chain[0]), 3);
        assert!(world.is_empty());
    }

    #[test]
    fn test_deepcopy_rejects_copy_past_depth_cap() {
        let registry = ComponentRegistry::with_default_components();
        let mut world = hecs::World::new();
        let source = spawn(&mut world, "s", None);
        let child = world.spawn((Name::new("c"), Transform::default()));
        attach(&mut world, child, Some(source), 3).unwrap();
        let mut anchor = spawn(&mut world, "a0", None);
        for level in 1..3 {
            let next = world.spawn((Name::new(format!("a{level}")), Transform::default()));
            attach(&mut world, next, Some(anchor), 3).unwrap();
            anchor = next;
        }
        let before = world.len();

        // anchor sits two levels down; s(c) would reach level four
        assert_eq!(
            deepcopy(&mut world, &registry, source, Some(anchor), 3),
            Err(HierarchyError::DepthExceeded {
                entity: source,
                parent: Some(anchor),
                max_depth: 3,
            })
        );
        assert_eq!(world.len(), before);

        let parent = hierarchy::parent(&world, anchor);
        assert!(deepcopy(&mut world, &registry, source, parent, 3).is_ok());
    }
}
