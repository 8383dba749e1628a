//! Intrusive parent/child linkage between entities
//!
//! Every entity taking part in a tree carries a [`Hierarchy`] component. A
//! parent points at the head of its child list, and the children are chained
//! through `next_sibling`/`prev_sibling`. New children are appended at the
//! tail so sibling order is insertion order.
//!
//! Links are plain entity ids. A link to an entity that is no longer alive,
//! or that carries no [`Hierarchy`], is read as "none" everywhere it is
//! followed.

use super::components::{Dirty, Hierarchy};
use hecs::Entity;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Default cap on tree depth and on parent-chain walks
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// Errors raised by structural hierarchy edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HierarchyError {
    #[error("entity {0:?} does not exist")]
    NoSuchEntity(Entity),

    #[error("attaching {entity:?} under {parent:?} would create a cycle")]
    CycleDetected { entity: Entity, parent: Entity },

    #[error("placing {entity:?} under {parent:?} would exceed {max_depth} levels")]
    DepthExceeded {
        entity: Entity,
        parent: Option<Entity>,
        max_depth: usize,
    },
}

/// Invariant violations reported by [`validate_hierarchy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HierarchyIssue {
    #[error("{child:?} is first child of {parent:?} but records parent {recorded:?}")]
    FirstChildParentMismatch {
        parent: Entity,
        child: Entity,
        recorded: Option<Entity>,
    },

    #[error("siblings {entity:?} and {next:?} record different parents")]
    SiblingParentMismatch { entity: Entity, next: Entity },

    #[error("{next:?} follows {entity:?} but its prev link is {recorded:?}")]
    BrokenBackLink {
        entity: Entity,
        next: Entity,
        recorded: Option<Entity>,
    },

    #[error("first child {child:?} of {parent:?} has a previous sibling")]
    HeadHasPrevious { parent: Entity, child: Entity },

    #[error("child list of {parent:?} loops")]
    SiblingCycle { parent: Entity },

    #[error("{entity:?} links to missing entity {target:?}")]
    DanglingLink { entity: Entity, target: Entity },
}

/// Copy of an entity's relation, if it has one
pub fn relation(world: &hecs::World, entity: Entity) -> Option<Hierarchy> {
    world.get::<&Hierarchy>(entity).ok().map(|h| *h)
}

fn relation_mut(world: &mut hecs::World, entity: Entity) -> Option<&mut Hierarchy> {
    world.query_one_mut::<&mut Hierarchy>(entity).ok()
}

fn has_relation(world: &hecs::World, entity: Entity) -> bool {
    world.satisfies::<&Hierarchy>(entity).unwrap_or(false)
}

fn live_link(world: &hecs::World, link: Option<Entity>) -> Option<Entity> {
    link.filter(|&e| has_relation(world, e))
}

/// Recorded parent of `entity`, if it is still alive
pub fn parent(world: &hecs::World, entity: Entity) -> Option<Entity> {
    relation(world, entity)?
        .parent
        .filter(|&p| world.contains(p))
}

/// Head of `entity`'s child list
pub fn first_child(world: &hecs::World, entity: Entity) -> Option<Entity> {
    live_link(world, relation(world, entity)?.first_child)
}

/// Next sibling of `entity`
pub fn next_sibling(world: &hecs::World, entity: Entity) -> Option<Entity> {
    live_link(world, relation(world, entity)?.next_sibling)
}

/// Previous sibling of `entity`
pub fn prev_sibling(world: &hecs::World, entity: Entity) -> Option<Entity> {
    live_link(world, relation(world, entity)?.prev_sibling)
}

/// Outcome of a capped walk up a parent chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ancestry {
    /// The target was reached
    Found,
    /// The chain ended after `links` parent steps
    Root { links: usize },
    /// The chain is longer than the cap
    TooDeep,
}

/// Follow parent links from `candidate` until `target` is met, the chain
/// ends, or `max_links` steps have been taken. With no target the walk only
/// measures the chain.
fn ancestry(
    world: &hecs::World,
    target: Option<Entity>,
    candidate: Entity,
    max_links: usize,
) -> Ancestry {
    let mut current = candidate;
    let mut links = 0;
    loop {
        if Some(current) == target {
            return Ancestry::Found;
        }
        let Some(p) = parent(world, current) else {
            return Ancestry::Root { links };
        };
        if links == max_links {
            return Ancestry::TooDeep;
        }
        links += 1;
        current = p;
    }
}

/// Longest child chain below `entity`, in levels
fn subtree_height(world: &hecs::World, entity: Entity) -> usize {
    let mut height = 0;
    let mut stack = vec![(entity, 0)];
    let mut visited = HashSet::new();
    while let Some((current, level)) = stack.pop() {
        if !visited.insert(current) {
            continue;
        }
        height = height.max(level);
        stack.extend(children(world, current).map(|child| (child, level + 1)));
    }
    height
}

/// Check that the subtree rooted at `entity` stays within `max_depth`
/// levels when placed under `parent`.
///
/// A parent chain longer than the cap fails the check as well.
pub(crate) fn ensure_fits(
    world: &hecs::World,
    entity: Entity,
    parent: Option<Entity>,
    max_depth: usize,
) -> Result<(), HierarchyError> {
    let base = match parent.map(|p| ancestry(world, None, p, max_depth)) {
        None => Some(0),
        Some(Ancestry::Root { links }) => Some(links + 1),
        Some(_) => None,
    };
    match base {
        Some(base) if base + subtree_height(world, entity) <= max_depth => Ok(()),
        _ => Err(HierarchyError::DepthExceeded {
            entity,
            parent,
            max_depth,
        }),
    }
}

/// Returns true if `ancestor` is reachable from `candidate` by following
/// parent links zero or more times. An entity counts as its own ancestor.
///
/// The walk gives up after `max_depth` steps and returns false. Trees built
/// through [`attach`] never reach that point.
pub fn is_ancestor_of(
    world: &hecs::World,
    ancestor: Entity,
    candidate: Entity,
    max_depth: usize,
) -> bool {
    match ancestry(world, Some(ancestor), candidate, max_depth) {
        Ancestry::Found => true,
        Ancestry::Root { .. } => false,
        Ancestry::TooDeep => {
            warn!(
                candidate = ?candidate,
                max_depth,
                "Parent chain exceeds maximum depth, assuming no ancestry"
            );
            false
        }
    }
}

/// Parent chain of `entity`, nearest first, capped at `max_depth` entries
pub fn ancestors(world: &hecs::World, entity: Entity, max_depth: usize) -> Vec<Entity> {
    let mut chain = Vec::new();
    let mut current = entity;
    while let Some(p) = parent(world, current) {
        if chain.len() == max_depth {
            warn!(entity = ?entity, max_depth, "Ancestor walk truncated");
            break;
        }
        chain.push(p);
        current = p;
    }
    chain
}

/// Iterator over the child list of an entity, in sibling order
pub struct Children<'w> {
    world: &'w hecs::World,
    next: Option<Entity>,
    remaining: usize,
}

impl Iterator for Children<'_> {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        let current = self.next?;
        if self.remaining == 0 {
            warn!(entity = ?current, "Sibling list longer than the world, stopping");
            self.next = None;
            return None;
        }
        self.remaining -= 1;
        self.next = next_sibling(self.world, current);
        Some(current)
    }
}

/// Children of `entity` in sibling-list order
pub fn children(world: &hecs::World, entity: Entity) -> Children<'_> {
    Children {
        world,
        next: first_child(world, entity),
        remaining: world.len() as usize,
    }
}

/// Depth-first pre-order iterator over the descendants of an entity
pub struct Descendants<'w> {
    world: &'w hecs::World,
    stack: Vec<Entity>,
    visited: HashSet<Entity>,
}

impl Descendants<'_> {
    fn push_children(&mut self, entity: Entity) {
        let start = self.stack.len();
        self.stack.extend(children(self.world, entity));
        self.stack[start..].reverse();
    }
}

impl Iterator for Descendants<'_> {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        while let Some(current) = self.stack.pop() {
            if !self.visited.insert(current) {
                warn!(entity = ?current, "Entity reached twice while walking a subtree");
                continue;
            }
            self.push_children(current);
            return Some(current);
        }
        None
    }
}

/// Descendants of `entity` (excluding itself), parents before children
pub fn descendants(world: &hecs::World, entity: Entity) -> Descendants<'_> {
    let mut iter = Descendants {
        world,
        stack: Vec::new(),
        visited: HashSet::from([entity]),
    };
    iter.push_children(entity);
    iter
}

/// Unlink `entity` from its parent's child list. Its own children stay.
fn unlink(world: &mut hecs::World, entity: Entity) -> bool {
    let Some(h) = relation(world, entity) else {
        return false;
    };
    let prev = live_link(world, h.prev_sibling);
    let next = live_link(world, h.next_sibling);
    let parent = live_link(world, h.parent);

    match prev {
        Some(prev) => {
            if let Some(prev_h) = relation_mut(world, prev) {
                prev_h.next_sibling = next;
            }
        }
        None => {
            if let Some(parent_h) = parent.and_then(|p| relation_mut(world, p)) {
                if parent_h.first_child == Some(entity) {
                    parent_h.first_child = next;
                }
            }
        }
    }
    if let Some(next_h) = next.and_then(|n| relation_mut(world, n)) {
        next_h.prev_sibling = prev;
    }

    if let Some(h) = relation_mut(world, entity) {
        h.parent = None;
        h.prev_sibling = None;
        h.next_sibling = None;
    }
    true
}

/// Attach `entity` under `parent`, or make it a root when `parent` is `None`.
///
/// The entity is appended at the tail of the parent's child list. An entity
/// that already has a relation is moved together with its subtree. If the
/// parent has no relation of its own the parent is recorded but nothing is
/// linked.
///
/// Fails with [`HierarchyError::CycleDetected`] when `parent` lies inside the
/// entity's subtree, and with [`HierarchyError::DepthExceeded`] when the
/// moved subtree would end up more than `max_depth` levels below a root. A
/// parent chain too long to inspect counts as exceeding the cap, so the
/// cycle check never passes on a partial walk.
///
/// Returns whether the hierarchy changed, which is always true on success.
pub fn attach(
    world: &mut hecs::World,
    entity: Entity,
    parent: Option<Entity>,
    max_depth: usize,
) -> Result<bool, HierarchyError> {
    if !world.contains(entity) {
        return Err(HierarchyError::NoSuchEntity(entity));
    }
    if let Some(p) = parent {
        if !world.contains(p) {
            return Err(HierarchyError::NoSuchEntity(p));
        }
        if ancestry(world, Some(entity), p, max_depth) == Ancestry::Found {
            return Err(HierarchyError::CycleDetected { entity, parent: p });
        }
        ensure_fits(world, entity, parent, max_depth)?;
    }

    if !unlink(world, entity) {
        world
            .insert_one(entity, Hierarchy::default())
            .map_err(|_| HierarchyError::NoSuchEntity(entity))?;
    }

    let mut prev = None;
    if let Some(p) = parent.filter(|&p| has_relation(world, p)) {
        match first_child(world, p) {
            None => {
                if let Some(parent_h) = relation_mut(world, p) {
                    parent_h.first_child = Some(entity);
                }
            }
            Some(head) => {
                let tail = children(world, p).last().unwrap_or(head);
                if let Some(tail_h) = relation_mut(world, tail) {
                    tail_h.next_sibling = Some(entity);
                }
                prev = Some(tail);
            }
        }
    } else if let Some(p) = parent {
        debug!(
            entity = ?entity,
            parent = ?p,
            "Parent has no hierarchy relation, recording parent without linking"
        );
    }

    if let Some(h) = relation_mut(world, entity) {
        h.parent = parent;
        h.prev_sibling = prev;
    }

    debug!(entity = ?entity, parent = ?parent, "Attached entity");
    Ok(true)
}

/// Remove `entity` from its parent's child list, leaving it a root that keeps
/// its own children.
///
/// Returns whether the hierarchy changed.
pub fn detach(world: &mut hecs::World, entity: Entity) -> bool {
    let changed = unlink(world, entity);
    if changed {
        debug!(entity = ?entity, "Detached entity");
    }
    changed
}

/// Detach `entity` and drop its relation component.
///
/// Its former children keep recording it as parent and are treated as roots
/// from now on.
pub fn remove(world: &mut hecs::World, entity: Entity) -> bool {
    if !unlink(world, entity) {
        return false;
    }
    let _ = world.remove_one::<Hierarchy>(entity);
    debug!(entity = ?entity, "Removed hierarchy relation");
    true
}

/// Insert a `Dirty<T>` marker on every entity of the subtree rooted at
/// `entity` that carries a `T`. Returns how many markers were added.
pub fn mark_dirty_recursive<T: hecs::Component>(world: &mut hecs::World, entity: Entity) -> usize {
    let targets: Vec<Entity> = std::iter::once(entity)
        .chain(descendants(world, entity))
        .filter(|&e| {
            world.satisfies::<&T>(e).unwrap_or(false)
                && !world.satisfies::<&Dirty<T>>(e).unwrap_or(false)
        })
        .collect();

    for &target in &targets {
        let _ = world.insert_one(target, Dirty::<T>::new());
    }
    targets.len()
}

/// Remove every `Dirty<T>` marker and return the entities that carried one
pub fn take_dirty<T: hecs::Component>(world: &mut hecs::World) -> Vec<Entity> {
    let marked: Vec<Entity> = world
        .query::<&Dirty<T>>()
        .iter()
        .map(|(entity, _)| entity)
        .collect();
    for &entity in &marked {
        let _ = world.remove_one::<Dirty<T>>(entity);
    }
    marked
}

/// Check the sibling-list invariants of every relation in the world
pub fn validate_hierarchy(world: &hecs::World) -> Vec<HierarchyIssue> {
    let mut issues = Vec::new();
    let limit = world.len() as usize;

    for (entity, h) in world.query::<&Hierarchy>().iter() {
        for target in [h.parent, h.first_child, h.next_sibling, h.prev_sibling]
            .into_iter()
            .flatten()
        {
            if !world.contains(target) {
                issues.push(HierarchyIssue::DanglingLink { entity, target });
            }
        }

        let Some(head) = live_link(world, h.first_child) else {
            continue;
        };
        let head_h = relation(world, head).unwrap_or_default();
        if head_h.parent != Some(entity) {
            issues.push(HierarchyIssue::FirstChildParentMismatch {
                parent: entity,
                child: head,
                recorded: head_h.parent,
            });
        }
        if head_h.prev_sibling.is_some() {
            issues.push(HierarchyIssue::HeadHasPrevious {
                parent: entity,
                child: head,
            });
        }

        let mut current = head;
        let mut steps = 0;
        while let Some(next) = next_sibling(world, current) {
            steps += 1;
            if steps > limit {
                issues.push(HierarchyIssue::SiblingCycle { parent: entity });
                break;
            }
            let current_h = relation(world, current).unwrap_or_default();
            let next_h = relation(world, next).unwrap_or_default();
            if current_h.parent != next_h.parent {
                issues.push(HierarchyIssue::SiblingParentMismatch {
                    entity: current,
                    next,
                });
            }
            if next_h.prev_sibling != Some(current) {
                issues.push(HierarchyIssue::BrokenBackLink {
                    entity: current,
                    next,
                    recorded: next_h.prev_sibling,
                });
            }
            current = next;
        }
    }

    for issue in &issues {
        warn!(%issue, "Hierarchy validation issue");
    }
    issues
}
