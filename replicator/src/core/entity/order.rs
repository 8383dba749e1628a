//! Traversal order over the hierarchy
//!
//! Keeps a sequence of every entity carrying both [`Hierarchy`] and
//! [`Transform`] such that parents come before their children and siblings
//! appear in sibling-list order. The sequence is only rebuilt when the caller
//! reports a structural change.

use super::components::{Hierarchy, Transform};
use super::hierarchy::children;
use hecs::Entity;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace, warn};

/// How the traversal order is rebuilt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStrategy {
    /// Explicit depth-first walk from the roots, O(n)
    #[default]
    DepthFirst,
    /// Stable sort with a hierarchy comparator, O(n * depth * log n)
    Comparator,
}

/// Maintained parent-before-child sequence of hierarchy entities
#[derive(Debug, Clone)]
pub struct HierarchyOrder {
    strategy: OrderStrategy,
    max_depth: usize,
    entities: Vec<Entity>,
    computed: bool,
}

impl HierarchyOrder {
    /// Create an empty order that will be computed on the first refresh
    pub fn new(strategy: OrderStrategy, max_depth: usize) -> Self {
        Self {
            strategy,
            max_depth,
            entities: Vec::new(),
            computed: false,
        }
    }

    /// Current sequence
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Number of ordered entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the sequence is empty
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Strategy used on rebuild
    pub fn strategy(&self) -> OrderStrategy {
        self.strategy
    }

    /// Rebuild the sequence if `changed` is set or it was never built.
    ///
    /// Returns whether a rebuild happened.
    pub fn refresh(&mut self, world: &hecs::World, changed: bool) -> bool {
        if self.computed && !changed {
            trace!("Skipping order rebuild - hierarchy unchanged");
            return false;
        }

        let layout = Layout::scan(world, &self.entities);
        self.entities = match self.strategy {
            OrderStrategy::DepthFirst => layout.depth_first(world),
            OrderStrategy::Comparator => layout.sorted(world, self.max_depth),
        };
        self.computed = true;

        debug!(
            count = self.entities.len(),
            strategy = ?self.strategy,
            "Rebuilt hierarchy order"
        );
        true
    }
}

/// Snapshot of the relations needed to order them
struct Layout {
    /// Relation-bearing entities, previously ordered ones first
    candidates: Vec<Entity>,
    /// Tie-break rank: position in the previous order, then store order
    ranks: HashMap<Entity, usize>,
    /// Index inside the recorded parent's child list
    positions: HashMap<Entity, usize>,
    /// Parent, only when that parent carries a relation
    parents: HashMap<Entity, Entity>,
}

impl Layout {
    fn scan(world: &hecs::World, previous: &[Entity]) -> Self {
        let mut ranks: HashMap<Entity, usize> = HashMap::new();
        let mut candidates = Vec::new();
        for &entity in previous {
            if world.satisfies::<&Hierarchy>(entity).unwrap_or(false) {
                ranks.insert(entity, ranks.len());
                candidates.push(entity);
            }
        }

        let mut parents = HashMap::new();
        for (entity, h) in world.query::<&Hierarchy>().iter() {
            if !ranks.contains_key(&entity) {
                ranks.insert(entity, previous.len() + ranks.len());
                candidates.push(entity);
            }
            let parent = h
                .parent
                .filter(|&p| world.satisfies::<&Hierarchy>(p).unwrap_or(false));
            if let Some(parent) = parent {
                parents.insert(entity, parent);
            }
        }

        let mut positions = HashMap::new();
        for &entity in &candidates {
            for (index, child) in children(world, entity).enumerate() {
                if parents.get(&child) == Some(&entity) {
                    positions.entry(child).or_insert(index);
                }
            }
        }

        Self {
            candidates,
            ranks,
            positions,
            parents,
        }
    }

    fn rank(&self, entity: Entity) -> usize {
        self.ranks.get(&entity).copied().unwrap_or(usize::MAX)
    }

    /// Children of `parent` in visiting order: linked ones in list order,
    /// then ones that record `parent` without being linked, by rank.
    fn ordered_children(
        &self,
        world: &hecs::World,
        parent: Entity,
        strays: &HashMap<Entity, Vec<Entity>>,
    ) -> Vec<Entity> {
        let mut kids: Vec<Entity> = children(world, parent)
            .filter(|child| self.parents.get(child) == Some(&parent))
            .collect();
        if let Some(extra) = strays.get(&parent) {
            kids.extend(extra.iter().copied());
        }
        kids
    }

    fn depth_first(&self, world: &hecs::World) -> Vec<Entity> {
        let mut roots = Vec::new();
        let mut strays: HashMap<Entity, Vec<Entity>> = HashMap::new();
        for &entity in &self.candidates {
            match self.parents.get(&entity) {
                None => roots.push(entity),
                Some(&parent) if !self.positions.contains_key(&entity) => {
                    strays.entry(parent).or_default().push(entity);
                }
                Some(_) => {}
            }
        }
        // Candidates are already in rank order
        let mut visited = HashSet::with_capacity(self.candidates.len());
        let mut order = Vec::with_capacity(self.candidates.len());
        let mut stack = Vec::new();

        for root in roots {
            stack.push(root);
            while let Some(current) = stack.pop() {
                if !visited.insert(current) {
                    continue;
                }
                if world.satisfies::<&Transform>(current).unwrap_or(false) {
                    order.push(current);
                }
                let kids = self.ordered_children(world, current, &strays);
                stack.extend(kids.into_iter().rev());
            }
        }

        let unreached: Vec<Entity> = self
            .candidates
            .iter()
            .copied()
            .filter(|e| !visited.contains(e))
            .collect();
        if !unreached.is_empty() {
            warn!(
                count = unreached.len(),
                "Entities unreachable from any root, hierarchy likely contains a cycle"
            );
            order.extend(
                unreached
                    .into_iter()
                    .filter(|&e| world.satisfies::<&Transform>(e).unwrap_or(false)),
            );
        }
        order
    }

    /// Sort key: one (list position, rank) pair per level from the root down
    fn path(&self, entity: Entity, max_depth: usize) -> Vec<(usize, usize)> {
        let mut path = Vec::new();
        let mut seen = HashSet::new();
        let mut current = entity;
        loop {
            let position = self.positions.get(&current).copied().unwrap_or(usize::MAX);
            path.push((position, self.rank(current)));
            if !seen.insert(current) || path.len() > max_depth {
                break;
            }
            match self.parents.get(&current) {
                Some(&parent) => current = parent,
                None => break,
            }
        }
        if let Some(root) = path.last_mut() {
            root.0 = 0;
        }
        path.reverse();
        path
    }

    /// A sorts before B if A is an ancestor of B, or if A's branch leaves
    /// their common ancestor before B's branch does.
    fn compare(&self, a: Entity, b: Entity, max_depth: usize) -> Ordering {
        self.path(a, max_depth).cmp(&self.path(b, max_depth))
    }

    fn sorted(&self, world: &hecs::World, max_depth: usize) -> Vec<Entity> {
        let mut order: Vec<Entity> = self
            .candidates
            .iter()
            .copied()
            .filter(|&e| world.satisfies::<&Transform>(e).unwrap_or(false))
            .collect();
        order.sort_by(|&a, &b| self.compare(a, b, max_depth));
        order
    }
}
