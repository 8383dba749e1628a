//! Transform propagation along the hierarchy order

use super::components::{Hierarchy, Transform};
use super::hierarchy::relation;
use glam::Mat4;
use hecs::Entity;
use tracing::trace;

/// World matrix of `entity` if it can act as a parent in this pass
fn parent_world_matrix(world: &hecs::World, entity: Entity) -> Option<Mat4> {
    let parent = relation(world, entity)?.parent?;
    if !world.satisfies::<&Hierarchy>(parent).unwrap_or(false) {
        return None;
    }
    world
        .get::<&Transform>(parent)
        .ok()
        .map(|transform| transform.world_matrix())
}

/// Compute world matrices for every entity in `order`, front to back.
///
/// `order` must list parents before their children. An entity whose parent
/// has no [`Transform`] (or no [`Hierarchy`]) is treated as a root. Entities
/// with a [`Transform`] but no [`Hierarchy`] get world = local.
///
/// Returns the number of world matrices written.
pub fn propagate_transforms(world: &mut hecs::World, order: &[Entity]) -> usize {
    let mut updated = 0;

    for &entity in order {
        let Ok(local) = world
            .get::<&Transform>(entity)
            .map(|transform| transform.local_matrix())
        else {
            trace!(entity = ?entity, "Ordered entity lost its transform, skipping");
            continue;
        };

        let world_matrix = match parent_world_matrix(world, entity) {
            Some(parent) => parent * local,
            None => local,
        };

        if let Ok(transform) = world.query_one_mut::<&mut Transform>(entity) {
            transform.set_world_matrix(world_matrix);
            updated += 1;
        }
    }

    for (_, transform) in world.query_mut::<hecs::Without<&mut Transform, &Hierarchy>>() {
        let local = transform.local_matrix();
        transform.set_world_matrix(local);
        updated += 1;
    }

    trace!(updated, "Transform propagation completed");
    updated
}
