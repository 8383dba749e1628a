//! Bounding boxes of entity subtrees

use super::aabb::Aabb;
use crate::core::entity::hierarchy::descendants;
use crate::core::entity::Transform;
use crate::graphics::Model;
use glam::Mat4;
use hecs::Entity;
use std::iter;

/// World-space box of one entity's own geometry, empty without a [`Model`]
pub fn model_bounds(world: &hecs::World, entity: Entity) -> Aabb {
    let Ok(model) = world.get::<&Model>(entity) else {
        return Aabb::EMPTY;
    };
    let matrix = world
        .get::<&Transform>(entity)
        .map(|transform| transform.world_matrix())
        .unwrap_or(Mat4::IDENTITY);
    model.mesh.bounds().transform(&matrix)
}

/// Union of the world-space geometry bounds of `entity` and all of its
/// descendants.
///
/// Reads the world matrices left by the last propagation pass. Entities
/// without geometry contribute nothing, so a subtree with no geometry
/// yields [`Aabb::EMPTY`].
pub fn bounding_box(world: &hecs::World, entity: Entity) -> Aabb {
    iter::once(entity)
        .chain(descendants(world, entity))
        .map(|e| model_bounds(world, e))
        .fold(Aabb::EMPTY, |acc, bounds| acc + bounds)
}
