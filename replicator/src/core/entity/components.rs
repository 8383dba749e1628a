//! Core components for the scene graph

use glam::{Mat4, Quat, Vec3};
use hecs::Entity;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// Transform component: local translation, rotation and scale relative to the parent,
/// plus the world matrix cached by the propagation system.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Transform {
    /// Translation in parent space
    pub translation: Vec3,
    /// Rotation in parent space as a unit quaternion
    pub rotation: Quat,
    /// Non-uniform scale
    pub scale: Vec3,
    /// World matrix written by the propagation pass
    #[serde(skip)]
    world: Mat4,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            world: Mat4::IDENTITY,
        }
    }
}

impl Transform {
    /// Create a new transform with the given translation
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// Create a new transform with the given translation and rotation
    pub fn from_translation_rotation(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
            ..Default::default()
        }
    }

    /// Set the scale of the transform
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Set the rotation of the transform
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Orient the transform so that -Z points at `target`
    pub fn looking_at(mut self, target: Vec3, up: Vec3) -> Self {
        let forward = (target - self.translation).normalize();
        let right = forward.cross(up).normalize();
        let up = right.cross(forward);

        let rotation_matrix = Mat4::from_cols(
            right.extend(0.0),
            up.extend(0.0),
            (-forward).extend(0.0),
            Vec3::ZERO.extend(1.0),
        );

        self.rotation = Quat::from_mat4(&rotation_matrix);
        self
    }

    /// Local matrix, translation * rotation * scale
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// World matrix as of the last propagation pass
    pub fn world_matrix(&self) -> Mat4 {
        self.world
    }

    /// World-space position as of the last propagation pass
    pub fn world_position(&self) -> Vec3 {
        self.world.w_axis.truncate()
    }

    pub(crate) fn set_world_matrix(&mut self, world: Mat4) {
        self.world = world;
    }

    /// Rotate about the entity's own X axis
    pub fn rotate_x(&mut self, angle: f32) -> &mut Self {
        self.rotate(Quat::from_rotation_x(angle))
    }

    /// Rotate about the entity's own Y axis
    pub fn rotate_y(&mut self, angle: f32) -> &mut Self {
        self.rotate(Quat::from_rotation_y(angle))
    }

    /// Rotate about the entity's own Z axis
    pub fn rotate_z(&mut self, angle: f32) -> &mut Self {
        self.rotate(Quat::from_rotation_z(angle))
    }

    /// Apply `rotation` in local space (post-multiplied)
    pub fn rotate(&mut self, rotation: Quat) -> &mut Self {
        self.rotation = (self.rotation * rotation).normalize();
        self
    }

    /// Rotate about the world X axis
    pub fn rotate_x_global(&mut self, angle: f32) -> &mut Self {
        self.rotate_global(Quat::from_rotation_x(angle))
    }

    /// Rotate about the world Y axis
    pub fn rotate_y_global(&mut self, angle: f32) -> &mut Self {
        self.rotate_global(Quat::from_rotation_y(angle))
    }

    /// Rotate about the world Z axis
    pub fn rotate_z_global(&mut self, angle: f32) -> &mut Self {
        self.rotate_global(Quat::from_rotation_z(angle))
    }

    /// Apply `rotation` in parent space (pre-multiplied)
    pub fn rotate_global(&mut self, rotation: Quat) -> &mut Self {
        self.rotation = (rotation * self.rotation).normalize();
        self
    }

    /// Move along the entity's own axes
    pub fn translate(&mut self, offset: Vec3) -> &mut Self {
        self.translation += self.rotation * offset;
        self
    }

    /// Move along the parent axes
    pub fn translate_global(&mut self, offset: Vec3) -> &mut Self {
        self.translation += offset;
        self
    }

    /// Multiply the current scale component-wise
    pub fn scale_by(&mut self, factor: Vec3) -> &mut Self {
        self.scale *= factor;
        self
    }

    /// Multiply the current scale uniformly
    pub fn scale_uniform(&mut self, factor: f32) -> &mut Self {
        self.scale *= factor;
        self
    }

    /// Replace the translation
    pub fn set_translation(&mut self, translation: Vec3) -> &mut Self {
        self.translation = translation;
        self
    }

    /// Replace the rotation
    pub fn set_rotation(&mut self, rotation: Quat) -> &mut Self {
        self.rotation = rotation;
        self
    }

    /// Replace the scale
    pub fn set_scale(&mut self, scale: Vec3) -> &mut Self {
        self.scale = scale;
        self
    }
}

/// Parent/child/sibling links of an entity taking part in a tree.
///
/// Children of one parent form a doubly linked list threaded through
/// `next_sibling`/`prev_sibling`, headed by the parent's `first_child`.
/// The links are only edited through [`attach`](super::hierarchy::attach)
/// and [`detach`](super::hierarchy::detach).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hierarchy {
    pub(crate) parent: Option<Entity>,
    pub(crate) first_child: Option<Entity>,
    pub(crate) next_sibling: Option<Entity>,
    pub(crate) prev_sibling: Option<Entity>,
}

impl Hierarchy {
    /// Recorded parent, `None` for a root
    pub fn parent(&self) -> Option<Entity> {
        self.parent
    }

    /// Head of this entity's child list
    pub fn first_child(&self) -> Option<Entity> {
        self.first_child
    }

    /// Next entity in the parent's child list
    pub fn next_sibling(&self) -> Option<Entity> {
        self.next_sibling
    }

    /// Previous entity in the parent's child list
    pub fn prev_sibling(&self) -> Option<Entity> {
        self.prev_sibling
    }
}

/// Name component for user-friendly entity identification
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Name(pub String);

impl Name {
    /// Create a new name component
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Marker recording that component `T` of an entity needs reprocessing
pub struct Dirty<T: 'static> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> Dirty<T> {
    /// Create a new marker
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T: 'static> Default for Dirty<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Clone for Dirty<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T: 'static> std::fmt::Debug for Dirty<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Dirty<{}>", std::any::type_name::<T>())
    }
}
