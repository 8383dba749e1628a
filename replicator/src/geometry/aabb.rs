//! Axis-aligned bounding boxes

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

/// Axis-aligned bounding box.
///
/// [`Aabb::EMPTY`] has `min = +inf` and `max = -inf`, which makes it the
/// neutral element of [`Aabb::union`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Aabb {
    /// Box containing nothing
    pub const EMPTY: Self = Self {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    /// Create a new box from min and max points
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box spanning from the origin to `max`
    pub const fn from_max(max: Vec3) -> Self {
        Self::new(Vec3::ZERO, max)
    }

    /// Smallest box containing every point; empty for no points
    pub fn from_points(points: &[Vec3]) -> Self {
        points.iter().fold(Self::EMPTY, |acc, &point| Self {
            min: acc.min.min(point),
            max: acc.max.max(point),
        })
    }

    /// Extent along X
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    /// Extent along Y
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Extent along Z
    pub fn length(&self) -> f32 {
        self.max.z - self.min.z
    }

    /// Extents on all axes
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Get the center of the box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// True if min exceeds max on any axis
    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    /// Inclusive point containment
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Multiply both corners by `factor`
    pub fn scale(&self, factor: Vec3) -> Self {
        if self.is_empty() {
            return *self;
        }
        Self::from_points(&[self.min * factor, self.max * factor])
    }

    /// Component-wise min of minima and max of maxima
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Bounds of this box after transforming its eight corners
    pub fn transform(&self, transform: &Mat4) -> Self {
        if self.is_empty() {
            return Self::EMPTY;
        }

        let corners = [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ];

        let transformed = corners.map(|corner| transform.transform_point3(corner));
        Self::from_points(&transformed)
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Add for Aabb {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.union(&rhs)
    }
}

impl AddAssign for Aabb {
    fn add_assign(&mut self, rhs: Self) {
        *self = self.union(&rhs);
    }
}

impl fmt::Display for Aabb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "x: {}:{} y: {}:{} z: {}:{}",
            self.min.x, self.max.x, self.min.y, self.max.y, self.min.z, self.max.z
        )
    }
}
