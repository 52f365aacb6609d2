//! Axis-aligned bounding boxes
//!
//! Two flavours are provided:
//! - [`Aabb`]: a plain data cache with public corners and no invariants,
//!   used while accumulating points or unions.
//! - [`BoundingBox`]: the validated, entity-facing box (`min <= max` on every
//!   axis) handed to culling code.
//!
//! A mesh's local box is computed once from its raw positions with
//! [`compute_local_bounds`]; world boxes are re-derived per query with
//! [`world_bounds`] and never written back into the local box.

use crate::error::{PoseError, Result};
use glam::{Mat4, Vec3};

/// Unvalidated min/max pair used as a cache or accumulator
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// An inverted box that any point will replace on [`Aabb::extend`]
    pub const EMPTY: Self = Self {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Whether no point has been accumulated yet (or the corners are inverted)
    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    /// Grow the box to include `point`
    pub fn extend(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Smallest box containing both boxes
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// The eight corners of the box
    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Validated axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize))]
pub struct BoundingBox {
    min: Vec3,
    max: Vec3,
}

impl BoundingBox {
    /// Create a box, rejecting inverted or non-finite corners
    pub fn new(min: Vec3, max: Vec3) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(PoseError::invalid(format!(
                "bounding box corners must be finite, got {min} .. {max}"
            )));
        }
        if min.cmpgt(max).any() {
            return Err(PoseError::invalid(format!(
                "bounding box min {min} exceeds max {max}"
            )));
        }
        Ok(Self { min, max })
    }

    /// Degenerate box around a single point
    pub fn from_point(point: Vec3) -> Result<Self> {
        Self::new(point, point)
    }

    pub fn min(&self) -> Vec3 {
        self.min
    }

    pub fn max(&self) -> Vec3 {
        self.max
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        (self.max - self.min).abs()
    }

    /// Whether the point lies inside or on the surface of the box
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Whether the interiors of the two boxes intersect
    ///
    /// Boxes that only share a face, edge or corner do not overlap.
    pub fn overlaps_with(&self, other: &BoundingBox) -> bool {
        overlaps_with(self, other)
    }

    /// World-space box of this box under `world`
    pub fn transformed(&self, world: &Mat4) -> BoundingBox {
        world_bounds(self, world)
    }

    /// Smallest box containing both boxes
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn to_aabb(&self) -> Aabb {
        Aabb::new(self.min, self.max)
    }
}

impl TryFrom<Aabb> for BoundingBox {
    type Error = PoseError;

    fn try_from(aabb: Aabb) -> Result<Self> {
        Self::new(aabb.min, aabb.max)
    }
}

impl From<BoundingBox> for Aabb {
    fn from(bounds: BoundingBox) -> Self {
        bounds.to_aabb()
    }
}

/// Compute the local-space box of raw vertex positions in a single pass
pub fn compute_local_bounds(vertices: &[Vec3]) -> Result<BoundingBox> {
    if vertices.is_empty() {
        return Err(PoseError::invalid(
            "cannot compute bounds of an empty vertex list",
        ));
    }

    let mut aabb = Aabb::EMPTY;
    for &vertex in vertices {
        aabb.extend(vertex);
    }
    BoundingBox::try_from(aabb)
}

/// Derive the world-space box of `local` under `world`
///
/// All eight corners go through the matrix so the result stays correct under
/// rotation.
pub fn world_bounds(local: &BoundingBox, world: &Mat4) -> BoundingBox {
    let mut aabb = Aabb::EMPTY;
    for corner in local.to_aabb().corners() {
        aabb.extend(world.transform_point3(corner));
    }
    BoundingBox {
        min: aabb.min,
        max: aabb.max,
    }
}

/// Strict overlap test: false as soon as the boxes are separated (or touch) along any axis
pub fn overlaps_with(a: &BoundingBox, b: &BoundingBox) -> bool {
    let separated = a.min.cmpge(b.max) | a.max.cmple(b.min);
    !separated.any()
}
