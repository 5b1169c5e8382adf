//! Uniform-grid spatial hashing for broad-phase collision detection.
//!
//! This crate answers the two questions a broad phase asks every frame:
//! which objects occupy a given region of space, and which pairs of
//! objects might be touching. It provides:
//!
//! - [`CellTable2`] / [`CellTable3`] - flat hash tables from integer
//!   cells to id lists, built in one contiguous allocation
//! - [`GridTable2`] / [`GridTable3`] - world-space point and AABB tables
//!   over a uniform grid
//! - [`TieredTable2`] / [`TieredTable3`] - stacked power-of-two size
//!   tiers with an overlap pair query
//! - [`OverlapList`] - compact, group-oriented storage for the candidate
//!   pairs a tiered query produces
//!
//! Tables are rebuilt from scratch each frame from caller-owned slices;
//! rebuilding reuses prior allocations. Nothing here resolves contacts:
//! the output is candidate pairs whose boxes really do overlap, ready
//! for a narrow phase.
//!
//! # Example
//!
//! ```
//! use gridphase::{Aabb3, Grid3, OverlapList, TieredTable3};
//! use glam::{IVec3, Vec3};
//!
//! let boxes = vec![
//!     Aabb3::new(Vec3::splat(0.1), Vec3::splat(0.9)),
//!     Aabb3::new(Vec3::splat(0.5), Vec3::splat(1.4)),
//!     Aabb3::new(Vec3::splat(5.0), Vec3::splat(5.5)),
//! ];
//! let ids = vec![10, 11, 12];
//!
//! let mut table = TieredTable3::new();
//! table.initialize(Grid3::from_region(Vec3::ZERO, Vec3::ONE, IVec3::ONE), 4);
//! table.build(&boxes);
//!
//! let mut overlaps = OverlapList::new();
//! table.find_overlaps(&ids, &boxes, &mut overlaps);
//!
//! let groups: Vec<&[i32]> = overlaps.iter().collect();
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups[0], &[10, 11][..]);
//! ```

use glam::{Vec2, Vec3};

mod cell_table;
mod grid;
mod grid_table;
mod hash;
mod overlap;
mod tiered;

pub use cell_table::{CellTable2, CellTable3};
pub use grid::{for_each_cell_2, for_each_cell_3, Grid2, Grid3};
pub use grid_table::{GridTable2, GridTable3};
pub use hash::{CellHash, CellHasher};
pub use overlap::{OverlapIter, OverlapList};
pub use tiered::{TieredTable2, TieredTable3};

// ============================================================================
// AABB Types
// ============================================================================

/// 2D axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb2 {
    /// Minimum corner.
    pub min: Vec2,
    /// Maximum corner.
    pub max: Vec2,
}

impl Aabb2 {
    /// Creates an AABB from min and max corners.
    ///
    /// The corners are stored as given; callers are expected to supply
    /// `min <= max` per axis (use [`from_corners`](Self::from_corners)
    /// for unordered input).
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Creates an AABB spanning two arbitrary corner points.
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Returns the center of the AABB.
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Returns the size of the AABB.
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Returns the half-extents of the AABB.
    pub fn half_extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    /// Returns the smallest AABB containing both `self` and `other`.
    pub fn union(&self, other: &Aabb2) -> Aabb2 {
        Aabb2 {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Returns this AABB grown by `margin` on every side.
    pub fn expand(&self, margin: f32) -> Aabb2 {
        Aabb2 {
            min: self.min - margin,
            max: self.max + margin,
        }
    }

    /// Checks if this AABB contains a point (boundary inclusive).
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Checks if this AABB overlaps another (boundary inclusive).
    pub fn overlaps(&self, other: &Aabb2) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }
}

/// 3D axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb3 {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb3 {
    /// Creates an AABB from min and max corners.
    ///
    /// The corners are stored as given; callers are expected to supply
    /// `min <= max` per axis (use [`from_corners`](Self::from_corners)
    /// for unordered input).
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Creates an AABB spanning two arbitrary corner points.
    pub fn from_corners(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Returns the center of the AABB.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Returns the size of the AABB.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Returns the half-extents of the AABB.
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Returns the smallest AABB containing both `self` and `other`.
    pub fn union(&self, other: &Aabb3) -> Aabb3 {
        Aabb3 {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Returns this AABB grown by `margin` on every side.
    pub fn expand(&self, margin: f32) -> Aabb3 {
        Aabb3 {
            min: self.min - margin,
            max: self.max + margin,
        }
    }

    /// Checks if this AABB contains a point (boundary inclusive).
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Checks if this AABB overlaps another (boundary inclusive).
    pub fn overlaps(&self, other: &Aabb3) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }
}

// ============================================================================
// Tests
// ============================================================================
