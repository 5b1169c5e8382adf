//! Uniform grids mapping world space onto integer cell coordinates.

use glam::{IVec2, IVec3, Vec2, Vec3};

/// Smallest cell edge / region extent the grids accept.
const MIN_EXTENT: f32 = 1e-5;

/// A uniform grid over 2D world space.
///
/// See [`Grid3`] for the full description; the two types differ only in
/// dimension.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Grid2 {
    origin: Vec2,
    scale: Vec2,
    cells: IVec2,
}

impl Grid2 {
    /// Creates an unbounded grid with the given cell edge lengths and the
    /// origin at zero.
    ///
    /// Every component of `cell_size` must be positive (at least `1e-5`).
    pub fn from_cell_size(cell_size: Vec2) -> Self {
        assert!(
            cell_size.cmpgt(Vec2::splat(MIN_EXTENT)).all(),
            "grid cell size must be positive"
        );
        Self {
            origin: Vec2::ZERO,
            scale: cell_size.recip(),
            cells: IVec2::ZERO,
        }
    }

    /// Creates a bounded grid mapping the region `[min, max]` onto
    /// `cells` cells per axis.
    ///
    /// The corners may be given in either order; the region extent must
    /// exceed `1e-5` on every axis.
    pub fn from_region(min: Vec2, max: Vec2, cells: IVec2) -> Self {
        let origin = min.min(max);
        let region = min.max(max) - origin;
        assert!(
            region.cmpgt(Vec2::splat(MIN_EXTENT)).all(),
            "grid region must have positive extent"
        );
        let cells = cells.abs();
        Self {
            origin,
            scale: cells.as_vec2() / region,
            cells,
        }
    }

    /// Returns the cell coordinate containing `point`.
    ///
    /// The scaled offset from the origin is truncated toward zero, so the
    /// cells touching the origin are half width on the negative side.
    /// Keep world coordinates at or above the origin for uniform cells.
    pub fn cell_of(&self, point: Vec2) -> IVec2 {
        ((point - self.origin) * self.scale).as_ivec2()
    }

    /// Returns the world position of the grid origin.
    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Returns the cells-per-unit scale on each axis.
    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    /// Returns the per-axis cell counts of a bounded grid (zero for a
    /// grid built from a cell size).
    pub fn cells(&self) -> IVec2 {
        self.cells
    }
}

impl Default for Grid2 {
    fn default() -> Self {
        Self {
            origin: Vec2::ZERO,
            scale: Vec2::ONE,
            cells: IVec2::ZERO,
        }
    }
}

/// A uniform grid over 3D world space.
///
/// The grid is a pure coordinate mapper: it owns no storage and performs
/// no range checks. [`from_cell_size`](Grid3::from_cell_size) builds the
/// unbounded form used for world-space tables;
/// [`from_region`](Grid3::from_region) pins a `[min, max]` region to a
/// fixed cell count, which gives a tiered table a shared origin for all
/// of its tiers.
///
/// # Example
///
/// ```
/// use gridphase::Grid3;
/// use glam::{IVec3, Vec3};
///
/// let grid = Grid3::from_cell_size(Vec3::splat(0.5));
/// assert_eq!(grid.cell_of(Vec3::new(1.2, 0.2, 0.7)), IVec3::new(2, 0, 1));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Grid3 {
    origin: Vec3,
    scale: Vec3,
    cells: IVec3,
}

impl Grid3 {
    /// Creates an unbounded grid with the given cell edge lengths and the
    /// origin at zero.
    ///
    /// Every component of `cell_size` must be positive (at least `1e-5`).
    pub fn from_cell_size(cell_size: Vec3) -> Self {
        assert!(
            cell_size.cmpgt(Vec3::splat(MIN_EXTENT)).all(),
            "grid cell size must be positive"
        );
        Self {
            origin: Vec3::ZERO,
            scale: cell_size.recip(),
            cells: IVec3::ZERO,
        }
    }

    /// Creates a bounded grid mapping the region `[min, max]` onto
    /// `cells` cells per axis.
    ///
    /// The corners may be given in either order; the region extent must
    /// exceed `1e-5` on every axis.
    pub fn from_region(min: Vec3, max: Vec3, cells: IVec3) -> Self {
        let origin = min.min(max);
        let region = min.max(max) - origin;
        assert!(
            region.cmpgt(Vec3::splat(MIN_EXTENT)).all(),
            "grid region must have positive extent"
        );
        let cells = cells.abs();
        Self {
            origin,
            scale: cells.as_vec3() / region,
            cells,
        }
    }

    /// Returns the cell coordinate containing `point`.
    ///
    /// The scaled offset from the origin is truncated toward zero, so the
    /// cells touching the origin are half width on the negative side.
    /// Keep world coordinates at or above the origin for uniform cells.
    pub fn cell_of(&self, point: Vec3) -> IVec3 {
        ((point - self.origin) * self.scale).as_ivec3()
    }

    /// Returns the world position of the grid origin.
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Returns the cells-per-unit scale on each axis.
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Returns the per-axis cell counts of a bounded grid (zero for a
    /// grid built from a cell size).
    pub fn cells(&self) -> IVec3 {
        self.cells
    }
}

impl Default for Grid3 {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            scale: Vec3::ONE,
            cells: IVec3::ZERO,
        }
    }
}

/// Invokes `f` for every cell coordinate in the closed box `[b0, b1]`.
///
/// The box is empty, and `f` is never called, if `b1` is below `b0` on
/// any axis.
pub fn for_each_cell_2(b0: IVec2, b1: IVec2, mut f: impl FnMut(IVec2)) {
    for x in b0.x..=b1.x {
        for y in b0.y..=b1.y {
            f(IVec2::new(x, y));
        }
    }
}

/// Invokes `f` for every cell coordinate in the closed box `[b0, b1]`.
///
/// The box is empty, and `f` is never called, if `b1` is below `b0` on
/// any axis.
pub fn for_each_cell_3(b0: IVec3, b1: IVec3, mut f: impl FnMut(IVec3)) {
    for x in b0.x..=b1.x {
        for y in b0.y..=b1.y {
            for z in b0.z..=b1.z {
                f(IVec3::new(x, y, z));
            }
        }
    }
}
