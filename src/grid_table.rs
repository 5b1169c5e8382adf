//! World-space tables: a uniform grid composed with a flat cell table.

use glam::{Vec2, Vec3};

use crate::cell_table::{CellTable2, CellTable3};
use crate::grid::{Grid2, Grid3};
use crate::{Aabb2, Aabb3};

macro_rules! impl_grid_table {
    ($name:ident, $grid:ty, $table:ty, $ivec:ty, $vec:ty, $aabb:ty) => {
        impl $name {
            /// Creates a table with a default unit grid. Call
            /// [`initialize`](Self::initialize) to set the real grid
            /// before building.
            pub fn new() -> Self {
                Self {
                    grid: <$grid>::default(),
                    table: <$table>::new(),
                }
            }

            /// Creates a table over `grid`.
            pub fn with_grid(grid: $grid) -> Self {
                Self {
                    grid,
                    table: <$table>::new(),
                }
            }

            /// Replaces the grid and drops any built contents.
            pub fn initialize(&mut self, grid: $grid) {
                self.grid = grid;
                self.table.clear();
            }

            /// Returns the grid the table maps through.
            pub fn grid(&self) -> &$grid {
                &self.grid
            }

            /// Removes all cells and ids, keeping allocated capacity.
            pub fn clear(&mut self) {
                self.table.clear();
            }

            /// Returns the number of occupied cells.
            pub fn num_cells(&self) -> usize {
                self.table.num_cells()
            }

            /// Rebuilds the table from points, using each point's index
            /// as its id.
            pub fn build_points(&mut self, points: &[$vec]) {
                self.table.clear();

                let mut total = 0i64;
                for point in points {
                    let cell = self.grid.cell_of(*point);
                    self.table.count(cell, &mut total);
                }

                self.table.prepare(total);

                // Second pass recomputes the cells; caching them costs
                // more memory traffic than the arithmetic saves.
                for (i, point) in points.iter().enumerate() {
                    self.table.insert(i as i32, self.grid.cell_of(*point));
                }
            }

            /// Rebuilds the table from points with caller-chosen ids.
            pub fn build_points_with_ids(&mut self, ids: &[i32], points: &[$vec]) {
                assert_eq!(ids.len(), points.len());
                self.table.clear();

                let mut total = 0i64;
                for point in points {
                    let cell = self.grid.cell_of(*point);
                    self.table.count(cell, &mut total);
                }

                self.table.prepare(total);

                for (id, point) in ids.iter().zip(points) {
                    self.table.insert(*id, self.grid.cell_of(*point));
                }
            }

            /// Rebuilds the table from bounding boxes, using each box's
            /// index as its id. A box is entered into every cell its
            /// corners span.
            pub fn build_aabbs(&mut self, bounds: &[$aabb]) {
                self.table.clear();

                let mut total = 0i64;
                for bbox in bounds {
                    let b0 = self.grid.cell_of(bbox.min);
                    let b1 = self.grid.cell_of(bbox.max);
                    self.table.count_range(b0, b1, &mut total);
                }

                self.table.prepare(total);

                for (i, bbox) in bounds.iter().enumerate() {
                    let b0 = self.grid.cell_of(bbox.min);
                    let b1 = self.grid.cell_of(bbox.max);
                    self.table.insert_range(i as i32, b0, b1);
                }
            }

            /// Rebuilds the table from bounding boxes with caller-chosen
            /// ids.
            pub fn build_aabbs_with_ids(&mut self, ids: &[i32], bounds: &[$aabb]) {
                assert_eq!(ids.len(), bounds.len());
                self.table.clear();

                let mut total = 0i64;
                for bbox in bounds {
                    let b0 = self.grid.cell_of(bbox.min);
                    let b1 = self.grid.cell_of(bbox.max);
                    self.table.count_range(b0, b1, &mut total);
                }

                self.table.prepare(total);

                for (id, bbox) in ids.iter().zip(bounds) {
                    let b0 = self.grid.cell_of(bbox.min);
                    let b1 = self.grid.cell_of(bbox.max);
                    self.table.insert_range(*id, b0, b1);
                }
            }

            /// Returns the ids stored in the cell containing `point`, or
            /// an empty slice.
            pub fn find(&self, point: $vec) -> &[i32] {
                self.table.find(self.grid.cell_of(point))
            }

            /// Iterates over every occupied cell and its ids, in
            /// unspecified order.
            pub fn iter(&self) -> impl Iterator<Item = ($ivec, &[i32])> + '_ {
                self.table.iter()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

/// A world-space spatial table over a 2D uniform grid.
///
/// See [`GridTable3`]; the two types differ only in dimension.
#[derive(Clone, Debug)]
pub struct GridTable2 {
    grid: Grid2,
    table: CellTable2,
}

/// A world-space spatial table over a 3D uniform grid.
///
/// Rebuilt from scratch each frame from a slice of points or bounding
/// boxes; answers "which ids occupy the cell containing this point".
/// Rebuilding reuses the previous build's allocations.
///
/// # Example
///
/// ```
/// use gridphase::{Grid3, GridTable3};
/// use glam::Vec3;
///
/// let mut table = GridTable3::with_grid(Grid3::from_cell_size(Vec3::splat(1.0)));
/// let points = [
///     Vec3::new(0.5, 0.5, 0.5),
///     Vec3::new(0.25, 0.75, 0.5),
///     Vec3::new(3.5, 0.5, 0.5),
/// ];
/// table.build_points(&points);
///
/// assert_eq!(table.num_cells(), 2);
/// assert_eq!(table.find(Vec3::new(0.9, 0.9, 0.9)).len(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct GridTable3 {
    grid: Grid3,
    table: CellTable3,
}

impl_grid_table!(GridTable2, Grid2, CellTable2, glam::IVec2, Vec2, Aabb2);
impl_grid_table!(GridTable3, Grid3, CellTable3, glam::IVec3, Vec3, Aabb3);
