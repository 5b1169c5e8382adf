//! Tiered tables: stacked grids at power-of-two cell sizes.

use glam::{IVec2, IVec3};

use crate::cell_table::{CellTable2, CellTable3};
use crate::grid::{for_each_cell_2, for_each_cell_3, Grid2, Grid3};
use crate::overlap::OverlapList;
use crate::{Aabb2, Aabb3};

macro_rules! impl_tiered_table {
    ($name:ident, $grid:ty, $table:ty, $ivec:ty, $aabb:ty, $for_each:ident) => {
        impl $name {
            /// Hard cap on the number of tiers.
            pub const MAX_TIERS: usize = 64;

            /// Creates an uninitialized table.
            pub fn new() -> Self {
                Self {
                    grid: <$grid>::default(),
                    tiers: Vec::new(),
                    totals: Vec::new(),
                }
            }

            /// Sets the base grid and the number of size tiers.
            ///
            /// Tier `t` behaves as a grid whose cell edge is `2^t` times
            /// the base grid's, sharing the base origin. `ntiers` must be
            /// between 1 and [`MAX_TIERS`](Self::MAX_TIERS).
            pub fn initialize(&mut self, grid: $grid, ntiers: usize) {
                assert!(
                    (1..=Self::MAX_TIERS).contains(&ntiers),
                    "tier count out of range"
                );
                self.grid = grid;
                self.tiers.clear();
                self.tiers.resize_with(ntiers, <$table>::new);
                self.totals.clear();
                self.totals.resize(ntiers, 0);
            }

            /// Returns `true` once [`initialize`](Self::initialize) has
            /// been called.
            pub fn is_initialized(&self) -> bool {
                !self.tiers.is_empty()
            }

            /// Returns the base grid.
            pub fn grid(&self) -> &$grid {
                &self.grid
            }

            /// Returns the number of tiers.
            pub fn num_tiers(&self) -> usize {
                self.tiers.len()
            }

            /// Returns the number of occupied cells across all tiers.
            pub fn num_cells(&self) -> usize {
                self.tiers.iter().map(|t| t.num_cells()).sum()
            }

            /// Returns the number of occupied cells in tier `tier`.
            pub fn num_cells_tier(&self, tier: usize) -> usize {
                self.tiers[tier].num_cells()
            }

            /// Drops the grid and every tier, returning the table to the
            /// uninitialized state.
            pub fn clear(&mut self) {
                self.grid = <$grid>::default();
                self.tiers.clear();
                self.totals.clear();
            }

            /// Returns a box's corner cells in its tier's coordinates,
            /// and the tier index.
            ///
            /// The tier is the smallest whose cells cover the box's
            /// widest axis, clamped to the last tier; boxes wider than
            /// the last tier's cells simply span several of them.
            fn classify(&self, bbox: &$aabb) -> ($ivec, $ivec, usize) {
                let mut b0 = self.grid.cell_of(bbox.min);
                let mut b1 = self.grid.cell_of(bbox.max);

                let mut extent = 1 + (b1 - b0).max_element();
                let mut tier = 0;
                let cap = self.tiers.len() - 1;
                while extent > 1 && tier < cap {
                    extent /= 2;
                    tier += 1;
                }

                for _ in 0..tier {
                    b0 = b0 / 2;
                    b1 = b1 / 2;
                }
                (b0, b1, tier)
            }

            /// Rebuilds every tier from `bounds`, storing each box's
            /// index as its id.
            pub fn build(&mut self, bounds: &[$aabb]) {
                if self.tiers.is_empty() {
                    return;
                }

                for tier in self.tiers.iter_mut() {
                    tier.clear();
                }
                self.totals.fill(0);

                for bbox in bounds {
                    let (b0, b1, tier) = self.classify(bbox);
                    self.tiers[tier].count_range(b0, b1, &mut self.totals[tier]);
                }

                for (tier, &total) in self.tiers.iter_mut().zip(self.totals.iter()) {
                    tier.prepare(total);
                }

                for (i, bbox) in bounds.iter().enumerate() {
                    let (b0, b1, tier) = self.classify(bbox);
                    self.tiers[tier].insert_range(i as i32, b0, b1);
                }
            }

            /// Collects every overlapping pair among `bounds` into `out`.
            ///
            /// `bounds` must be the slice the table was built from, and
            /// `ids` supplies the id reported for each box. `out` is
            /// cleared first; afterwards it holds one group per box that
            /// overlaps anything, anchored on that box's id, and each
            /// overlapping pair appears in exactly one group.
            pub fn find_overlaps(&self, ids: &[i32], bounds: &[$aabb], out: &mut OverlapList) {
                assert_eq!(ids.len(), bounds.len());
                out.clear();
                if self.tiers.is_empty() {
                    return;
                }

                for (i, bbox) in bounds.iter().enumerate() {
                    let (mut b0, mut b1, tier) = self.classify(bbox);

                    out.group();
                    out.push(ids[i]);

                    // The box's own tier: skip indices at or above the
                    // box's own so every pair is reported from exactly
                    // one side.
                    let table = &self.tiers[tier];
                    $for_each(b0, b1, |cell| {
                        for &j in table.find(cell) {
                            if j as usize >= i {
                                continue;
                            }
                            if bbox.overlaps(&bounds[j as usize]) {
                                out.push(ids[j as usize]);
                            }
                        }
                    });
                    b0 = b0 / 2;
                    b1 = b1 / 2;

                    // Higher tiers hold strictly larger boxes, which
                    // never report pairs downward, so no index filter.
                    for t in tier + 1..self.tiers.len() {
                        let table = &self.tiers[t];
                        $for_each(b0, b1, |cell| {
                            for &j in table.find(cell) {
                                if bbox.overlaps(&bounds[j as usize]) {
                                    out.push(ids[j as usize]);
                                }
                            }
                        });
                        b0 = b0 / 2;
                        b1 = b1 / 2;
                    }

                    out.ungroup();
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

/// A tiered spatial table over 2D bounding boxes.
///
/// See [`TieredTable3`]; the two types differ only in dimension.
#[derive(Clone, Debug)]
pub struct TieredTable2 {
    grid: Grid2,
    tiers: Vec<CellTable2>,
    totals: Vec<i64>,
}

/// A tiered spatial table over 3D bounding boxes.
///
/// A single flat grid forces one cell size onto every object: too small
/// and large boxes touch many cells, too large and every cell is
/// crowded. This table stacks up to 64 grids whose cell edges grow by
/// powers of two, files each box into the smallest tier whose cells
/// cover it, and scans a box's own and larger tiers when harvesting
/// overlap pairs. Insertion work per box stays bounded regardless of the
/// mix of object sizes.
///
/// # Example
///
/// ```
/// use gridphase::{Aabb3, Grid3, TieredTable3};
/// use glam::{IVec3, Vec3};
///
/// let mut table = TieredTable3::new();
/// table.initialize(Grid3::from_region(Vec3::ZERO, Vec3::ONE, IVec3::ONE), 4);
///
/// // Two base cells wide on every axis: lands in tier 1.
/// let boxes = [Aabb3::new(Vec3::splat(0.1), Vec3::splat(1.9))];
/// table.build(&boxes);
///
/// assert_eq!(table.num_cells_tier(1), 1);
/// assert_eq!(table.num_cells(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct TieredTable3 {
    grid: Grid3,
    tiers: Vec<CellTable3>,
    totals: Vec<i64>,
}

impl_tiered_table!(TieredTable2, Grid2, CellTable2, IVec2, Aabb2, for_each_cell_2);
impl_tiered_table!(TieredTable3, Grid3, CellTable3, IVec3, Aabb3, for_each_cell_3);

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};

    fn unit_grid() -> Grid3 {
        Grid3::from_region(Vec3::ZERO, Vec3::ONE, IVec3::ONE)
    }

    fn table4() -> TieredTable3 {
        let mut table = TieredTable3::new();
        table.initialize(unit_grid(), 4);
        table
    }

    fn tier_counts(table: &TieredTable3) -> Vec<usize> {
        (0..table.num_tiers())
            .map(|t| table.num_cells_tier(t))
            .collect()
    }

    fn groups_of(list: &OverlapList) -> Vec<Vec<i32>> {
        list.iter().map(|g| g.to_vec()).collect()
    }

    fn sorted(ids: &[i32]) -> Vec<i32> {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn test_uninitialized_table() {
        let table = TieredTable3::new();
        assert!(!table.is_initialized());
        assert_eq!(table.num_tiers(), 0);
        assert_eq!(table.num_cells(), 0);

        // Building and querying before initialize is a no-op.
        let mut table = table;
        table.build(&[Aabb3::new(Vec3::ZERO, Vec3::ONE)]);
        assert_eq!(table.num_cells(), 0);

        let mut list = OverlapList::new();
        list.group();
        list.push(1);
        list.push(2);
        list.ungroup();
        table.find_overlaps(&[0], &[Aabb3::new(Vec3::ZERO, Vec3::ONE)], &mut list);
        assert!(list.is_empty());
    }

    #[test]
    fn test_initialize() {
        let table = table4();
        assert!(table.is_initialized());
        assert_eq!(table.num_tiers(), 4);
        assert_eq!(table.num_cells(), 0);
    }

    #[test]
    #[should_panic]
    fn test_zero_tiers_panics() {
        let mut table = TieredTable3::new();
        table.initialize(unit_grid(), 0);
    }

    #[test]
    #[should_panic]
    fn test_too_many_tiers_panics() {
        let mut table = TieredTable3::new();
        table.initialize(unit_grid(), TieredTable3::MAX_TIERS + 1);
    }

    #[test]
    fn test_clear_uninitializes() {
        let mut table = table4();
        table.build(&[Aabb3::new(Vec3::splat(0.1), Vec3::splat(0.9))]);
        table.clear();
        assert!(!table.is_initialized());
        assert_eq!(table.num_tiers(), 0);
    }

    #[test]
    fn test_single_box_lands_in_its_tier() {
        // One base cell wide: tier 0.
        let mut table = table4();
        table.build(&[Aabb3::new(Vec3::splat(0.1), Vec3::splat(0.9))]);
        assert_eq!(tier_counts(&table), vec![1, 0, 0, 0]);

        // Two base cells wide: tier 1.
        table.build(&[Aabb3::new(Vec3::splat(0.1), Vec3::splat(1.9))]);
        assert_eq!(tier_counts(&table), vec![0, 1, 0, 0]);

        // Four: tier 2.
        table.build(&[Aabb3::new(Vec3::splat(0.1), Vec3::splat(3.9))]);
        assert_eq!(tier_counts(&table), vec![0, 0, 1, 0]);

        // Eight: tier 3.
        table.build(&[Aabb3::new(Vec3::splat(0.1), Vec3::splat(7.9))]);
        assert_eq!(tier_counts(&table), vec![0, 0, 0, 1]);
    }

    #[test]
    fn test_small_box_far_from_origin() {
        let mut table = table4();
        table.build(&[Aabb3::new(Vec3::splat(10.1), Vec3::splat(10.9))]);
        assert_eq!(tier_counts(&table), vec![1, 0, 0, 0]);
        assert_eq!(table.num_cells(), 1);
    }

    #[test]
    fn test_oversized_box_spans_last_tier() {
        // Thirty-two base cells long on one axis, clamped to tier 3
        // where it still spans four cells.
        let mut table = table4();
        table.build(&[Aabb3::new(
            Vec3::new(0.1, 0.1, 0.1),
            Vec3::new(31.9, 0.9, 0.9),
        )]);
        assert_eq!(tier_counts(&table), vec![0, 0, 0, 4]);
    }

    #[test]
    fn test_same_tier_pair_anchors_on_later_box() {
        let mut table = table4();
        let bounds = [
            Aabb3::new(Vec3::splat(0.1), Vec3::splat(0.5)),
            Aabb3::new(Vec3::splat(0.4), Vec3::splat(0.9)),
        ];
        let ids = [7, 9];
        table.build(&bounds);

        let mut list = OverlapList::new();
        table.find_overlaps(&ids, &bounds, &mut list);

        assert_eq!(groups_of(&list), vec![vec![9, 7]]);
        assert_eq!(tier_counts(&table), vec![1, 0, 0, 0]);
    }

    #[test]
    fn test_cross_tier_pair() {
        let mut table = table4();
        let bounds = [
            Aabb3::new(Vec3::splat(0.1), Vec3::splat(0.9)),
            Aabb3::new(Vec3::splat(0.4), Vec3::splat(7.9)),
        ];
        let ids = [0, 1];
        table.build(&bounds);
        assert_eq!(tier_counts(&table), vec![1, 0, 0, 1]);

        let mut list = OverlapList::new();
        table.find_overlaps(&ids, &bounds, &mut list);

        // The smaller box finds the larger one while walking up.
        assert_eq!(groups_of(&list), vec![vec![0, 1]]);
    }

    #[test]
    fn test_disjoint_boxes_in_one_cell_produce_nothing() {
        let mut table = table4();
        let bounds = [
            Aabb3::new(Vec3::splat(0.1), Vec3::splat(0.3)),
            Aabb3::new(Vec3::splat(0.6), Vec3::splat(0.9)),
        ];
        table.build(&bounds);

        let mut list = OverlapList::new();
        table.find_overlaps(&[0, 1], &bounds, &mut list);
        assert!(list.is_empty());
    }

    #[test]
    fn test_chain_across_all_tiers() {
        let mut table = table4();
        let bounds = [
            Aabb3::new(Vec3::splat(0.1), Vec3::splat(0.9)),
            Aabb3::new(Vec3::splat(0.1), Vec3::splat(1.9)),
            Aabb3::new(Vec3::splat(0.1), Vec3::splat(3.9)),
            Aabb3::new(Vec3::splat(0.1), Vec3::splat(7.9)),
        ];
        let ids = [0, 1, 2, 3];
        table.build(&bounds);
        assert_eq!(tier_counts(&table), vec![1, 1, 1, 1]);

        let mut list = OverlapList::new();
        table.find_overlaps(&ids, &bounds, &mut list);

        let groups = groups_of(&list);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0][0], 0);
        assert_eq!(sorted(&groups[0]), vec![0, 1, 2, 3]);
        assert_eq!(groups[1][0], 1);
        assert_eq!(sorted(&groups[1]), vec![1, 2, 3]);
        assert_eq!(groups[2][0], 2);
        assert_eq!(sorted(&groups[2]), vec![2, 3]);
    }

    #[test]
    fn test_pair_sharing_cells_reported_once() {
        // Both boxes straddle the same two tier-1 cells; the collider
        // must still show up once in the anchor's group.
        let mut table = table4();
        let bounds = [
            Aabb3::new(Vec3::new(1.5, 0.1, 0.1), Vec3::new(2.5, 0.9, 0.9)),
            Aabb3::new(Vec3::new(1.6, 0.1, 0.1), Vec3::new(2.4, 0.9, 0.9)),
        ];
        let ids = [100, 200];
        table.build(&bounds);
        assert_eq!(tier_counts(&table), vec![0, 2, 0, 0]);

        let mut list = OverlapList::new();
        table.find_overlaps(&ids, &bounds, &mut list);
        assert_eq!(groups_of(&list), vec![vec![200, 100]]);
    }

    #[test]
    fn test_rebuild_replaces_tiers() {
        let mut table = table4();
        table.build(&[Aabb3::new(Vec3::splat(0.1), Vec3::splat(0.9))]);
        assert_eq!(tier_counts(&table), vec![1, 0, 0, 0]);

        table.build(&[Aabb3::new(Vec3::splat(0.1), Vec3::splat(1.9))]);
        assert_eq!(tier_counts(&table), vec![0, 1, 0, 0]);
    }

    fn lcg(state: &mut u32) -> f32 {
        *state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        (*state >> 8) as f32 / 16_777_216.0
    }

    #[test]
    fn test_pairs_match_brute_force() {
        let mut state = 0x1234_5678u32;
        let mut bounds = Vec::new();
        for _ in 0..48 {
            let min = Vec3::new(
                lcg(&mut state) * 8.0,
                lcg(&mut state) * 8.0,
                lcg(&mut state) * 8.0,
            );
            let size = Vec3::new(
                0.05 + lcg(&mut state) * 3.0,
                0.05 + lcg(&mut state) * 3.0,
                0.05 + lcg(&mut state) * 3.0,
            );
            bounds.push(Aabb3::new(min, min + size));
        }
        let ids: Vec<i32> = (0..bounds.len() as i32).collect();

        let mut table = TieredTable3::new();
        table.initialize(unit_grid(), 6);
        table.build(&bounds);

        let mut list = OverlapList::new();
        table.find_overlaps(&ids, &bounds, &mut list);

        let mut found = Vec::new();
        for group in list.iter() {
            let anchor = group[0];
            for &other in &group[1..] {
                let pair = if anchor < other {
                    (anchor, other)
                } else {
                    (other, anchor)
                };
                found.push(pair);
            }
        }
        found.sort_unstable();

        let mut expected = Vec::new();
        for i in 0..bounds.len() {
            for j in 0..i {
                if bounds[i].overlaps(&bounds[j]) {
                    expected.push((j as i32, i as i32));
                }
            }
        }
        expected.sort_unstable();

        let mut deduped = found.clone();
        deduped.dedup();
        assert_eq!(deduped.len(), found.len(), "a pair was reported twice");
        assert_eq!(found, expected);
        assert!(!expected.is_empty());
    }

    #[test]
    fn test_tiered_table2() {
        let mut table = TieredTable2::new();
        table.initialize(
            Grid2::from_region(Vec2::ZERO, Vec2::ONE, IVec2::ONE),
            4,
        );

        let bounds = [
            Aabb2::new(Vec2::splat(0.1), Vec2::splat(1.9)),
            Aabb2::new(Vec2::splat(0.4), Vec2::splat(0.9)),
        ];
        table.build(&bounds);
        assert_eq!(table.num_cells_tier(0), 1);
        assert_eq!(table.num_cells_tier(1), 1);

        let mut list = OverlapList::new();
        table.find_overlaps(&[0, 1], &bounds, &mut list);
        assert_eq!(groups_of(&list), vec![vec![1, 0]]);
    }
}
