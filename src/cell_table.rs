//! Flat cell tables: sparse integer cells backed by one contiguous
//! id buffer.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use glam::{IVec2, IVec3};

use crate::grid::{for_each_cell_2, for_each_cell_3};
use crate::hash::CellHash;

/// Build phase of a cell table.
///
/// A build runs count, then prepare, then insert, strictly in that
/// order, and queries are only meaningful once every counted id has
/// been inserted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    /// No cells counted; queries return nothing.
    Empty,
    /// Cell counts are being accumulated; the entry buffer is stale.
    Counting,
    /// The entry buffer is laid out; inserts and (once inserts are done)
    /// queries are valid.
    Ready,
}

macro_rules! impl_cell_table {
    ($name:ident, $ivec:ty, $for_each:ident) => {
        impl $name {
            /// Creates an empty table.
            pub fn new() -> Self {
                Self {
                    cells: HashMap::default(),
                    entries: Vec::new(),
                    phase: Phase::Empty,
                }
            }

            /// Removes all cells and ids, keeping allocated capacity for
            /// the next build.
            pub fn clear(&mut self) {
                self.cells.clear();
                self.entries.clear();
                self.phase = Phase::Empty;
            }

            /// Returns the number of distinct cells in the table.
            ///
            /// Cells exist only if at least one id was counted for them;
            /// there are no empty cells.
            pub fn num_cells(&self) -> usize {
                self.cells.len()
            }

            /// Returns the length of the entry buffer (ids plus one count
            /// slot per cell).
            pub fn num_entries(&self) -> usize {
                self.entries.len()
            }

            /// Counts one id for `cell`, accumulating the entry total for
            /// [`prepare`](Self::prepare) in `total`.
            ///
            /// The first id counted for a cell reserves two slots: one
            /// for the cell's id count and one for the write cursor used
            /// during insertion. Every further id reserves one.
            pub fn count(&mut self, cell: $ivec, total: &mut i64) {
                debug_assert_ne!(self.phase, Phase::Ready, "count after prepare");
                self.phase = Phase::Counting;
                match self.cells.entry(cell) {
                    Entry::Vacant(slot) => {
                        slot.insert(2);
                        *total += 2;
                    }
                    Entry::Occupied(mut slot) => {
                        *slot.get_mut() += 1;
                        *total += 1;
                    }
                }
            }

            /// Counts one id for every cell in the closed box `[b0, b1]`.
            pub fn count_range(&mut self, b0: $ivec, b1: $ivec, total: &mut i64) {
                $for_each(b0, b1, |cell| self.count(cell, total));
            }

            /// Lays out the entry buffer for the counted cells.
            ///
            /// `total` must be the value accumulated by the counting
            /// pass. After this call the map holds each cell's start
            /// offset, the slot at the offset holds the cell's final id
            /// count, and the slot after it holds the write cursor for
            /// [`insert`](Self::insert).
            pub fn prepare(&mut self, total: i64) {
                debug_assert_ne!(self.phase, Phase::Ready, "prepare called twice");
                assert!(
                    (0..=i32::MAX as i64).contains(&total),
                    "cell table exceeds 32-bit entry offsets"
                );
                self.phase = Phase::Ready;

                self.entries.clear();
                self.entries.resize(total as usize, 0);

                let mut running: i32 = 0;
                for start in self.cells.values_mut() {
                    let reserved = *start;
                    *start = running;
                    // One slot of the reservation belongs to the count
                    // itself, so the id count is `reserved - 1`. The
                    // cursor starts at the cell's last id slot.
                    self.entries[running as usize] = reserved - 1;
                    self.entries[running as usize + 1] = reserved - 1;
                    running += reserved;
                }
                debug_assert_eq!(running as i64, total);
            }

            /// Inserts `id` into a counted cell.
            ///
            /// Ids fill each cell's span back to front; the final insert
            /// for a cell lands on the (spent) cursor slot, leaving the
            /// count slot untouched. Inserting into a cell that was never
            /// counted, or more often than it was counted, is a caller
            /// bug and panics.
            pub fn insert(&mut self, id: i32, cell: $ivec) {
                debug_assert_eq!(self.phase, Phase::Ready, "insert before prepare");
                let start = self.cells[&cell] as usize;
                let offset = self.entries[start + 1];
                debug_assert!(offset > 0, "cell received more ids than were counted");
                self.entries[start + 1] = offset - 1;
                self.entries[start + offset as usize] = id;
            }

            /// Inserts `id` into every cell in the closed box `[b0, b1]`.
            pub fn insert_range(&mut self, id: i32, b0: $ivec, b1: $ivec) {
                $for_each(b0, b1, |cell| self.insert(id, cell));
            }

            /// Returns the ids stored in `cell`, or an empty slice if the
            /// cell is absent.
            ///
            /// The order of ids within a cell is unspecified. The
            /// returned slice borrows the table and is invalidated by the
            /// next mutation.
            pub fn find(&self, cell: $ivec) -> &[i32] {
                debug_assert_ne!(self.phase, Phase::Counting, "query during counting");
                match self.cells.get(&cell) {
                    Some(&start) => {
                        let start = start as usize;
                        let count = self.entries[start] as usize;
                        &self.entries[start + 1..start + 1 + count]
                    }
                    None => &[],
                }
            }

            /// Iterates over every cell and its ids, in unspecified
            /// order.
            pub fn iter(&self) -> impl Iterator<Item = ($ivec, &[i32])> + '_ {
                debug_assert_ne!(self.phase, Phase::Counting, "query during counting");
                self.cells.iter().map(|(&cell, &start)| {
                    let start = start as usize;
                    let count = self.entries[start] as usize;
                    (cell, &self.entries[start + 1..start + 1 + count])
                })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

/// A flat hash table from 2D integer cells to lists of ids.
///
/// See [`CellTable3`]; the two types differ only in key dimension.
#[derive(Clone, Debug)]
pub struct CellTable2 {
    cells: HashMap<IVec2, i32, CellHash>,
    entries: Vec<i32>,
    phase: Phase,
}

/// A flat hash table from 3D integer cells to lists of ids.
///
/// Ids are caller-chosen `i32` values, stored verbatim; they need not be
/// unique, and an id counted twice for one cell is stored twice. A build
/// runs in three strictly ordered steps: count every (id, cell)
/// pairing, prepare, then insert every pairing again. Afterwards every
/// cell's ids sit in one contiguous span of a single buffer, and the
/// table never reallocates between prepare and the end of insertion.
///
/// Most callers want [`GridTable3`](crate::GridTable3) or
/// [`TieredTable3`](crate::TieredTable3), which drive this table from
/// world-space input.
///
/// # Example
///
/// ```
/// use gridphase::CellTable3;
/// use glam::IVec3;
///
/// let mut table = CellTable3::new();
/// let mut total = 0i64;
/// table.count(IVec3::new(1, 1, 1), &mut total);
/// table.prepare(total);
/// table.insert(7, IVec3::new(1, 1, 1));
///
/// assert_eq!(table.find(IVec3::new(1, 1, 1)), &[7][..]);
/// assert!(table.find(IVec3::new(0, 0, 0)).is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct CellTable3 {
    cells: HashMap<IVec3, i32, CellHash>,
    entries: Vec<i32>,
    phase: Phase,
}

impl_cell_table!(CellTable2, IVec2, for_each_cell_2);
impl_cell_table!(CellTable3, IVec3, for_each_cell_3);
