//! Binary-relation handlers: a single pair, or a relation applied
//! pairwise across a list of cells.

use std::sync::Arc;

use variant_sudoku_core::{CellExclusions, Grid, GridShape, LookupTables, Mask};

use super::{Handler, format_id};
use crate::accumulator::HandlerAccumulator;

/// A precompiled binary relation: a name (for `id_str`/diagnostics) and the
/// forward/backward tables built by [`LookupTables::for_binary_key`].
///
/// `forward[bit(a)]` is the mask of `b` with `predicate(a, b)`;
/// `backward[bit(a)]` is the mask of `b` with `predicate(b, a)`.
#[derive(Clone)]
pub struct RelationKey {
    name: String,
    tables: Arc<(Vec<u16>, Vec<u16>)>,
}

impl std::fmt::Debug for RelationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationKey")
            .field("name", &self.name)
            .finish()
    }
}

impl RelationKey {
    /// Compiles `predicate` into forward/backward tables for `num_values`,
    /// memoized process-wide by `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, num_values: usize, predicate: impl Fn(u8, u8) -> bool) -> Self {
        let name = name.into();
        let tables = LookupTables::get(num_values).for_binary_key(&name, predicate);
        Self { name, tables }
    }

    fn forward(&self, mask: Mask) -> Mask {
        Mask::from_bits(self.tables.0[mask.bits() as usize])
    }

    fn backward(&self, mask: Mask) -> Mask {
        Mask::from_bits(self.tables.1[mask.bits() as usize])
    }
}

/// `lt(n)`: `a < b`, used by [`super::Thermometer`].
#[must_use]
pub fn less_than(num_values: usize) -> RelationKey {
    RelationKey::new("lt", num_values, |a, b| a < b)
}

/// `eq(n)`: `a == b`, used by [`super::Palindrome`] and by
/// [`BinaryPairwise`]'s hidden-single mode.
#[must_use]
pub fn equal(num_values: usize) -> RelationKey {
    RelationKey::new("eq", num_values, |a, b| a == b)
}

/// `diff_at_least(n, d)`: `|a - b| >= d`, used by [`super::Whisper`].
#[must_use]
pub fn diff_at_least(num_values: usize, d: u8) -> RelationKey {
    RelationKey::new(format!("diff_ge_{d}"), num_values, move |a, b| {
        a.abs_diff(b) >= d
    })
}

/// "Values form a consecutive run of size `k`": used by [`super::Renban`].
/// Symmetric, so `forward == backward`; not a true pairwise binary
/// predicate on its own, but reused as one (`a` and `b` both just need to
/// belong to *some* size-`k` run — the cage-level job of confirming the
/// whole line forms one run is left to the surrounding
/// [`BinaryPairwise`]'s equal-like fixed-point, which is sufficient for
/// pruning even though it is not a complete consistency check by itself).
#[must_use]
pub fn within_run_of(num_values: usize, k: u8) -> RelationKey {
    RelationKey::new(format!("run_{k}"), num_values, move |a, b| {
        a.abs_diff(b) < k
    })
}

/// A single precompiled binary relation between two cells.
///
/// Enforces `grid[a] &= backward[grid[b]]` and `grid[b] &= forward[grid[a]]`,
/// each direction pruning from the other's currently-possible values.
#[derive(Debug, Clone)]
pub struct BinaryConstraint {
    cells: [usize; 2],
    relation: RelationKey,
}

impl BinaryConstraint {
    /// Creates a handler enforcing `relation(value_at(a), value_at(b))`.
    #[must_use]
    pub fn new(a: usize, b: usize, relation: RelationKey) -> Self {
        Self {
            cells: [a, b],
            relation,
        }
    }
}

impl Handler for BinaryConstraint {
    fn cells(&self) -> &[usize] {
        &self.cells
    }

    fn id_str(&self) -> String {
        format_id("binary", &self.cells, &self.relation.name)
    }

    fn initialize(
        &mut self,
        grid: &mut Grid,
        _exclusions: &mut CellExclusions,
        _shape: &GridShape,
    ) -> bool {
        let mut acc = HandlerAccumulator::new(grid.len(), &[]);
        self.enforce_consistency(grid, &mut acc)
    }

    fn enforce_consistency(
        &mut self,
        grid: &mut Grid,
        accumulator: &mut HandlerAccumulator,
    ) -> bool {
        let [a, b] = self.cells;
        if grid[a].intersect_with(self.relation.backward(grid[b])) {
            accumulator.add_for_cell(a);
            if grid[a].is_empty() {
                return false;
            }
        }
        if grid[b].intersect_with(self.relation.forward(grid[a])) {
            accumulator.add_for_cell(b);
            if grid[b].is_empty() {
                return false;
            }
        }
        true
    }
}

/// Applies a binary relation pairwise across every pair in an ordered
/// cell list, optionally enabling hidden-single detection (when the
/// relation is equality-like, e.g. [`equal`] for palindromes, so a value
/// forced out of every cell but one in the list can be fixed there).
#[derive(Debug, Clone)]
pub struct BinaryPairwise {
    cells: Vec<usize>,
    relation: RelationKey,
    hidden_single: bool,
}

impl BinaryPairwise {
    /// Creates a handler applying `relation` to every ordered pair in
    /// `cells` (both `(cells[i], cells[j])` and `(cells[j], cells[i])` for
    /// `i < j`, since the relation need not be symmetric).
    #[must_use]
    pub fn new(cells: Vec<usize>, relation: RelationKey) -> Self {
        Self {
            cells,
            relation,
            hidden_single: false,
        }
    }

    /// Enables hidden-single detection for equality-like relations.
    #[must_use]
    pub fn with_hidden_singles(mut self) -> Self {
        self.hidden_single = true;
        self
    }
}

impl Handler for BinaryPairwise {
    fn cells(&self) -> &[usize] {
        &self.cells
    }

    fn id_str(&self) -> String {
        format_id("binary_pairwise", &self.cells, &self.relation.name)
    }

    fn initialize(
        &mut self,
        grid: &mut Grid,
        _exclusions: &mut CellExclusions,
        _shape: &GridShape,
    ) -> bool {
        let mut acc = HandlerAccumulator::new(grid.len(), &[]);
        self.enforce_consistency(grid, &mut acc)
    }

    fn enforce_consistency(
        &mut self,
        grid: &mut Grid,
        accumulator: &mut HandlerAccumulator,
    ) -> bool {
        loop {
            let mut changed = false;
            for i in 0..self.cells.len() {
                for j in 0..self.cells.len() {
                    if i == j {
                        continue;
                    }
                    let (a, b) = (self.cells[i], self.cells[j]);
                    if grid[a].intersect_with(self.relation.backward(grid[b])) {
                        changed = true;
                        accumulator.add_for_cell(a);
                        if grid[a].is_empty() {
                            return false;
                        }
                    }
                }
            }

            if self.hidden_single {
                let union = self
                    .cells
                    .iter()
                    .map(|&c| grid[c])
                    .reduce(|a, b| a | b)
                    .unwrap_or(Mask::EMPTY);
                for value in union.iter() {
                    let mut holder = None;
                    let mut count = 0;
                    for &c in &self.cells {
                        if grid[c].contains(value) {
                            count += 1;
                            holder = Some(c);
                        }
                    }
                    if count == 1 {
                        let c = holder.unwrap();
                        if !grid[c].is_singleton() {
                            grid[c] = Mask::singleton(value);
                            accumulator.add_for_cell(c);
                            changed = true;
                        }
                    }
                }
            }

            for &c in &self.cells {
                if grid[c].is_empty() {
                    return false;
                }
            }

            if !changed {
                return true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn less_than_prunes_both_directions() {
        let shape = GridShape::with_derived_boxes(9, 9, 9);
        let mut grid = Grid::new(&shape);
        grid[0] = Mask::singleton(8);
        let mut handler = BinaryConstraint::new(0, 1, less_than(9));
        let mut acc = HandlerAccumulator::new(grid.len(), &[]);
        assert!(handler.enforce_consistency(&mut grid, &mut acc));
        assert_eq!(grid[1], Mask::singleton(9));
    }

    #[test]
    fn equal_pairwise_detects_hidden_single() {
        let shape = GridShape::with_derived_boxes(9, 9, 9);
        let mut grid = Grid::new(&shape);
        grid[0] = Mask::singleton(1) | Mask::singleton(2);
        grid[1] = Mask::singleton(1) | Mask::singleton(2);
        grid[2] = Mask::singleton(2);
        let mut handler = BinaryPairwise::new(vec![0, 1, 2], equal(9)).with_hidden_singles();
        let mut acc = HandlerAccumulator::new(grid.len(), &[]);
        assert!(handler.enforce_consistency(&mut grid, &mut acc));
        assert_eq!(grid[0], Mask::singleton(2));
        assert_eq!(grid[1], Mask::singleton(2));
    }

    #[test]
    fn wipeout_is_signalled() {
        let shape = GridShape::with_derived_boxes(9, 9, 9);
        let mut grid = Grid::new(&shape);
        grid[0] = Mask::singleton(9);
        let mut handler = BinaryConstraint::new(0, 1, less_than(9));
        let mut acc = HandlerAccumulator::new(grid.len(), &[]);
        assert!(!handler.enforce_consistency(&mut grid, &mut acc));
    }
}
