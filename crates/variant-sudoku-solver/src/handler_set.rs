//! The deduplicated handler collection and the propagation fixed-point
//! driver built on top of it.

use log::{debug, trace};

use variant_sudoku_core::{CellExclusions, Grid, GridShape, Mask};

use crate::accumulator::HandlerAccumulator;
use crate::handler::{BoxedHandler, Handler, Sum};

/// Owns every constraint handler for a puzzle, deduplicated by
/// [`Handler::id_str`], plus the [`CellExclusions`] graph and
/// [`HandlerAccumulator`] built from them.
///
/// Dedup matters because the constraint-translation layer
/// ([`crate::spec`]) and the [`Optimizer`] both synthesize handlers
/// independently — an `Arrow` and a hand-authored `Sum` with identical
/// cells/coefficients/target would otherwise double-count the same
/// constraint during propagation.
pub struct HandlerSet {
    handlers: Vec<BoxedHandler>,
    exclusions: CellExclusions,
    accumulator: HandlerAccumulator,
}

impl HandlerSet {
    /// Builds a handler set: deduplicates `handlers`, initializes each one
    /// against `grid` (registering mutual exclusions and applying any
    /// immediately-derivable pruning), then runs one full propagation pass.
    ///
    /// Returns `None` if any handler reports infeasibility during
    /// initialization or the first propagation pass.
    #[must_use]
    pub fn build(mut handlers: Vec<BoxedHandler>, grid: &mut Grid, shape: &GridShape) -> Option<Self> {
        let mut seen = std::collections::HashSet::new();
        handlers.retain(|h| seen.insert(h.id_str()));
        debug!("building handler set with {} deduplicated handlers", handlers.len());

        let mut exclusions = CellExclusions::new(grid.len());
        for handler in &mut handlers {
            if !handler.initialize(grid, &mut exclusions, shape) {
                debug!("handler {} reported infeasibility during initialization", handler.id_str());
                return None;
            }
        }

        let mut accumulator = HandlerAccumulator::new(grid.len(), &handlers);
        for cell in 0..grid.len() {
            accumulator.add_for_cell(cell);
        }

        let mut set = Self {
            handlers,
            exclusions,
            accumulator,
        };
        if !set.propagate(grid) {
            return None;
        }
        Some(set)
    }

    /// Marks every handler watching `cell` as dirty; callers use this
    /// after directly assigning a value during search (the engine's own
    /// trail mutations don't go through a handler's `enforce_consistency`).
    pub fn mark_cell_dirty(&mut self, cell: usize) {
        self.accumulator.add_for_cell(cell);
    }

    /// Runs handlers to a fixed point: pops the highest-priority dirty
    /// handler, re-runs it, and repeats until the queue empties or a
    /// handler reports a wipeout.
    pub fn propagate(&mut self, grid: &mut Grid) -> bool {
        while let Some(idx) = self.accumulator.pop() {
            trace!("running handler {}", self.handlers[idx].id_str());
            if !self.handlers[idx].enforce_consistency(grid, &mut self.accumulator) {
                return false;
            }
        }
        true
    }

    /// Empties the dirty queue without running anything. Used before
    /// reusing the handler set's propagation on scratch grids that aren't
    /// the live search grid (e.g. Monte-Carlo sampling in
    /// [`crate::engine::Engine::estimated_count_solutions`]), so a sample
    /// that fails partway through doesn't leave stale entries queued for
    /// the next one.
    pub fn reset_accumulator(&mut self) {
        self.accumulator.clear();
    }

    /// The deduplicated handler list.
    #[must_use]
    pub fn handlers(&self) -> &[BoxedHandler] {
        &self.handlers
    }

    /// The sealed mutual-exclusion graph built during initialization.
    #[must_use]
    pub fn exclusions(&mut self) -> &mut CellExclusions {
        &mut self.exclusions
    }
}

/// Derives extra handlers from structural patterns the constraint set
/// exposes, so the core propagators above see tighter constraints without
/// the puzzle author having to spell them out.
///
/// Currently implements one technique — "gap-fill": when a house is
/// fully covered by a set of non-overlapping cages plus exactly one
/// leftover region, and the house's total sum is known (i.e. the grid is
/// square, so every house sums to `1 + 2 + ... + numValues`), the leftover
/// region's sum is exactly `house_total - sum(cage targets)`. This is the
/// classic killer-sudoku "innie/outie" deduction. Other named
/// optimizations (sum-intersection, rectangular non-square totals,
/// size-specific cage collapse) are not implemented; `DESIGN.md` records
/// this as a scoped-down subset of the full technique family.
pub struct Optimizer;

impl Optimizer {
    /// Synthesizes gap-fill `Sum` handlers for `houses`, given the cages
    /// (`cells`, `target`) already known. A house qualifies when its cells
    /// are exactly covered by a disjoint union of cage cells plus a single
    /// non-empty leftover set.
    #[must_use]
    pub fn derive_gap_fills(houses: &[Vec<usize>], cages: &[(Vec<usize>, i64)], num_values: usize) -> Vec<Sum> {
        let house_total = (1..=num_values as i64).sum::<i64>();
        let mut derived = vec![];

        for house in houses {
            let house_set: std::collections::HashSet<usize> = house.iter().copied().collect();
            let mut covered = std::collections::HashSet::new();
            let mut covered_sum = 0i64;
            let mut touched_any = false;

            for (cage_cells, target) in cages {
                if !cage_cells.iter().all(|c| house_set.contains(c)) {
                    continue;
                }
                if cage_cells.iter().any(|c| covered.contains(c)) {
                    // Overlapping cages break the clean partition this
                    // technique relies on.
                    touched_any = false;
                    break;
                }
                covered.extend(cage_cells.iter().copied());
                covered_sum += target;
                touched_any = true;
            }

            if !touched_any {
                continue;
            }
            let leftover: Vec<usize> = house.iter().copied().filter(|c| !covered.contains(c)).collect();
            if leftover.is_empty() || leftover.len() == house.len() {
                continue;
            }
            if let Ok(sum) = Sum::new(leftover, None, house_total - covered_sum, num_values, false) {
                derived.push(sum);
            }
        }
        derived
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::AllDifferent;
    use variant_sudoku_core::GridShape;

    #[test]
    fn dedups_identical_handlers() {
        let shape = GridShape::with_derived_boxes(9, 9, 9);
        let mut grid = Grid::new(&shape);
        let handlers: Vec<BoxedHandler> = vec![
            Box::new(AllDifferent::new(vec![0, 1, 2])),
            Box::new(AllDifferent::new(vec![2, 1, 0])), // same set, different order
        ];
        let set = HandlerSet::build(handlers, &mut grid, &shape).unwrap();
        assert_eq!(set.handlers().len(), 1);
    }

    #[test]
    fn build_fails_on_infeasible_handler() {
        let shape = GridShape::with_derived_boxes(4, 4, 4);
        let mut grid = Grid::new(&shape);
        grid[0] = Mask::singleton(1);
        grid[1] = Mask::singleton(1);
        let handlers: Vec<BoxedHandler> = vec![Box::new(AllDifferent::new(vec![0, 1]))];
        assert!(HandlerSet::build(handlers, &mut grid, &shape).is_none());
    }

    #[test]
    fn gap_fill_derives_leftover_sum() {
        let house: Vec<usize> = (0..9).collect();
        let cages = vec![(vec![0, 1, 2], 10i64)];
        let derived = Optimizer::derive_gap_fills(&[house], &cages, 9);
        assert_eq!(derived.len(), 1);
    }
}
