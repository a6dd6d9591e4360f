//! The "all-different" house handler (rows, columns, boxes, jigsaw
//! regions, windoku boxes, diagonals).

use variant_sudoku_core::{CellExclusions, Grid, GridShape, Mask};

use super::{Handler, format_id};
use crate::accumulator::HandlerAccumulator;

/// Enforces that every cell in a house holds a distinct value.
///
/// Used directly for rows, columns, boxes, jigsaw pieces, windoku regions,
/// and diagonals — the "(jigsaw regions, windoku...)" items from the
/// purpose statement are all just additional `AllDifferent` handlers built
/// from the appropriate cell lists; there is no separate handler type for
/// them.
///
/// Propagation: if any cell is a singleton `v`, remove `v` from every
/// other cell; then detect hidden singles (a value with exactly one
/// remaining cell) and fix them. Repeats in a single call until no more
/// progress is made, so a single `enforce_consistency` invocation reaches
/// a local fixed point for this house (cheaper than waiting for the
/// accumulator to re-dispatch it).
#[derive(Debug, Clone)]
pub struct AllDifferent {
    cells: Vec<usize>,
}

impl AllDifferent {
    /// Creates a handler over `cells`. The list is sorted and deduplicated.
    #[must_use]
    pub fn new(mut cells: Vec<usize>) -> Self {
        cells.sort_unstable();
        cells.dedup();
        Self { cells }
    }
}

impl Handler for AllDifferent {
    fn cells(&self) -> &[usize] {
        &self.cells
    }

    fn id_str(&self) -> String {
        format_id("all_different", &self.cells, "")
    }

    fn initialize(
        &mut self,
        grid: &mut Grid,
        exclusions: &mut CellExclusions,
        _shape: &GridShape,
    ) -> bool {
        exclusions
            .add_all_different(&self.cells)
            .expect("CellExclusions must not be sealed during handler initialization");
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

            // Singleton elimination: remove each fixed value from every
            // other cell in the house.
            let mut fixed = Mask::EMPTY;
            for &c in &self.cells {
                if let Some(v) = grid[c].as_singleton() {
                    fixed.insert(v);
                }
            }
            for &c in &self.cells {
                if grid[c].is_singleton() {
                    continue;
                }
                let before = grid[c];
                if grid[c].subtract(fixed) {
                    changed = true;
                    accumulator.add_for_cell(c);
                    if grid[c].is_empty() {
                        return false;
                    }
                    let _ = before;
                }
            }

            // Hidden singles: a value with exactly one remaining
            // candidate cell must go there.
            if let Some(num_values) = self.cells.iter().map(|&c| grid[c]).reduce(|a, b| a | b) {
                for value in 1..=16u8 {
                    if !num_values.contains(value) {
                        continue;
                    }
                    let mut holder = None;
                    let mut count = 0;
                    for &c in &self.cells {
                        if grid[c].contains(value) {
                            count += 1;
                            holder = Some(c);
                        }
                        if count > 1 {
                            break;
                        }
                    }
                    if count == 0 {
                        return false;
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
    use proptest::prelude::*;

    use super::*;

    fn grid9() -> (Grid, GridShape) {
        let shape = GridShape::with_derived_boxes(9, 9, 9);
        (Grid::new(&shape), shape)
    }

    #[test]
    fn removes_singleton_from_peers() {
        let (mut grid, _shape) = grid9();
        let mut handler = AllDifferent::new(vec![0, 1, 2]);
        grid[0] = Mask::singleton(5);
        let mut acc = HandlerAccumulator::new(grid.len(), &[]);
        assert!(handler.enforce_consistency(&mut grid, &mut acc));
        assert!(!grid[1].contains(5));
        assert!(!grid[2].contains(5));
    }

    #[test]
    fn detects_hidden_single() {
        let (mut grid, _shape) = grid9();
        let mut handler = AllDifferent::new(vec![0, 1, 2]);
        // Only cell 0 can hold value 9 within this trio.
        for v in 1..=8 {
            grid[1].remove(v);
            grid[2].remove(v);
        }
        grid[1].remove(9);
        grid[2].remove(9);
        // cell 1 and 2 must be empty-ish for the test to be meaningful;
        // give them a harmless alternative value instead.
        grid[1] = Mask::singleton(1);
        grid[2] = Mask::singleton(2);
        let mut acc = HandlerAccumulator::new(grid.len(), &[]);
        assert!(handler.enforce_consistency(&mut grid, &mut acc));
        assert_eq!(grid[0].as_singleton(), Some(9));
    }

    #[test]
    fn wipeout_is_reported() {
        let (mut grid, _shape) = grid9();
        let mut handler = AllDifferent::new(vec![0, 1]);
        grid[0] = Mask::singleton(5);
        grid[1] = Mask::singleton(5);
        let mut acc = HandlerAccumulator::new(grid.len(), &[]);
        assert!(!handler.enforce_consistency(&mut grid, &mut acc));
    }

    #[test]
    fn is_a_reducer() {
        let (mut grid, _shape) = grid9();
        let mut handler = AllDifferent::new(vec![0, 1, 2, 3]);
        grid[0] = Mask::singleton(3);
        let before: Vec<_> = (0..4).map(|c| grid[c]).collect();
        let mut acc = HandlerAccumulator::new(grid.len(), &[]);
        handler.enforce_consistency(&mut grid, &mut acc);
        for (c, prior) in before.into_iter().enumerate() {
            assert!((grid[c].bits() & !prior.bits()) == 0, "mask only shrinks");
        }
    }

    proptest! {
        // The handler-reducer property every propagator must hold: a call
        // to `enforce_consistency` never adds a candidate back to a cell
        // it watches, and once it reports no further change, calling it
        // again on the same grid is a no-op. `is_a_reducer` above pins one
        // fixed example; this generalizes it across arbitrary starting
        // candidate sets for a 4-cell house.
        #[test]
        fn enforce_consistency_only_shrinks_and_settles(
            bits in prop::collection::vec(1u32..512, 4),
        ) {
            let (mut grid, _shape) = grid9();
            let mut handler = AllDifferent::new(vec![0, 1, 2, 3]);
            for (c, b) in bits.iter().enumerate() {
                grid[c] = Mask::from_bits(*b as u16);
            }
            let before: Vec<_> = (0..4).map(|c| grid[c]).collect();
            let mut acc = HandlerAccumulator::new(grid.len(), &[]);
            let ok = handler.enforce_consistency(&mut grid, &mut acc);
            for (c, prior) in before.iter().enumerate() {
                prop_assert_eq!(grid[c].bits() & !prior.bits(), 0, "mask only shrinks");
            }
            if ok {
                let settled: Vec<_> = (0..4).map(|c| grid[c]).collect();
                let mut acc2 = HandlerAccumulator::new(grid.len(), &[]);
                prop_assert!(handler.enforce_consistency(&mut grid, &mut acc2));
                for (c, prior) in settled.iter().enumerate() {
                    prop_assert_eq!(grid[c], *prior, "fixed point is stable");
                }
            }
        }
    }
}
