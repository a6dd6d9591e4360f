//! The quadruple clue: a list of required values, distributed across a
//! small cell group (usually the four cells meeting at a grid corner).

use variant_sudoku_core::{CellExclusions, Grid, GridShape, Mask};

use super::{Handler, format_id};
use crate::accumulator::HandlerAccumulator;

/// Every value in `required` (counted with multiplicity) must appear
/// somewhere among `cells`.
#[derive(Debug, Clone)]
pub struct Quad {
    cells: Vec<usize>,
    required: Vec<u8>,
}

impl Quad {
    /// Creates a quad handler. `required` may contain duplicates (e.g.
    /// `[2, 2]` demands two cells hold `2`).
    #[must_use]
    pub fn new(cells: Vec<usize>, required: Vec<u8>) -> Self {
        Self { cells, required }
    }

    fn multiplicity_needed(&self, value: u8) -> usize {
        self.required.iter().filter(|&&v| v == value).count()
    }
}

impl Handler for Quad {
    fn cells(&self) -> &[usize] {
        &self.cells
    }

    fn id_str(&self) -> String {
        format_id("quad", &self.cells, &format!("{:?}", self.required))
    }

    fn initialize(&mut self, grid: &mut Grid, _exclusions: &mut CellExclusions, _shape: &GridShape) -> bool {
        let mut acc = HandlerAccumulator::new(grid.len(), &[]);
        self.enforce_consistency(grid, &mut acc)
    }

    fn enforce_consistency(&mut self, grid: &mut Grid, accumulator: &mut HandlerAccumulator) -> bool {
        let mut distinct: Vec<u8> = self.required.clone();
        distinct.sort_unstable();
        distinct.dedup();

        for value in distinct {
            let needed = self.multiplicity_needed(value);
            let candidates: Vec<usize> = self
                .cells
                .iter()
                .copied()
                .filter(|&c| grid[c].contains(value))
                .collect();
            if candidates.len() < needed {
                return false;
            }
            // Hidden single for this value within the quad: exactly as
            // many candidate cells as required placements remain, so
            // every one of them must take it.
            if candidates.len() == needed {
                for &c in &candidates {
                    if grid[c].intersect_with(Mask::singleton(value)) {
                        accumulator.add_for_cell(c);
                        if grid[c].is_empty() {
                            return false;
                        }
                    }
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forces_singleton_when_only_one_candidate_remains() {
        let shape = GridShape::with_derived_boxes(9, 9, 9);
        let mut grid = Grid::new(&shape);
        let mut exclusions = CellExclusions::new(shape.num_cells());
        for v in 1..=9u8 {
            if v != 5 {
                grid[1].remove(v);
                grid[2].remove(v);
                grid[3].remove(v);
            }
        }
        // Only cell 0 can still hold 5 among the quad.
        let mut quad = Quad::new(vec![0, 1, 2, 3], vec![5]);
        assert!(quad.initialize(&mut grid, &mut exclusions, &shape));
        assert_eq!(grid[0], Mask::singleton(5));
    }

    #[test]
    fn fails_when_no_cell_can_hold_required_value() {
        let shape = GridShape::with_derived_boxes(9, 9, 9);
        let mut grid = Grid::new(&shape);
        let mut exclusions = CellExclusions::new(shape.num_cells());
        for &c in &[0, 1, 2, 3] {
            grid[c].remove(7);
        }
        let mut quad = Quad::new(vec![0, 1, 2, 3], vec![7]);
        assert!(!quad.initialize(&mut grid, &mut exclusions, &shape));
    }
}
