//! Indexing handlers: a cell's value names a position within a parallel
//! cell list, and that position's value must match back.

use variant_sudoku_core::{CellExclusions, Grid, GridShape, Mask};

use super::{Handler, format_id};
use crate::accumulator::HandlerAccumulator;

/// For each value `v`, `index_cells[v - 1]` holds the 1-indexed position
/// within `value_cells` where `v` appears.
///
/// `index_cells` and `value_cells` must have the same length `n`
/// (typically a full house). Enforces, in both directions:
/// `value_cells[p] == v  =>  index_cells[v - 1] == p + 1`, and
/// `index_cells[v - 1] == p + 1  =>  value_cells[p] == v`.
#[derive(Debug, Clone)]
pub struct Indexing {
    index_cells: Vec<usize>,
    value_cells: Vec<usize>,
    cells: Vec<usize>,
}

impl Indexing {
    /// Creates an indexing handler. `index_cells` and `value_cells` must
    /// have equal length.
    #[must_use]
    pub fn new(index_cells: Vec<usize>, value_cells: Vec<usize>) -> Self {
        let mut cells = index_cells.clone();
        cells.extend(&value_cells);
        cells.sort_unstable();
        cells.dedup();
        Self {
            index_cells,
            value_cells,
            cells,
        }
    }
}

impl Handler for Indexing {
    fn cells(&self) -> &[usize] {
        &self.cells
    }

    fn id_str(&self) -> String {
        format_id("indexing", &self.cells, "")
    }

    fn initialize(&mut self, grid: &mut Grid, _exclusions: &mut CellExclusions, _shape: &GridShape) -> bool {
        let mut acc = HandlerAccumulator::new(grid.len(), &[]);
        self.enforce_consistency(grid, &mut acc)
    }

    fn enforce_consistency(&mut self, grid: &mut Grid, accumulator: &mut HandlerAccumulator) -> bool {
        let n = self.index_cells.len();
        loop {
            let mut changed = false;

            // value_cells[p] fixed to v => index_cells[v-1] == p+1.
            for (p, &vc) in self.value_cells.iter().enumerate() {
                if let Some(v) = grid[vc].as_singleton() {
                    let ic = self.index_cells[usize::from(v) - 1];
                    if grid[ic].intersect_with(Mask::singleton((p + 1) as u8)) {
                        changed = true;
                        accumulator.add_for_cell(ic);
                        if grid[ic].is_empty() {
                            return false;
                        }
                    }
                }
            }

            // index_cells[v-1] fixed to p+1 => value_cells[p] == v.
            for (v0, &ic) in self.index_cells.iter().enumerate() {
                if let Some(p1) = grid[ic].as_singleton() {
                    let p = usize::from(p1) - 1;
                    if p >= n {
                        grid[ic] = Mask::EMPTY;
                        accumulator.add_for_cell(ic);
                        return false;
                    }
                    let vc = self.value_cells[p];
                    let v = (v0 + 1) as u8;
                    if grid[vc].intersect_with(Mask::singleton(v)) {
                        changed = true;
                        accumulator.add_for_cell(vc);
                        if grid[vc].is_empty() {
                            return false;
                        }
                    }
                }
            }

            if !changed {
                return true;
            }
        }
    }
}

/// A single-value specialization of [`Indexing`]: `index_cell` holds the
/// 1-indexed position of `target_value` within `house`.
#[derive(Debug, Clone)]
pub struct ValueIndexing {
    house: Vec<usize>,
    target_value: u8,
    index_cell: usize,
    cells: Vec<usize>,
}

impl ValueIndexing {
    /// Creates a value-indexing handler.
    #[must_use]
    pub fn new(house: Vec<usize>, target_value: u8, index_cell: usize) -> Self {
        let mut cells = house.clone();
        cells.push(index_cell);
        cells.sort_unstable();
        cells.dedup();
        Self {
            house,
            target_value,
            index_cell,
            cells,
        }
    }
}

impl Handler for ValueIndexing {
    fn cells(&self) -> &[usize] {
        &self.cells
    }

    fn id_str(&self) -> String {
        format_id("value_indexing", &self.cells, &format!("v={}", self.target_value))
    }

    fn initialize(&mut self, grid: &mut Grid, _exclusions: &mut CellExclusions, _shape: &GridShape) -> bool {
        let mut acc = HandlerAccumulator::new(grid.len(), &[]);
        self.enforce_consistency(grid, &mut acc)
    }

    fn enforce_consistency(&mut self, grid: &mut Grid, accumulator: &mut HandlerAccumulator) -> bool {
        // index_cell narrows the positions the target value can occupy.
        let mut allowed_positions = Mask::EMPTY;
        for (p, &c) in self.house.iter().enumerate() {
            if grid[c].contains(self.target_value) && p < 16 {
                allowed_positions.insert((p + 1) as u8);
            }
        }
        if grid[self.index_cell].intersect_with(allowed_positions) {
            accumulator.add_for_cell(self.index_cell);
            if grid[self.index_cell].is_empty() {
                return false;
            }
        }

        // A settled index_cell pins the target value's position, ruling
        // it out everywhere else in the house.
        if let Some(p1) = grid[self.index_cell].as_singleton() {
            let p = usize::from(p1) - 1;
            for (q, &c) in self.house.iter().enumerate() {
                if q == p {
                    if grid[c].intersect_with(Mask::singleton(self.target_value)) {
                        accumulator.add_for_cell(c);
                    }
                } else if grid[c].contains(self.target_value) {
                    grid[c].remove(self.target_value);
                    accumulator.add_for_cell(c);
                }
                if grid[c].is_empty() {
                    return false;
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
    fn value_cell_drives_index_cell() {
        let shape = GridShape::with_derived_boxes(9, 9, 9);
        let mut grid = Grid::new(&shape);
        let mut exclusions = CellExclusions::new(shape.num_cells());
        let index_cells: Vec<usize> = (0..9).collect();
        let value_cells: Vec<usize> = (9..18).collect();
        grid[9] = Mask::singleton(5); // value_cells[0] == 5
        let mut idx = Indexing::new(index_cells, value_cells);
        assert!(idx.initialize(&mut grid, &mut exclusions, &shape));
        // index_cells[5 - 1] must equal position 1.
        assert_eq!(grid[4], Mask::singleton(1));
    }

    #[test]
    fn index_cell_drives_value_cell() {
        let shape = GridShape::with_derived_boxes(9, 9, 9);
        let mut grid = Grid::new(&shape);
        let mut exclusions = CellExclusions::new(shape.num_cells());
        let index_cells: Vec<usize> = (0..9).collect();
        let value_cells: Vec<usize> = (9..18).collect();
        grid[2] = Mask::singleton(4); // index_cells[2] == 4 => value 3 at position 4
        let mut idx = Indexing::new(index_cells, value_cells);
        assert!(idx.initialize(&mut grid, &mut exclusions, &shape));
        assert_eq!(grid[12], Mask::singleton(3));
    }
}
