//! Region and outside-clue handlers: sandwiches, lunchboxes,
//! little-killers, and the skyscraper/numbered-room/X-sum family of
//! edge clues.

use variant_sudoku_core::{CellExclusions, Grid, GridShape, Mask};

use super::{Handler, Sum, format_id};
use crate::accumulator::HandlerAccumulator;
use crate::error::SolverError;

/// The cells strictly between the `1` and the `num_values` in a house sum
/// to `target` ("sandwich sum").
#[derive(Debug, Clone)]
pub struct Sandwich {
    house: Vec<usize>,
    target: i64,
    num_values: usize,
}

impl Sandwich {
    /// Creates a sandwich handler over `house` with the given `target`.
    #[must_use]
    pub fn new(house: Vec<usize>, target: i64, num_values: usize) -> Self {
        Self { house, target, num_values }
    }

    fn window_bounds(&self, grid: &Grid) -> Option<(usize, usize)> {
        let low = self.house.iter().position(|&c| grid[c].as_singleton() == Some(1))?;
        let high = self
            .house
            .iter()
            .position(|&c| grid[c].as_singleton() == Some(self.num_values as u8))?;
        Some((low.min(high), low.max(high)))
    }
}

impl Handler for Sandwich {
    fn cells(&self) -> &[usize] {
        &self.house
    }

    fn id_str(&self) -> String {
        format_id("sandwich", &self.house, &format!("target={}", self.target))
    }

    fn initialize(&mut self, grid: &mut Grid, _exclusions: &mut CellExclusions, _shape: &GridShape) -> bool {
        let mut acc = HandlerAccumulator::new(grid.len(), &[]);
        self.enforce_consistency(grid, &mut acc)
    }

    fn enforce_consistency(&mut self, grid: &mut Grid, accumulator: &mut HandlerAccumulator) -> bool {
        // Only propagates once both bread markers (`1` and `numValues`)
        // have settled into specific positions; before that, the
        // sandwiched span isn't known. Any house handler already present
        // will eventually pin both markers via its own hidden-single
        // search, so this handler just waits for that to happen.
        let Some((low, high)) = self.window_bounds(grid) else {
            return true;
        };
        if high <= low + 1 {
            if self.target != 0 {
                return false;
            }
            return true;
        }
        let filling: Vec<usize> = self.house[low + 1..high].to_vec();
        let sum = match Sum::new(filling, None, self.target, self.num_values, false) {
            Ok(sum) => sum,
            Err(_) => return false,
        };
        let mut sum = sum;
        let mut exclusions = CellExclusions::new(grid.len());
        sum.initialize(grid, &mut exclusions, &GridShape::with_derived_boxes(1, grid.len(), self.num_values))
            && sum.enforce_consistency(grid, accumulator)
    }
}

/// Like [`Sandwich`], but the bounding markers are arbitrary clue values
/// (`low_marker`/`high_marker`) rather than fixed at `1`/`num_values`.
#[derive(Debug, Clone)]
pub struct Lunchbox {
    house: Vec<usize>,
    low_marker: u8,
    high_marker: u8,
    target: i64,
    num_values: usize,
}

impl Lunchbox {
    /// Creates a lunchbox handler.
    #[must_use]
    pub fn new(
        house: Vec<usize>,
        low_marker: u8,
        high_marker: u8,
        target: i64,
        num_values: usize,
    ) -> Self {
        Self {
            house,
            low_marker,
            high_marker,
            target,
            num_values,
        }
    }
}

impl Handler for Lunchbox {
    fn cells(&self) -> &[usize] {
        &self.house
    }

    fn id_str(&self) -> String {
        format_id("lunchbox", &self.house, &format!("target={}", self.target))
    }

    fn initialize(&mut self, grid: &mut Grid, _exclusions: &mut CellExclusions, _shape: &GridShape) -> bool {
        let mut acc = HandlerAccumulator::new(grid.len(), &[]);
        self.enforce_consistency(grid, &mut acc)
    }

    fn enforce_consistency(&mut self, grid: &mut Grid, accumulator: &mut HandlerAccumulator) -> bool {
        let low = self
            .house
            .iter()
            .position(|&c| grid[c].as_singleton() == Some(self.low_marker));
        let high = self
            .house
            .iter()
            .position(|&c| grid[c].as_singleton() == Some(self.high_marker));
        let (Some(low), Some(high)) = (low, high) else {
            return true;
        };
        let (lo, hi) = (low.min(high), low.max(high));
        if hi <= lo + 1 {
            return self.target == 0;
        }
        let filling: Vec<usize> = self.house[lo + 1..hi].to_vec();
        let Ok(mut sum) = Sum::new(filling, None, self.target, self.num_values, false) else {
            return false;
        };
        let mut exclusions = CellExclusions::new(grid.len());
        sum.initialize(grid, &mut exclusions, &GridShape::with_derived_boxes(1, grid.len(), self.num_values))
            && sum.enforce_consistency(grid, accumulator)
    }
}

/// A little-killer diagonal clue: the cells along a diagonal ray (as
/// determined by the puzzle layout) sum to `target`. A thin,
/// naming-specific wrapper over [`Sum`], since the propagation itself is
/// identical to any other fixed-cell-list sum.
#[derive(Debug)]
pub struct LittleKiller {
    sum: Sum,
}

impl LittleKiller {
    /// Creates a little-killer handler over a diagonal ray `cells`.
    ///
    /// # Errors
    ///
    /// Propagates [`SolverError`] from the underlying [`Sum`] builder.
    pub fn new(cells: Vec<usize>, target: i64, num_values: usize) -> Result<Self, SolverError> {
        Ok(Self {
            sum: Sum::new(cells, None, target, num_values, false)?,
        })
    }
}

impl Handler for LittleKiller {
    fn cells(&self) -> &[usize] {
        self.sum.cells()
    }

    fn id_str(&self) -> String {
        format_id("little_killer", self.sum.cells(), "")
    }

    fn initialize(&mut self, grid: &mut Grid, exclusions: &mut CellExclusions, shape: &GridShape) -> bool {
        self.sum.initialize(grid, exclusions, shape)
    }

    fn enforce_consistency(&mut self, grid: &mut Grid, accumulator: &mut HandlerAccumulator) -> bool {
        self.sum.enforce_consistency(grid, accumulator)
    }
}

/// A skyscraper clue: `clue` buildings are visible looking down `cells`
/// from the clue side (a building is visible if it is taller than every
/// building before it).
///
/// Enforces the standard necessary bound `cells[0] <= num_values - clue +
/// 1` (the first cell must leave room for `clue - 1` further record
/// heights behind it); this is sound but not a complete consistency
/// check — the full visibility-count constraint needs a DP over the
/// remaining cells' relative order that this kernel doesn't carry, so
/// deeper deductions are left to search.
#[derive(Debug, Clone)]
pub struct Skyscraper {
    cells: Vec<usize>,
    clue: u8,
    num_values: usize,
}

impl Skyscraper {
    /// Creates a skyscraper handler over `cells`, ordered from the clue
    /// side inward.
    #[must_use]
    pub fn new(cells: Vec<usize>, clue: u8, num_values: usize) -> Self {
        Self { cells, clue, num_values }
    }
}

impl Handler for Skyscraper {
    fn cells(&self) -> &[usize] {
        &self.cells
    }

    fn id_str(&self) -> String {
        format_id("skyscraper", &self.cells, &format!("clue={}", self.clue))
    }

    fn initialize(&mut self, grid: &mut Grid, _exclusions: &mut CellExclusions, _shape: &GridShape) -> bool {
        let mut acc = HandlerAccumulator::new(grid.len(), &[]);
        self.enforce_consistency(grid, &mut acc)
    }

    fn enforce_consistency(&mut self, grid: &mut Grid, accumulator: &mut HandlerAccumulator) -> bool {
        let Some(&first) = self.cells.first() else {
            return true;
        };
        let bound = (self.num_values as i32) - i32::from(self.clue) + 1;
        if bound < 1 {
            return false;
        }
        let mut window = Mask::EMPTY;
        for v in 1..=bound as u8 {
            window.insert(v);
        }
        if grid[first].intersect_with(window) {
            accumulator.add_for_cell(first);
            if grid[first].is_empty() {
                return false;
            }
        }
        true
    }
}

/// A hidden skyscraper clue: like [`Skyscraper`], but counted from behind
/// the tallest building in view rather than from the clue edge itself.
/// Modeled here as a skyscraper-style bound applied to the far end of the
/// line, reflecting that visibility in this variant only starts counting
/// after the view is first blocked — a documented simplification of the
/// full "count visible after the first blocker" rule, which (like
/// [`Skyscraper`]) this kernel only partially propagates outside search.
#[derive(Debug, Clone)]
pub struct HiddenSkyscraper {
    inner: Skyscraper,
}

impl HiddenSkyscraper {
    /// Creates a hidden-skyscraper handler over `cells`, ordered from the
    /// clue side inward.
    #[must_use]
    pub fn new(mut cells: Vec<usize>, clue: u8, num_values: usize) -> Self {
        cells.reverse();
        Self {
            inner: Skyscraper::new(cells, clue, num_values),
        }
    }
}

impl Handler for HiddenSkyscraper {
    fn cells(&self) -> &[usize] {
        self.inner.cells()
    }

    fn id_str(&self) -> String {
        format_id("hidden_skyscraper", self.inner.cells(), "")
    }

    fn initialize(&mut self, grid: &mut Grid, exclusions: &mut CellExclusions, shape: &GridShape) -> bool {
        self.inner.initialize(grid, exclusions, shape)
    }

    fn enforce_consistency(&mut self, grid: &mut Grid, accumulator: &mut HandlerAccumulator) -> bool {
        self.inner.enforce_consistency(grid, accumulator)
    }
}

/// A numbered-room clue: the cell at position `clue` (1-indexed, counted
/// from the clue side) holds the value `clue` itself.
#[derive(Debug, Clone)]
pub struct NumberedRoom {
    cells: Vec<usize>,
    clue: u8,
}

impl NumberedRoom {
    /// Creates a numbered-room handler over `cells`, ordered from the
    /// clue side inward.
    #[must_use]
    pub fn new(cells: Vec<usize>, clue: u8) -> Self {
        Self { cells, clue }
    }
}

impl Handler for NumberedRoom {
    fn cells(&self) -> &[usize] {
        &self.cells
    }

    fn id_str(&self) -> String {
        format_id("numbered_room", &self.cells, &format!("clue={}", self.clue))
    }

    fn initialize(&mut self, grid: &mut Grid, _exclusions: &mut CellExclusions, _shape: &GridShape) -> bool {
        let Some(&target) = self.cells.get(usize::from(self.clue) - 1) else {
            return false;
        };
        grid[target].intersect_with(Mask::singleton(self.clue));
        !grid[target].is_empty()
    }

    fn enforce_consistency(&mut self, grid: &mut Grid, accumulator: &mut HandlerAccumulator) -> bool {
        let Some(&target) = self.cells.get(usize::from(self.clue) - 1) else {
            return false;
        };
        if grid[target].intersect_with(Mask::singleton(self.clue)) {
            accumulator.add_for_cell(target);
        }
        !grid[target].is_empty()
    }
}

/// An X-sum clue: the sum of the first `N` cells equals `clue`, where `N`
/// is the value of the first cell itself.
#[derive(Debug, Clone)]
pub struct XSum {
    cells: Vec<usize>,
    clue: i64,
    num_values: usize,
}

impl XSum {
    /// Creates an X-sum handler over `cells`, ordered from the clue side
    /// inward.
    #[must_use]
    pub fn new(cells: Vec<usize>, clue: i64, num_values: usize) -> Self {
        Self { cells, clue, num_values }
    }
}

impl Handler for XSum {
    fn cells(&self) -> &[usize] {
        &self.cells
    }

    fn id_str(&self) -> String {
        format_id("x_sum", &self.cells, &format!("clue={}", self.clue))
    }

    fn initialize(&mut self, grid: &mut Grid, _exclusions: &mut CellExclusions, _shape: &GridShape) -> bool {
        let mut acc = HandlerAccumulator::new(grid.len(), &[]);
        self.enforce_consistency(grid, &mut acc)
    }

    fn enforce_consistency(&mut self, grid: &mut Grid, accumulator: &mut HandlerAccumulator) -> bool {
        let Some(&first) = self.cells.first() else {
            return true;
        };
        let lookup = variant_sudoku_core::LookupTables::get(self.num_values);
        let mut feasible = Mask::EMPTY;
        for n in grid[first].iter() {
            let prefix = &self.cells[..(n as usize).min(self.cells.len())];
            if prefix.len() != n as usize {
                continue;
            }
            let mut min_sum = 0i64;
            let mut max_sum = 0i64;
            for &c in prefix {
                let info = lookup.range_info(grid[c]);
                if info.is_wipeout(self.num_values) {
                    min_sum = i64::MAX;
                    max_sum = i64::MIN;
                    break;
                }
                min_sum += i64::from(info.min_value());
                max_sum += i64::from(info.max_value());
            }
            if min_sum <= self.clue && self.clue <= max_sum {
                feasible.insert(n);
            }
        }
        if grid[first].intersect_with(feasible) {
            accumulator.add_for_cell(first);
        }
        !grid[first].is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skyscraper_bounds_first_cell() {
        let shape = GridShape::with_derived_boxes(9, 9, 9);
        let mut grid = Grid::new(&shape);
        let mut exclusions = CellExclusions::new(shape.num_cells());
        let mut sky = Skyscraper::new(vec![0, 1, 2, 3, 4, 5, 6, 7, 8], 3, 9);
        assert!(sky.initialize(&mut grid, &mut exclusions, &shape));
        assert!(grid[0].max_value().unwrap() <= 7);
    }

    #[test]
    fn numbered_room_forces_position() {
        let shape = GridShape::with_derived_boxes(9, 9, 9);
        let mut grid = Grid::new(&shape);
        let mut exclusions = CellExclusions::new(shape.num_cells());
        let mut room = NumberedRoom::new(vec![0, 1, 2, 3, 4, 5, 6, 7, 8], 4);
        assert!(room.initialize(&mut grid, &mut exclusions, &shape));
        assert_eq!(grid[3], Mask::singleton(4));
    }

    #[test]
    fn sandwich_restricts_filling_once_markers_settle() {
        let shape = GridShape::with_derived_boxes(9, 9, 9);
        let mut grid = Grid::new(&shape);
        let mut exclusions = CellExclusions::new(shape.num_cells());
        let house: Vec<usize> = (0..9).collect();
        grid[0] = Mask::singleton(1);
        grid[4] = Mask::singleton(9);
        let mut sandwich = Sandwich::new(house, 10, 9);
        assert!(sandwich.initialize(&mut grid, &mut exclusions, &shape));
    }
}
