//! The mutable candidate grid, and its cell-centric counterpart.

use std::fmt::{self, Display};

use crate::mask::Mask;
use crate::shape::GridShape;

/// The sole shared, mutable state mutated during search: one [`Mask`] per
/// cell.
///
/// `Grid` is deliberately a thin `Vec<Mask>` wrapper rather than a
/// `HashMap` or nested structure — handlers address cells by index, and the
/// engine clones/restores grids (or, on the hot path, trail frames) far
/// more often than it iterates cell-by-cell with bookkeeping overhead.
///
/// # Examples
///
/// ```
/// use variant_sudoku_core::{Grid, GridShape, Mask};
///
/// let shape = GridShape::with_derived_boxes(9, 9, 9);
/// let mut grid = Grid::new(&shape);
/// assert_eq!(grid[0], Mask::full(9));
/// grid[0] = Mask::singleton(5);
/// assert!(grid.is_singleton(0));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<Mask>,
}

impl Grid {
    /// Creates a grid with every cell holding the full domain
    /// `1..=shape.num_values()`.
    #[must_use]
    pub fn new(shape: &GridShape) -> Self {
        Self {
            cells: vec![Mask::full(shape.num_values()); shape.num_cells()],
        }
    }

    /// Creates a grid with every cell set to `Mask::EMPTY`.
    ///
    /// Mainly useful as scratch state for handlers that build up a result
    /// mask incrementally (e.g. Sum's complement propagation).
    #[must_use]
    pub fn empty(num_cells: usize) -> Self {
        Self {
            cells: vec![Mask::EMPTY; num_cells],
        }
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if this grid has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns `true` if `cell` currently has exactly one candidate.
    #[must_use]
    pub fn is_singleton(&self, cell: usize) -> bool {
        self.cells[cell].is_singleton()
    }

    /// Returns `true` if `cell` has no remaining candidates (a wipeout).
    #[must_use]
    pub fn is_wiped_out(&self, cell: usize) -> bool {
        self.cells[cell].is_empty()
    }

    /// Returns `true` if every cell is a singleton.
    #[must_use]
    pub fn is_solved(&self) -> bool {
        self.cells.iter().all(|m| m.is_singleton())
    }

    /// Returns `true` if any cell is wiped out.
    #[must_use]
    pub fn has_contradiction(&self) -> bool {
        self.cells.iter().any(|m| m.is_empty())
    }

    /// Returns a slice over the raw cell masks.
    #[must_use]
    pub fn as_slice(&self) -> &[Mask] {
        &self.cells
    }

    /// Extracts a [`DigitGrid`] snapshot: `Some(value)` for every singleton
    /// cell, `None` for every other cell.
    #[must_use]
    pub fn to_digit_grid(&self) -> DigitGrid {
        DigitGrid {
            cells: self.cells.iter().map(|m| m.as_singleton()).collect(),
        }
    }
}

impl std::ops::Index<usize> for Grid {
    type Output = Mask;
    fn index(&self, cell: usize) -> &Mask {
        &self.cells[cell]
    }
}

impl std::ops::IndexMut<usize> for Grid {
    fn index_mut(&mut self, cell: usize) -> &mut Mask {
        &mut self.cells[cell]
    }
}

/// A cell-centric, display/debug-friendly snapshot of a [`Grid`].
///
/// Where [`Grid`] answers "what are this cell's remaining candidates?",
/// `DigitGrid` answers "what value (if any) is in this cell?" — the same
/// split the teacher lineage draws between its digit-centric and
/// cell-centric grid types. Conversion from `Grid` is one-way and lossy
/// (only decided cells survive); there is no `DigitGrid -> Grid` path here
/// because puzzle construction goes through [`crate::GridShape`] plus
/// explicit givens instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitGrid {
    cells: Vec<Option<u8>>,
}

impl DigitGrid {
    /// The value at `cell`, or `None` if undecided.
    #[must_use]
    pub fn get(&self, cell: usize) -> Option<u8> {
        self.cells[cell]
    }

    /// All cell values in row-major order.
    #[must_use]
    pub fn as_slice(&self) -> &[Option<u8>] {
        &self.cells
    }
}

impl Display for DigitGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cell in &self.cells {
            match cell {
                Some(v) if *v < 10 => write!(f, "{v}")?,
                Some(v) => write!(f, "{}", (b'a' + (*v - 10)) as char)?,
                None => write!(f, ".")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_grid_is_full() {
        let shape = GridShape::with_derived_boxes(9, 9, 9);
        let grid = Grid::new(&shape);
        assert_eq!(grid.len(), 81);
        assert!(grid.as_slice().iter().all(|m| m.len() == 9));
    }

    #[test]
    fn to_digit_grid_keeps_only_singletons() {
        let shape = GridShape::with_derived_boxes(4, 4, 4);
        let mut grid = Grid::new(&shape);
        grid[0] = Mask::singleton(2);
        let dg = grid.to_digit_grid();
        assert_eq!(dg.get(0), Some(2));
        assert_eq!(dg.get(1), None);
    }

    #[test]
    fn contradiction_detection() {
        let shape = GridShape::with_derived_boxes(4, 4, 4);
        let mut grid = Grid::new(&shape);
        assert!(!grid.has_contradiction());
        grid[3] = Mask::EMPTY;
        assert!(grid.has_contradiction());
        assert!(grid.is_wiped_out(3));
    }
}
