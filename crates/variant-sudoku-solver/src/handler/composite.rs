//! Composite boolean handlers: wrap other handlers behind "always on",
//! "always off", "any one of these holds", and "all of these hold".

use variant_sudoku_core::{CellExclusions, Grid, GridShape};

use super::{BoxedHandler, Handler, format_id};
use crate::accumulator::HandlerAccumulator;

/// A handler that is always consistent and never prunes anything.
///
/// Useful as the result of a constraint builder that determined, at build
/// time, that a conditional constraint is vacuously true (e.g. an empty
/// cage list), so the caller doesn't need a separate "maybe no handler"
/// branch.
#[derive(Debug, Clone, Default)]
pub struct True {
    cells: Vec<usize>,
}

impl True {
    /// Creates a no-op handler that still reports `cells` as watched, so
    /// [`crate::handler_set::HandlerSet`] bookkeeping (e.g. required-value
    /// accounting) sees them.
    #[must_use]
    pub fn new(cells: Vec<usize>) -> Self {
        Self { cells }
    }
}

impl Handler for True {
    fn cells(&self) -> &[usize] {
        &self.cells
    }

    fn id_str(&self) -> String {
        format_id("true", &self.cells, "")
    }

    fn initialize(&mut self, _grid: &mut Grid, _exclusions: &mut CellExclusions, _shape: &GridShape) -> bool {
        true
    }

    fn enforce_consistency(&mut self, _grid: &mut Grid, _accumulator: &mut HandlerAccumulator) -> bool {
        true
    }
}

/// A handler that is always inconsistent.
///
/// Produced by a constraint builder that determined at build time that a
/// constraint can never be satisfied (e.g. a cage whose minimum possible
/// sum already exceeds its target), so infeasibility surfaces through the
/// ordinary `initialize` failure path instead of a separate error variant.
#[derive(Debug, Clone, Default)]
pub struct False {
    cells: Vec<usize>,
}

impl False {
    /// Creates a handler over `cells` that unconditionally fails.
    #[must_use]
    pub fn new(cells: Vec<usize>) -> Self {
        Self { cells }
    }
}

impl Handler for False {
    fn cells(&self) -> &[usize] {
        &self.cells
    }

    fn id_str(&self) -> String {
        format_id("false", &self.cells, "")
    }

    fn initialize(&mut self, _grid: &mut Grid, _exclusions: &mut CellExclusions, _shape: &GridShape) -> bool {
        false
    }

    fn enforce_consistency(&mut self, _grid: &mut Grid, _accumulator: &mut HandlerAccumulator) -> bool {
        false
    }
}

/// Holds so long as at least one of its branches holds.
///
/// Each branch is propagated independently every call; a branch that
/// reports a wipeout on its own *private* grid copy is dropped from
/// consideration rather than failing the whole handler. Only when every
/// branch is simultaneously infeasible does `AnyOf` itself fail. Used for
/// disjunctive constraints (e.g. a "this cage is either the black-cell or
/// white-cell reading" clue) that don't reduce to a single propagator.
#[derive(Debug)]
pub struct AnyOf {
    cells: Vec<usize>,
    branches: Vec<BoxedHandler>,
}

impl AnyOf {
    /// Creates a handler that holds when any of `branches` holds.
    #[must_use]
    pub fn new(branches: Vec<BoxedHandler>) -> Self {
        let mut cells: Vec<usize> = branches.iter().flat_map(|b| b.cells().to_vec()).collect();
        cells.sort_unstable();
        cells.dedup();
        Self { cells, branches }
    }
}

impl Handler for AnyOf {
    fn cells(&self) -> &[usize] {
        &self.cells
    }

    fn id_str(&self) -> String {
        let parts: Vec<String> = self.branches.iter().map(|b| b.id_str()).collect();
        format_id("any_of", &self.cells, &parts.join("|"))
    }

    fn priority(&self) -> i32 {
        self.branches.iter().map(Handler::priority).max().unwrap_or(0)
    }

    fn initialize(&mut self, grid: &mut Grid, exclusions: &mut CellExclusions, shape: &GridShape) -> bool {
        // A disjunction can't register mutual exclusions up front (a cell
        // pair might be forced equal under one branch and excluded under
        // another), so branches only run against scratch grids here;
        // `CellExclusions` is left untouched.
        let _ = exclusions;
        self.branches
            .iter_mut()
            .any(|b| {
                let mut scratch = grid.clone();
                let mut scratch_exclusions = CellExclusions::new(grid.len());
                b.initialize(&mut scratch, &mut scratch_exclusions, shape)
            })
    }

    fn enforce_consistency(&mut self, grid: &mut Grid, accumulator: &mut HandlerAccumulator) -> bool {
        let mut survivors = vec![];
        for branch in &mut self.branches {
            let mut scratch = grid.clone();
            let mut scratch_acc = HandlerAccumulator::new(scratch.len(), &[]);
            if branch.enforce_consistency(&mut scratch, &mut scratch_acc) {
                survivors.push(scratch);
            }
        }
        if survivors.is_empty() {
            return false;
        }
        // A cell's post-propagation candidates are the union, across
        // surviving branches, of what each branch allows.
        for cell in 0..grid.len() {
            let union = survivors
                .iter()
                .map(|s| s[cell])
                .reduce(|a, b| a | b)
                .unwrap_or(variant_sudoku_core::Mask::EMPTY);
            if grid[cell].intersect_with(union) {
                accumulator.add_for_cell(cell);
                if grid[cell].is_empty() {
                    return false;
                }
            }
        }
        true
    }
}

/// Holds only if every branch holds; equivalent to running each branch as
/// its own independent handler, bundled so a single constraint descriptor
/// can expand to several related propagators (e.g. a "between line" built
/// from both an ordering and a range handler) while still presenting one
/// [`Handler`] to the set.
#[derive(Debug)]
pub struct AllOf {
    cells: Vec<usize>,
    branches: Vec<BoxedHandler>,
}

impl AllOf {
    /// Creates a handler that holds only when every branch holds.
    #[must_use]
    pub fn new(branches: Vec<BoxedHandler>) -> Self {
        let mut cells: Vec<usize> = branches.iter().flat_map(|b| b.cells().to_vec()).collect();
        cells.sort_unstable();
        cells.dedup();
        Self { cells, branches }
    }
}

impl Handler for AllOf {
    fn cells(&self) -> &[usize] {
        &self.cells
    }

    fn id_str(&self) -> String {
        let parts: Vec<String> = self.branches.iter().map(|b| b.id_str()).collect();
        format_id("all_of", &self.cells, &parts.join("&"))
    }

    fn priority(&self) -> i32 {
        self.branches.iter().map(Handler::priority).max().unwrap_or(0)
    }

    fn initialize(&mut self, grid: &mut Grid, exclusions: &mut CellExclusions, shape: &GridShape) -> bool {
        self.branches.iter_mut().all(|b| b.initialize(grid, exclusions, shape))
    }

    fn enforce_consistency(&mut self, grid: &mut Grid, accumulator: &mut HandlerAccumulator) -> bool {
        self.branches
            .iter_mut()
            .all(|b| b.enforce_consistency(grid, accumulator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use variant_sudoku_core::{GridShape, Mask};

    fn grid9() -> (Grid, GridShape) {
        let shape = GridShape::with_derived_boxes(9, 9, 9);
        (Grid::new(&shape), shape)
    }

    #[test]
    fn true_never_prunes() {
        let (mut grid, _shape) = grid9();
        let mut t = True::new(vec![0]);
        let mut acc = HandlerAccumulator::new(grid.len(), &[]);
        assert!(t.enforce_consistency(&mut grid, &mut acc));
        assert_eq!(grid[0], Mask::full(9));
    }

    #[test]
    fn false_always_fails() {
        let (mut grid, _shape) = grid9();
        let mut f = False::new(vec![0]);
        let mut acc = HandlerAccumulator::new(grid.len(), &[]);
        assert!(!f.enforce_consistency(&mut grid, &mut acc));
    }

    #[test]
    fn any_of_unions_surviving_branches() {
        use crate::handler::{BinaryConstraint, RelationKey};

        let (mut grid, _shape) = grid9();
        grid[0] = Mask::full(9);
        let a: BoxedHandler = Box::new(BinaryConstraint::new(
            0,
            1,
            RelationKey::new("eq1", 9, |a, b| a == b && a == 1),
        ));
        let b: BoxedHandler = Box::new(BinaryConstraint::new(
            0,
            1,
            RelationKey::new("eq2", 9, |a, b| a == b && a == 2),
        ));
        let mut any_of = AnyOf::new(vec![a, b]);
        let mut acc = HandlerAccumulator::new(grid.len(), &[]);
        assert!(any_of.enforce_consistency(&mut grid, &mut acc));
        assert_eq!(grid[0], Mask::singleton(1) | Mask::singleton(2));
    }
}
