//! Test utilities for handler implementations.
//!
//! Mirrors the teacher lineage's `sudoku_solver::testing` module:
//! [`HandlerTester`] tracks a handler's initial and current grid state,
//! lets a test drive propagation to a fixed point, and asserts on what
//! changed — the same fluent, `#[track_caller]`-annotated chaining style.
//!
//! # Example
//!
//! ```
//! use variant_sudoku_core::GridShape;
//! use variant_sudoku_solver::handler::AllDifferent;
//! use variant_sudoku_solver::testing::HandlerTester;
//!
//! let shape = GridShape::with_derived_boxes(9, 9, 9);
//! let mut handler = AllDifferent::new(vec![0, 1, 2]);
//! HandlerTester::with_shape(shape)
//!     .given(0, 5)
//!     .apply_to_fixed_point(&mut handler)
//!     .assert_removed_includes(1, [5])
//!     .assert_removed_includes(2, [5]);
//! ```

use variant_sudoku_core::{Grid, GridShape, Mask};

use crate::accumulator::HandlerAccumulator;
use crate::handler::Handler;

/// A test harness for verifying a single handler's propagation in
/// isolation, outside a full [`crate::handler_set::HandlerSet`].
///
/// # Panics
///
/// All assertion methods panic with a detailed message on failure, using
/// `#[track_caller]` to report the correct source location.
#[derive(Debug)]
pub struct HandlerTester {
    initial: Grid,
    current: Grid,
    wiped_out: bool,
}

impl HandlerTester {
    /// Creates a tester from an explicit initial candidate grid.
    #[must_use]
    pub fn new(initial: Grid) -> Self {
        let current = initial.clone();
        Self { initial, current, wiped_out: false }
    }

    /// Creates a tester over `shape`'s default full-candidate grid.
    #[must_use]
    pub fn with_shape(shape: GridShape) -> Self {
        Self::new(Grid::new(&shape))
    }

    /// Fixes `cell` to `value` before any propagation runs (a "given").
    #[must_use]
    pub fn given(mut self, cell: usize, value: u8) -> Self {
        self.initial[cell] = Mask::singleton(value);
        self.current[cell] = Mask::singleton(value);
        self
    }

    /// Repeatedly runs `handler.enforce_consistency` against the current
    /// grid until it stops changing anything or reports a wipeout.
    ///
    /// The accumulator passed to `enforce_consistency` has no other
    /// handlers registered, so `accumulator.add_for_cell` calls the
    /// handler makes are harmless no-ops here — this tester only cares
    /// about what `handler` itself does to the grid.
    pub fn apply_to_fixed_point(mut self, handler: &mut dyn Handler) -> Self {
        let mut accumulator = HandlerAccumulator::new(self.current.len(), &[]);
        loop {
            let before = self.current.clone();
            if !handler.enforce_consistency(&mut self.current, &mut accumulator) {
                self.wiped_out = true;
                break;
            }
            if self.current == before {
                break;
            }
        }
        self
    }

    /// Asserts that `cell` was placed (decided) with `value`: it started
    /// undecided and is now a singleton equal to `value`.
    #[track_caller]
    pub fn assert_placed(self, cell: usize, value: u8) -> Self {
        let initial = self.initial[cell];
        let current = self.current[cell];
        assert!(
            !initial.is_singleton(),
            "expected cell {cell} to start undecided, but had {initial:?}"
        );
        assert!(
            current.is_singleton(),
            "expected cell {cell} to be decided, but has {current:?}"
        );
        assert!(
            current.contains(value),
            "expected cell {cell} to contain {value}, but candidates are {current:?}"
        );
        self
    }

    /// Asserts that every value in `values` was initially a candidate at
    /// `cell` and has since been removed. Other candidates may also have
    /// been removed; this only checks the named ones are gone.
    #[track_caller]
    pub fn assert_removed_includes(self, cell: usize, values: impl IntoIterator<Item = u8>) -> Self {
        let initial = self.initial[cell];
        let current = self.current[cell];
        for value in values {
            assert!(
                initial.contains(value),
                "expected cell {cell} to initially contain {value}, but initial candidates are {initial:?}"
            );
            assert!(
                !current.contains(value),
                "expected {value} to be removed from cell {cell}, but current candidates are {current:?}"
            );
        }
        self
    }

    /// Asserts that exactly `values` were removed from `cell` — no more,
    /// no less.
    #[track_caller]
    pub fn assert_removed_exact(self, cell: usize, values: impl IntoIterator<Item = u8>) -> Self {
        let initial = self.initial[cell];
        let current = self.current[cell];
        let mut expected = Mask::EMPTY;
        for value in values {
            expected.insert(value);
        }
        let mut removed = Mask::EMPTY;
        for value in initial.iter().filter(|&v| !current.contains(v)) {
            removed.insert(value);
        }
        assert_eq!(
            removed, expected,
            "expected exactly {expected:?} removed from cell {cell}, but removed {removed:?} (initial {initial:?}, current {current:?})"
        );
        self
    }

    /// Asserts that `cell`'s candidates are unchanged from the initial
    /// grid.
    #[track_caller]
    pub fn assert_no_change(self, cell: usize) -> Self {
        let initial = self.initial[cell];
        let current = self.current[cell];
        assert_eq!(
            initial, current,
            "expected no change at cell {cell}, but candidates changed from {initial:?} to {current:?}"
        );
        self
    }

    /// Asserts that propagation produced a wipeout.
    #[track_caller]
    pub fn assert_wiped_out(self) -> Self {
        assert!(self.wiped_out, "expected propagation to report a wipeout, but it didn't");
        self
    }

    /// Asserts that propagation did not produce a wipeout.
    #[track_caller]
    pub fn assert_not_wiped_out(self) -> Self {
        assert!(!self.wiped_out, "expected propagation not to wipe out, but it did");
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::AllDifferent;
    use variant_sudoku_core::GridShape;

    #[test]
    fn all_different_removes_given_from_peers() {
        let shape = GridShape::with_derived_boxes(9, 9, 9);
        let mut handler = AllDifferent::new(vec![0, 1, 2]);
        HandlerTester::with_shape(shape)
            .given(0, 5)
            .apply_to_fixed_point(&mut handler)
            .assert_placed(0, 5)
            .assert_removed_includes(1, [5])
            .assert_removed_includes(2, [5]);
    }

    #[test]
    fn unrelated_cell_is_untouched() {
        let shape = GridShape::with_derived_boxes(9, 9, 9);
        let mut handler = AllDifferent::new(vec![0, 1]);
        HandlerTester::with_shape(shape)
            .given(0, 5)
            .apply_to_fixed_point(&mut handler)
            .assert_no_change(40);
    }

    #[test]
    fn duplicate_givens_wipe_out() {
        let shape = GridShape::with_derived_boxes(4, 4, 4);
        let mut handler = AllDifferent::new(vec![0, 1]);
        HandlerTester::with_shape(shape)
            .given(0, 1)
            .given(1, 1)
            .apply_to_fixed_point(&mut handler)
            .assert_wiped_out();
    }
}
