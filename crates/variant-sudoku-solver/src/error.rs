//! Errors raised while building or driving a solver.

use variant_sudoku_core::CoreError;

/// Errors that can occur while constructing a [`crate::Solver`] or its
/// constraint handlers.
///
/// Per the design's error-handling policy, propagation wipeouts and
/// initial infeasibility are *not* represented here: they surface as
/// ordinary `None`/empty results from [`crate::Solver`] methods, exactly
/// like an unsolvable puzzle simply yielding no solutions from an
/// iterator. `SolverError` is reserved for mistakes the caller can fix
/// before solving ever starts, and for genuine programmer errors.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum SolverError {
    /// A constraint descriptor named an unknown constraint type.
    #[display("unknown constraint type: {_0:?}")]
    #[from(ignore)]
    UnknownConstraintType(String),

    /// A cage/sum constraint's coefficient list length didn't match its
    /// cell list length.
    #[display(
        "coefficient/cell length mismatch: {num_coeffs} coefficients for {num_cells} cells"
    )]
    #[from(ignore)]
    CoefficientCellMismatch {
        /// Number of coefficients supplied.
        num_coeffs: usize,
        /// Number of cells supplied.
        num_cells: usize,
    },

    /// A coefficient was not an integer (e.g. came from a malformed
    /// external descriptor). Always a programmer/caller error.
    #[display("non-integer coefficient: {_0}")]
    #[from(ignore)]
    NonIntegerCoefficient(f64),

    /// A grid-shape or cell-id problem propagated up from
    /// `variant-sudoku-core`.
    #[display("{_0}")]
    Core(CoreError),

    /// The solver was invoked from more than one thread concurrently (or
    /// re-entrantly while a search was already in progress). The kernel is
    /// single-threaded cooperative by design (see the concurrency model);
    /// this is a programmer error, not a recoverable condition.
    #[display("solver invoked concurrently or re-entrantly")]
    #[from(ignore)]
    ConcurrentUse,
}
