//! Constraint-handler propagation and backtracking search kernel for
//! variant Sudoku puzzles.
//!
//! This crate consumes the data model from [`variant_sudoku_core`] and
//! builds the solving machinery on top of it:
//!
//! - [`handler`]: the polymorphic constraint propagators (`AllDifferent`,
//!   `Sum`, `Arrow`, thermometers, DFA-driven lines, ...).
//! - [`handler_set`]: [`handler_set::HandlerSet`], the deduplicated
//!   handler collection and fixed-point propagation driver, plus
//!   [`handler_set::Optimizer`]'s gap-fill cage derivation.
//! - [`accumulator`]: the dirty-handler queue propagation runs against.
//! - [`selector`]: branch selection — step guides, handler-proposed
//!   candidates, and the minimum-remaining-values fallback.
//! - [`conflict`]: [`conflict::ConflictScores`] and
//!   [`conflict::SeenCandidateSet`], the VSIDS-style tie-breaking state.
//! - [`engine`]: [`engine::Engine`], the trail-based backtracking search
//!   driver every search mode is built on.
//! - [`spec`]: the in-memory constraint-descriptor construction surface
//!   ([`spec::PuzzleSpec`]/[`spec::ConstraintSpec`]) that [`Solver::build`]
//!   consumes.
//! - [`api`]: [`Solver`], the public entry point tying the above together.
//! - [`config`]: [`config::SolverConfig`], the solver's tunable parameters.
//! - [`error`]: [`error::SolverError`], construction-time failures.
//! - [`testing`]: [`testing::HandlerTester`], a fluent harness for
//!   exercising a single handler's propagation in isolation.
//!
//! # Examples
//!
//! ```
//! use variant_sudoku_solver::config::SolverConfig;
//! use variant_sudoku_solver::spec::{GridShapeTag, PuzzleSpec};
//! use variant_sudoku_solver::Solver;
//!
//! // An empty 4x4 grid (no givens, no extra constraints) has 288 distinct
//! // fillings — small enough for exhaustive search in a doctest.
//! let spec = PuzzleSpec {
//!     shape: GridShapeTag { rows: 4, cols: 4, num_values: 4 },
//!     constraints: vec![],
//! };
//! let mut solver = Solver::build(&spec, SolverConfig::new()).unwrap();
//! assert_eq!(solver.count_solutions().unwrap(), 288);
//! ```

pub mod accumulator;
pub mod api;
pub mod config;
pub mod conflict;
pub mod engine;
pub mod error;
pub mod handler;
pub mod handler_set;
pub mod selector;
pub mod spec;
pub mod testing;

pub use self::api::Solver;
pub use self::error::SolverError;
