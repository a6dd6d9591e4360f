//! Shared grid, mask, and lookup-table primitives for variant Sudoku
//! solving.
//!
//! This crate provides the data model that [`variant_sudoku_solver`] builds
//! its constraint handlers and search engine on top of:
//!
//! - [`Mask`]: a candidate-value bitset (bit `i` set means value `i + 1` is
//!   still possible).
//! - [`Grid`]: the mutable `Vec<Mask>` that is the sole shared state
//!   mutated during search, plus [`DigitGrid`], its cell-centric,
//!   display-friendly snapshot.
//! - [`GridShape`]: pure configuration describing a grid's dimensions,
//!   houses, and the wire-facing cell-id encoding.
//! - [`LookupTables`]: per-`num_values` precomputed sum/reverse/range/
//!   pairwise-sum tables, shared process-wide via [`LookupTables::get`].
//! - [`CellExclusions`]: the symmetric "must hold distinct values" graph
//!   induced by house handlers, with append-then-seal construction
//!   discipline.
//!
//! # Architecture
//!
//! This crate follows its lineage's two-grid split (a digit-centric grid
//! for solving, a cell-centric grid for display) and its "no garbage on
//! hot paths" discipline: [`Grid`] is a flat `Vec<Mask>`, [`LookupTables`]
//! are built once per grid size and never mutated, and [`CellExclusions`]
//! uses a word-packed bitset rather than a `HashSet` per cell.
//!
//! Unlike that lineage's `numelace-core`/`sudoku-core`, every size here is
//! a runtime [`GridShape`] parameter rather than a compile-time constant —
//! this crate's grids range from 4x4 up to 16x16, not a fixed 9x9 — so the
//! const-generic "semantics pattern" containers don't apply; [`Mask`] and
//! [`Grid`] use plain runtime bounds checks instead.
//!
//! [`variant_sudoku_solver`]: https://docs.rs/variant-sudoku-solver
//!
//! # Examples
//!
//! ```
//! use variant_sudoku_core::{CellExclusions, Grid, GridShape, Mask};
//!
//! let shape = GridShape::with_derived_boxes(9, 9, 9);
//! let mut grid = Grid::new(&shape);
//! grid[0] = Mask::singleton(5);
//! assert!(grid.is_singleton(0));
//!
//! let mut exclusions = CellExclusions::new(shape.num_cells());
//! for house in shape.all_houses() {
//!     exclusions.add_all_different(&house).unwrap();
//! }
//! assert!(exclusions.is_mutually_exclusive(0, 1)); // same row
//! ```

mod error;
mod exclusions;
mod grid;
mod lookup;
mod mask;
mod shape;

pub use self::{
    error::CoreError,
    exclusions::CellExclusions,
    grid::{DigitGrid, Grid},
    lookup::{LookupTables, RangeInfo},
    mask::Mask,
    shape::{GridShape, House},
};
