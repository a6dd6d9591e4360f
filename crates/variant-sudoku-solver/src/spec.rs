//! The in-memory constraint-spec construction surface: turns a
//! [`PuzzleSpec`] (grid-shape tag + a list of tagged constraint
//! descriptors) into a [`GridShape`], an initial [`Grid`], and a built
//! [`HandlerSet`].
//!
//! This is *not* a parser for any external puzzle-file format — `build`
//! consumes an already-constructed in-memory tree, the same way
//! `DigitGrid`'s `FromStr` only understands the compact internal notation
//! rather than a general puzzle format.

use std::str::FromStr;

use variant_sudoku_core::{CoreError, Grid, GridShape, Mask};

use crate::error::SolverError;
use crate::handler::{
    AllDifferent, Arrow, Between, BinaryConstraint, BinaryPairwise, BoxedHandler, DfaLine,
    DoubleArrow, EntropicLine, HiddenSkyscraper, Indexing, Lockout, LittleKiller, Lunchbox,
    ModularLine, NumberedRoom, Palindrome, PillArrow, Quad, RelationKey, Renban, Sandwich,
    Skyscraper, Sum, SumLine, Thermometer, TransitionTable, ValueIndexing, Whisper, XSum,
};
use crate::handler_set::HandlerSet;

/// A cell reference in a [`ConstraintSpec`]: either a raw grid index or a
/// wire-format `R<row>C<col>` id (see `spec.md` §6), resolved against a
/// [`GridShape`] at build time.
#[derive(Debug, Clone)]
pub enum CellRef {
    /// A raw 0-indexed cell index.
    Index(usize),
    /// A wire-format cell id, e.g. `"R1C1"`.
    Id(String),
}

impl CellRef {
    fn resolve(&self, shape: &GridShape) -> Result<usize, SolverError> {
        match self {
            CellRef::Index(i) => Ok(*i),
            CellRef::Id(s) => Ok(shape.parse_cell_id(s)?),
        }
    }
}

fn resolve_all(cells: &[CellRef], shape: &GridShape) -> Result<Vec<usize>, SolverError> {
    cells.iter().map(|c| c.resolve(shape)).collect()
}

/// The grid-shape tag from `spec.md` §6: canonical form `"{rows}x{cols}"`
/// with an optional `"~{numValues}"` suffix; `numValues` defaults to
/// `cols` when the suffix is absent. Box dimensions derive automatically
/// when `rows * cols == numValues^2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShapeTag {
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
    /// Number of distinct values.
    pub num_values: usize,
}

impl GridShapeTag {
    /// The standard 9x9 tag, used as the default when a wire payload omits
    /// a shape entirely.
    #[must_use]
    pub fn classic_9x9() -> Self {
        Self { rows: 9, cols: 9, num_values: 9 }
    }

    /// Builds the [`GridShape`] this tag describes.
    #[must_use]
    pub fn to_shape(self) -> GridShape {
        GridShape::with_derived_boxes(self.rows, self.cols, self.num_values)
    }
}

impl FromStr for GridShapeTag {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || SolverError::Core(CoreError::MalformedCellId(s.to_string()));
        let (dims, values) = match s.split_once('~') {
            Some((d, v)) => (d, Some(v)),
            None => (s, None),
        };
        let (rows_str, cols_str) = dims.split_once('x').ok_or_else(malformed)?;
        let rows: usize = rows_str.parse().map_err(|_| malformed())?;
        let cols: usize = cols_str.parse().map_err(|_| malformed())?;
        let num_values = match values {
            Some(v) => v.parse().map_err(|_| malformed())?,
            None => cols,
        };
        Ok(Self { rows, cols, num_values })
    }
}

/// Adjacency relations used by [`ConstraintSpec::AntiKnight`],
/// [`ConstraintSpec::AntiKing`], and [`ConstraintSpec::Consecutive`]:
/// every pair of cells at the given offset relation gets a pairwise
/// constraint.
fn adjacent_pairs(shape: &GridShape, offsets: &[(isize, isize)]) -> Vec<(usize, usize)> {
    let (rows, cols) = (shape.num_rows() as isize, shape.num_cols() as isize);
    let mut pairs = vec![];
    for r in 0..rows {
        for c in 0..cols {
            for &(dr, dc) in offsets {
                let (r2, c2) = (r + dr, c + dc);
                if r2 < 0 || c2 < 0 || r2 >= rows || c2 >= cols {
                    continue;
                }
                let a = shape.cell_index(r as usize, c as usize);
                let b = shape.cell_index(r2 as usize, c2 as usize);
                if a < b {
                    pairs.push((a, b));
                }
            }
        }
    }
    pairs
}

/// Every pair of cells across the whole grid plus their taxicab (Manhattan)
/// distance, used by [`ConstraintSpec::Taxicab`].
fn all_cell_pairs_by_taxicab_distance(shape: &GridShape) -> Vec<(usize, usize, usize)> {
    let (rows, cols) = (shape.num_rows(), shape.num_cols());
    let mut pairs = vec![];
    for r1 in 0..rows {
        for c1 in 0..cols {
            let a = shape.cell_index(r1, c1);
            for r2 in 0..rows {
                for c2 in 0..cols {
                    let b = shape.cell_index(r2, c2);
                    if a < b {
                        pairs.push((a, b, r1.abs_diff(r2) + c1.abs_diff(c2)));
                    }
                }
            }
        }
    }
    pairs
}

/// A single constraint descriptor. Each variant names a cell-reference
/// list plus the parameters its handler needs; [`build`] translates each
/// descriptor into one or more [`crate::handler::Handler`]s.
#[derive(Debug, Clone)]
pub enum ConstraintSpec {
    /// Fixes `cell` to `value` before search begins.
    Given { cell: CellRef, value: u8 },
    /// An extra `AllDifferent` region (jigsaw piece, windoku box, or any
    /// other arbitrary house) beyond the canonical rows/columns/boxes
    /// `GridShape` already derives.
    ExtraRegion { cells: Vec<CellRef> },
    /// The two main diagonals must also be `AllDifferent`.
    Diagonals,
    /// A killer-cage-style or coefficient-weighted sum.
    Sum {
        cells: Vec<CellRef>,
        coefficients: Option<Vec<i64>>,
        target: i64,
        cage_all_different: bool,
    },
    /// An arrow: `head` equals the sum of `shaft`.
    Arrow { head: CellRef, shaft: Vec<CellRef> },
    /// Two arrows sharing a head.
    DoubleArrow { head: CellRef, shaft_a: Vec<CellRef>, shaft_b: Vec<CellRef> },
    /// A multi-cell "pill" head read as a multi-digit number, equal to the
    /// sum of `shaft`.
    PillArrow { pill_cells: Vec<CellRef>, shaft: Vec<CellRef> },
    /// A line summing to a fixed total, without cage semantics.
    SumLine { cells: Vec<CellRef>, target: i64 },
    /// A diagonal ray summing to `target` (little-killer clue).
    LittleKiller { cells: Vec<CellRef>, target: i64 },
    /// A strictly increasing path from bulb to tip.
    Thermometer { cells: Vec<CellRef> },
    /// Mirrored values around an even-length path's midpoint.
    Palindrome { cells: Vec<CellRef> },
    /// Adjacent cells differ by at least `min_diff`.
    Whisper { cells: Vec<CellRef>, min_diff: u8 },
    /// A consecutive run of distinct values in any order.
    Renban { cells: Vec<CellRef> },
    /// Every sliding window of `modulus` consecutive cells holds one of
    /// each residue class mod `modulus`.
    Modular { cells: Vec<CellRef>, modulus: usize },
    /// Every sliding window of 3 consecutive cells holds one low, one mid,
    /// and one high value (thirds of the value domain).
    Entropic { cells: Vec<CellRef> },
    /// Path cells lie strictly between the two endpoints' values.
    Between { low: CellRef, high: CellRef, path: Vec<CellRef> },
    /// Endpoints differ by at least `gap`; path cells excluded between them.
    Lockout { a: CellRef, b: CellRef, path: Vec<CellRef>, gap: u8 },
    /// A skyscraper edge clue.
    Skyscraper { cells: Vec<CellRef>, clue: u8 },
    /// A hidden-skyscraper edge clue.
    HiddenSkyscraper { cells: Vec<CellRef>, clue: u8 },
    /// A numbered-room edge clue.
    NumberedRoom { cells: Vec<CellRef>, clue: u8 },
    /// An X-sum edge clue.
    XSum { cells: Vec<CellRef>, clue: i64 },
    /// A sandwich-sum house clue (bread markers are `1` and `numValues`).
    Sandwich { house: Vec<CellRef>, target: i64 },
    /// A lunchbox house clue (arbitrary bread markers).
    Lunchbox { house: Vec<CellRef>, low_marker: u8, high_marker: u8, target: i64 },
    /// A full position<->value indexing relation.
    Indexing { index_cells: Vec<CellRef>, value_cells: Vec<CellRef> },
    /// A single-value indexing relation.
    ValueIndexing { house: Vec<CellRef>, target_value: u8, index_cell: CellRef },
    /// A quadruple clue.
    Quad { cells: Vec<CellRef>, required: Vec<u8> },
    /// Every pair of cells a knight's-move apart must differ.
    AntiKnight,
    /// Every pair of cells a king's-move apart must differ.
    AntiKing,
    /// Every pair of orthogonally adjacent cells must differ by more than 1.
    Consecutive,
    /// Any two cells holding the same value `v` must sit at taxicab
    /// distance exactly `v` from each other.
    Taxicab,
    /// A line constraint defined by a DFA read left-to-right over `cells`.
    DfaLine {
        cells: Vec<CellRef>,
        transition: TransitionTable,
        start: usize,
        accept: Vec<bool>,
        name: String,
    },
}

/// A full puzzle description: the grid shape plus every constraint.
#[derive(Debug, Clone)]
pub struct PuzzleSpec {
    /// The grid's dimensions and value count.
    pub shape: GridShapeTag,
    /// Every constraint descriptor to translate.
    pub constraints: Vec<ConstraintSpec>,
}

/// The outcome of [`build`]: a grid shape, an initial grid, and either a
/// built handler set or `None` if the constraints are already infeasible
/// (e.g. two conflicting givens) — matching `spec.md` §7's rule that
/// initial infeasibility is never a [`SolverError`].
pub struct BuildResult {
    /// The grid shape this puzzle was built against.
    pub shape: GridShape,
    /// The (possibly partially pruned) initial grid.
    pub grid: Grid,
    /// `None` when the constraint set is infeasible from the start.
    pub handlers: Option<HandlerSet>,
    /// Resolved jigsaw/windoku/diagonal regions (beyond the canonical
    /// rows/columns/boxes), captured so [`crate::api::Solver::validate_layout`]
    /// can rebuild a layout-only handler set without re-walking the spec.
    pub layout_regions: Vec<Vec<usize>>,
}

/// Translates `spec` into a [`BuildResult`].
///
/// # Errors
///
/// Returns [`SolverError`] for malformed descriptors: unresolvable cell
/// ids, mismatched coefficient/cell lists, or (propagated from
/// [`crate::handler::Sum::new`]) non-integer-reducible coefficients.
pub fn build(spec: &PuzzleSpec) -> Result<BuildResult, SolverError> {
    let shape = spec.shape.to_shape();
    let num_values = shape.num_values();
    let mut grid = Grid::new(&shape);
    let mut handlers: Vec<BoxedHandler> = vec![];

    for house in shape.rows() {
        handlers.push(Box::new(AllDifferent::new(house)));
    }
    for house in shape.columns() {
        handlers.push(Box::new(AllDifferent::new(house)));
    }
    for house in shape.boxes() {
        handlers.push(Box::new(AllDifferent::new(house)));
    }

    let mut layout_regions = vec![];
    for constraint in &spec.constraints {
        translate(constraint, &shape, num_values, &mut grid, &mut handlers, &mut layout_regions)?;
    }

    let handlers = HandlerSet::build(handlers, &mut grid, &shape);
    Ok(BuildResult { shape, grid, handlers, layout_regions })
}

fn translate(
    constraint: &ConstraintSpec,
    shape: &GridShape,
    num_values: usize,
    grid: &mut Grid,
    handlers: &mut Vec<BoxedHandler>,
    layout_regions: &mut Vec<Vec<usize>>,
) -> Result<(), SolverError> {
    match constraint {
        ConstraintSpec::Given { cell, value } => {
            let cell = cell.resolve(shape)?;
            grid[cell].intersect_with(Mask::singleton(*value));
        }
        ConstraintSpec::ExtraRegion { cells } => {
            let cells = resolve_all(cells, shape)?;
            layout_regions.push(cells.clone());
            handlers.push(Box::new(AllDifferent::new(cells)));
        }
        ConstraintSpec::Diagonals => {
            for house in shape.diagonals() {
                layout_regions.push(house.clone());
                handlers.push(Box::new(AllDifferent::new(house)));
            }
        }
        ConstraintSpec::Sum { cells, coefficients, target, cage_all_different } => {
            let cells = resolve_all(cells, shape)?;
            handlers.push(Box::new(Sum::new(
                cells,
                coefficients.clone(),
                *target,
                num_values,
                *cage_all_different,
            )?));
        }
        ConstraintSpec::Arrow { head, shaft } => {
            let head = head.resolve(shape)?;
            let shaft = resolve_all(shaft, shape)?;
            handlers.push(Box::new(Arrow::new(head, shaft, num_values)?));
        }
        ConstraintSpec::DoubleArrow { head, shaft_a, shaft_b } => {
            let head = head.resolve(shape)?;
            let shaft_a = resolve_all(shaft_a, shape)?;
            let shaft_b = resolve_all(shaft_b, shape)?;
            handlers.push(Box::new(DoubleArrow::new(head, shaft_a, shaft_b, num_values)?));
        }
        ConstraintSpec::PillArrow { pill_cells, shaft } => {
            let pill_cells = resolve_all(pill_cells, shape)?;
            let shaft = resolve_all(shaft, shape)?;
            handlers.push(Box::new(PillArrow::new(pill_cells, shaft, num_values)?));
        }
        ConstraintSpec::SumLine { cells, target } => {
            let cells = resolve_all(cells, shape)?;
            handlers.push(Box::new(SumLine::new(cells, *target, num_values)?));
        }
        ConstraintSpec::LittleKiller { cells, target } => {
            let cells = resolve_all(cells, shape)?;
            handlers.push(Box::new(LittleKiller::new(cells, *target, num_values)?));
        }
        ConstraintSpec::Thermometer { cells } => {
            let cells = resolve_all(cells, shape)?;
            handlers.push(Box::new(Thermometer::new(cells, num_values)));
        }
        ConstraintSpec::Palindrome { cells } => {
            let cells = resolve_all(cells, shape)?;
            handlers.push(Box::new(Palindrome::new(cells, num_values)));
        }
        ConstraintSpec::Whisper { cells, min_diff } => {
            let cells = resolve_all(cells, shape)?;
            handlers.push(Box::new(Whisper::new(cells, num_values, *min_diff)));
        }
        ConstraintSpec::Renban { cells } => {
            let cells = resolve_all(cells, shape)?;
            handlers.push(Box::new(Renban::new(cells, num_values)));
        }
        ConstraintSpec::Modular { cells, modulus } => {
            let cells = resolve_all(cells, shape)?;
            handlers.push(Box::new(ModularLine::new(cells, num_values, *modulus)));
        }
        ConstraintSpec::Entropic { cells } => {
            let cells = resolve_all(cells, shape)?;
            handlers.push(Box::new(EntropicLine::new(cells, num_values)));
        }
        ConstraintSpec::Between { low, high, path } => {
            let low = low.resolve(shape)?;
            let high = high.resolve(shape)?;
            let path = resolve_all(path, shape)?;
            handlers.push(Box::new(Between::new(low, high, path)));
        }
        ConstraintSpec::Lockout { a, b, path, gap } => {
            let a = a.resolve(shape)?;
            let b = b.resolve(shape)?;
            let path = resolve_all(path, shape)?;
            handlers.push(Box::new(Lockout::new(a, b, path, num_values, *gap)));
        }
        ConstraintSpec::Skyscraper { cells, clue } => {
            let cells = resolve_all(cells, shape)?;
            handlers.push(Box::new(Skyscraper::new(cells, *clue, num_values)));
        }
        ConstraintSpec::HiddenSkyscraper { cells, clue } => {
            let cells = resolve_all(cells, shape)?;
            handlers.push(Box::new(HiddenSkyscraper::new(cells, *clue, num_values)));
        }
        ConstraintSpec::NumberedRoom { cells, clue } => {
            let cells = resolve_all(cells, shape)?;
            handlers.push(Box::new(NumberedRoom::new(cells, *clue)));
        }
        ConstraintSpec::XSum { cells, clue } => {
            let cells = resolve_all(cells, shape)?;
            handlers.push(Box::new(XSum::new(cells, *clue, num_values)));
        }
        ConstraintSpec::Sandwich { house, target } => {
            let house = resolve_all(house, shape)?;
            handlers.push(Box::new(Sandwich::new(house, *target, num_values)));
        }
        ConstraintSpec::Lunchbox { house, low_marker, high_marker, target } => {
            let house = resolve_all(house, shape)?;
            handlers.push(Box::new(Lunchbox::new(house, *low_marker, *high_marker, *target, num_values)));
        }
        ConstraintSpec::Indexing { index_cells, value_cells } => {
            let index_cells = resolve_all(index_cells, shape)?;
            let value_cells = resolve_all(value_cells, shape)?;
            handlers.push(Box::new(Indexing::new(index_cells, value_cells)));
        }
        ConstraintSpec::ValueIndexing { house, target_value, index_cell } => {
            let house = resolve_all(house, shape)?;
            let index_cell = index_cell.resolve(shape)?;
            handlers.push(Box::new(ValueIndexing::new(house, *target_value, index_cell)));
        }
        ConstraintSpec::Quad { cells, required } => {
            let cells = resolve_all(cells, shape)?;
            handlers.push(Box::new(Quad::new(cells, required.clone())));
        }
        ConstraintSpec::AntiKnight => {
            let not_equal = RelationKey::new("neq", num_values, |a, b| a != b);
            for (a, b) in adjacent_pairs(shape, &[(1, 2), (2, 1), (1, -2), (2, -1)]) {
                handlers.push(Box::new(BinaryConstraint::new(a, b, not_equal.clone())));
            }
        }
        ConstraintSpec::AntiKing => {
            let not_equal = RelationKey::new("neq", num_values, |a, b| a != b);
            for (a, b) in adjacent_pairs(shape, &[(1, 1), (1, -1)]) {
                handlers.push(Box::new(BinaryConstraint::new(a, b, not_equal.clone())));
            }
        }
        ConstraintSpec::Consecutive => {
            let non_consecutive = RelationKey::new("non_consecutive", num_values, |a, b| a.abs_diff(b) != 1);
            for (a, b) in adjacent_pairs(shape, &[(0, 1), (1, 0)]) {
                handlers.push(Box::new(BinaryConstraint::new(a, b, non_consecutive.clone())));
            }
        }
        ConstraintSpec::Taxicab => {
            let mut by_distance: Vec<(usize, RelationKey)> = vec![];
            for (a, b, d) in all_cell_pairs_by_taxicab_distance(shape) {
                let relation = match by_distance.iter().find(|(dd, _)| *dd == d) {
                    Some((_, r)) => r.clone(),
                    None => {
                        let r = RelationKey::new(format!("taxicab_{d}"), num_values, move |x, y| {
                            !(x == y && usize::from(x) != d)
                        });
                        by_distance.push((d, r.clone()));
                        r
                    }
                };
                handlers.push(Box::new(BinaryConstraint::new(a, b, relation)));
            }
        }
        ConstraintSpec::DfaLine { cells, transition, start, accept, name } => {
            let cells = resolve_all(cells, shape)?;
            handlers.push(Box::new(DfaLine::new(
                cells,
                transition.clone(),
                *start,
                accept.clone(),
                num_values,
                name.clone(),
            )));
        }
    }
    Ok(())
}

/// Builds the layout-only handler set for [`crate::api::Solver::validate_layout`]:
/// only the house/box/jigsaw `AllDifferent` handlers, skipping givens and
/// every numeric/relational constraint. `layout_regions` is the set of
/// non-canonical regions (jigsaw/windoku/diagonal cell lists) already
/// resolved during the original [`build`] call, so this never re-parses a
/// [`CellRef`].
#[must_use]
pub fn build_layout_only(shape: &GridShape, layout_regions: &[Vec<usize>]) -> BuildResult {
    let mut grid = Grid::new(shape);
    let mut handlers: Vec<BoxedHandler> = vec![];
    for house in shape.all_houses() {
        handlers.push(Box::new(AllDifferent::new(house)));
    }
    for region in layout_regions {
        handlers.push(Box::new(AllDifferent::new(region.clone())));
    }
    let handlers = HandlerSet::build(handlers, &mut grid, shape);
    BuildResult {
        shape: shape.clone(),
        grid,
        handlers,
        layout_regions: layout_regions.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_shape_tag_with_explicit_num_values() {
        let tag: GridShapeTag = "6x6~6".parse().unwrap();
        assert_eq!(tag, GridShapeTag { rows: 6, cols: 6, num_values: 6 });
    }

    #[test]
    fn parses_shape_tag_defaulting_num_values_to_cols() {
        let tag: GridShapeTag = "9x9".parse().unwrap();
        assert_eq!(tag.num_values, 9);
    }

    #[test]
    fn rejects_malformed_shape_tag() {
        assert!("bogus".parse::<GridShapeTag>().is_err());
    }

    #[test]
    fn build_rejects_mismatched_sum_coefficients() {
        let spec = PuzzleSpec {
            shape: GridShapeTag::classic_9x9(),
            constraints: vec![ConstraintSpec::Sum {
                cells: vec![CellRef::Index(0), CellRef::Index(1)],
                coefficients: Some(vec![1]),
                target: 3,
                cage_all_different: false,
            }],
        };
        assert!(matches!(build(&spec), Err(SolverError::CoefficientCellMismatch { .. })));
    }

    #[test]
    fn build_reports_infeasible_givens_as_none_handlers() {
        let spec = PuzzleSpec {
            shape: GridShapeTag::classic_9x9(),
            constraints: vec![
                ConstraintSpec::Given { cell: CellRef::Index(0), value: 1 },
                ConstraintSpec::Given { cell: CellRef::Id("R1C1".to_string()), value: 2 },
            ],
        };
        let result = build(&spec).unwrap();
        assert!(result.handlers.is_none());
    }

    #[test]
    fn build_applies_a_modular_line() {
        let spec = PuzzleSpec {
            shape: GridShapeTag::classic_9x9(),
            constraints: vec![
                ConstraintSpec::Given { cell: CellRef::Index(0), value: 1 },
                ConstraintSpec::Modular {
                    cells: vec![CellRef::Index(0), CellRef::Index(1), CellRef::Index(2)],
                    modulus: 3,
                },
            ],
        };
        let result = build(&spec).unwrap();
        assert!(result.handlers.is_some());
        for v in [1u8, 4, 7] {
            assert!(!result.grid[1].contains(v));
        }
    }

    #[test]
    fn build_applies_an_entropic_line() {
        let spec = PuzzleSpec {
            shape: GridShapeTag::classic_9x9(),
            constraints: vec![
                ConstraintSpec::Given { cell: CellRef::Index(0), value: 2 },
                ConstraintSpec::Entropic {
                    cells: vec![CellRef::Index(0), CellRef::Index(1), CellRef::Index(2)],
                },
            ],
        };
        let result = build(&spec).unwrap();
        assert!(result.handlers.is_some());
        for v in [1u8, 2, 3] {
            assert!(!result.grid[1].contains(v));
        }
    }

    #[test]
    fn build_applies_taxicab_exclusions() {
        // R1C1 (index 0) = 5. R4C2 (index 28, row 3 col 1) shares no row,
        // column, or box with it, but sits at taxicab distance 4, so the
        // taxicab relation alone must exclude 5 there. R5C2 (index 37, row
        // 4 col 1) sits at distance 5 instead, so it may still hold 5.
        let spec = PuzzleSpec {
            shape: GridShapeTag::classic_9x9(),
            constraints: vec![
                ConstraintSpec::Given { cell: CellRef::Index(0), value: 5 },
                ConstraintSpec::Taxicab,
            ],
        };
        let result = build(&spec).unwrap();
        assert!(result.handlers.is_some());
        assert!(!result.grid[28].contains(5), "R4C2 is taxicab distance 4 from R1C1");
        assert!(result.grid[37].contains(5), "R5C2 is taxicab distance 5 from R1C1");
    }

    #[test]
    fn build_solves_a_killer_cage_over_an_empty_grid() {
        let spec = PuzzleSpec {
            shape: GridShapeTag::classic_9x9(),
            constraints: vec![ConstraintSpec::Sum {
                cells: vec![CellRef::Index(0), CellRef::Index(1), CellRef::Index(2)],
                coefficients: None,
                target: 6,
                cage_all_different: true,
            }],
        };
        let result = build(&spec).unwrap();
        assert!(result.handlers.is_some());
        for c in [0, 1, 2] {
            assert_eq!(
                result.grid[c],
                Mask::singleton(1) | Mask::singleton(2) | Mask::singleton(3)
            );
        }
    }
}
