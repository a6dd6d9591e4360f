//! Ordered-path ("line") handlers: thermometers, palindromes, whispers,
//! renbans, arrows, and the sum/ordering-based lines built on them.

use variant_sudoku_core::{CellExclusions, Grid, GridShape, Mask};

use super::binary::{
    BinaryConstraint, BinaryPairwise, RelationKey, diff_at_least, equal, less_than, within_run_of,
};
use super::{Handler, Sum, format_id};
use crate::accumulator::HandlerAccumulator;
use crate::error::SolverError;

/// Every pair of cells within some sliding window of `window` consecutive
/// `cells`, deduplicated across overlapping windows.
fn window_pairs(cells: &[usize], window: usize) -> Vec<(usize, usize)> {
    let mut pairs = vec![];
    if window >= 2 {
        for w in cells.windows(window) {
            for i in 0..w.len() {
                for j in (i + 1)..w.len() {
                    pairs.push((w[i], w[j]));
                }
            }
        }
    }
    pairs.sort_unstable();
    pairs.dedup();
    pairs
}

/// A strictly increasing path from bulb to tip.
#[derive(Debug, Clone)]
pub struct Thermometer {
    cells: Vec<usize>,
    links: Vec<BinaryConstraint>,
}

impl Thermometer {
    /// Creates a thermometer over `cells`, ordered from bulb to tip.
    #[must_use]
    pub fn new(cells: Vec<usize>, num_values: usize) -> Self {
        let links = cells
            .windows(2)
            .map(|w| BinaryConstraint::new(w[0], w[1], less_than(num_values)))
            .collect();
        Self { cells, links }
    }
}

impl Handler for Thermometer {
    fn cells(&self) -> &[usize] {
        &self.cells
    }

    fn id_str(&self) -> String {
        format_id("thermometer", &self.cells, "")
    }

    fn initialize(&mut self, grid: &mut Grid, exclusions: &mut CellExclusions, shape: &GridShape) -> bool {
        self.links.iter_mut().all(|l| l.initialize(grid, exclusions, shape))
    }

    fn enforce_consistency(&mut self, grid: &mut Grid, accumulator: &mut HandlerAccumulator) -> bool {
        loop {
            let mut changed = false;
            for link in &mut self.links {
                let before: Vec<Mask> = link.cells().iter().map(|&c| grid[c]).collect();
                if !link.enforce_consistency(grid, accumulator) {
                    return false;
                }
                if link.cells().iter().map(|&c| grid[c]).ne(before) {
                    changed = true;
                }
            }
            if !changed {
                return true;
            }
        }
    }
}

/// Mirrored values around the midpoint of an even-length path.
#[derive(Debug, Clone)]
pub struct Palindrome {
    cells: Vec<usize>,
    links: Vec<BinaryConstraint>,
}

impl Palindrome {
    /// Creates a palindrome handler over `cells`.
    #[must_use]
    pub fn new(cells: Vec<usize>, num_values: usize) -> Self {
        let n = cells.len();
        let links = (0..n / 2)
            .map(|i| BinaryConstraint::new(cells[i], cells[n - 1 - i], equal(num_values)))
            .collect();
        Self { cells, links }
    }
}

impl Handler for Palindrome {
    fn cells(&self) -> &[usize] {
        &self.cells
    }

    fn id_str(&self) -> String {
        format_id("palindrome", &self.cells, "")
    }

    fn initialize(&mut self, grid: &mut Grid, exclusions: &mut CellExclusions, shape: &GridShape) -> bool {
        self.links.iter_mut().all(|l| l.initialize(grid, exclusions, shape))
    }

    fn enforce_consistency(&mut self, grid: &mut Grid, accumulator: &mut HandlerAccumulator) -> bool {
        self.links.iter_mut().all(|l| l.enforce_consistency(grid, accumulator))
    }
}

/// Adjacent cells differ by at least `min_diff` (a "German whisper" when
/// `min_diff == 5`, a looser "dutch whisper" at `min_diff == 4`).
#[derive(Debug, Clone)]
pub struct Whisper {
    cells: Vec<usize>,
    links: Vec<BinaryConstraint>,
}

impl Whisper {
    /// Creates a whisper line over `cells` with adjacent difference at
    /// least `min_diff`.
    #[must_use]
    pub fn new(cells: Vec<usize>, num_values: usize, min_diff: u8) -> Self {
        let links = cells
            .windows(2)
            .map(|w| BinaryConstraint::new(w[0], w[1], diff_at_least(num_values, min_diff)))
            .collect();
        Self { cells, links }
    }
}

impl Handler for Whisper {
    fn cells(&self) -> &[usize] {
        &self.cells
    }

    fn id_str(&self) -> String {
        format_id("whisper", &self.cells, "")
    }

    fn initialize(&mut self, grid: &mut Grid, exclusions: &mut CellExclusions, shape: &GridShape) -> bool {
        self.links.iter_mut().all(|l| l.initialize(grid, exclusions, shape))
    }

    fn enforce_consistency(&mut self, grid: &mut Grid, accumulator: &mut HandlerAccumulator) -> bool {
        self.links.iter_mut().all(|l| l.enforce_consistency(grid, accumulator))
    }
}

/// Every sliding window of `modulus` consecutive cells holds one of each
/// residue class mod `modulus` (a "modular line": window size 1 smaller
/// than the domain collapses to ordinary pairwise distinctness within the
/// window).
#[derive(Debug, Clone)]
pub struct ModularLine {
    cells: Vec<usize>,
    links: Vec<BinaryConstraint>,
}

impl ModularLine {
    /// Creates a modular line over `cells` with window/modulus `modulus`.
    #[must_use]
    pub fn new(cells: Vec<usize>, num_values: usize, modulus: usize) -> Self {
        let relation = RelationKey::new(format!("mod_distinct_{modulus}"), num_values, move |a, b| {
            (usize::from(a - 1)) % modulus != (usize::from(b - 1)) % modulus
        });
        let links = window_pairs(&cells, modulus)
            .into_iter()
            .map(|(a, b)| BinaryConstraint::new(a, b, relation.clone()))
            .collect();
        Self { cells, links }
    }
}

impl Handler for ModularLine {
    fn cells(&self) -> &[usize] {
        &self.cells
    }

    fn id_str(&self) -> String {
        format_id("modular_line", &self.cells, "")
    }

    fn initialize(&mut self, grid: &mut Grid, exclusions: &mut CellExclusions, shape: &GridShape) -> bool {
        self.links.iter_mut().all(|l| l.initialize(grid, exclusions, shape))
    }

    fn enforce_consistency(&mut self, grid: &mut Grid, accumulator: &mut HandlerAccumulator) -> bool {
        loop {
            let mut changed = false;
            for link in &mut self.links {
                let before: Vec<Mask> = link.cells().iter().map(|&c| grid[c]).collect();
                if !link.enforce_consistency(grid, accumulator) {
                    return false;
                }
                if link.cells().iter().map(|&c| grid[c]).ne(before) {
                    changed = true;
                }
            }
            if !changed {
                return true;
            }
        }
    }
}

/// Every sliding window of 3 consecutive cells holds one value from each
/// third of the value domain (low/mid/high "entropy" bucket).
#[derive(Debug, Clone)]
pub struct EntropicLine {
    cells: Vec<usize>,
    links: Vec<BinaryConstraint>,
}

impl EntropicLine {
    /// Creates an entropic line over `cells`.
    #[must_use]
    pub fn new(cells: Vec<usize>, num_values: usize) -> Self {
        let relation = RelationKey::new("entropic_distinct", num_values, move |a, b| {
            entropic_bucket(a, num_values) != entropic_bucket(b, num_values)
        });
        let links = window_pairs(&cells, 3)
            .into_iter()
            .map(|(a, b)| BinaryConstraint::new(a, b, relation.clone()))
            .collect();
        Self { cells, links }
    }
}

/// Which third of `1..=num_values` `v` falls in (0 = low, 1 = mid, 2 = high).
fn entropic_bucket(v: u8, num_values: usize) -> u8 {
    ((usize::from(v - 1) * 3) / num_values) as u8
}

impl Handler for EntropicLine {
    fn cells(&self) -> &[usize] {
        &self.cells
    }

    fn id_str(&self) -> String {
        format_id("entropic_line", &self.cells, "")
    }

    fn initialize(&mut self, grid: &mut Grid, exclusions: &mut CellExclusions, shape: &GridShape) -> bool {
        self.links.iter_mut().all(|l| l.initialize(grid, exclusions, shape))
    }

    fn enforce_consistency(&mut self, grid: &mut Grid, accumulator: &mut HandlerAccumulator) -> bool {
        loop {
            let mut changed = false;
            for link in &mut self.links {
                let before: Vec<Mask> = link.cells().iter().map(|&c| grid[c]).collect();
                if !link.enforce_consistency(grid, accumulator) {
                    return false;
                }
                if link.cells().iter().map(|&c| grid[c]).ne(before) {
                    changed = true;
                }
            }
            if !changed {
                return true;
            }
        }
    }
}

/// A set of cells forming a run of `len(cells)` consecutive values in any
/// order, all distinct.
///
/// Combines an all-different clique with a pairwise "within-one-run-width"
/// relation; the latter alone is not a complete consistency check (see
/// [`within_run_of`]'s doc comment), but the two together reject every
/// assignment that isn't a genuine consecutive run, just sometimes a pass
/// later than a bespoke window-propagator would.
#[derive(Debug, Clone)]
pub struct Renban {
    cells: Vec<usize>,
    pairwise: BinaryPairwise,
}

impl Renban {
    /// Creates a renban line over `cells`.
    #[must_use]
    pub fn new(cells: Vec<usize>, num_values: usize) -> Self {
        let k = cells.len() as u8;
        let pairwise = BinaryPairwise::new(cells.clone(), within_run_of(num_values, k));
        Self { cells, pairwise }
    }
}

impl Handler for Renban {
    fn cells(&self) -> &[usize] {
        &self.cells
    }

    fn id_str(&self) -> String {
        format_id("renban", &self.cells, "")
    }

    fn initialize(&mut self, grid: &mut Grid, exclusions: &mut CellExclusions, shape: &GridShape) -> bool {
        exclusions
            .add_all_different(&self.cells)
            .expect("CellExclusions must not be sealed during handler initialization");
        self.pairwise.initialize(grid, exclusions, shape)
    }

    fn enforce_consistency(&mut self, grid: &mut Grid, accumulator: &mut HandlerAccumulator) -> bool {
        self.pairwise.enforce_consistency(grid, accumulator)
    }
}

/// An arrow: the head cell equals the sum of the shaft cells.
#[derive(Debug)]
pub struct Arrow {
    sum: Sum,
}

impl Arrow {
    /// Creates an arrow with `head` equal to the sum of `shaft`.
    ///
    /// # Errors
    ///
    /// Propagates [`SolverError`] from the underlying [`Sum`] builder
    /// (never triggered by this constructor's own fixed-coefficient
    /// shape, but kept so callers building `Arrow`s in a loop can use `?`
    /// uniformly).
    pub fn new(head: usize, shaft: Vec<usize>, num_values: usize) -> Result<Self, SolverError> {
        let mut cells = vec![head];
        cells.extend(&shaft);
        let mut coeffs = vec![-1i64];
        coeffs.extend(std::iter::repeat_n(1i64, shaft.len()));
        Ok(Self {
            sum: Sum::new(cells, Some(coeffs), 0, num_values, false)?,
        })
    }
}

impl Handler for Arrow {
    fn cells(&self) -> &[usize] {
        self.sum.cells()
    }

    fn id_str(&self) -> String {
        format_id("arrow", self.sum.cells(), "")
    }

    fn priority(&self) -> i32 {
        self.sum.priority()
    }

    fn initialize(&mut self, grid: &mut Grid, exclusions: &mut CellExclusions, shape: &GridShape) -> bool {
        self.sum.initialize(grid, exclusions, shape)
    }

    fn enforce_consistency(&mut self, grid: &mut Grid, accumulator: &mut HandlerAccumulator) -> bool {
        self.sum.enforce_consistency(grid, accumulator)
    }
}

/// Two arrows sharing a single head cell pool: `head = sum(shaft_a) =
/// sum(shaft_b)`, modeled as two arrows plus an equality between their
/// (shared) targets — here simply two independent [`Arrow`]s over the same
/// head, since the shared-head equality falls out of both already summing
/// to that one cell's value.
#[derive(Debug)]
pub struct DoubleArrow {
    a: Arrow,
    b: Arrow,
    cells: Vec<usize>,
}

impl DoubleArrow {
    /// Creates a double arrow over a shared `head` with two shafts.
    ///
    /// # Errors
    ///
    /// Propagates [`SolverError`] from the underlying [`Sum`] builders.
    pub fn new(
        head: usize,
        shaft_a: Vec<usize>,
        shaft_b: Vec<usize>,
        num_values: usize,
    ) -> Result<Self, SolverError> {
        let a = Arrow::new(head, shaft_a, num_values)?;
        let b = Arrow::new(head, shaft_b, num_values)?;
        let mut cells = a.cells().to_vec();
        cells.extend(b.cells());
        cells.sort_unstable();
        cells.dedup();
        Ok(Self { a, b, cells })
    }
}

impl Handler for DoubleArrow {
    fn cells(&self) -> &[usize] {
        &self.cells
    }

    fn id_str(&self) -> String {
        format_id("double_arrow", &self.cells, "")
    }

    fn initialize(&mut self, grid: &mut Grid, exclusions: &mut CellExclusions, shape: &GridShape) -> bool {
        self.a.initialize(grid, exclusions, shape) && self.b.initialize(grid, exclusions, shape)
    }

    fn enforce_consistency(&mut self, grid: &mut Grid, accumulator: &mut HandlerAccumulator) -> bool {
        self.a.enforce_consistency(grid, accumulator) && self.b.enforce_consistency(grid, accumulator)
    }
}

/// An arrow whose head is a multi-cell "pill" read as a multi-digit number
/// (most significant digit first), equal to the sum of the shaft.
#[derive(Debug)]
pub struct PillArrow {
    sum: Sum,
}

impl PillArrow {
    /// Creates a pill arrow: `pill_cells` (most-significant first) read as
    /// a base-`num_values` number, equal to the sum of `shaft`.
    ///
    /// # Errors
    ///
    /// Propagates [`SolverError`] from the underlying [`Sum`] builder.
    pub fn new(pill_cells: Vec<usize>, shaft: Vec<usize>, num_values: usize) -> Result<Self, SolverError> {
        let mut cells = vec![];
        let mut coeffs = vec![];
        let place_count = pill_cells.len() as u32;
        for (i, &c) in pill_cells.iter().enumerate() {
            cells.push(c);
            let place = place_count - 1 - i as u32;
            coeffs.push(-i64::from((num_values as u32).pow(place)));
        }
        cells.extend(&shaft);
        coeffs.extend(std::iter::repeat_n(1i64, shaft.len()));
        Ok(Self {
            sum: Sum::new(cells, Some(coeffs), 0, num_values, false)?,
        })
    }
}

impl Handler for PillArrow {
    fn cells(&self) -> &[usize] {
        self.sum.cells()
    }

    fn id_str(&self) -> String {
        format_id("pill_arrow", self.sum.cells(), "")
    }

    fn initialize(&mut self, grid: &mut Grid, exclusions: &mut CellExclusions, shape: &GridShape) -> bool {
        self.sum.initialize(grid, exclusions, shape)
    }

    fn enforce_consistency(&mut self, grid: &mut Grid, accumulator: &mut HandlerAccumulator) -> bool {
        self.sum.enforce_consistency(grid, accumulator)
    }
}

/// A line whose cells sum to a fixed target, without cage semantics (no
/// implicit all-different, no complement propagation) — a "sum line".
#[derive(Debug)]
pub struct SumLine {
    sum: Sum,
}

impl SumLine {
    /// Creates a sum line over `cells` equal to `target`.
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

impl Handler for SumLine {
    fn cells(&self) -> &[usize] {
        self.sum.cells()
    }

    fn id_str(&self) -> String {
        format_id("sum_line", self.sum.cells(), "")
    }

    fn initialize(&mut self, grid: &mut Grid, exclusions: &mut CellExclusions, shape: &GridShape) -> bool {
        self.sum.initialize(grid, exclusions, shape)
    }

    fn enforce_consistency(&mut self, grid: &mut Grid, accumulator: &mut HandlerAccumulator) -> bool {
        self.sum.enforce_consistency(grid, accumulator)
    }
}

/// Path cells must lie strictly between the two endpoint cells' values.
#[derive(Debug, Clone)]
pub struct Between {
    low: usize,
    high: usize,
    path: Vec<usize>,
    cells: Vec<usize>,
}

impl Between {
    /// Creates a between-line handler with endpoints `low`/`high` (order
    /// is not significant; whichever ends up smaller at solve time bounds
    /// the path from below) and interior `path` cells.
    #[must_use]
    pub fn new(low: usize, high: usize, path: Vec<usize>) -> Self {
        let mut cells = vec![low, high];
        cells.extend(&path);
        Self { low, high, path, cells }
    }
}

impl Handler for Between {
    fn cells(&self) -> &[usize] {
        &self.cells
    }

    fn id_str(&self) -> String {
        format_id("between", &self.cells, "")
    }

    fn initialize(&mut self, grid: &mut Grid, _exclusions: &mut CellExclusions, _shape: &GridShape) -> bool {
        let mut acc = HandlerAccumulator::new(grid.len(), &[]);
        self.enforce_consistency(grid, &mut acc)
    }

    fn enforce_consistency(&mut self, grid: &mut Grid, accumulator: &mut HandlerAccumulator) -> bool {
        // Only the fully-resolved-endpoints case yields a sound window;
        // otherwise every endpoint ordering would need to be considered,
        // so we leave the path unconstrained until endpoints settle.
        if let (Some(a), Some(b)) = (grid[self.low].as_singleton(), grid[self.high].as_singleton()) {
            let (lo, hi) = (a.min(b), a.max(b));
            if hi <= lo + 1 {
                for &c in &self.path {
                    grid[c] = Mask::EMPTY;
                    accumulator.add_for_cell(c);
                }
                return false;
            }
            let mut window = Mask::EMPTY;
            for v in (lo + 1)..hi {
                window.insert(v);
            }
            for &c in &self.path {
                if grid[c].intersect_with(window) {
                    accumulator.add_for_cell(c);
                    if grid[c].is_empty() {
                        return false;
                    }
                }
            }
        }
        true
    }
}

/// Endpoints differ by at least `gap`; once both endpoints are resolved,
/// path cells are excluded from the closed interval between them.
#[derive(Debug, Clone)]
pub struct Lockout {
    a: usize,
    b: usize,
    path: Vec<usize>,
    cells: Vec<usize>,
    diff: BinaryConstraint,
}

impl Lockout {
    /// Creates a lockout line with endpoints `a`/`b` at least `gap` apart
    /// and interior `path` cells excluded from between them.
    #[must_use]
    pub fn new(a: usize, b: usize, path: Vec<usize>, num_values: usize, gap: u8) -> Self {
        let mut cells = vec![a, b];
        cells.extend(&path);
        let diff = BinaryConstraint::new(a, b, diff_at_least(num_values, gap));
        Self { a, b, path, cells, diff }
    }
}

impl Handler for Lockout {
    fn cells(&self) -> &[usize] {
        &self.cells
    }

    fn id_str(&self) -> String {
        format_id("lockout", &self.cells, "")
    }

    fn initialize(&mut self, grid: &mut Grid, exclusions: &mut CellExclusions, shape: &GridShape) -> bool {
        self.diff.initialize(grid, exclusions, shape)
    }

    fn enforce_consistency(&mut self, grid: &mut Grid, accumulator: &mut HandlerAccumulator) -> bool {
        if !self.diff.enforce_consistency(grid, accumulator) {
            return false;
        }
        if let (Some(a), Some(b)) = (grid[self.a].as_singleton(), grid[self.b].as_singleton()) {
            let (lo, hi) = (a.min(b), a.max(b));
            for &c in &self.path {
                for v in lo..=hi {
                    grid[c].remove(v);
                }
                accumulator.add_for_cell(c);
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

    fn grid9() -> (Grid, GridShape) {
        let shape = GridShape::with_derived_boxes(9, 9, 9);
        (Grid::new(&shape), shape)
    }

    #[test]
    fn thermometer_orders_bulb_to_tip() {
        let (mut grid, shape) = grid9();
        let mut exclusions = CellExclusions::new(shape.num_cells());
        grid[0] = Mask::singleton(7);
        let mut thermo = Thermometer::new(vec![0, 1, 2], 9);
        assert!(thermo.initialize(&mut grid, &mut exclusions, &shape));
        assert!(grid[1].min_value().unwrap() > 7);
        assert!(grid[2].min_value().unwrap() > grid[1].min_value().unwrap());
    }

    #[test]
    fn whisper_enforces_gap() {
        let (mut grid, shape) = grid9();
        let mut exclusions = CellExclusions::new(shape.num_cells());
        grid[0] = Mask::singleton(5);
        let mut whisper = Whisper::new(vec![0, 1], 9, 5);
        assert!(whisper.initialize(&mut grid, &mut exclusions, &shape));
        assert!(!grid[1].contains(1));
        assert!(!grid[1].contains(9));
    }

    #[test]
    fn modular_line_excludes_same_residue_in_window() {
        let (mut grid, shape) = grid9();
        let mut exclusions = CellExclusions::new(shape.num_cells());
        grid[0] = Mask::singleton(1);
        let mut modular = ModularLine::new(vec![0, 1, 2], 9, 3);
        assert!(modular.initialize(&mut grid, &mut exclusions, &shape));
        for v in [1u8, 4, 7] {
            assert!(!grid[1].contains(v));
            assert!(!grid[2].contains(v));
        }
    }

    #[test]
    fn entropic_line_excludes_same_bucket_in_window() {
        let (mut grid, shape) = grid9();
        let mut exclusions = CellExclusions::new(shape.num_cells());
        grid[0] = Mask::singleton(2);
        let mut entropic = EntropicLine::new(vec![0, 1, 2], 9);
        assert!(entropic.initialize(&mut grid, &mut exclusions, &shape));
        for v in [1u8, 2, 3] {
            assert!(!grid[1].contains(v));
            assert!(!grid[2].contains(v));
        }
    }

    #[test]
    fn between_restricts_path_once_resolved() {
        let (mut grid, shape) = grid9();
        let mut exclusions = CellExclusions::new(shape.num_cells());
        grid[0] = Mask::singleton(2);
        grid[1] = Mask::singleton(8);
        let mut between = Between::new(0, 1, vec![2]);
        assert!(between.initialize(&mut grid, &mut exclusions, &shape));
        assert!(!grid[2].contains(1));
        assert!(!grid[2].contains(2));
        assert!(!grid[2].contains(8));
        assert!(!grid[2].contains(9));
        assert!(grid[2].contains(5));
    }
}
