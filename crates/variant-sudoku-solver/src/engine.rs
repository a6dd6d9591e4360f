//! Trail-based backtracking search.
//!
//! The engine drives propagation to a fixed point at each node, asks the
//! [`CandidateSelector`] to pick the next branch, and walks an explicit
//! stack of [`Frame`]s rather than recursing — the same frame doubles as
//! both the undo trail (it remembers the grid as it was before any of its
//! branches were tried) and the bookkeeping `nthStep` replays from. Every
//! public search mode (`nth_solution`, `count_solutions`, ...) is built on
//! top of the single [`Engine::advance_one`] primitive.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use log::{debug, trace};
use rand::Rng;
use rand::SeedableRng;

use variant_sudoku_core::{DigitGrid, Grid, Mask};

use crate::config::SolverConfig;
use crate::conflict::{ConflictScores, SeenCandidateSet};
use crate::handler_set::HandlerSet;
use crate::selector::{CandidateSelector, StepGuide};

/// Search-tree bookkeeping surfaced to callers: guesses made, backtracks
/// taken, solutions found so far, raw iteration count, and a running
/// estimate of how much of the tree has been explored.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Counters {
    /// Branches attempted.
    pub guesses: u64,
    /// Branches that led to a contradiction.
    pub backtracks: u64,
    /// Solutions yielded so far.
    pub solutions: u64,
    /// Total [`Engine::advance_one`] calls.
    pub iterations: u64,
    /// Fraction of the search tree estimated explored so far, in `[0, 1]`.
    pub progress_ratio: f64,
    /// `progress_ratio` as of the previous checkpoint.
    pub progress_ratio_prev: f64,
}

/// A progress snapshot, emitted to the caller's progress callback every
/// `2^k` iterations and returned from [`Engine::state`].
#[derive(Debug, Clone)]
pub struct ProgressState {
    /// The counters as of this snapshot.
    pub counters: Counters,
    /// Wall-clock time since the engine started searching.
    pub time_ms: u128,
    /// Wall-clock time spent on initial propagation before search began.
    pub puzzle_setup_time_ms: u128,
    /// Solutions found since the previous snapshot, when the caller asked
    /// for them to be included (e.g. `solveAllPossibilities` bookkeeping).
    pub extra_solutions: Option<Vec<DigitGrid>>,
}

/// The result of stepping the engine to a specific search-tree position
/// via [`Engine::nth_step`].
#[derive(Debug, Clone)]
pub struct StepResult {
    /// Human-readable summary of what happened at this step (e.g.
    /// `"branch R1C1=5"`, `"backtrack"`, `"solution"`).
    pub description: String,
    /// The grid's pencil-marks after this step.
    pub pencilmarks: Vec<Mask>,
    /// `(cell, before, after)` for every cell whose mask changed relative
    /// to the previous step.
    pub diff: Vec<(usize, Mask, Mask)>,
    /// Decided values as of this step; `None` for undecided cells.
    pub values: DigitGrid,
    /// `true` if every cell is a singleton at this step.
    pub is_solution: bool,
    /// `true` if some cell is wiped out at this step.
    pub has_contradiction: bool,
    /// Cells this step's branch decision touched, for UI highlighting.
    pub highlight_cells: Vec<usize>,
}

/// One node on the explicit DFS stack: the grid as it was before any of
/// `branches` was tried (the "undo" target), the ordered branch list from
/// the selector, and how far through it we've gotten.
#[derive(Debug, Clone)]
struct Frame {
    snapshot: Grid,
    branches: Vec<(usize, u8)>,
    cursor: usize,
    /// This frame's share of the whole tree's weight, already discounted
    /// by its ancestors' branching factors. See [`Engine::advance_one`]'s
    /// progress-ratio bookkeeping.
    weight: f64,
}

/// The outcome of one [`Engine::advance_one`] call.
#[derive(Debug, Clone)]
enum NodeEvent {
    /// A branch was tried and propagation succeeded; the engine descended
    /// to a new node.
    Progressed,
    /// A branch was tried and propagation produced a contradiction.
    FailedBranch,
    /// The current node's branches are exhausted; the engine popped back
    /// to its parent.
    Backtracked,
    /// The grid reached a fully-singleton state.
    Solution(Grid),
    /// The whole search tree is exhausted.
    Exhausted,
    /// `terminate()` was called.
    Aborted,
}

/// A single record in the `nth_step` replay history: the live state after
/// one [`Engine::advance_one`] call, plus what that call did.
#[derive(Debug, Clone)]
struct HistoryEntry {
    grid: Grid,
    conflict: ConflictScores,
    seen: SeenCandidateSet,
    description: String,
    highlight_cells: Vec<usize>,
}

/// Owns the live grid, handler set, and selector state, and drives the
/// backtracking search described in the engine design notes.
///
/// `Engine` is agnostic to *why* a handler exists — `validate_layout`-style
/// searches are realized by constructing an `Engine` whose [`HandlerSet`]
/// only contains house/box/jigsaw `AllDifferent` handlers, assembled by
/// the caller (see [`crate::api`]), not by special-casing constraint
/// kinds here.
pub struct Engine {
    grid: Grid,
    handler_set: HandlerSet,
    selector: CandidateSelector,
    conflict: ConflictScores,
    seen: SeenCandidateSet,
    config: SolverConfig,
    aborted: Arc<AtomicBool>,
    progress_callback: Option<Box<dyn FnMut(&ProgressState) + Send>>,
    counters: Counters,
    stack: Vec<Frame>,
    decay_counter: u32,
    start: Instant,
    setup_time: Duration,
    step_guides: BTreeMap<u32, StepGuide>,
    history: Vec<HistoryEntry>,
    num_values: usize,
}

impl Engine {
    /// Builds an engine from an already-propagated [`HandlerSet`] (i.e.
    /// one returned by [`HandlerSet::build`], which has already run the
    /// initial fixed point and applied any givens).
    #[must_use]
    pub fn new(grid: Grid, handler_set: HandlerSet, num_values: usize, config: SolverConfig) -> Self {
        let num_cells = grid.len();
        let setup_time = Instant::now();
        let mut engine = Self {
            grid,
            handler_set,
            selector: CandidateSelector::new(),
            conflict: ConflictScores::new(num_cells, num_values),
            seen: SeenCandidateSet::new(),
            config,
            aborted: Arc::new(AtomicBool::new(false)),
            progress_callback: None,
            counters: Counters::default(),
            stack: vec![],
            decay_counter: 0,
            start: Instant::now(),
            setup_time: setup_time.elapsed(),
            step_guides: BTreeMap::new(),
            history: vec![],
            num_values,
        };
        engine.enter_node();
        engine.start = Instant::now();
        engine
    }

    /// A shareable handle to the cancellation flag; [`terminate`] sets it,
    /// [`advance_one`] polls it at the top of every call.
    ///
    /// [`terminate`]: Engine::terminate
    /// [`advance_one`]: Engine::advance_one
    #[must_use]
    pub fn abort_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.aborted)
    }

    /// Requests cancellation; the next `advance_one` call unwinds cleanly
    /// and every search mode stops, reporting what it has so far.
    pub fn terminate(&self) {
        self.aborted.store(true, Ordering::Relaxed);
    }

    /// Registers a callback invoked every `2^k` iterations (`k` from
    /// [`SolverConfig::progress_every_power_of_2_iterations`]), and
    /// whenever a search mode completes.
    pub fn set_progress_callback(&mut self, callback: impl FnMut(&ProgressState) + Send + 'static) {
        self.progress_callback = Some(Box::new(callback));
    }

    /// A snapshot of the current search counters and timing.
    #[must_use]
    pub fn state(&self) -> ProgressState {
        ProgressState {
            counters: self.counters,
            time_ms: self.start.elapsed().as_millis(),
            puzzle_setup_time_ms: self.setup_time.as_millis(),
            extra_solutions: None,
        }
    }

    fn maybe_report_progress(&mut self) {
        let k = self.config.progress_every_power_of_2_iterations;
        if k == 0 {
            return;
        }
        let period = 1u64 << k;
        if self.counters.iterations % period == 0 {
            let state = self.state();
            if let Some(cb) = &mut self.progress_callback {
                cb(&state);
            }
            self.counters.progress_ratio_prev = self.counters.progress_ratio;
        }
    }

    fn bump_conflict_scores(&mut self, cell: usize, value: u8) {
        self.conflict.bump(cell, value);
        self.decay_counter += 1;
        if self.decay_counter >= self.config.conflict_decay_countdown {
            self.conflict.decay_all(0.5);
            self.decay_counter = 0;
        }
    }

    /// Pushes a frame for the node at the engine's current grid state:
    /// either a zero-branch solution leaf, or a node with the selector's
    /// ordered branch list.
    fn enter_node(&mut self) -> Option<Grid> {
        if self.grid.is_solved() {
            let weight = self.stack.last().map_or(1.0, |f| f.weight);
            self.stack.push(Frame {
                snapshot: self.grid.clone(),
                branches: vec![],
                cursor: 0,
                weight,
            });
            return Some(self.grid.clone());
        }

        let guide = self.step_guides.remove(&(self.counters.iterations as u32));
        let branches = self
            .selector
            .select(&self.grid, self.handler_set.handlers(), &self.conflict, guide)
            .unwrap_or_default();
        let parent_weight = self.stack.last().map_or(1.0, |f| f.weight);
        let weight = parent_weight / (branches.len().max(1) as f64);
        self.stack.push(Frame {
            snapshot: self.grid.clone(),
            branches,
            cursor: 0,
            weight,
        });
        None
    }

    /// Advances the search by exactly one unit of work: tries the next
    /// untried branch at the current node, backtracks an exhausted node,
    /// or reports a freshly reached solution.
    ///
    /// `progress_ratio` is a Knuth-style tree-size estimate: a node's
    /// `weight` is its parent's weight divided by its own branching
    /// factor, so a leaf's weight is exactly the fraction of the whole
    /// tree it represents. A failed branch (a dead end with no further
    /// children) or an exhausted solution leaf contributes its weight to
    /// `progress_ratio` exactly once, so the ratio converges to `1.0`
    /// when the tree is fully explored. This differs from the literal
    /// "sum at each backtrack" wording by attributing weight at leaves
    /// rather than at backtrack points, which avoids double-counting
    /// partially-explored subtrees; the two coincide once the search
    /// completes.
    fn advance_one(&mut self) -> NodeEvent {
        if self.aborted.load(Ordering::Relaxed) {
            return NodeEvent::Aborted;
        }
        self.counters.iterations += 1;
        self.maybe_report_progress();

        let Some(top) = self.stack.last_mut() else {
            return NodeEvent::Exhausted;
        };

        if top.cursor >= top.branches.len() {
            let finished = self.stack.pop().expect("checked above");
            if finished.branches.is_empty() {
                self.counters.progress_ratio += finished.weight;
            }
            if let Some(parent) = self.stack.last() {
                self.grid = parent.snapshot.clone();
            }
            trace!("backtrack: node exhausted at depth {}", self.stack.len());
            return NodeEvent::Backtracked;
        }

        let (cell, value) = top.branches[top.cursor];
        top.cursor += 1;
        let branch_weight = top.weight / (top.branches.len() as f64);
        self.grid = top.snapshot.clone();
        self.grid[cell] = Mask::singleton(value);
        self.handler_set.mark_cell_dirty(cell);
        self.counters.guesses += 1;
        trace!("branching: cell {cell} = {value}");

        if self.handler_set.propagate(&mut self.grid) {
            match self.enter_node() {
                Some(solution) => {
                    self.counters.solutions += 1;
                    for cell in 0..solution.len() {
                        if let Some(v) = solution[cell].as_singleton() {
                            self.seen.mark(cell, v);
                        }
                    }
                    debug!("solution #{} found after {} guesses", self.counters.solutions, self.counters.guesses);
                    NodeEvent::Solution(solution)
                }
                None => NodeEvent::Progressed,
            }
        } else {
            self.counters.backtracks += 1;
            self.counters.progress_ratio += branch_weight;
            self.bump_conflict_scores(cell, value);
            trace!("backtrack: cell {cell} = {value} wiped out a handler");
            NodeEvent::FailedBranch
        }
    }

    /// Drives `advance_one` until a solution is found, the tree is
    /// exhausted, or the search is aborted.
    fn drive_to_next_solution(&mut self) -> Option<Grid> {
        loop {
            match self.advance_one() {
                NodeEvent::Solution(grid) => return Some(grid),
                NodeEvent::Exhausted | NodeEvent::Aborted => return None,
                NodeEvent::Progressed | NodeEvent::FailedBranch | NodeEvent::Backtracked => {}
            }
        }
    }

    /// Resumes the search until the `n`th solution (0-indexed) is
    /// produced, or `None` if the tree is exhausted first.
    pub fn nth_solution(&mut self, n: u32) -> Option<Grid> {
        let mut found = None;
        for _ in 0..=n {
            found = self.drive_to_next_solution();
            found.as_ref()?;
        }
        found
    }

    /// Exhausts the whole search tree, counting solutions.
    pub fn count_solutions(&mut self) -> u64 {
        while self.drive_to_next_solution().is_some() {}
        self.counters.solutions
    }

    /// Monte-Carlo estimate of the solution count: repeatedly descends
    /// from a fresh copy of the *current* grid, at each step choosing a
    /// uniformly random candidate for the lowest-candidate-count
    /// undecided cell, weighting the completed (or failed) path by the
    /// product of candidate counts seen, and reports the running mean and
    /// variance across `trials` independent descents.
    ///
    /// This does not touch the engine's own search stack — it samples
    /// independently of `nth_solution`/`count_solutions` and is safe to
    /// call between other search calls.
    pub fn estimated_count_solutions(&mut self, trials: u32) -> (f64, f64) {
        let seed = self.config.rng_seed.unwrap_or_else(rand::random);
        let mut rng = rand_pcg::Pcg64::seed_from_u64(seed);

        let mut samples = Vec::with_capacity(trials as usize);
        for _ in 0..trials {
            samples.push(self.sample_one(&mut rng));
            if self.aborted.load(Ordering::Relaxed) {
                break;
            }
        }
        if samples.is_empty() {
            return (0.0, 0.0);
        }
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let variance = if samples.len() < 2 {
            0.0
        } else {
            samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (samples.len() - 1) as f64
        };
        (mean, variance)
    }

    /// Descends once from the engine's current grid state: at each node,
    /// picks the undecided cell with fewest candidates and assigns it a
    /// uniformly random value from its mask, propagates, and multiplies
    /// the running weight by the candidate count that cell had. Returns
    /// the final path weight (an unbiased per-path estimator of the
    /// solution count), or `0.0` if propagation ever contradicts.
    ///
    /// Reuses `self.handler_set`'s propagation on a scratch grid rather
    /// than the live search grid, resetting its dirty queue before and
    /// after so this doesn't disturb `nth_solution`/`count_solutions`
    /// bookkeeping.
    fn sample_one(&mut self, rng: &mut rand_pcg::Pcg64) -> f64 {
        let mut grid = self.grid.clone();
        self.handler_set.reset_accumulator();
        let mut weight = 1.0f64;
        let result = loop {
            if grid.is_solved() {
                break weight;
            }
            let Some((cell, len)) = (0..grid.len())
                .filter(|&c| !grid[c].is_singleton())
                .map(|c| (c, grid[c].len()))
                .min_by_key(|&(_, len)| len)
            else {
                break weight;
            };
            if len == 0 {
                break 0.0;
            }
            weight *= f64::from(len);
            let values: Vec<u8> = grid[cell].iter().collect();
            let chosen = values[rng.random_range(0..values.len())];
            grid[cell] = Mask::singleton(chosen);
            self.handler_set.mark_cell_dirty(cell);
            if !self.handler_set.propagate(&mut grid) {
                break 0.0;
            }
        };
        self.handler_set.reset_accumulator();
        result
    }

    /// Enumerates solutions until every cell has accumulated at least
    /// `threshold` distinct confirmed values (or the tree is exhausted),
    /// then returns the union of every solution's mask per cell along
    /// with per-(cell, value) support counts.
    pub fn solve_all_possibilities(&mut self, threshold: u8) -> (Vec<Mask>, Vec<Vec<u32>>) {
        let num_cells = self.grid.len();
        let mut possibilities = vec![Mask::EMPTY; num_cells];
        let mut counts = vec![vec![0u32; self.num_values]; num_cells];
        let mut confirmed_counts = vec![0u8; num_cells];

        while confirmed_counts.iter().any(|&c| c < threshold) {
            let Some(solution) = self.drive_to_next_solution() else {
                break;
            };
            for cell in 0..num_cells {
                if let Some(v) = solution[cell].as_singleton() {
                    let was_absent = !possibilities[cell].contains(v);
                    possibilities[cell].insert(v);
                    counts[cell][usize::from(v) - 1] += 1;
                    if was_absent {
                        confirmed_counts[cell] += 1;
                    }
                }
            }
        }
        (possibilities, counts)
    }

    /// Registers (or clears, via an empty map) the step guides consumed
    /// by `nth_step`: forced `(cell, value)` branches keyed by the
    /// iteration index at which they apply.
    pub fn set_step_guides(&mut self, guides: BTreeMap<u32, StepGuide>) {
        self.step_guides = guides;
    }

    /// Advances or rewinds to search step `n` (0-indexed over
    /// `advance_one` calls), replaying from recorded history when
    /// rewinding and extending the search when advancing past what has
    /// been recorded so far.
    ///
    /// Rewinding restores the grid, `ConflictScores`, and
    /// `SeenCandidateSet` exactly as they were at that step, satisfying
    /// the stepping-stability requirement: `nth_step(n-1)` after
    /// `nth_step(n)` reproduces the earlier view exactly.
    pub fn nth_step(&mut self, n: u32) -> StepResult {
        let n = n as usize;
        while self.history.len() <= n {
            let before = self.grid.clone();
            let event = self.advance_one();
            let (description, highlight) = Self::describe_event(&event);
            if let NodeEvent::Aborted | NodeEvent::Exhausted = event {
                self.history.push(HistoryEntry {
                    grid: before,
                    conflict: self.conflict.clone(),
                    seen: self.seen.clone(),
                    description,
                    highlight_cells: highlight,
                });
                break;
            }
            self.history.push(HistoryEntry {
                grid: self.grid.clone(),
                conflict: self.conflict.clone(),
                seen: self.seen.clone(),
                description,
                highlight_cells: highlight,
            });
        }

        let idx = n.min(self.history.len().saturating_sub(1));
        let entry = &self.history[idx];
        self.grid = entry.grid.clone();
        self.conflict = entry.conflict.clone();
        self.seen = entry.seen.clone();

        let prev_grid = if idx == 0 { None } else { Some(&self.history[idx - 1].grid) };
        let diff = prev_grid.map_or_else(Vec::new, |prev| {
            (0..entry.grid.len())
                .filter(|&c| prev[c] != entry.grid[c])
                .map(|c| (c, prev[c], entry.grid[c]))
                .collect()
        });

        StepResult {
            description: entry.description.clone(),
            pencilmarks: entry.grid.as_slice().to_vec(),
            diff,
            values: entry.grid.to_digit_grid(),
            is_solution: entry.grid.is_solved(),
            has_contradiction: entry.grid.has_contradiction(),
            highlight_cells: entry.highlight_cells.clone(),
        }
    }

    fn describe_event(event: &NodeEvent) -> (String, Vec<usize>) {
        match event {
            NodeEvent::Progressed => ("branch".to_owned(), vec![]),
            NodeEvent::FailedBranch => ("branch failed".to_owned(), vec![]),
            NodeEvent::Backtracked => ("backtrack".to_owned(), vec![]),
            NodeEvent::Solution(_) => ("solution".to_owned(), vec![]),
            NodeEvent::Exhausted => ("exhausted".to_owned(), vec![]),
            NodeEvent::Aborted => ("aborted".to_owned(), vec![]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{AllDifferent, BoxedHandler};
    use variant_sudoku_core::GridShape;

    fn four_by_four_rows_cols_boxes() -> (GridShape, Vec<BoxedHandler>) {
        let shape = GridShape::with_derived_boxes(4, 4, 4);
        let mut handlers: Vec<BoxedHandler> = vec![];
        for house in shape.rows().into_iter().chain(shape.columns()).chain(shape.boxes()) {
            handlers.push(Box::new(AllDifferent::new(house)));
        }
        (shape, handlers)
    }

    #[test]
    fn counts_all_solutions_of_empty_4x4() {
        let (shape, handlers) = four_by_four_rows_cols_boxes();
        let mut grid = Grid::new(&shape);
        let set = HandlerSet::build(handlers, &mut grid, &shape).unwrap();
        let mut engine = Engine::new(grid, set, 4, SolverConfig::default());
        assert_eq!(engine.count_solutions(), 288);
    }

    #[test]
    fn nth_solution_is_deterministic_and_exhausts_cleanly() {
        let (shape, handlers) = four_by_four_rows_cols_boxes();
        let mut grid = Grid::new(&shape);
        let set = HandlerSet::build(handlers, &mut grid, &shape).unwrap();
        let mut engine = Engine::new(grid, set, 4, SolverConfig::default());
        let first = engine.nth_solution(0);
        assert!(first.is_some());
        assert!(first.unwrap().is_solved());
    }

    #[test]
    fn terminate_stops_the_search() {
        let (shape, handlers) = four_by_four_rows_cols_boxes();
        let mut grid = Grid::new(&shape);
        let set = HandlerSet::build(handlers, &mut grid, &shape).unwrap();
        let mut engine = Engine::new(grid, set, 4, SolverConfig::default());
        engine.terminate();
        assert_eq!(engine.count_solutions(), 0);
    }
}
