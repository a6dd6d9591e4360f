//! The public solver surface: `Solver::build` translates a [`PuzzleSpec`]
//! into handlers and an [`Engine`], then every search mode is a thin
//! forwarding call, degrading gracefully (`None`/`0`/empty) when the
//! puzzle was infeasible from the start rather than panicking.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use variant_sudoku_core::{DigitGrid, GridShape, Mask};

use crate::config::SolverConfig;
use crate::engine::{Engine, ProgressState, StepResult};
use crate::error::SolverError;
use crate::selector::StepGuide;
use crate::spec::{self, BuildResult, PuzzleSpec};

/// A built puzzle, ready to search.
///
/// `Solver` owns an `Option<Engine>`: `None` when [`build`](Solver::build)'s
/// constraint set was already infeasible (e.g. conflicting givens), in
/// which case every search method below degrades to its empty result
/// rather than erroring, matching an ordinary unsatisfiable puzzle.
pub struct Solver {
    shape: GridShape,
    layout_regions: Vec<Vec<usize>>,
    num_values: usize,
    config: SolverConfig,
    engine: Option<Engine>,
    busy: AtomicBool,
}

impl Solver {
    /// Translates `spec` into handlers and runs the initial propagation
    /// pass, per [`crate::spec::build`].
    ///
    /// # Errors
    ///
    /// Returns [`SolverError`] for malformed constraint descriptors. Initial
    /// infeasibility is *not* an error — see [`Solver`]'s docs.
    pub fn build(spec: &PuzzleSpec, config: SolverConfig) -> Result<Self, SolverError> {
        let BuildResult { shape, grid, handlers, layout_regions } = spec::build(spec)?;
        let num_values = shape.num_values();
        let engine = handlers.map(|h| Engine::new(grid, h, num_values, config.clone()));
        Ok(Self {
            shape,
            layout_regions,
            num_values,
            config,
            engine,
            busy: AtomicBool::new(false),
        })
    }

    /// The grid shape this puzzle was built against.
    #[must_use]
    pub fn shape(&self) -> &GridShape {
        &self.shape
    }

    /// Marks the solver busy for the duration of a search call, returning
    /// [`SolverError::ConcurrentUse`] if a call is already in flight. The
    /// kernel's single-threaded cooperative design (§5) makes this
    /// unreachable through `&mut self` alone, but the guard still catches
    /// a caller that stashes a shared handle (e.g. behind `Rc<RefCell<_>>`)
    /// and re-enters from a progress callback.
    fn enter(&self) -> Result<(), SolverError> {
        if self.busy.swap(true, Ordering::AcqRel) {
            return Err(SolverError::ConcurrentUse);
        }
        Ok(())
    }

    fn leave(&self) {
        self.busy.store(false, Ordering::Release);
    }

    /// The `n`th solution (0-indexed) found by exhaustive search, or
    /// `None` if the tree is exhausted (or the puzzle was infeasible from
    /// the start) before reaching it.
    ///
    /// # Errors
    ///
    /// [`SolverError::ConcurrentUse`] on re-entrant invocation.
    pub fn nth_solution(&mut self, n: u32) -> Result<Option<DigitGrid>, SolverError> {
        self.enter()?;
        let result = self.engine.as_mut().and_then(|e| e.nth_solution(n));
        self.leave();
        Ok(result.map(|g| g.to_digit_grid()))
    }

    /// Exhausts the whole search tree, counting solutions.
    ///
    /// # Errors
    ///
    /// [`SolverError::ConcurrentUse`] on re-entrant invocation.
    pub fn count_solutions(&mut self) -> Result<u64, SolverError> {
        self.enter()?;
        let count = self.engine.as_mut().map_or(0, Engine::count_solutions);
        self.leave();
        Ok(count)
    }

    /// A Monte-Carlo `(mean, variance)` estimate of the solution count over
    /// `trials` independent random descents.
    ///
    /// # Errors
    ///
    /// [`SolverError::ConcurrentUse`] on re-entrant invocation.
    pub fn estimated_count_solutions(&mut self, trials: u32) -> Result<(f64, f64), SolverError> {
        self.enter()?;
        let estimate = self
            .engine
            .as_mut()
            .map_or((0.0, 0.0), |e| e.estimated_count_solutions(trials));
        self.leave();
        Ok(estimate)
    }

    /// Enumerates solutions until every cell has at least `threshold`
    /// distinct confirmed values, returning the union of per-cell
    /// possibilities and per-(cell, value) support counts.
    ///
    /// # Errors
    ///
    /// [`SolverError::ConcurrentUse`] on re-entrant invocation.
    pub fn solve_all_possibilities(&mut self, threshold: u8) -> Result<(Vec<Mask>, Vec<Vec<u32>>), SolverError> {
        self.enter()?;
        let result = self.engine.as_mut().map_or_else(
            || (vec![Mask::EMPTY; self.shape.num_cells()], vec![vec![0u32; self.num_values]; self.shape.num_cells()]),
            |e| e.solve_all_possibilities(threshold),
        );
        self.leave();
        Ok(result)
    }

    /// Re-derives a search over only the layout's houses and extra
    /// regions (jigsaw/windoku/diagonals), ignoring every given and
    /// numeric/relational constraint captured at [`build`](Solver::build)
    /// time, and returns one solution to it — i.e. whether the bare
    /// layout (independent of clues) admits any Latin-square-like filling
    /// at all.
    ///
    /// # Errors
    ///
    /// [`SolverError::ConcurrentUse`] on re-entrant invocation.
    pub fn validate_layout(&mut self) -> Result<Option<DigitGrid>, SolverError> {
        self.enter()?;
        let result = spec::build_layout_only(&self.shape, &self.layout_regions)
            .handlers
            .map(|handlers| {
                let grid = variant_sudoku_core::Grid::new(&self.shape);
                let mut engine = Engine::new(grid, handlers, self.num_values, self.config.clone());
                engine.nth_solution(0)
            })
            .and_then(|solution| solution.map(|g| g.to_digit_grid()));
        self.leave();
        Ok(result)
    }

    /// Advances or rewinds to search step `n`, applying `step_guides` as
    /// forced branches keyed by iteration index.
    ///
    /// # Errors
    ///
    /// [`SolverError::ConcurrentUse`] on re-entrant invocation.
    pub fn nth_step(
        &mut self,
        n: u32,
        step_guides: BTreeMap<u32, StepGuide>,
    ) -> Result<Option<StepResult>, SolverError> {
        self.enter()?;
        let result = self.engine.as_mut().map(|e| {
            e.set_step_guides(step_guides);
            e.nth_step(n)
        });
        self.leave();
        Ok(result)
    }

    /// A snapshot of the current search counters and timing. Returns the
    /// all-zero default if the puzzle was infeasible from the start.
    #[must_use]
    pub fn state(&self) -> ProgressState {
        self.engine.as_ref().map_or_else(
            || ProgressState {
                counters: crate::engine::Counters::default(),
                time_ms: 0,
                puzzle_setup_time_ms: 0,
                extra_solutions: None,
            },
            Engine::state,
        )
    }

    /// Registers a progress callback, invoked per
    /// [`SolverConfig::progress_every_power_of_2_iterations`]. A no-op if
    /// the puzzle was infeasible from the start (there is no search to
    /// report progress on).
    pub fn set_progress_callback(&mut self, callback: impl FnMut(&ProgressState) + Send + 'static) {
        if let Some(engine) = self.engine.as_mut() {
            engine.set_progress_callback(callback);
        }
    }

    /// A shareable handle to the cancellation flag, or `None` if the
    /// puzzle was infeasible from the start.
    #[must_use]
    pub fn abort_handle(&self) -> Option<Arc<AtomicBool>> {
        self.engine.as_ref().map(Engine::abort_handle)
    }

    /// Requests cancellation of any in-progress search. A no-op if the
    /// puzzle was infeasible from the start.
    pub fn terminate(&self) {
        if let Some(engine) = self.engine.as_ref() {
            engine.terminate();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{CellRef, ConstraintSpec, GridShapeTag};

    #[test]
    fn counts_solutions_of_an_empty_4x4() {
        let spec = PuzzleSpec {
            shape: GridShapeTag { rows: 4, cols: 4, num_values: 4 },
            constraints: vec![],
        };
        let mut solver = Solver::build(&spec, SolverConfig::new()).unwrap();
        assert_eq!(solver.count_solutions().unwrap(), 288);
    }

    #[test]
    fn reports_infeasible_givens_as_no_solution() {
        let spec = PuzzleSpec {
            shape: GridShapeTag::classic_9x9(),
            constraints: vec![
                ConstraintSpec::Given { cell: CellRef::Index(0), value: 1 },
                ConstraintSpec::Given { cell: CellRef::Id("R1C1".to_string()), value: 2 },
            ],
        };
        let mut solver = Solver::build(&spec, SolverConfig::new()).unwrap();
        assert_eq!(solver.nth_solution(0).unwrap(), None);
        assert_eq!(solver.count_solutions().unwrap(), 0);
    }

    #[test]
    fn validates_a_jigsaw_layout() {
        let spec = PuzzleSpec {
            shape: GridShapeTag { rows: 4, cols: 4, num_values: 4 },
            constraints: vec![ConstraintSpec::ExtraRegion {
                cells: vec![
                    CellRef::Index(0),
                    CellRef::Index(1),
                    CellRef::Index(4),
                    CellRef::Index(5),
                ],
            }],
        };
        let mut solver = Solver::build(&spec, SolverConfig::new()).unwrap();
        assert!(solver.validate_layout().unwrap().is_some());
    }
}
