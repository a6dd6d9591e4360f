//! Branching cell/value selection: step guides, custom candidate
//! proposals from handlers, and the default minimum-remaining-values
//! heuristic.

use variant_sudoku_core::Grid;

use crate::conflict::ConflictScores;
use crate::handler::BoxedHandler;

/// An explicit branching instruction for `nthStep` search: try `value` at
/// `cell` next, bypassing the heuristic entirely. Lets a caller drive the
/// engine one decision at a time (e.g. for a UI "hint" feature) while
/// still reusing the same propagation machinery.
#[derive(Debug, Clone, Copy)]
pub struct StepGuide {
    /// The cell to branch on.
    pub cell: usize,
    /// The value to try first.
    pub value: u8,
}

/// Chooses the next sequence of `(cell, value)` branches to attempt, in
/// try-order. The engine walks this list, backtracking to the next entry
/// on failure.
#[derive(Debug, Default)]
pub struct CandidateSelector;

impl CandidateSelector {
    /// Creates a selector. Stateless today; kept as a type (rather than a
    /// free function) so a future caching layer (e.g. a persistent
    /// min-heap over cell candidate counts) has somewhere to live without
    /// changing the engine's call sites.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Picks the next branch sequence.
    ///
    /// Priority: an explicit `step_guide` always wins; otherwise the
    /// highest-[`crate::handler::CandidateProposal::score`] proposal from
    /// any handler's [`crate::handler::Handler::candidate_proposal`] is
    /// used — trying `value` at each of the proposal's `cells` in order;
    /// otherwise falls back to minimum-remaining-values among undecided
    /// cells, tie-broken by [`ConflictScores::cell_score`], trying that
    /// one cell's candidate values in descending conflict-score order.
    ///
    /// Returns `None` if every cell is already a singleton (the grid is
    /// solved).
    #[must_use]
    pub fn select(
        &self,
        grid: &Grid,
        handlers: &[BoxedHandler],
        conflict: &ConflictScores,
        step_guide: Option<StepGuide>,
    ) -> Option<Vec<(usize, u8)>> {
        if let Some(guide) = step_guide {
            let mut branches = vec![(guide.cell, guide.value)];
            branches.extend(
                grid[guide.cell]
                    .iter()
                    .filter(|&v| v != guide.value)
                    .map(|v| (guide.cell, v)),
            );
            return Some(branches);
        }

        let mut best_proposal = None;
        for handler in handlers {
            if let Some(proposal) = handler.candidate_proposal(grid) {
                let better = best_proposal
                    .as_ref()
                    .is_none_or(|p: &crate::handler::CandidateProposal| proposal.score > p.score);
                if better {
                    best_proposal = Some(proposal);
                }
            }
        }
        if let Some(proposal) = best_proposal {
            let branches: Vec<(usize, u8)> = proposal
                .cells
                .iter()
                .filter(|&&c| grid[c].contains(proposal.value))
                .map(|&c| (c, proposal.value))
                .collect();
            if !branches.is_empty() {
                return Some(branches);
            }
        }

        let mut best: Option<(usize, u32, f64)> = None;
        for cell in 0..grid.len() {
            let mask = grid[cell];
            if mask.is_singleton() {
                continue;
            }
            let len = mask.len();
            let score = conflict.cell_score(cell, mask);
            let is_better = match best {
                None => true,
                Some((_, best_len, best_score)) => len < best_len || (len == best_len && score > best_score),
            };
            if is_better {
                best = Some((cell, len, score));
            }
        }
        let (cell, _, _) = best?;
        let mut values: Vec<u8> = grid[cell].iter().collect();
        values.sort_by(|&a, &b| {
            conflict
                .score(cell, b)
                .partial_cmp(&conflict.score(cell, a))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Some(values.into_iter().map(|v| (cell, v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use variant_sudoku_core::{GridShape, Mask};

    #[test]
    fn picks_minimum_remaining_values_cell() {
        let shape = GridShape::with_derived_boxes(9, 9, 9);
        let mut grid = Grid::new(&shape);
        grid[5] = Mask::singleton(2) | Mask::singleton(3);
        let conflict = ConflictScores::new(grid.len(), 9);
        let selector = CandidateSelector::new();
        let branches = selector.select(&grid, &[], &conflict, None).unwrap();
        assert!(branches.iter().all(|&(c, _)| c == 5));
        assert_eq!(branches.len(), 2);
    }

    #[test]
    fn step_guide_overrides_heuristic() {
        let shape = GridShape::with_derived_boxes(9, 9, 9);
        let grid = Grid::new(&shape);
        let conflict = ConflictScores::new(grid.len(), 9);
        let selector = CandidateSelector::new();
        let guide = StepGuide { cell: 10, value: 4 };
        let branches = selector.select(&grid, &[], &conflict, Some(guide)).unwrap();
        assert_eq!(branches[0], (10, 4));
    }

    #[test]
    fn returns_none_when_grid_is_solved() {
        let shape = GridShape::with_derived_boxes(1, 1, 1);
        let grid = Grid::new(&shape);
        let conflict = ConflictScores::new(grid.len(), 1);
        let selector = CandidateSelector::new();
        assert!(selector.select(&grid, &[], &conflict, None).is_none());
    }
}
