//! Conflict-driven branching heuristics: a VSIDS-style score table, and
//! the per-node "already tried" bookkeeping that keeps candidate selection
//! from repeating exhausted branches.

use std::collections::HashSet;

/// A VSIDS-style score per `(cell, value)` pair, bumped whenever a branch
/// on that pair leads to a conflict and periodically decayed so recent
/// conflicts dominate older ones.
///
/// Used by [`crate::selector::CandidateSelector`] to break ties among
/// cells with the same candidate count: prefer branching on the
/// `(cell, value)` that has been the most frequent recent source of
/// failure, since resolving it tends to prune the largest remaining
/// search space.
#[derive(Debug, Clone)]
pub struct ConflictScores {
    num_values: usize,
    scores: Vec<f64>,
}

impl ConflictScores {
    /// Creates a score table for a grid of `num_cells` cells over
    /// `num_values` values, all scores starting at zero.
    #[must_use]
    pub fn new(num_cells: usize, num_values: usize) -> Self {
        Self {
            num_values,
            scores: vec![0.0; num_cells * num_values],
        }
    }

    fn index(&self, cell: usize, value: u8) -> usize {
        cell * self.num_values + usize::from(value) - 1
    }

    /// The current score for branching on `value` at `cell`.
    #[must_use]
    pub fn score(&self, cell: usize, value: u8) -> f64 {
        self.scores[self.index(cell, value)]
    }

    /// Bumps the score for `(cell, value)` by `1.0`, as if a conflict had
    /// just been attributed to it.
    pub fn bump(&mut self, cell: usize, value: u8) {
        let idx = self.index(cell, value);
        self.scores[idx] += 1.0;
    }

    /// Multiplies every score by `factor` (`< 1.0`), so older conflicts
    /// fade relative to new ones. Call periodically (e.g. every fixed
    /// number of backtracks), not after every single conflict.
    pub fn decay_all(&mut self, factor: f64) {
        for s in &mut self.scores {
            *s *= factor;
        }
    }

    /// The summed score across every value still in `mask` for `cell`,
    /// used to rank candidate cells for branching.
    #[must_use]
    pub fn cell_score(&self, cell: usize, mask: variant_sudoku_core::Mask) -> f64 {
        mask.iter().map(|v| self.score(cell, v)).sum()
    }
}

/// Tracks `(cell, value)` branches already tried and exhausted at the
/// *current* search node, so the engine's step-by-step (`nthStep`) mode
/// doesn't re-propose a branch it already backtracked out of within the
/// same node when resuming from a snapshot.
#[derive(Debug, Clone, Default)]
pub struct SeenCandidateSet {
    seen: HashSet<(usize, u8)>,
}

impl SeenCandidateSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `(cell, value)` has been tried.
    pub fn mark(&mut self, cell: usize, value: u8) {
        self.seen.insert((cell, value));
    }

    /// `true` if `(cell, value)` was already tried at this node.
    #[must_use]
    pub fn is_seen(&self, cell: usize, value: u8) -> bool {
        self.seen.contains(&(cell, value))
    }

    /// Clears every recorded branch; called when the engine descends to a
    /// new node (the set is node-scoped, not search-scoped).
    pub fn clear(&mut self) {
        self.seen.clear();
    }

    /// Number of branches tried at this node.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// `true` if no branch has been tried at this node.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_and_decay() {
        let mut scores = ConflictScores::new(4, 9);
        scores.bump(0, 5);
        scores.bump(0, 5);
        assert_eq!(scores.score(0, 5), 2.0);
        scores.decay_all(0.5);
        assert_eq!(scores.score(0, 5), 1.0);
    }

    #[test]
    fn seen_candidate_set_tracks_per_node() {
        let mut seen = SeenCandidateSet::new();
        assert!(!seen.is_seen(0, 1));
        seen.mark(0, 1);
        assert!(seen.is_seen(0, 1));
        seen.clear();
        assert!(seen.is_empty());
    }
}
