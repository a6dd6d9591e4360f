//! Generalized line constraints expressed as a deterministic finite
//! automaton read left-to-right over a cell sequence.
//!
//! Any line rule whose validity can be checked by a single left-to-right
//! scan with bounded state (running sum parity, "have we crossed a box
//! boundary yet", a small running difference window, ...) reduces to a
//! `DfaLine` instead of a bespoke handler. This is the line-constraint
//! analogue of the classic `regular` global constraint: filtering is
//! forward/backward reachability over the automaton's state DAG, unrolled
//! once per cell in the line.

use variant_sudoku_core::{CellExclusions, Grid, GridShape, Mask};

use super::{Handler, format_id};
use crate::accumulator::HandlerAccumulator;

/// A deterministic transition table: `transition[state][value - 1]` is the
/// next state, or `None` if `value` is illegal from `state`.
pub type TransitionTable = Vec<Vec<Option<usize>>>;

/// A line constraint defined by a DFA read over `cells` in order.
///
/// `num_values` must match the grid's value domain; `transition` must have
/// one row per state and `num_values` columns per row.
#[derive(Debug, Clone)]
pub struct DfaLine {
    cells: Vec<usize>,
    transition: TransitionTable,
    start: usize,
    accept: Vec<bool>,
    num_values: usize,
    name: String,
}

impl DfaLine {
    /// Creates a DFA-line handler.
    #[must_use]
    pub fn new(
        cells: Vec<usize>,
        transition: TransitionTable,
        start: usize,
        accept: Vec<bool>,
        num_values: usize,
        name: impl Into<String>,
    ) -> Self {
        Self {
            cells,
            transition,
            start,
            accept,
            num_values,
            name: name.into(),
        }
    }

    /// `forward[i]` is the bitset of states reachable after reading
    /// `cells[..i]` starting from `start`, constrained by each cell's
    /// current candidate mask.
    fn forward_reachable(&self, grid: &Grid) -> Vec<Vec<bool>> {
        let num_states = self.transition.len();
        let mut forward = vec![vec![false; num_states]; self.cells.len() + 1];
        forward[0][self.start] = true;
        for (i, &cell) in self.cells.iter().enumerate() {
            let mask = grid[cell];
            for state in 0..num_states {
                if !forward[i][state] {
                    continue;
                }
                for value in mask.iter() {
                    if let Some(next) = self.transition[state][usize::from(value) - 1] {
                        forward[i + 1][next] = true;
                    }
                }
            }
        }
        forward
    }

    /// `backward[i]` is the bitset of states from which an accept state is
    /// reachable reading `cells[i..]`.
    fn backward_reachable(&self, grid: &Grid) -> Vec<Vec<bool>> {
        let num_states = self.transition.len();
        let n = self.cells.len();
        let mut backward = vec![vec![false; num_states]; n + 1];
        for (state, &is_accept) in self.accept.iter().enumerate() {
            backward[n][state] = is_accept;
        }
        for i in (0..n).rev() {
            let mask = grid[self.cells[i]];
            for state in 0..num_states {
                for value in mask.iter() {
                    if let Some(next) = self.transition[state][usize::from(value) - 1]
                        && backward[i + 1][next]
                    {
                        backward[i][state] = true;
                        break;
                    }
                }
            }
        }
        backward
    }
}

impl Handler for DfaLine {
    fn cells(&self) -> &[usize] {
        &self.cells
    }

    fn id_str(&self) -> String {
        format_id("dfa_line", &self.cells, &self.name)
    }

    fn initialize(&mut self, grid: &mut Grid, _exclusions: &mut CellExclusions, _shape: &GridShape) -> bool {
        let mut acc = HandlerAccumulator::new(grid.len(), &[]);
        self.enforce_consistency(grid, &mut acc)
    }

    fn enforce_consistency(&mut self, grid: &mut Grid, accumulator: &mut HandlerAccumulator) -> bool {
        let forward = self.forward_reachable(grid);
        let backward = self.backward_reachable(grid);
        let num_states = self.transition.len();

        if !(0..num_states).any(|s| forward[self.cells.len()][s] && self.accept.get(s).copied().unwrap_or(false))
        {
            for &c in &self.cells {
                grid[c] = Mask::EMPTY;
                accumulator.add_for_cell(c);
            }
            return false;
        }

        for (i, &cell) in self.cells.iter().enumerate() {
            let mut allowed = Mask::EMPTY;
            for value in grid[cell].iter() {
                let reachable = (0..num_states).any(|state| {
                    forward[i][state]
                        && self.transition[state][usize::from(value) - 1]
                            .is_some_and(|next| backward[i + 1][next])
                });
                if reachable {
                    allowed.insert(value);
                }
            }
            if grid[cell].intersect_with(allowed) {
                accumulator.add_for_cell(cell);
                if grid[cell].is_empty() {
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

    /// A 2-state DFA enforcing "even number of odd values seen", state 0
    /// = even count (accepting), state 1 = odd count.
    fn parity_transition(num_values: usize) -> TransitionTable {
        (0..2)
            .map(|state| {
                (1..=num_values)
                    .map(|v| {
                        let is_odd = v % 2 == 1;
                        Some(if is_odd { 1 - state } else { state })
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn prunes_to_satisfy_even_odd_parity() {
        let shape = GridShape::with_derived_boxes(9, 9, 9);
        let mut grid = Grid::new(&shape);
        let mut exclusions = CellExclusions::new(shape.num_cells());
        grid[0] = Mask::singleton(3); // odd
        let mut dfa = DfaLine::new(
            vec![0, 1],
            parity_transition(9),
            0,
            vec![true, false],
            9,
            "even_odd_count",
        );
        assert!(dfa.initialize(&mut grid, &mut exclusions, &shape));
        // cell 1 must also be odd to return to an even count.
        assert!(grid[1].iter().all(|v| v % 2 == 1));
    }

    #[test]
    fn rejects_when_no_accepting_path_exists() {
        let shape = GridShape::with_derived_boxes(9, 9, 9);
        let mut grid = Grid::new(&shape);
        let mut exclusions = CellExclusions::new(shape.num_cells());
        grid[0] = Mask::singleton(3);
        grid[1] = Mask::singleton(2); // even value: stays in odd (rejecting) state
        let mut dfa = DfaLine::new(
            vec![0, 1],
            parity_transition(9),
            0,
            vec![true, false],
            9,
            "even_odd_count",
        );
        assert!(!dfa.initialize(&mut grid, &mut exclusions, &shape));
    }
}
