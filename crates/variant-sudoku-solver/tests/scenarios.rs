//! Integration tests covering the kernel's concrete scenarios end to end,
//! through the public [`Solver`] surface rather than individual handlers.

use variant_sudoku_solver::config::SolverConfig;
use variant_sudoku_solver::spec::{CellRef, ConstraintSpec, GridShapeTag, PuzzleSpec};
use variant_sudoku_solver::Solver;

/// Parses an 81-char row-major puzzle string (`.` for empty, `1`-`9`
/// otherwise) into `Given` constraints, the same convention the teacher
/// lineage's `DigitGrid::from_str` uses.
fn givens_from_str(s: &str) -> Vec<ConstraintSpec> {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .enumerate()
        .filter_map(|(cell, c)| {
            c.to_digit(10).map(|d| ConstraintSpec::Given { cell: CellRef::Index(cell), value: d as u8 })
        })
        .collect()
}

#[test]
fn classic_9x9_with_thirty_givens_has_a_unique_solution() {
    // A 23-given puzzle generated from a known solved grid (teacher
    // lineage's `numelace-solver` benchmark fixtures), guaranteed
    // uniquely solvable by construction.
    const PUZZLE: &str =
        "...36..4..9.....2...67..1..5....987..31..............4..8...65.67.....3......3..2";
    const SOLUTION: &str =
        "185362947793148526246795183564239871931874265827516394318427659672951438459683712";

    let spec = PuzzleSpec { shape: GridShapeTag::classic_9x9(), constraints: givens_from_str(PUZZLE) };
    let mut solver = Solver::build(&spec, SolverConfig::new()).unwrap();

    assert_eq!(solver.count_solutions().unwrap(), 1);

    let mut solver = Solver::build(&spec, SolverConfig::new()).unwrap();
    let solution = solver.nth_solution(0).unwrap().unwrap();
    let expected: Vec<u8> = SOLUTION.chars().map(|c| c.to_digit(10).unwrap() as u8).collect();
    for (cell, &value) in expected.iter().enumerate() {
        assert_eq!(solution.get(cell), Some(value), "cell {cell} mismatched");
    }
}

#[test]
fn empty_4x4_has_288_solutions() {
    let spec = PuzzleSpec {
        shape: GridShapeTag { rows: 4, cols: 4, num_values: 4 },
        constraints: vec![],
    };
    let mut solver = Solver::build(&spec, SolverConfig::new()).unwrap();
    assert_eq!(solver.count_solutions().unwrap(), 288);
}

#[test]
fn killer_cage_restricts_to_its_minimal_value_set() {
    let spec = PuzzleSpec {
        shape: GridShapeTag::classic_9x9(),
        constraints: vec![ConstraintSpec::Sum {
            cells: vec![CellRef::Index(0), CellRef::Index(1), CellRef::Index(2)],
            coefficients: None,
            target: 6,
            cage_all_different: true,
        }],
    };
    let result = variant_sudoku_solver::spec::build(&spec).unwrap();
    for cell in [0usize, 1, 2] {
        for value in 4u8..=9 {
            assert!(!result.grid[cell].contains(value), "cell {cell} should be restricted to {{1,2,3}}");
        }
    }

    // All six permutations of {1,2,3} over the cage should be reachable.
    let mut seen = std::collections::HashSet::new();
    for n in 0..6 {
        let mut solver = Solver::build(&spec, SolverConfig::new()).unwrap();
        if let Some(grid) = solver.nth_solution(n).unwrap() {
            let perm: Vec<u8> = (0..3).map(|c| grid.get(c).unwrap()).collect();
            seen.insert(perm);
        }
    }
    assert_eq!(seen.len(), 6);
}

#[test]
fn arrow_bounds_head_and_shaft_after_propagation() {
    let spec = PuzzleSpec {
        shape: GridShapeTag::classic_9x9(),
        constraints: vec![ConstraintSpec::Arrow {
            head: CellRef::Index(0),
            shaft: vec![CellRef::Index(1), CellRef::Index(2)],
        }],
    };
    // `build` already runs the initial propagation pass, so inspect the
    // handler set's resulting grid directly via the lower-level `spec`
    // module rather than through a solved/unsolved Solver.
    //
    // Shaft cells R1C2/R1C3 share a row, so the row house's all-different
    // clique makes them mutually exclusive before the arrow's `Sum`
    // handler ever runs: the range propagator derives head >= 1+2 (the two
    // smallest *distinct* shaft values), not the looser 1+1, and shaft < 9
    // (bounded by head's own maximum).
    let result = variant_sudoku_solver::spec::build(&spec).unwrap();
    assert!(result.handlers.is_some());
    for value in 1u8..=2 {
        assert!(!result.grid[0].contains(value), "head must be >= 3");
    }
    for value in 9u8..=9 {
        assert!(!result.grid[1].contains(value), "shaft cell must be < head's max");
        assert!(!result.grid[2].contains(value), "shaft cell must be < head's max");
    }
}

#[test]
fn two_conflicting_givens_are_infeasible_from_the_start() {
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
fn jigsaw_layout_validates_and_detects_an_invalid_merge() {
    // A valid 4x4 jigsaw tiling: four L/S-shaped tetromino regions,
    // disjoint and covering every cell, each the same size as a row.
    let regions: Vec<Vec<usize>> = vec![
        vec![0, 1, 4, 5],
        vec![2, 3, 6, 7],
        vec![8, 9, 12, 13],
        vec![10, 11, 14, 15],
    ];
    let spec = PuzzleSpec {
        shape: GridShapeTag { rows: 4, cols: 4, num_values: 4 },
        constraints: regions
            .iter()
            .cloned()
            .map(|cells| ConstraintSpec::ExtraRegion { cells: cells.into_iter().map(CellRef::Index).collect() })
            .collect(),
    };
    let mut solver = Solver::build(&spec, SolverConfig::new()).unwrap();
    assert!(solver.validate_layout().unwrap().is_some());

    // Merge two regions' cells into one (dropping the other's
    // corresponding cells) so the cover is no longer a disjoint 4x4
    // tiling at all: two size-8 regions overlapping every row/column
    // constraint can't be filled together, so the bare layout has no
    // valid solution.
    let invalid_regions = vec![
        vec![0, 1, 4, 5, 2, 3, 6, 7],
        vec![8, 9, 12, 13],
        vec![10, 11, 14, 15],
    ];
    let invalid_spec = PuzzleSpec {
        shape: GridShapeTag { rows: 4, cols: 4, num_values: 4 },
        constraints: invalid_regions
            .into_iter()
            .map(|cells| ConstraintSpec::ExtraRegion { cells: cells.into_iter().map(CellRef::Index).collect() })
            .collect(),
    };
    let mut invalid_solver = Solver::build(&invalid_spec, SolverConfig::new()).unwrap();
    assert_eq!(invalid_solver.validate_layout().unwrap(), None);
}
