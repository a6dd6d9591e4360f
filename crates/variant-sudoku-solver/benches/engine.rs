//! End-to-end benchmarks for the backtracking search engine.
//!
//! Measures whole-puzzle solve cost across a handful of shapes and
//! constraint densities, mirroring the teacher lineage's whole-solver
//! benchmark split from its per-technique ones.
//!
//! # Running
//!
//! ```sh
//! cargo bench --bench engine
//! ```

use std::hint;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use variant_sudoku_solver::config::SolverConfig;
use variant_sudoku_solver::spec::{CellRef, ConstraintSpec, GridShapeTag, PuzzleSpec};
use variant_sudoku_solver::Solver;

/// `count` (at most 9) diagonal givens, non-conflicting by construction:
/// distinct rows, columns, and 3x3 boxes, with values chosen so no box
/// repeats one.
fn classic_9x9_with_givens(count: usize) -> PuzzleSpec {
    let constraints = (0..count.min(9))
        .map(|i| ConstraintSpec::Given { cell: CellRef::Index(i * 10), value: (i as u8) + 1 })
        .collect();
    PuzzleSpec { shape: GridShapeTag::classic_9x9(), constraints }
}

fn bench_count_solutions(c: &mut Criterion) {
    for &size in &[4usize, 6] {
        let spec = PuzzleSpec { shape: GridShapeTag { rows: size, cols: size, num_values: size }, constraints: vec![] };
        c.bench_with_input(BenchmarkId::new("count_solutions_empty", size), &size, |b, _| {
            b.iter_batched_ref(
                || Solver::build(&spec, SolverConfig::new()).unwrap(),
                |solver| hint::black_box(solver.count_solutions().unwrap()),
                criterion::BatchSize::SmallInput,
            );
        });
    }
}

fn bench_nth_solution_with_givens(c: &mut Criterion) {
    for &given_count in &[3usize, 9] {
        let spec = classic_9x9_with_givens(given_count);
        c.bench_with_input(BenchmarkId::new("nth_solution", given_count), &given_count, |b, _| {
            b.iter_batched_ref(
                || Solver::build(&spec, SolverConfig::new()).unwrap(),
                |solver| hint::black_box(solver.nth_solution(0).unwrap()),
                criterion::BatchSize::SmallInput,
            );
        });
    }
}

criterion_group!(benches, bench_count_solutions, bench_nth_solution_with_givens);
criterion_main!(benches);
