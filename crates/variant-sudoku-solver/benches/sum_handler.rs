//! Benchmarks for the `Sum` handler's propagation hot path.
//!
//! `Sum` is the highest-priority handler in a [`HandlerSet`]
//! (see its module docs): killer cages and arrows are common enough in
//! variant puzzles that its `enforce_consistency` cost dominates most
//! search runs, so it gets its own benchmark separate from whole-puzzle
//! solves.
//!
//! # Running
//!
//! ```sh
//! cargo bench --bench sum_handler
//! ```

use std::hint;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use variant_sudoku_core::{Grid, GridShape};
use variant_sudoku_solver::accumulator::HandlerAccumulator;
use variant_sudoku_solver::handler::{Handler, Sum};

fn bench_sum_propagation(c: &mut Criterion) {
    let shape = GridShape::with_derived_boxes(9, 9, 9);

    let cage_sizes = [2usize, 3, 4, 5];
    for &size in &cage_sizes {
        let cells: Vec<usize> = (0..size).collect();
        let target = (1..=size as i64).sum::<i64>() + size as i64;

        c.bench_with_input(BenchmarkId::new("sum_enforce_consistency", size), &size, |b, _| {
            b.iter_batched_ref(
                || {
                    let mut handler = Sum::new(cells.clone(), None, target, 9, true).unwrap();
                    let mut grid = Grid::new(&shape);
                    let mut exclusions = variant_sudoku_core::CellExclusions::new(grid.len());
                    handler.initialize(&mut grid, &mut exclusions, &shape);
                    (handler, grid)
                },
                |(handler, grid)| {
                    let mut acc = HandlerAccumulator::new(grid.len(), &[]);
                    hint::black_box(handler.enforce_consistency(grid, &mut acc))
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
}

criterion_group!(benches, bench_sum_propagation);
criterion_main!(benches);
