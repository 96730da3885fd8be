//! Solver benchmarks using Criterion.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use assign_lab::{exact, heuristic, CostMatrix, Mode, Policy, StepwiseHungarianSolver};

/// Deterministic cost matrix with no structure the solvers could shortcut.
fn patterned_matrix(n: usize) -> CostMatrix {
    let grid: Vec<Vec<f64>> = (0..n)
        .map(|r| {
            (0..n)
                .map(|c| ((r * 31 + c * 17 + r * c) % 97) as f64 + 1.0)
                .collect()
        })
        .collect();
    CostMatrix::new(grid, Mode::Minimize).unwrap()
}

fn benchmark_exact_solve(c: &mut Criterion) {
    for n in [10, 25, 50] {
        let matrix = patterned_matrix(n);
        c.bench_function(&format!("exact_solve_{}x{}", n, n), |b| {
            b.iter(|| exact::solve(black_box(&matrix)).unwrap())
        });
    }
}

fn benchmark_stepwise_solve(c: &mut Criterion) {
    // Smaller sizes: the stepwise solver snapshots the full state per step,
    // which is the point of it (teaching sizes, not production sizes).
    for n in [5, 10, 20] {
        let matrix = patterned_matrix(n);
        c.bench_function(&format!("stepwise_solve_{}x{}", n, n), |b| {
            b.iter(|| StepwiseHungarianSolver::new(black_box(matrix.clone())).unwrap())
        });
    }
}

fn benchmark_heuristic_policies(c: &mut Criterion) {
    let matrix = patterned_matrix(50);
    let policies = [
        ("greedy", Policy::Greedy),
        ("thrifty", Policy::Thrifty),
        (
            "thrifty_k5_greedy",
            Policy::ThriftyKthThenGreedy {
                k: 5,
                switch_stage: 25,
            },
        ),
    ];

    for (name, policy) in policies {
        c.bench_function(&format!("heuristic_{}_50x50", name), |b| {
            b.iter(|| heuristic::run(black_box(&matrix), &policy).unwrap())
        });
    }
}

criterion_group!(
    benches,
    benchmark_exact_solve,
    benchmark_stepwise_solve,
    benchmark_heuristic_policies
);
criterion_main!(benches);
