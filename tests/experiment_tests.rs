//! Experiment runner tests: parallel averaging must be deterministic and
//! must agree with running the engines one by one.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use assign_lab::{
    exact, heuristic, CostMatrix, ExperimentConfig, Mode, Policy,
};
use assign_lab::experiment::run_experiments;

fn random_batch(seed: u64, count: usize, n: usize) -> Vec<CostMatrix> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let grid: Vec<Vec<f64>> = (0..n)
                .map(|_| (0..n).map(|_| rng.gen_range(0.0..100.0)).collect())
                .collect();
            CostMatrix::new(grid, Mode::Minimize).unwrap()
        })
        .collect()
}

fn all_policies() -> Vec<Policy> {
    vec![
        Policy::Greedy,
        Policy::Thrifty,
        Policy::GreedyThenThrifty { switch_stage: 3 },
        Policy::ThriftyThenGreedy { switch_stage: 3 },
        Policy::ThriftyKthThenGreedy {
            k: 2,
            switch_stage: 3,
        },
    ]
}

#[test]
fn test_report_matches_sequential_computation() {
    let batch = random_batch(3, 8, 6);
    let config = ExperimentConfig::with_baselines(all_policies());
    let report = run_experiments(&batch, &config).unwrap();

    // Recompute the exact-minimum series by hand.
    let mut expected = vec![0.0; 6];
    for m in &batch {
        let solution = exact::solve(m).unwrap();
        let mut running = 0.0;
        for (stage, value) in solution.stage_values.iter().enumerate() {
            running += value;
            expected[stage] += running;
        }
    }
    for slot in &mut expected {
        *slot /= batch.len() as f64;
    }

    let hungarian_min = &report.series[0];
    assert_eq!(hungarian_min.label, "HungarianMin");
    for (got, want) in hungarian_min.mean_cumulative.iter().zip(&expected) {
        assert!((got - want).abs() < 1e-9);
    }

    // And the greedy series.
    let greedy = report
        .series
        .iter()
        .find(|s| s.label == "Greedy")
        .unwrap();
    let mut greedy_total = 0.0;
    for m in &batch {
        greedy_total += heuristic::run(m, &Policy::Greedy).unwrap().total_cost;
    }
    assert!((greedy.mean_total - greedy_total / batch.len() as f64).abs() < 1e-9);
}

#[test]
fn test_parallel_result_is_deterministic() {
    let batch = random_batch(9, 16, 5);
    let config = ExperimentConfig::with_baselines(all_policies());

    let default_pool = run_experiments(&batch, &config).unwrap();

    let single_thread = rayon::ThreadPoolBuilder::new()
        .num_threads(1)
        .build()
        .unwrap()
        .install(|| run_experiments(&batch, &config).unwrap());

    assert_eq!(default_pool.series.len(), single_thread.series.len());
    for (a, b) in default_pool.series.iter().zip(&single_thread.series) {
        assert_eq!(a.label, b.label);
        for (x, y) in a.mean_cumulative.iter().zip(&b.mean_cumulative) {
            assert!((x - y).abs() < 1e-9, "{}: {} vs {}", a.label, x, y);
        }
    }
}

#[test]
fn test_exact_baselines_bound_every_policy() {
    let batch = random_batch(21, 10, 5);
    let config = ExperimentConfig::with_baselines(all_policies());
    let report = run_experiments(&batch, &config).unwrap();

    let min_total = report.series[0].mean_total;
    let max_total = report.series[1].mean_total;
    assert!(min_total <= max_total);

    for series in &report.series[2..] {
        assert!(
            series.mean_total >= min_total - 1e-9 && series.mean_total <= max_total + 1e-9,
            "{} mean total {} outside [{}, {}]",
            series.label,
            series.mean_total,
            min_total,
            max_total
        );
    }
}

#[test]
fn test_cumulative_series_is_monotone_for_positive_costs() {
    // Entries are positive, so every cumulative curve must be nondecreasing.
    let batch = random_batch(33, 6, 7);
    let config = ExperimentConfig::with_baselines(all_policies());
    let report = run_experiments(&batch, &config).unwrap();

    for series in &report.series {
        for window in series.mean_cumulative.windows(2) {
            assert!(
                window[1] >= window[0] - 1e-9,
                "{} decreases: {:?}",
                series.label,
                window
            );
        }
    }
}
