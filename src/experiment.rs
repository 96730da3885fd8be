//! Comparative experiments: many matrices, every engine, averaged curves.
//!
//! Mirrors how the heuristics are benchmarked against the exact optimum:
//! each repetition runs every configured policy (plus optional exact
//! baselines) over its own matrix, and the per-stage cumulative sums are
//! averaged over all repetitions. Repetitions are independent, so they run
//! on the rayon pool with per-worker accumulators merged by reduction; no
//! matrix or solver state is ever shared between workers.
//!
//! The core never generates matrices itself; callers build (or randomize)
//! them and pass the batch in.

use rayon::prelude::*;

use crate::exact;
use crate::heuristic::{self, Policy, StageAssignment};
use crate::matrix::{CostMatrix, Mode};
use crate::{Error, Result};

/// Which engines an experiment compares.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExperimentConfig {
    /// Heuristic policies to evaluate, in report order.
    pub policies: Vec<Policy>,
    /// Also run the exact solver in minimize mode as a baseline.
    pub include_exact_min: bool,
    /// Also run the exact solver in maximize mode as a baseline.
    pub include_exact_max: bool,
}

impl ExperimentConfig {
    /// Compare the given policies against both exact baselines.
    pub fn with_baselines(policies: Vec<Policy>) -> Self {
        Self {
            policies,
            include_exact_min: true,
            include_exact_max: true,
        }
    }

    /// Compare only the given policies.
    pub fn policies_only(policies: Vec<Policy>) -> Self {
        Self {
            policies,
            include_exact_min: false,
            include_exact_max: false,
        }
    }

    fn series_count(&self) -> usize {
        self.policies.len()
            + usize::from(self.include_exact_min)
            + usize::from(self.include_exact_max)
    }
}

/// Averaged cumulative curve for one engine.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Series {
    /// Engine label ("HungarianMin", "Greedy", ...).
    pub label: String,
    /// `mean_cumulative[j]` is the cost accumulated through stage `j`,
    /// averaged over all repetitions.
    pub mean_cumulative: Vec<f64>,
    /// Average total cost (the last cumulative entry).
    pub mean_total: f64,
}

/// Result of a comparative experiment.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExperimentReport {
    pub stage_count: usize,
    pub repetitions: usize,
    pub series: Vec<Series>,
}

/// Run every configured engine over every matrix and average the curves.
///
/// All matrices must share one column count; the exact baselines
/// additionally require them square. Baselines always run in their own mode
/// (minimize or maximize) regardless of the mode flag the input matrices
/// carry.
///
/// # Errors
/// * [`Error::Shape`] for an empty batch, mismatched column counts, or
///   non-square matrices with a baseline enabled
/// * [`Error::Parameter`] if a policy's parameters do not fit the matrices
pub fn run_experiments(
    matrices: &[CostMatrix],
    config: &ExperimentConfig,
) -> Result<ExperimentReport> {
    let Some(first) = matrices.first() else {
        return Err(Error::Shape("experiment needs at least one matrix".to_string()));
    };
    if config.series_count() == 0 {
        return Err(Error::Parameter(
            "experiment needs at least one policy or baseline".to_string(),
        ));
    }

    let stage_count = first.ncols();
    let needs_square = config.include_exact_min || config.include_exact_max;
    for (i, m) in matrices.iter().enumerate() {
        if m.ncols() != stage_count {
            return Err(Error::Shape(format!(
                "matrix {} has {} stages, expected {}",
                i,
                m.ncols(),
                stage_count
            )));
        }
        if needs_square && !m.is_square() {
            return Err(Error::Shape(format!(
                "matrix {} is {}x{}; exact baselines require square matrices",
                i,
                m.nrows(),
                m.ncols()
            )));
        }
    }

    let series_count = config.series_count();
    let zero = || vec![vec![0.0; stage_count]; series_count];

    // Per-worker accumulators, merged at the end; pure summation, so the
    // reduction order cannot change the result.
    let sums: Vec<Vec<f64>> = matrices
        .par_iter()
        .try_fold(zero, |mut acc, matrix| -> Result<Vec<Vec<f64>>> {
            let mut series = 0;

            if config.include_exact_min {
                let solution = exact::solve(&matrix.with_mode(Mode::Minimize))?;
                add_cumulative_values(&mut acc[series], &solution.stage_values);
                series += 1;
            }
            if config.include_exact_max {
                let solution = exact::solve(&matrix.with_mode(Mode::Maximize))?;
                add_cumulative_values(&mut acc[series], &solution.stage_values);
                series += 1;
            }
            for policy in &config.policies {
                let (_, assignments) = heuristic::run_with_rows(matrix, policy)?;
                add_cumulative_stages(&mut acc[series], &assignments, stage_count);
                series += 1;
            }

            Ok(acc)
        })
        .try_reduce(zero, |mut a, b| {
            for (acc_row, other_row) in a.iter_mut().zip(&b) {
                for (acc, other) in acc_row.iter_mut().zip(other_row) {
                    *acc += other;
                }
            }
            Ok(a)
        })?;

    let repetitions = matrices.len();
    let labels = series_labels(config);
    let series = labels
        .into_iter()
        .zip(sums)
        .map(|(label, totals)| {
            let mean_cumulative: Vec<f64> =
                totals.into_iter().map(|t| t / repetitions as f64).collect();
            let mean_total = mean_cumulative.last().copied().unwrap_or(0.0);
            Series {
                label,
                mean_cumulative,
                mean_total,
            }
        })
        .collect();

    Ok(ExperimentReport {
        stage_count,
        repetitions,
        series,
    })
}

fn series_labels(config: &ExperimentConfig) -> Vec<String> {
    let mut labels = Vec::with_capacity(config.series_count());
    if config.include_exact_min {
        labels.push("HungarianMin".to_string());
    }
    if config.include_exact_max {
        labels.push("HungarianMax".to_string());
    }
    for policy in &config.policies {
        labels.push(policy.label());
    }
    labels
}

/// Add the cumulative sums of a dense per-stage value sequence.
fn add_cumulative_values(acc: &mut [f64], values: &[f64]) {
    let mut running = 0.0;
    for (slot, value) in acc.iter_mut().zip(values) {
        running += value;
        *slot += running;
    }
}

/// Add cumulative sums for a heuristic run, holding the running total flat
/// across skipped stages.
fn add_cumulative_stages(acc: &mut [f64], assignments: &[StageAssignment], stage_count: usize) {
    let mut running = 0.0;
    let mut next = assignments.iter().peekable();
    for (stage, slot) in acc.iter_mut().enumerate().take(stage_count) {
        if let Some(a) = next.peek() {
            if a.stage == stage {
                running += a.value;
                next.next();
            }
        }
        *slot += running;
    }
}
