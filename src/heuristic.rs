//! Stage-by-stage heuristic assignment policies.
//!
//! All five policies share one engine: walk the stages (columns) left to
//! right, ask an order-statistic selector for a candidate row, and consume
//! that row for the rest of the run. Policies differ only in which
//! [`SelectMode`] they pick per stage.

use crate::matrix::CostMatrix;
use crate::selection::{select_in_column, SelectMode};
use crate::{Error, Result};

/// Stage-selection policy for the heuristic engine.
///
/// The staged hybrids hold a `switch_stage` index `x`: stages before `x` use
/// the first rule, stages from `x` on use the second. The k-th order variant
/// additionally falls back to greedy whenever fewer than `k` stages remain
/// (`i + k >= m`), even inside the thrifty window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Policy {
    /// Always pick the maximum remaining value.
    Greedy,
    /// Always pick the minimum remaining value.
    Thrifty,
    /// Maximum before `switch_stage`, minimum afterwards.
    GreedyThenThrifty { switch_stage: usize },
    /// Minimum before `switch_stage`, maximum afterwards.
    ThriftyThenGreedy { switch_stage: usize },
    /// k-th smallest before `switch_stage` (with the look-ahead guard),
    /// maximum afterwards.
    ThriftyKthThenGreedy { k: usize, switch_stage: usize },
}

impl Policy {
    /// Selection mode this policy uses at `stage` out of `stage_count`.
    ///
    /// Pure function of the stage index; the engine carries no other
    /// policy state.
    pub fn select_mode(&self, stage: usize, stage_count: usize) -> SelectMode {
        match *self {
            Policy::Greedy => SelectMode::Max,
            Policy::Thrifty => SelectMode::Min,
            Policy::GreedyThenThrifty { switch_stage } => {
                if stage < switch_stage {
                    SelectMode::Max
                } else {
                    SelectMode::Min
                }
            }
            Policy::ThriftyThenGreedy { switch_stage } => {
                if stage < switch_stage {
                    SelectMode::Min
                } else {
                    SelectMode::Max
                }
            }
            Policy::ThriftyKthThenGreedy { k, switch_stage } => {
                if stage < switch_stage && stage + k < stage_count {
                    SelectMode::KthMin(k)
                } else {
                    SelectMode::Max
                }
            }
        }
    }

    /// Display label, used by the experiment report.
    pub fn label(&self) -> String {
        match *self {
            Policy::Greedy => "Greedy".to_string(),
            Policy::Thrifty => "Thrifty".to_string(),
            Policy::GreedyThenThrifty { switch_stage } => {
                format!("GreedyThrifty({})", switch_stage)
            }
            Policy::ThriftyThenGreedy { switch_stage } => {
                format!("ThriftyGreedy({})", switch_stage)
            }
            Policy::ThriftyKthThenGreedy { k, switch_stage } => {
                format!("ThriftyK{}Greedy({})", k, switch_stage)
            }
        }
    }

    /// Validate policy parameters against a matrix shape.
    ///
    /// The switch index must lie in `[0, stage_count]` and `k` in
    /// `[1, candidate_count]`; `k` is further clamped to the shrinking
    /// available count inside the selector at each stage.
    fn validate(&self, stage_count: usize, candidate_count: usize) -> Result<()> {
        let switch_stage = match *self {
            Policy::Greedy | Policy::Thrifty => None,
            Policy::GreedyThenThrifty { switch_stage }
            | Policy::ThriftyThenGreedy { switch_stage } => Some(switch_stage),
            Policy::ThriftyKthThenGreedy { k, switch_stage } => {
                if k == 0 || k > candidate_count {
                    return Err(Error::Parameter(format!(
                        "k = {} outside [1, {}]",
                        k, candidate_count
                    )));
                }
                Some(switch_stage)
            }
        };

        if let Some(x) = switch_stage {
            if x > stage_count {
                return Err(Error::Parameter(format!(
                    "switch stage {} outside [0, {}]",
                    x, stage_count
                )));
            }
        }
        Ok(())
    }
}

/// Result of one heuristic run: total accumulated cost and the per-stage
/// values, one entry per fulfilled stage.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssignmentOutcome {
    pub total_cost: f64,
    pub stage_values: Vec<f64>,
}

/// One fulfilled stage: which row it consumed and at what value.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StageAssignment {
    pub stage: usize,
    pub row: usize,
    pub value: f64,
}

/// Run a policy over every stage of the matrix.
///
/// Stages with no remaining candidate are skipped silently: they contribute
/// no cost and consume no row. Consumed rows are never reused: the
/// injectivity invariant of every engine in this crate.
///
/// # Errors
/// [`Error::Parameter`] if the policy's switch index or `k` is outside the
/// matrix bounds.
pub fn run(matrix: &CostMatrix, policy: &Policy) -> Result<AssignmentOutcome> {
    run_with_rows(matrix, policy).map(|(outcome, _)| outcome)
}

/// Like [`run`], also reporting which row each fulfilled stage consumed.
pub fn run_with_rows(
    matrix: &CostMatrix,
    policy: &Policy,
) -> Result<(AssignmentOutcome, Vec<StageAssignment>)> {
    let stage_count = matrix.ncols();
    policy.validate(stage_count, matrix.nrows())?;

    let mut excluded = vec![false; matrix.nrows()];
    let mut total_cost = 0.0;
    let mut stage_values = Vec::with_capacity(stage_count);
    let mut assignments = Vec::with_capacity(stage_count);

    for stage in 0..stage_count {
        let mode = policy.select_mode(stage, stage_count);
        if let Some(selection) = select_in_column(matrix, stage, &excluded, mode) {
            excluded[selection.row] = true;
            total_cost += selection.value;
            stage_values.push(selection.value);
            assignments.push(StageAssignment {
                stage,
                row: selection.row,
                value: selection.value,
            });
        }
    }

    Ok((
        AssignmentOutcome {
            total_cost,
            stage_values,
        },
        assignments,
    ))
}
