//! # assign-lab - Assignment Solvers with Inspectable Traces
//!
//! Solvers and heuristics for the linear assignment problem over a cost
//! matrix: pick one candidate row per stage (column) under an injectivity
//! constraint, minimizing or maximizing the accumulated cost.
//!
//! ## Features
//!
//! - Stepwise Hungarian solver that records every intermediate matrix and
//!   marking state into an immutable, navigable [`Trace`]
//! - Exact augmenting-path solver as ground truth ([`exact::solve`])
//! - Per-stage selection heuristics (greedy, thrifty, staged hybrids,
//!   k-th order variant) sharing one engine ([`heuristic::run`])
//! - Parallel comparative experiments across policies ([`experiment`])
//!
//! ## Example
//!
//! ```rust
//! use assign_lab::{CostMatrix, Mode, StepwiseHungarianSolver};
//!
//! let matrix = CostMatrix::new(
//!     vec![vec![4.0, 1.0, 3.0], vec![2.0, 0.0, 5.0], vec![3.0, 2.0, 2.0]],
//!     Mode::Minimize,
//! ).unwrap();
//!
//! let solver = StepwiseHungarianSolver::new(matrix).unwrap();
//! assert_eq!(solver.optimal_cost(), 5.0);
//!
//! // Walk the recorded algorithm states without recomputing anything.
//! let mut cursor = solver.cursor();
//! while let Some(step) = cursor.advance() {
//!     println!("{}", step.description);
//! }
//! ```

pub mod exact;
pub mod experiment;
pub mod heuristic;
pub mod matrix;
pub mod selection;
pub mod stepwise;
pub mod trace;

// Re-exports for convenience
pub use exact::ExactSolution;
pub use experiment::{ExperimentConfig, ExperimentReport, Series};
pub use heuristic::{AssignmentOutcome, Policy, StageAssignment};
pub use matrix::{CostMatrix, Mode};
pub use selection::{SelectMode, Selection};
pub use stepwise::StepwiseHungarianSolver;
pub use trace::{Phase, Step, Trace, TraceCursor};

// Error types
pub use crate::error::{Error, Result};

mod error {
    use thiserror::Error;

    /// Errors that can occur in the assign-lab library
    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Invalid matrix shape: {0}")]
        Shape(String),

        #[error("Non-finite value {value} at row {row}, column {col}")]
        InvalidValue { row: usize, col: usize, value: f64 },

        #[error("Invalid parameter: {0}")]
        Parameter(String),
    }

    /// Result type alias used throughout the library
    pub type Result<T> = std::result::Result<T, Error>;
}
