//! Immutable solve traces and cursor navigation.
//!
//! The stepwise solver records every intermediate state into a [`Trace`] at
//! construction time. Navigation afterwards is pure indexing: a
//! [`TraceCursor`] never re-runs any algorithm state, which is what makes
//! back/forward stepping O(1) and always consistent.

use nalgebra::DMatrix;

/// Machine-readable tag for an algorithm phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    Init,
    MaxRowShift,
    RowReduce,
    ColReduce,
    MarkSingleRow,
    MarkSingleCol,
    MarkArbitrary,
    StarsAugmented,
    OptimalFound,
    LinesDrawn,
    MinUncovered,
    MatrixAdjusted,
}

impl Phase {
    /// Stable string tag, e.g. for log output or UI dispatch.
    pub fn tag(&self) -> &'static str {
        match self {
            Phase::Init => "INIT",
            Phase::MaxRowShift => "MAX_ROW_SHIFT",
            Phase::RowReduce => "ROW_REDUCE",
            Phase::ColReduce => "COL_REDUCE",
            Phase::MarkSingleRow => "MARK_SINGLE_ROW",
            Phase::MarkSingleCol => "MARK_SINGLE_COL",
            Phase::MarkArbitrary => "MARK_ARBITRARY",
            Phase::StarsAugmented => "STARS_AUGMENTED",
            Phase::OptimalFound => "OPTIMAL_FOUND",
            Phase::LinesDrawn => "LINES_DRAWN",
            Phase::MinUncovered => "MIN_UNCOVERED",
            Phase::MatrixAdjusted => "MATRIX_ADJUSTED",
        }
    }
}

/// Full snapshot of the solver state at one recorded moment.
///
/// Marking state uses dense boolean grids sized like the matrix, and dense
/// coverage vectors sized by the dimension, so membership checks are O(1).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Step {
    /// Working matrix at this point of the algorithm.
    pub matrix: DMatrix<f64>,
    /// Starred zeros (tentative assignment).
    pub starred: DMatrix<bool>,
    /// Crossed zeros (eliminated candidates).
    pub crossed: DMatrix<bool>,
    /// Rows covered by a line.
    pub row_covered: Vec<bool>,
    /// Columns covered by a line.
    pub col_covered: Vec<bool>,
    /// Machine-readable phase tag.
    pub phase: Phase,
    /// Human-readable description of what just happened.
    pub description: String,
}

/// Ordered, append-only record of solver steps.
///
/// Built once by [`crate::StepwiseHungarianSolver`]; never mutated after the
/// solve finishes.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trace {
    steps: Vec<Step>,
}

impl Trace {
    pub(crate) fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub(crate) fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step at `index`, if present.
    pub fn get(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    /// All recorded steps in order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Cursor positioned at the first step.
    pub fn cursor(&self) -> TraceCursor<'_> {
        TraceCursor {
            trace: self,
            index: 0,
        }
    }
}

/// Read-only forward/backward navigation over a [`Trace`].
///
/// Holds only an index; `advance` and `retreat` are O(1) and never recompute
/// algorithm state. At a boundary they return `None` and leave the cursor
/// where it is.
#[derive(Debug, Clone)]
pub struct TraceCursor<'a> {
    trace: &'a Trace,
    index: usize,
}

impl<'a> TraceCursor<'a> {
    /// Step under the cursor, or `None` for an empty trace.
    pub fn current(&self) -> Option<&'a Step> {
        self.trace.get(self.index)
    }

    /// Move forward one step and return it; `None` at the last step.
    pub fn advance(&mut self) -> Option<&'a Step> {
        if self.index + 1 < self.trace.len() {
            self.index += 1;
            self.current()
        } else {
            None
        }
    }

    /// Move backward one step and return it; `None` at the first step.
    pub fn retreat(&mut self) -> Option<&'a Step> {
        if self.index > 0 {
            self.index -= 1;
            self.current()
        } else {
            None
        }
    }

    /// True exactly at the last recorded step.
    pub fn is_at_end(&self) -> bool {
        self.index + 1 >= self.trace.len()
    }

    /// True at the first step.
    pub fn is_at_start(&self) -> bool {
        self.index == 0
    }

    /// Current index into the trace.
    pub fn position(&self) -> usize {
        self.index
    }
}
