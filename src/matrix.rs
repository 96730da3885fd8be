//! Cost matrix value type shared by every solver.

use nalgebra::DMatrix;

use crate::{Error, Result};

/// Optimization direction for a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    /// Minimize the accumulated cost.
    Minimize,
    /// Maximize the accumulated cost.
    Maximize,
}

/// Validated, immutable cost matrix.
///
/// Rows are candidates, columns are stages. Every entry is guaranteed finite
/// (no NaN or infinity) once construction succeeds. The stepwise and exact
/// solvers additionally require the matrix to be square; the heuristic engine
/// accepts rectangular matrices with at most as many stages as candidates.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CostMatrix {
    values: DMatrix<f64>,
    mode: Mode,
}

impl CostMatrix {
    /// Build a cost matrix from a row-major grid.
    ///
    /// # Errors
    /// * [`Error::Shape`] if the grid is empty or rows have unequal lengths
    /// * [`Error::InvalidValue`] if any entry is NaN or infinite
    pub fn new(grid: Vec<Vec<f64>>, mode: Mode) -> Result<Self> {
        if grid.is_empty() || grid[0].is_empty() {
            return Err(Error::Shape(
                "cost matrix must have at least one row and one column".to_string(),
            ));
        }

        let ncols = grid[0].len();
        for (r, row) in grid.iter().enumerate() {
            if row.len() != ncols {
                return Err(Error::Shape(format!(
                    "row {} has {} columns, expected {}",
                    r,
                    row.len(),
                    ncols
                )));
            }
        }

        let flat: Vec<f64> = grid.iter().flat_map(|row| row.iter().copied()).collect();
        Self::from_matrix(DMatrix::from_row_slice(grid.len(), ncols, &flat), mode)
    }

    /// Build a cost matrix from an existing nalgebra matrix.
    ///
    /// Same validation as [`CostMatrix::new`].
    pub fn from_matrix(values: DMatrix<f64>, mode: Mode) -> Result<Self> {
        if values.nrows() == 0 || values.ncols() == 0 {
            return Err(Error::Shape(
                "cost matrix must have at least one row and one column".to_string(),
            ));
        }

        for r in 0..values.nrows() {
            for c in 0..values.ncols() {
                let value = values[(r, c)];
                if !value.is_finite() {
                    return Err(Error::InvalidValue {
                        row: r,
                        col: c,
                        value,
                    });
                }
            }
        }

        Ok(Self { values, mode })
    }

    /// Number of candidate rows.
    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    /// Number of stages (columns).
    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    /// Entry at `(row, col)`.
    ///
    /// # Panics
    /// Panics if the indices are out of bounds.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[(row, col)]
    }

    /// Optimization direction this matrix was built for.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// True if the matrix has as many rows as columns.
    pub fn is_square(&self) -> bool {
        self.values.nrows() == self.values.ncols()
    }

    /// Read-only view of the underlying matrix.
    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.values
    }

    /// Same values under a different optimization direction.
    ///
    /// Used by the experiment runner to evaluate both exact baselines over
    /// one input matrix.
    pub fn with_mode(&self, mode: Mode) -> CostMatrix {
        Self {
            values: self.values.clone(),
            mode,
        }
    }
}
