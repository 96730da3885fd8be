//! Exact assignment solver (ground truth, no trace).
//!
//! Augmenting-path Kuhn-Munkres over a working copy of the matrix. Used as
//! the reference the stepwise solver and the heuristics are checked against.

use nalgebra::DMatrix;

use crate::matrix::{CostMatrix, Mode};
use crate::{Error, Result};

/// Reduced entries within this distance of zero count as zeros.
const ZERO_EPS: f64 = 1e-10;

/// Optimal one-to-one assignment over a square cost matrix.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExactSolution {
    /// Sum of the assigned entries, read from the original matrix.
    pub total_cost: f64,
    /// Original-matrix value assigned to each column, in column order.
    /// Directly comparable to a heuristic run's per-stage values.
    pub stage_values: Vec<f64>,
    /// `assignment[col]` is the row assigned to `col`.
    pub assignment: Vec<usize>,
}

/// Solve the assignment problem exactly for a square cost matrix.
///
/// Minimizes or maximizes per the matrix's [`Mode`]. When the optimum is
/// non-unique any optimal pairing may be returned, but `total_cost` is
/// always the optimal value.
///
/// # Errors
/// [`Error::Shape`] if the matrix is not square.
pub fn solve(matrix: &CostMatrix) -> Result<ExactSolution> {
    if !matrix.is_square() {
        return Err(Error::Shape(format!(
            "exact solver requires a square matrix, got {}x{}",
            matrix.nrows(),
            matrix.ncols()
        )));
    }

    let n = matrix.nrows();
    let mut working = matrix.as_matrix().clone();
    if matrix.mode() == Mode::Maximize {
        // Negating turns the maximization into an equivalent minimization;
        // costs are still read from the original matrix below.
        working.iter_mut().for_each(|v| *v = -*v);
    }

    let row_to_col = min_cost_assignment(&mut working);

    let mut assignment = vec![0; n];
    for (row, col) in row_to_col.into_iter().enumerate() {
        assignment[col] = row;
    }

    let stage_values: Vec<f64> = (0..n).map(|col| matrix.get(assignment[col], col)).collect();
    let total_cost = stage_values.iter().sum();

    Ok(ExactSolution {
        total_cost,
        stage_values,
        assignment,
    })
}

/// Minimum-cost complete assignment of an n x n matrix.
///
/// Reduces rows and columns, seeds a matching on the zeros, then alternates
/// augmenting-path searches with dual updates until every row is matched.
/// Returns `result[row] = col`. The matrix is consumed as scratch space.
fn min_cost_assignment(cost: &mut DMatrix<f64>) -> Vec<usize> {
    let n = cost.nrows();

    for r in 0..n {
        let row_min = (0..n).map(|c| cost[(r, c)]).fold(f64::INFINITY, f64::min);
        for c in 0..n {
            cost[(r, c)] -= row_min;
        }
    }
    for c in 0..n {
        let col_min = (0..n).map(|r| cost[(r, c)]).fold(f64::INFINITY, f64::min);
        for r in 0..n {
            cost[(r, c)] -= col_min;
        }
    }

    let mut row_match: Vec<Option<usize>> = vec![None; n];
    let mut col_match: Vec<Option<usize>> = vec![None; n];

    // Cheap initial matching on the reduced zeros.
    for r in 0..n {
        for c in 0..n {
            if cost[(r, c)].abs() < ZERO_EPS && row_match[r].is_none() && col_match[c].is_none() {
                row_match[r] = Some(c);
                col_match[c] = Some(r);
            }
        }
    }

    loop {
        let unmatched_rows: Vec<usize> = (0..n).filter(|&r| row_match[r].is_none()).collect();
        if unmatched_rows.is_empty() {
            break;
        }

        // Try every free row before touching the duals: one free row can
        // be a dead end in the current zeros while another still has an
        // augmenting path.
        let mut augmented = false;
        for &start_row in &unmatched_rows {
            if augment_from(start_row, cost, &mut row_match, &mut col_match) {
                augmented = true;
                break;
            }
        }
        if augmented {
            continue;
        }

        // No augmenting path through the current zeros: update the duals
        // to create one. Reachable rows / columns come from the
        // alternating search out of every free row.
        let mut row_reached = vec![false; n];
        let mut col_reached = vec![false; n];
        let mut stack = unmatched_rows;

        while let Some(r) = stack.pop() {
            if row_reached[r] {
                continue;
            }
            row_reached[r] = true;
            for c in 0..n {
                if cost[(r, c)].abs() < ZERO_EPS && !col_reached[c] {
                    col_reached[c] = true;
                    if let Some(matched_row) = col_match[c] {
                        stack.push(matched_row);
                    }
                }
            }
        }

        let mut delta = f64::INFINITY;
        for r in 0..n {
            if !row_reached[r] {
                continue;
            }
            for c in 0..n {
                if !col_reached[c] {
                    delta = delta.min(cost[(r, c)]);
                }
            }
        }

        // A non-positive or infinite delta cannot create a new zero; bail
        // out instead of adjusting in place forever.
        if !delta.is_finite() || delta <= 0.0 {
            break;
        }

        for r in 0..n {
            for c in 0..n {
                if row_reached[r] && !col_reached[c] {
                    cost[(r, c)] -= delta;
                } else if !row_reached[r] && col_reached[c] {
                    cost[(r, c)] += delta;
                }
            }
        }
    }

    // Once every free row has been tried the guarded break leaves nothing
    // unmatched on finite input; pair any leftovers with the free columns
    // so the result is always a permutation.
    let mut free_cols: Vec<usize> = (0..n).filter(|&c| col_match[c].is_none()).collect();
    row_match
        .into_iter()
        .map(|m| m.unwrap_or_else(|| free_cols.pop().expect("free columns pair with free rows")))
        .collect()
}

/// BFS for an augmenting path of zeros starting at `start_row`; flips the
/// matching along the path if one is found.
fn augment_from(
    start_row: usize,
    cost: &DMatrix<f64>,
    row_match: &mut [Option<usize>],
    col_match: &mut [Option<usize>],
) -> bool {
    let n = cost.nrows();
    let mut parent_col: Vec<Option<usize>> = vec![None; n];
    let mut visited_col = vec![false; n];
    let mut queue = std::collections::VecDeque::from([start_row]);
    let mut end_col = None;

    'bfs: while let Some(row) = queue.pop_front() {
        for col in 0..n {
            if !visited_col[col] && cost[(row, col)].abs() < ZERO_EPS {
                visited_col[col] = true;
                parent_col[col] = Some(row);

                match col_match[col] {
                    None => {
                        end_col = Some(col);
                        break 'bfs;
                    }
                    Some(next_row) => queue.push_back(next_row),
                }
            }
        }
    }

    let Some(mut col) = end_col else {
        return false;
    };

    loop {
        let row = parent_col[col].expect("path leads back to the start row");
        let previous = row_match[row];
        row_match[row] = Some(col);
        col_match[col] = Some(row);

        match previous {
            Some(prev_col) => col = prev_col,
            None => return true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(grid: Vec<Vec<f64>>, mode: Mode) -> CostMatrix {
        CostMatrix::new(grid, mode).unwrap()
    }

    #[test]
    fn test_minimize_reference_scenario() {
        let m = square(
            vec![
                vec![4.0, 1.0, 3.0],
                vec![2.0, 0.0, 5.0],
                vec![3.0, 2.0, 2.0],
            ],
            Mode::Minimize,
        );
        let solution = solve(&m).unwrap();

        assert_relative_eq!(solution.total_cost, 5.0);
        assert_eq!(solution.stage_values.len(), 3);
        assert_relative_eq!(solution.stage_values.iter().sum::<f64>(), 5.0);
    }

    #[test]
    fn test_maximize() {
        let m = square(
            vec![
                vec![4.0, 1.0, 3.0],
                vec![2.0, 0.0, 5.0],
                vec![3.0, 2.0, 2.0],
            ],
            Mode::Maximize,
        );
        let solution = solve(&m).unwrap();

        // Best pairing: (0,0)=4 + (1,2)=5 + (2,1)=2 = 11
        assert_relative_eq!(solution.total_cost, 11.0);
    }

    #[test]
    fn test_assignment_is_a_permutation() {
        let m = square(
            vec![
                vec![7.0, 3.0, 1.0, 4.0],
                vec![2.0, 9.0, 6.0, 8.0],
                vec![5.0, 5.0, 2.0, 3.0],
                vec![8.0, 1.0, 4.0, 6.0],
            ],
            Mode::Minimize,
        );
        let solution = solve(&m).unwrap();

        let mut rows = solution.assignment.clone();
        rows.sort_unstable();
        assert_eq!(rows, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_stage_values_match_assignment() {
        let m = square(
            vec![vec![1.0, 100.0], vec![100.0, 2.0]],
            Mode::Minimize,
        );
        let solution = solve(&m).unwrap();

        for (col, &row) in solution.assignment.iter().enumerate() {
            assert_relative_eq!(solution.stage_values[col], m.get(row, col));
        }
        assert_relative_eq!(solution.total_cost, 3.0);
    }

    #[test]
    fn test_single_cell() {
        let m = square(vec![vec![3.0]], Mode::Minimize);
        let solution = solve(&m).unwrap();
        assert_relative_eq!(solution.total_cost, 3.0);
        assert_eq!(solution.assignment, vec![0]);
    }

    #[test]
    fn test_needs_dual_update() {
        // Greedy zero matching after reduction cannot complete here; the
        // solver must adjust the duals at least once.
        let m = square(
            vec![
                vec![1.0, 2.0, 3.0],
                vec![2.0, 4.0, 6.0],
                vec![3.0, 6.0, 9.0],
            ],
            Mode::Minimize,
        );
        let solution = solve(&m).unwrap();
        // Optimal: (0,2)=3 + (1,1)=4 + (2,0)=3 = 10
        assert_relative_eq!(solution.total_cost, 10.0);
    }

    #[test]
    fn test_zero_heavy_matrix_needs_a_later_start_row() {
        // The first free row dead-ends in the initial zero matching while a
        // later free row still has an augmenting path; the solver must try
        // them all instead of adjusting the duals.
        let m = square(
            vec![
                vec![0.0, 1.0, 0.0, 1.0, 0.0],
                vec![1.0, 1.0, 1.0, 0.0, 1.0],
                vec![0.0, 0.0, 0.0, 1.0, 0.0],
                vec![1.0, 1.0, 1.0, 0.0, 1.0],
                vec![0.0, 1.0, 1.0, 1.0, 1.0],
            ],
            Mode::Minimize,
        );
        let solution = solve(&m).unwrap();

        // Rows 2 and 4 both have their only zero in column 4, so exactly
        // one unit of cost is unavoidable.
        assert_relative_eq!(solution.total_cost, 1.0);
        let mut rows = solution.assignment.clone();
        rows.sort_unstable();
        assert_eq!(rows, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_negative_entries() {
        let m = square(
            vec![vec![-5.0, 2.0], vec![3.0, -1.0]],
            Mode::Minimize,
        );
        let solution = solve(&m).unwrap();
        assert_relative_eq!(solution.total_cost, -6.0);
    }

    #[test]
    fn test_rejects_rectangular() {
        let m = CostMatrix::new(vec![vec![1.0, 2.0, 3.0]], Mode::Minimize).unwrap();
        assert!(matches!(solve(&m), Err(Error::Shape(_))));
    }
}
