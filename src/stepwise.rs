//! Stepwise Hungarian solver recording every intermediate state.
//!
//! The classical primal-dual matrix-reduction presentation of the algorithm:
//! row/column reduction, zero marking with deterministic tie-breaks, minimum
//! line cover (König construction), matrix adjustment, iterate to fixpoint.
//! Every phase transition is recorded as a [`Step`] in an immutable
//! [`Trace`], built eagerly at construction so that navigation never has to
//! re-run anything.

use nalgebra::DMatrix;

use crate::matrix::{CostMatrix, Mode};
use crate::trace::{Phase, Step, Trace, TraceCursor};
use crate::{Error, Result};

/// Reduced entries within this distance of zero count as zeros.
const ZERO_EPS: f64 = 1e-10;

/// Exact assignment solver that exposes its full intermediate state.
///
/// Construction runs the whole algorithm; afterwards the solver is a
/// read-only artifact holding the trace, the optimal assignment and its
/// cost. Use [`cursor`](Self::cursor) to step through the recorded states.
pub struct StepwiseHungarianSolver {
    original: CostMatrix,
    working: DMatrix<f64>,
    starred: DMatrix<bool>,
    crossed: DMatrix<bool>,
    row_covered: Vec<bool>,
    col_covered: Vec<bool>,
    n: usize,
    trace: Trace,
    assignment: Vec<usize>,
    stage_values: Vec<f64>,
    optimal_cost: f64,
}

impl StepwiseHungarianSolver {
    /// Solve the given square matrix, recording every step.
    ///
    /// # Errors
    /// [`Error::Shape`] if the matrix is not square.
    pub fn new(matrix: CostMatrix) -> Result<Self> {
        if !matrix.is_square() {
            return Err(Error::Shape(format!(
                "stepwise solver requires a square matrix, got {}x{}",
                matrix.nrows(),
                matrix.ncols()
            )));
        }

        let n = matrix.nrows();
        let mut solver = Self {
            working: matrix.as_matrix().clone(),
            starred: DMatrix::from_element(n, n, false),
            crossed: DMatrix::from_element(n, n, false),
            row_covered: vec![false; n],
            col_covered: vec![false; n],
            n,
            trace: Trace::new(),
            assignment: Vec::new(),
            stage_values: Vec::new(),
            optimal_cost: 0.0,
            original: matrix,
        };

        solver.record(Phase::Init, "Initialization.".to_string());
        solver.run();
        solver.finish();
        Ok(solver)
    }

    /// The recorded trace.
    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// Cursor positioned at the first recorded step.
    pub fn cursor(&self) -> TraceCursor<'_> {
        self.trace.cursor()
    }

    /// Optimal total cost, summed from the original (untransformed) matrix.
    pub fn optimal_cost(&self) -> f64 {
        self.optimal_cost
    }

    /// `assignment()[col]` is the row assigned to `col`.
    pub fn assignment(&self) -> &[usize] {
        &self.assignment
    }

    /// Original-matrix value assigned to each column, in column order.
    pub fn stage_values(&self) -> &[f64] {
        &self.stage_values
    }

    /// The input matrix the solver was built from.
    pub fn original(&self) -> &CostMatrix {
        &self.original
    }

    fn record(&mut self, phase: Phase, description: String) {
        self.trace.push(Step {
            matrix: self.working.clone(),
            starred: self.starred.clone(),
            crossed: self.crossed.clone(),
            row_covered: self.row_covered.clone(),
            col_covered: self.col_covered.clone(),
            phase,
            description,
        });
    }

    fn run(&mut self) {
        let n = self.n;

        // Step 1 (maximize only): per-row shift turns the maximization into
        // an equivalent minimization over the transformed matrix.
        if self.original.mode() == Mode::Maximize {
            for r in 0..n {
                let row_max = (0..n)
                    .map(|c| self.working[(r, c)])
                    .fold(f64::NEG_INFINITY, f64::max);
                for c in 0..n {
                    self.working[(r, c)] = row_max - self.working[(r, c)];
                }
            }
            self.record(
                Phase::MaxRowShift,
                "Step 1 (maximize): replaced each entry with its row maximum minus the entry."
                    .to_string(),
            );
        }

        // Step 2: row reduction.
        for r in 0..n {
            let row_min = (0..n)
                .map(|c| self.working[(r, c)])
                .fold(f64::INFINITY, f64::min);
            for c in 0..n {
                self.working[(r, c)] -= row_min;
            }
        }
        self.record(
            Phase::RowReduce,
            "Step 2: subtracted the row minimum from every entry of each row.".to_string(),
        );

        // Step 3: column reduction.
        for c in 0..n {
            let col_min = (0..n)
                .map(|r| self.working[(r, c)])
                .fold(f64::INFINITY, f64::min);
            for r in 0..n {
                self.working[(r, c)] -= col_min;
            }
        }
        self.record(
            Phase::ColReduce,
            "Step 3: subtracted the column minimum from every entry of each column.".to_string(),
        );

        loop {
            self.clear_marks();
            self.mark_zeros();

            // The marking pass stars a maximal zero set that need not be a
            // maximum matching of the current zeros. Left as is, the line
            // cover below can degenerate to all n columns and the
            // adjustment stalls with nothing uncovered, so grow the stars
            // along alternating paths first.
            while self.star_count() < n && self.augment_stars() {
                self.record(
                    Phase::StarsAugmented,
                    format!(
                        "Grew the starred zeros along an alternating path ({} starred zeros).",
                        self.star_count()
                    ),
                );
            }

            let stars = self.star_count();
            if stars == n {
                self.record(
                    Phase::OptimalFound,
                    format!("Step 7: optimal solution found ({} starred zeros).", n),
                );
                return;
            }

            self.draw_lines();
            self.record(
                Phase::LinesDrawn,
                format!(
                    "Step 7: assignment incomplete ({}/{} starred zeros); drew the minimum line cover.",
                    stars, n
                ),
            );

            let delta = self.min_uncovered();
            self.record(
                Phase::MinUncovered,
                format!("Step 8: minimum uncovered entry is {}.", delta),
            );

            self.adjust(delta);
            self.record(
                Phase::MatrixAdjusted,
                "Step 8: matrix adjusted (uncovered entries reduced, doubly covered entries increased); back to step 4."
                    .to_string(),
            );
        }
    }

    /// Steps 4-6: star zeros until no free zero remains in this pass.
    ///
    /// A zero is free while it is neither starred nor crossed. Tie-breaks
    /// are fixed: lowest row index first, then lowest column index, then
    /// row-major order for the arbitrary rule.
    fn mark_zeros(&mut self) {
        let n = self.n;

        loop {
            let mut row_counts = vec![0usize; n];
            let mut col_counts = vec![0usize; n];
            let mut first_zero: Option<(usize, usize)> = None;

            for r in 0..n {
                for c in 0..n {
                    if self.is_free_zero(r, c) {
                        row_counts[r] += 1;
                        col_counts[c] += 1;
                        if first_zero.is_none() {
                            first_zero = Some((r, c));
                        }
                    }
                }
            }

            if first_zero.is_none() {
                return;
            }

            // Step 4: first row holding exactly one free zero.
            if let Some(r) = (0..n).find(|&r| row_counts[r] == 1) {
                let c = (0..n)
                    .find(|&c| self.is_free_zero(r, c))
                    .expect("counted one free zero in this row");
                self.starred[(r, c)] = true;
                for r_other in 0..n {
                    if r_other != r && self.is_free_zero(r_other, c) {
                        self.crossed[(r_other, c)] = true;
                    }
                }
                self.record(
                    Phase::MarkSingleRow,
                    format!(
                        "Step 4: row {} has a single free zero at ({}, {}); starred it and crossed the other zeros of column {}.",
                        r + 1, r + 1, c + 1, c + 1
                    ),
                );
                continue;
            }

            // Step 5: first column holding exactly one free zero.
            if let Some(c) = (0..n).find(|&c| col_counts[c] == 1) {
                let r = (0..n)
                    .find(|&r| self.is_free_zero(r, c))
                    .expect("counted one free zero in this column");
                self.starred[(r, c)] = true;
                for c_other in 0..n {
                    if c_other != c && self.is_free_zero(r, c_other) {
                        self.crossed[(r, c_other)] = true;
                    }
                }
                self.record(
                    Phase::MarkSingleCol,
                    format!(
                        "Step 5: column {} has a single free zero at ({}, {}); starred it and crossed the other zeros of row {}.",
                        c + 1, r + 1, c + 1, r + 1
                    ),
                );
                continue;
            }

            // Step 6: arbitrary free zero, first in row-major order.
            let (r, c) = first_zero.expect("free zeros remain");
            self.starred[(r, c)] = true;
            for c_other in 0..n {
                if c_other != c && self.is_free_zero(r, c_other) {
                    self.crossed[(r, c_other)] = true;
                }
            }
            for r_other in 0..n {
                if r_other != r && self.is_free_zero(r_other, c) {
                    self.crossed[(r_other, c)] = true;
                }
            }
            self.record(
                Phase::MarkArbitrary,
                format!(
                    "Step 6: starred the arbitrary zero at ({}, {}); crossed the zeros sharing its row and column.",
                    r + 1, c + 1
                ),
            );
        }
    }

    /// Grow the starred matching by one along an alternating path of zeros.
    ///
    /// Stars stay disjoint by row and column: the path flip unstars one
    /// zero per intermediate row before starring its replacement. Returns
    /// whether a path was found.
    fn augment_stars(&mut self) -> bool {
        let n = self.n;
        let mut star_in_row: Vec<Option<usize>> = vec![None; n];
        let mut star_in_col: Vec<Option<usize>> = vec![None; n];
        for r in 0..n {
            for c in 0..n {
                if self.starred[(r, c)] {
                    star_in_row[r] = Some(c);
                    star_in_col[c] = Some(r);
                }
            }
        }

        let mut parent_col: Vec<Option<usize>> = vec![None; n];
        let mut visited_col = vec![false; n];
        let mut queue: std::collections::VecDeque<usize> =
            (0..n).filter(|&r| star_in_row[r].is_none()).collect();
        let mut end_col = None;

        'bfs: while let Some(row) = queue.pop_front() {
            for col in 0..n {
                if !visited_col[col] && self.working[(row, col)].abs() < ZERO_EPS {
                    visited_col[col] = true;
                    parent_col[col] = Some(row);

                    match star_in_col[col] {
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
            let row = parent_col[col].expect("path leads back to a star-free row");
            let previous = star_in_row[row];
            self.starred[(row, col)] = true;
            star_in_row[row] = Some(col);

            match previous {
                Some(prev_col) => {
                    self.starred[(row, prev_col)] = false;
                    col = prev_col;
                }
                None => return true,
            }
        }
    }

    /// Minimum line cover via the König construction.
    ///
    /// Starting from the rows without a star, alternate "zeros in a marked
    /// row mark their column" and "stars in a marked column mark their row"
    /// to a fixpoint. Covering rows are the rows NOT marked; covering
    /// columns are the marked columns.
    fn draw_lines(&mut self) {
        let n = self.n;

        let mut marked_rows: Vec<bool> = (0..n)
            .map(|r| !(0..n).any(|c| self.starred[(r, c)]))
            .collect();
        let mut marked_cols = vec![false; n];

        loop {
            let mut changed = false;

            for r in 0..n {
                if !marked_rows[r] {
                    continue;
                }
                for c in 0..n {
                    if self.working[(r, c)].abs() < ZERO_EPS && !marked_cols[c] {
                        marked_cols[c] = true;
                        changed = true;
                    }
                }
            }

            for r in 0..n {
                for c in 0..n {
                    if self.starred[(r, c)] && marked_cols[c] && !marked_rows[r] {
                        marked_rows[r] = true;
                        changed = true;
                    }
                }
            }

            if !changed {
                break;
            }
        }

        for r in 0..n {
            self.row_covered[r] = !marked_rows[r];
        }
        for c in 0..n {
            self.col_covered[c] = marked_cols[c];
        }
    }

    /// Smallest entry not covered by any line.
    fn min_uncovered(&self) -> f64 {
        let mut min_val = f64::INFINITY;
        for r in 0..self.n {
            if self.row_covered[r] {
                continue;
            }
            for c in 0..self.n {
                if !self.col_covered[c] && self.working[(r, c)] < min_val {
                    min_val = self.working[(r, c)];
                }
            }
        }
        min_val
    }

    /// Subtract `delta` from uncovered entries, add it to doubly covered
    /// ones; singly covered entries stay unchanged.
    fn adjust(&mut self, delta: f64) {
        for r in 0..self.n {
            for c in 0..self.n {
                let covered_by_row = self.row_covered[r];
                let covered_by_col = self.col_covered[c];
                if !covered_by_row && !covered_by_col {
                    self.working[(r, c)] -= delta;
                } else if covered_by_row && covered_by_col {
                    self.working[(r, c)] += delta;
                }
            }
        }
    }

    fn clear_marks(&mut self) {
        self.starred.fill(false);
        self.crossed.fill(false);
        self.row_covered.fill(false);
        self.col_covered.fill(false);
    }

    fn is_free_zero(&self, r: usize, c: usize) -> bool {
        self.working[(r, c)].abs() < ZERO_EPS && !self.starred[(r, c)] && !self.crossed[(r, c)]
    }

    fn star_count(&self) -> usize {
        self.starred.iter().filter(|&&s| s).count()
    }

    /// Read the assignment and its cost off the final starred set.
    fn finish(&mut self) {
        let n = self.n;
        self.assignment = (0..n)
            .map(|c| {
                (0..n)
                    .find(|&r| self.starred[(r, c)])
                    .expect("optimal marking stars every column exactly once")
            })
            .collect();
        self.stage_values = (0..n)
            .map(|c| self.original.get(self.assignment[c], c))
            .collect();
        self.optimal_cost = self.stage_values.iter().sum();
    }
}
