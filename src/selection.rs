//! Order-statistic selection over a single matrix column.

use std::cmp::Ordering;

use crate::matrix::CostMatrix;

/// Which order statistic to select from the non-excluded column entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SelectMode {
    /// Largest remaining value.
    Max,
    /// Smallest remaining value.
    Min,
    /// k-th smallest remaining value, 1-indexed. `k` is clamped to the
    /// number of available rows at call time.
    KthMin(usize),
}

/// A selected column entry and the row it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Selection {
    /// Value at `(row, col)` in the cost matrix.
    pub value: f64,
    /// Candidate row the value belongs to.
    pub row: usize,
}

/// Select an order statistic from column `col`, skipping excluded rows.
///
/// `excluded[r]` marks row `r` as already consumed; `excluded` must have one
/// entry per matrix row. Ties resolve to the lowest row index for every mode,
/// so results are deterministic and reproducible.
///
/// Returns `None` when every row is excluded; callers treat this as "stage
/// unfulfilled", not as an error.
///
/// # Panics
/// Panics if `col` is out of bounds or `excluded` is shorter than the row
/// count.
pub fn select_in_column(
    matrix: &CostMatrix,
    col: usize,
    excluded: &[bool],
    mode: SelectMode,
) -> Option<Selection> {
    let nrows = matrix.nrows();

    match mode {
        SelectMode::Max => {
            let mut best: Option<Selection> = None;
            for row in 0..nrows {
                if excluded[row] {
                    continue;
                }
                let value = matrix.get(row, col);
                // Strict comparison keeps the first occurrence on ties.
                if best.map_or(true, |b| value > b.value) {
                    best = Some(Selection { value, row });
                }
            }
            best
        }
        SelectMode::Min => {
            let mut best: Option<Selection> = None;
            for row in 0..nrows {
                if excluded[row] {
                    continue;
                }
                let value = matrix.get(row, col);
                if best.map_or(true, |b| value < b.value) {
                    best = Some(Selection { value, row });
                }
            }
            best
        }
        SelectMode::KthMin(k) => {
            let mut available: Vec<f64> = (0..nrows)
                .filter(|&row| !excluded[row])
                .map(|row| matrix.get(row, col))
                .collect();
            if available.is_empty() {
                return None;
            }

            let k = k.clamp(1, available.len());
            let target = kth_smallest(&mut available, k - 1);

            // Resolve back to the lowest row index holding the selected
            // value, so the result stays deterministic regardless of the
            // partition order inside quickselect.
            (0..nrows)
                .filter(|&row| !excluded[row])
                .find(|&row| matrix.get(row, col) == target)
                .map(|row| Selection { value: target, row })
        }
    }
}

/// Quickselect: value at 0-indexed rank `k` of `data` sorted ascending.
///
/// Runs in expected linear time; `data` is reordered in place. Entries are
/// finite (the cost matrix guarantees it), so `partial_cmp` never fails.
fn kth_smallest(data: &mut [f64], k: usize) -> f64 {
    debug_assert!(k < data.len());

    let mut lo = 0;
    let mut hi = data.len() - 1;
    loop {
        if lo == hi {
            return data[lo];
        }
        let pivot = partition(data, lo, hi);
        match k.cmp(&pivot) {
            Ordering::Equal => return data[pivot],
            Ordering::Less => hi = pivot - 1,
            Ordering::Greater => lo = pivot + 1,
        }
    }
}

/// Median-of-three Lomuto partition of `data[lo..=hi]`.
///
/// Returns the final pivot position; everything left of it is strictly
/// smaller, everything right of it is greater or equal.
fn partition(data: &mut [f64], lo: usize, hi: usize) -> usize {
    let mid = lo + (hi - lo) / 2;

    // Order (lo, mid, hi) so the median lands at mid, then use it as pivot.
    if data[mid] < data[lo] {
        data.swap(mid, lo);
    }
    if data[hi] < data[lo] {
        data.swap(hi, lo);
    }
    if data[hi] < data[mid] {
        data.swap(hi, mid);
    }
    data.swap(mid, hi);

    let pivot = data[hi];
    let mut store = lo;
    for i in lo..hi {
        if data[i] < pivot {
            data.swap(i, store);
            store += 1;
        }
    }
    data.swap(store, hi);
    store
}
