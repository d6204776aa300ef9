//! Equal-error critical-value search.
//!
//! Given sorted LLR distributions `D0` (null) and `D1` (alternative), find
//! the split `a` in `D0` at which the two error rates balance. Candidate
//! thresholds are `D0[a]` for `a = n0-1, n0-2, .., 0`. For each candidate,
//! `b` counts the `D1` values strictly below the threshold, and the search
//! minimizes `|b + a − n0|`. Ties keep the first candidate seen, i.e. the
//! largest `a`. The significance level is `alpha = 1 − a*/n0`.
//!
//! Thresholds only decrease as `a` does, so `b` is non-increasing and one
//! pointer into `D1` walks backwards across the whole scan: O(n0 + n1).
//! Both inputs must already be sorted ascending; this is not re-checked.

use ht_common::{Error, Result};
use serde::Serialize;

/// Outcome of the equal-error search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CriticalValue {
    /// Significance level (false-positive rate) at the balanced threshold.
    pub alpha: f64,
    /// Chosen split index `a*` into `D0`.
    pub split: usize,
    /// Threshold LLR value `D0[a*]`.
    pub threshold: f64,
    /// `D1` values strictly below the threshold at `a*`.
    pub type_two_count: usize,
    /// Residual `|b + a* − n0|`.
    pub imbalance: usize,
}

/// Locate the equal-error threshold between `d0` and `d1`.
pub fn find_critical_value(d0: &[f64], d1: &[f64]) -> Result<CriticalValue> {
    let n0 = d0.len();
    let n1 = d1.len();
    if n0 == 0 {
        return Err(Error::empty_distribution("hypothesis 0 LLR distribution"));
    }
    if n1 == 0 {
        return Err(Error::empty_distribution("hypothesis 1 LLR distribution"));
    }

    // d1[..below] holds exactly the values strictly less than d0[a].
    let mut below = n1;
    let mut candidate = |a: usize| {
        while below > 0 && d1[below - 1] >= d0[a] {
            below -= 1;
        }
        (a, below, (below + a).abs_diff(n0))
    };

    // (split, type_two_count, imbalance), starting from the largest split.
    let mut best = candidate(n0 - 1);
    for a in (0..n0 - 1).rev() {
        if best.2 == 0 {
            break;
        }
        let next = candidate(a);
        if next.2 < best.2 {
            best = next;
        }
    }

    let (split, type_two_count, imbalance) = best;
    Ok(CriticalValue {
        alpha: (n0 - split) as f64 / n0 as f64,
        split,
        threshold: d0[split],
        type_two_count,
        imbalance,
    })
}

/// Significance level at which the false-positive and false-negative rates
/// are equal.
pub fn equal_error_alpha(d0: &[f64], d1: &[f64]) -> Result<f64> {
    find_critical_value(d0, d1).map(|cv| cv.alpha)
}
