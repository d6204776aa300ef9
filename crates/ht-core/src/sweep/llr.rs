//! Log-likelihood-ratio distributions.
//!
//! For a measurement count `M`, each hypothesis's data is cut into `n_exp`
//! disjoint experiments of `M` contiguous measurements. Experiment `e` covers
//! `measurements[M*e .. M*e + M]`, so no raw value is reused within one `M`.
//! Every experiment contributes one LLR value:
//!
//! ```text
//! llr = Σ [ ln f(x | rate₁) − ln f(x | rate₀) ]
//! ```
//!
//! The ratio is always alternative over null, for both hypotheses' data.

use ht_common::{Error, Result};
use ht_math::{exp_log_likelihood_ratio, NeumaierSum};
use serde::Serialize;

use crate::measurement::{Hypothesis, HypothesisPair};

/// Per-experiment LLR values for one hypothesis, sorted ascending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LlrDistribution {
    values: Vec<f64>,
}

impl LlrDistribution {
    /// Sort `values` ascending (IEEE total order) and wrap them.
    pub fn from_unsorted(mut values: Vec<f64>) -> Self {
        values.sort_by(f64::total_cmp);
        LlrDistribution { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// LLR of one experiment's measurements.
pub fn experiment_llr(measurements: &[f64], rate0: f64, rate1: f64) -> f64 {
    let mut sum = NeumaierSum::new();
    sum.extend(
        measurements
            .iter()
            .map(|&x| exp_log_likelihood_ratio(x, rate1, rate0)),
    );
    sum.total()
}

/// Build the sorted LLR distribution of `hypothesis` for `m` measurements per
/// experiment.
///
/// Fails with `InsufficientData` if the hypothesis holds fewer than
/// `m * n_exp` measurements.
pub fn build_distribution(
    hypothesis: &Hypothesis,
    rates: (f64, f64),
    m: usize,
    n_exp: usize,
) -> Result<LlrDistribution> {
    if m == 0 {
        return Err(Error::invalid_parameter(
            "m",
            m,
            "measurements per experiment must be at least 1",
        ));
    }
    let needed = m
        .checked_mul(n_exp)
        .ok_or_else(|| Error::invalid_parameter("n_exp", n_exp, "sweep size overflows"))?;
    if hypothesis.measurements.len() < needed {
        return Err(Error::insufficient_measurements(
            &hypothesis.source,
            needed,
            hypothesis.measurements.len(),
        ));
    }

    let (rate0, rate1) = rates;
    let values = hypothesis.measurements[..needed]
        .chunks_exact(m)
        .map(|experiment| experiment_llr(experiment, rate0, rate1))
        .collect();
    Ok(LlrDistribution::from_unsorted(values))
}

/// Build `(D0, D1)` for one sweep step.
pub fn build_llr_pair(
    pair: &HypothesisPair,
    m: usize,
    n_exp: usize,
) -> Result<(LlrDistribution, LlrDistribution)> {
    let rates = pair.rates();
    let d0 = build_distribution(&pair.h0, rates, m, n_exp)?;
    let d1 = build_distribution(&pair.h1, rates, m, n_exp)?;
    Ok((d0, d1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(r0: f64, r1: f64, data0: Vec<f64>, data1: Vec<f64>) -> HypothesisPair {
        HypothesisPair::new(
            Hypothesis::from_parts(0, r0, data0),
            Hypothesis::from_parts(1, r1, data1),
        )
    }

    #[test]
    fn single_measurement_llr_closed_form() {
        // ln(2) - 2x - (ln(1) - x) = ln 2 - x
        let llr = experiment_llr(&[0.5], 1.0, 2.0);
        assert!((llr - (2f64.ln() - 0.5)).abs() < 1e-12);
    }

    #[test]
    fn equal_rates_give_zero_llr() {
        let d = build_distribution(
            &Hypothesis::from_parts(0, 3.0, vec![0.1, 7.0, 2.5, 0.0]),
            (3.0, 3.0),
            2,
            2,
        )
        .unwrap();
        assert!(d.values().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn experiments_are_disjoint_contiguous_slices() {
        // rates (1, 2): per-measurement LLR = ln 2 - x
        let h = Hypothesis::from_parts(0, 1.0, vec![0.0, 1.0, 2.0, 3.0, 100.0]);
        let d = build_distribution(&h, (1.0, 2.0), 2, 2).unwrap();
        let ln2 = 2f64.ln();
        // experiment 0 = [0, 1], experiment 1 = [2, 3]; trailing value unused
        let expected = [2.0 * ln2 - 5.0, 2.0 * ln2 - 1.0];
        assert_eq!(d.len(), 2);
        for (got, want) in d.values().iter().zip(expected) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[test]
    fn distribution_is_sorted() {
        let h = Hypothesis::from_parts(1, 2.0, vec![3.0, 0.1, 2.0, 0.5, 1.0, 0.0]);
        let d = build_distribution(&h, (1.0, 2.0), 1, 6).unwrap();
        assert!(d.values().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn ratio_direction_is_same_for_both_hypotheses() {
        let p = pair(1.0, 2.0, vec![0.5], vec![0.5]);
        let (d0, d1) = build_llr_pair(&p, 1, 1).unwrap();
        assert_eq!(d0.values(), d1.values());
    }

    #[test]
    fn short_data_is_insufficient() {
        let p = pair(1.0, 2.0, vec![0.5; 10], vec![0.5; 5]);
        let err = build_llr_pair(&p, 3, 3).unwrap_err();
        match err {
            Error::InsufficientData { needed, have, .. } => {
                assert_eq!((needed, have), (9, 5));
            }
            other => panic!("expected InsufficientData, got {:?}", other),
        }
    }

    #[test]
    fn large_values_stay_finite_in_log_space() {
        // rate * x far beyond exp() underflow
        let llr = experiment_llr(&[5_000.0], 1.0, 1.5);
        assert!(llr.is_finite());
        assert!((llr - (1.5f64.ln() - 2_500.0)).abs() < 1e-9);
    }
}
