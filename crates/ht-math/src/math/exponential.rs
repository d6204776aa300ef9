//! Exponential distribution utilities for inter-event time models.
//!
//! Uses **rate parameterization**: `Exp(λ)` with density
//! `f(x) = λ e^(-λx)` for `x ≥ 0`.
//!
//! All densities are evaluated in log space (`ln λ − λx`). Forming
//! `λ e^(-λx)` first underflows to zero once `λx` exceeds roughly 745, after
//! which the logarithm is `-inf` and every sum containing it is lost.

/// Log of the exponential PDF at `x`.
///
/// # Returns
/// * `ln λ − λx` for `x ≥ 0`
/// * `-inf` for `x < 0` (outside the support)
/// * NaN for NaN inputs or a non-positive rate
#[inline]
pub fn exp_log_pdf(x: f64, rate: f64) -> f64 {
    if x.is_nan() || rate.is_nan() {
        return f64::NAN;
    }
    if rate <= 0.0 {
        return f64::NAN;
    }
    if x < 0.0 {
        return f64::NEG_INFINITY;
    }
    rate.ln() - rate * x
}

/// Per-measurement log-likelihood ratio `ln f(x | λ₁) − ln f(x | λ₀)`.
#[inline]
pub fn exp_log_likelihood_ratio(x: f64, rate_num: f64, rate_den: f64) -> f64 {
    exp_log_pdf(x, rate_num) - exp_log_pdf(x, rate_den)
}

/// Inverse CDF (quantile) of the exponential distribution.
///
/// `p` must lie in `[0, 1)`; `p = 1` maps to `+inf`. Uses `ln_1p` so small
/// probabilities keep full precision.
pub fn exp_quantile(p: f64, rate: f64) -> f64 {
    if p.is_nan() || rate.is_nan() || rate <= 0.0 || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }
    -(-p).ln_1p() / rate
}
