//! Numerically stable accumulation primitives.
//!
//! Log-likelihood sums over thousands of measurements mix terms of very
//! different magnitude. Naive left-to-right summation loses the low-order
//! bits of small terms once the running total grows; the compensated
//! accumulator here keeps a running error term so the final sum is accurate
//! to roughly one rounding of the exact result.

/// Neumaier (improved Kahan-Babuška) compensated summation.
///
/// The result depends only on the order of `add` calls, so repeated runs over
/// the same sequence are bit-identical.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NeumaierSum {
    sum: f64,
    compensation: f64,
}

impl NeumaierSum {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a term to the running sum.
    #[inline]
    pub fn add(&mut self, value: f64) {
        let t = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - t) + value;
        } else {
            self.compensation += (value - t) + self.sum;
        }
        self.sum = t;
    }

    /// Current compensated total.
    #[inline]
    pub fn total(&self) -> f64 {
        self.sum + self.compensation
    }
}

impl Extend<f64> for NeumaierSum {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for v in iter {
            self.add(v);
        }
    }
}
