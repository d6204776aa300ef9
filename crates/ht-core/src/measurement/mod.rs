//! Measurement data for the two hypotheses.
//!
//! A [`Hypothesis`] is loaded once from a data file (see [`source`]) and is
//! immutable afterwards; sweep workers only ever borrow it. The
//! [`generate`] submodule writes files in the same format.

pub mod generate;
pub mod source;

pub use generate::{generate_samples, write_sample_file, write_samples, GenerateParams};
pub use source::{load_hypothesis, parse_measurements};

use serde::Serialize;

/// One hypothesis: its true rate and the inter-event times drawn from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Hypothesis {
    /// 0 for the null hypothesis, 1 for the alternative.
    pub index: usize,
    /// Rate parameter (events per second) used to generate the data.
    pub rate: f64,
    /// Non-negative inter-event times, in file order.
    pub measurements: Vec<f64>,
    /// Where the data came from (file path, or a label for in-memory data).
    pub source: String,
    /// SHA-256 of the raw file bytes, when loaded from disk.
    pub sha256: Option<String>,
}

impl Hypothesis {
    /// Build a hypothesis from in-memory data.
    pub fn from_parts(index: usize, rate: f64, measurements: Vec<f64>) -> Self {
        Hypothesis {
            index,
            rate,
            measurements,
            source: format!("hypothesis {}", index),
            sha256: None,
        }
    }

    /// Number of measurements held.
    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    /// Provenance summary for reports.
    pub fn input_info(&self) -> InputInfo {
        InputInfo {
            hypothesis: self.index,
            source: self.source.clone(),
            rate: self.rate,
            measurements: self.measurements.len(),
            sha256: self.sha256.clone(),
        }
    }
}

/// The null and alternative hypotheses, always in that order.
#[derive(Debug, Clone, PartialEq)]
pub struct HypothesisPair {
    pub h0: Hypothesis,
    pub h1: Hypothesis,
}

impl HypothesisPair {
    pub fn new(h0: Hypothesis, h1: Hypothesis) -> Self {
        HypothesisPair { h0, h1 }
    }

    /// `(rate[0], rate[1])`.
    pub fn rates(&self) -> (f64, f64) {
        (self.h0.rate, self.h1.rate)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hypothesis> {
        [&self.h0, &self.h1].into_iter()
    }
}

/// Input provenance echoed in the sweep report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputInfo {
    pub hypothesis: usize,
    pub source: String,
    pub rate: f64,
    pub measurements: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}
