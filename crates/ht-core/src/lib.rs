//! Hypotest Core Library
//!
//! This library provides the significance-sweep engine for a binary
//! hypothesis test between two exponential-rate processes:
//! - Measurement loading and sample generation
//! - Log-likelihood-ratio distributions per hypothesis
//! - Equal-error (alpha = beta) critical-value search
//! - Sweeps over measurements per experiment, and report rendering
//!
//! The binary entry point is in `main.rs`.

pub mod config;
pub mod events;
pub mod exit_codes;
pub mod logging;
pub mod measurement;
pub mod report;
pub mod sweep;

pub use measurement::{Hypothesis, HypothesisPair};
pub use sweep::{run_sweep, CurvePoint, SignificanceCurve, SweepParams};
