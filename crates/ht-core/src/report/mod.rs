//! Sweep reports.
//!
//! A [`SweepReport`] bundles the significance curve with everything needed to
//! reproduce or interpret it: parameters, rates, input digests, timing and
//! the sigma crossings (first `M` at which alpha falls below the two-sided
//! normal tail for 1σ, 2σ, ...). Rendering lives in [`render`].

pub mod render;

pub use render::{
    render_csv, render_json, render_markdown, render_plot, render_report, render_summary,
    PlotOptions,
};

use chrono::{DateTime, Utc};
use ht_math::two_sided_tail;
use serde::Serialize;
use std::path::PathBuf;

use crate::measurement::{HypothesisPair, InputInfo};
use crate::sweep::{CurvePoint, SignificanceCurve, SweepParams};

/// Report schema version.
pub const REPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Highest sigma level checked for crossings.
pub const MAX_SIGMA: u32 = 7;

/// First curve point below a sigma level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SigmaCrossing {
    /// Sigma multiple `k`.
    pub sigma: u32,
    /// Two-sided tail probability `1 − erf(k/√2)`.
    pub level: f64,
    /// Measurements per experiment at the crossing.
    pub m: usize,
    /// Alpha at the crossing.
    pub alpha: f64,
}

/// Sigma crossings for `k = 1..=max_sigma`, stopping at the first level the
/// curve never reaches.
pub fn sigma_crossings(curve: &SignificanceCurve, max_sigma: u32) -> Vec<SigmaCrossing> {
    let mut crossings = Vec::new();
    for k in 1..=max_sigma {
        let level = two_sided_tail(f64::from(k));
        match curve.first_below(level) {
            Some(point) => crossings.push(SigmaCrossing {
                sigma: k,
                level,
                m: point.m,
                alpha: point.alpha,
            }),
            None => break,
        }
    }
    crossings
}

/// Config file provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigProvenance {
    pub path: PathBuf,
    pub sha256: String,
}

/// Complete result of one sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub schema_version: String,
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub title: String,
    /// `[rate0, rate1]`.
    pub rates: [f64; 2],
    pub params: SweepParams,
    pub inputs: Vec<InputInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<ConfigProvenance>,
    pub points: Vec<CurvePoint>,
    /// `(M/1000, alpha)` pairs, ascending in the first coordinate.
    pub renderer_points: Vec<(f64, f64)>,
    pub sigma_crossings: Vec<SigmaCrossing>,
    pub elapsed_ms: u64,
}

impl SweepReport {
    pub fn new(
        run_id: impl Into<String>,
        params: &SweepParams,
        pair: &HypothesisPair,
        curve: &SignificanceCurve,
        elapsed_ms: u64,
    ) -> Self {
        let (rate0, rate1) = pair.rates();
        SweepReport {
            schema_version: REPORT_SCHEMA_VERSION.to_string(),
            run_id: run_id.into(),
            generated_at: Utc::now(),
            title: report_title(params.n_exp, rate0, rate1),
            rates: [rate0, rate1],
            params: *params,
            inputs: pair.iter().map(|h| h.input_info()).collect(),
            config: None,
            points: curve.points.clone(),
            renderer_points: curve.renderer_points(),
            sigma_crossings: sigma_crossings(curve, MAX_SIGMA),
            elapsed_ms,
        }
    }

    pub fn with_config(mut self, path: PathBuf, sha256: String) -> Self {
        self.config = Some(ConfigProvenance { path, sha256 });
        self
    }

    /// Final point of the curve, if any.
    pub fn last_point(&self) -> Option<&CurvePoint> {
        self.points.last()
    }
}

/// Chart title: `"<Nexp> experiments per test with rates <r0>, <r1> events / second"`.
pub fn report_title(n_exp: usize, rate0: f64, rate1: f64) -> String {
    format!(
        "{} experiments per test with rates {}, {} events / second",
        n_exp, rate0, rate1
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::Hypothesis;

    fn curve(alphas: &[f64]) -> SignificanceCurve {
        SignificanceCurve {
            points: alphas
                .iter()
                .enumerate()
                .map(|(i, &alpha)| CurvePoint {
                    m: 1 + 2 * i,
                    alpha,
                    threshold: 0.0,
                })
                .collect(),
        }
    }

    #[test]
    fn title_format() {
        assert_eq!(
            report_title(1000, 1.0, 1.5),
            "1000 experiments per test with rates 1, 1.5 events / second"
        );
    }

    #[test]
    fn crossings_stop_at_first_unreached_level() {
        // 1σ ≈ 0.3173, 2σ ≈ 0.0455, 3σ ≈ 0.0027
        let c = curve(&[0.45, 0.30, 0.10, 0.04, 0.01]);
        let crossings = sigma_crossings(&c, MAX_SIGMA);
        assert_eq!(crossings.len(), 2);
        assert_eq!(crossings[0].sigma, 1);
        assert_eq!(crossings[0].m, 3);
        assert_eq!(crossings[1].sigma, 2);
        assert_eq!(crossings[1].m, 7);
        assert!((crossings[1].level - 0.0455).abs() < 1e-3);
    }

    #[test]
    fn crossings_can_share_a_point() {
        let c = curve(&[0.5, 0.0]);
        let crossings = sigma_crossings(&c, MAX_SIGMA);
        assert_eq!(crossings.len(), 7);
        assert!(crossings.iter().all(|x| x.m == 3));
    }

    #[test]
    fn empty_curve_has_no_crossings() {
        assert!(sigma_crossings(&SignificanceCurve::default(), MAX_SIGMA).is_empty());
    }

    #[test]
    fn report_collects_inputs_and_renderer_points() {
        let pair = HypothesisPair::new(
            Hypothesis::from_parts(0, 1.0, vec![0.0; 4]),
            Hypothesis::from_parts(1, 2.0, vec![0.0; 4]),
        );
        let params = SweepParams::new(2, 2, 1).unwrap();
        let report = SweepReport::new("run-test", &params, &pair, &curve(&[0.5]), 3)
            .with_config(PathBuf::from("sweep.toml"), "ab".repeat(32));

        assert_eq!(report.rates, [1.0, 2.0]);
        assert_eq!(report.inputs.len(), 2);
        assert_eq!(report.renderer_points, vec![(0.001, 0.5)]);
        assert_eq!(report.last_point().map(|p| p.m), Some(1));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["params"]["n_exp"], 2);
        assert_eq!(json["renderer_points"][0][1], 0.5);
        assert_eq!(json["config"]["path"], "sweep.toml");
    }
}
