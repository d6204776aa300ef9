//! Significance sweep over measurements per experiment.
//!
//! For every `M` in `1, 1+step, 1+2·step, .. < mpe` the sweep builds both LLR
//! distributions ([`llr`]) and runs the equal-error search ([`critical`]),
//! producing one [`CurvePoint`]. Steps are independent. With `jobs > 1` they
//! are spread over scoped worker threads that only borrow the immutable
//! hypotheses; results are re-ordered by `M` afterwards, so the curve is
//! bit-identical whatever the job count.
//!
//! Any failing step aborts the sweep. No partial curve is ever returned.

pub mod critical;
pub mod llr;

pub use critical::{equal_error_alpha, find_critical_value, CriticalValue};
pub use llr::{build_distribution, build_llr_pair, experiment_llr, LlrDistribution};

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use ht_common::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::events::{event_names, Phase, ProgressEmitter, ProgressEvent};
use crate::logging::event_names as log_events;
use crate::logging::Stage;
use crate::measurement::HypothesisPair;

/// Validated sweep parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepParams {
    /// Experiments per test (`Nexp`).
    pub n_exp: usize,
    /// Exclusive upper bound on measurements per experiment.
    pub mpe: usize,
    /// Increment between successive measurement counts.
    pub step: usize,
    /// Worker threads; 1 runs the steps sequentially.
    pub jobs: usize,
}

impl SweepParams {
    /// Sequential sweep parameters.
    pub fn new(n_exp: usize, mpe: usize, step: usize) -> Result<Self> {
        let params = SweepParams {
            n_exp,
            mpe,
            step,
            jobs: 1,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn with_jobs(mut self, jobs: usize) -> Result<Self> {
        self.jobs = jobs;
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("n_exp", self.n_exp),
            ("mpe", self.mpe),
            ("step", self.step),
            ("jobs", self.jobs),
        ] {
            if value == 0 {
                return Err(Error::invalid_parameter(
                    name,
                    value,
                    "must be a positive integer",
                ));
            }
        }
        self.required_measurements().map(|_| ())
    }

    /// Measurement counts visited by the sweep, ascending. Empty when `mpe == 1`.
    ///
    /// `step` must already be validated as positive.
    pub fn measurement_counts(&self) -> Vec<usize> {
        (1..self.mpe).step_by(self.step).collect()
    }

    /// Number of sweep steps.
    pub fn step_count(&self) -> usize {
        self.measurement_counts().len()
    }

    /// Measurements each hypothesis must provide: `n_exp * mpe`.
    pub fn required_measurements(&self) -> Result<usize> {
        self.n_exp.checked_mul(self.mpe).ok_or_else(|| {
            Error::invalid_parameter(
                "n_exp",
                self.n_exp,
                format!("n_exp * mpe overflows (mpe = {})", self.mpe),
            )
        })
    }
}

/// One point of the significance curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Measurements per experiment.
    pub m: usize,
    /// Equal-error significance level, in `[0, 1]`.
    pub alpha: f64,
    /// LLR threshold chosen at this step.
    pub threshold: f64,
}

impl CurvePoint {
    /// `M / 1000`, the renderer's x coordinate.
    pub fn m_thousands(&self) -> f64 {
        self.m as f64 / 1000.0
    }
}

/// Curve points ordered by increasing `M`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignificanceCurve {
    pub points: Vec<CurvePoint>,
}

impl SignificanceCurve {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// `(M/1000, alpha)` pairs for the renderer.
    pub fn renderer_points(&self) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .map(|p| (p.m_thousands(), p.alpha))
            .collect()
    }

    /// First point (smallest `M`) whose alpha is strictly below `level`.
    pub fn first_below(&self, level: f64) -> Option<&CurvePoint> {
        self.points.iter().find(|p| p.alpha < level)
    }
}

/// Compute a single sweep step.
pub fn compute_point(pair: &HypothesisPair, m: usize, n_exp: usize) -> Result<CurvePoint> {
    let (d0, d1) = build_llr_pair(pair, m, n_exp)?;
    tracing::debug!(
        target: log_events::LLR_BUILT,
        stage = %Stage::Build,
        m = m as u64,
        n0 = d0.len() as u64,
        n1 = d1.len() as u64,
        "Built LLR distributions"
    );
    let cv = find_critical_value(d0.values(), d1.values())?;
    tracing::debug!(
        target: log_events::CRITICAL_FOUND,
        stage = %Stage::Search,
        m = m as u64,
        split = cv.split as u64,
        imbalance = cv.imbalance as u64,
        alpha = cv.alpha,
        "Found equal-error threshold"
    );
    Ok(CurvePoint {
        m,
        alpha: cv.alpha,
        threshold: cv.threshold,
    })
}

/// Run the full sweep.
///
/// Both hypotheses are checked for `n_exp * mpe` measurements before any
/// LLR is computed.
pub fn run_sweep(
    params: &SweepParams,
    pair: &HypothesisPair,
    progress: Option<&dyn ProgressEmitter>,
) -> Result<SignificanceCurve> {
    params.validate()?;
    let required = params.required_measurements()?;
    for hypothesis in pair.iter() {
        if hypothesis.len() < required {
            return Err(Error::insufficient_measurements(
                &hypothesis.source,
                required,
                hypothesis.len(),
            ));
        }
    }

    let counts = params.measurement_counts();
    let total = counts.len();
    let started = Instant::now();

    tracing::info!(
        target: log_events::SWEEP_STARTED,
        steps = total as u64,
        n_exp = params.n_exp as u64,
        jobs = params.jobs as u64,
        "Analyzing data"
    );
    if let Some(emitter) = progress {
        emitter.emit(
            ProgressEvent::new(event_names::SWEEP_STARTED, Phase::Sweep)
                .with_progress(0, Some(total as u64))
                .with_detail("n_exp", params.n_exp)
                .with_detail("mpe", params.mpe)
                .with_detail("step", params.step),
        );
    }

    let reporter = StepReporter {
        total,
        completed: AtomicUsize::new(0),
        progress,
    };

    let points = if params.jobs <= 1 || total <= 1 {
        let mut points = Vec::with_capacity(total);
        for &m in &counts {
            let point = compute_point(pair, m, params.n_exp)?;
            reporter.step_done(&point);
            points.push(point);
        }
        points
    } else {
        run_parallel(&counts, params, pair, &reporter)?
    };

    let elapsed_ms = started.elapsed().as_millis() as u64;
    tracing::info!(
        target: log_events::SWEEP_FINISHED,
        points = points.len() as u64,
        elapsed_ms,
        "sweep complete"
    );
    if let Some(emitter) = progress {
        emitter.emit(
            ProgressEvent::new(event_names::SWEEP_COMPLETE, Phase::Sweep)
                .with_progress(total as u64, Some(total as u64))
                .with_elapsed_ms(elapsed_ms),
        );
    }

    Ok(SignificanceCurve { points })
}

/// Per-step logging and progress, shared by all workers.
struct StepReporter<'a> {
    total: usize,
    completed: AtomicUsize,
    progress: Option<&'a dyn ProgressEmitter>,
}

impl StepReporter<'_> {
    fn step_done(&self, point: &CurvePoint) {
        let done = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(
            target: log_events::SWEEP_STEP_DONE,
            m = point.m as u64,
            alpha = point.alpha,
            "Step {} of {} complete",
            done,
            self.total
        );
        if let Some(emitter) = self.progress {
            emitter.emit(
                ProgressEvent::new(event_names::SWEEP_STEP_COMPLETE, Phase::Sweep)
                    .with_progress(done as u64, Some(self.total as u64))
                    .with_detail("m", point.m)
                    .with_detail("alpha", point.alpha),
            );
        }
    }
}

fn run_parallel(
    counts: &[usize],
    params: &SweepParams,
    pair: &HypothesisPair,
    reporter: &StepReporter<'_>,
) -> Result<Vec<CurvePoint>> {
    let workers = params.jobs.min(counts.len());
    let next = AtomicUsize::new(0);
    let abort = AtomicBool::new(false);
    let parent = tracing::Span::current();

    let outcomes: Vec<std::result::Result<Vec<(usize, CurvePoint)>, (usize, Error)>> =
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    let parent = parent.clone();
                    let next = &next;
                    let abort = &abort;
                    scope.spawn(move || {
                        let _entered = parent.enter();
                        let mut local = Vec::new();
                        loop {
                            if abort.load(Ordering::Relaxed) {
                                break;
                            }
                            let index = next.fetch_add(1, Ordering::Relaxed);
                            let Some(&m) = counts.get(index) else {
                                break;
                            };
                            match compute_point(pair, m, params.n_exp) {
                                Ok(point) => {
                                    reporter.step_done(&point);
                                    local.push((index, point));
                                }
                                Err(err) => {
                                    abort.store(true, Ordering::Relaxed);
                                    return Err((index, err));
                                }
                            }
                        }
                        Ok(local)
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(outcome) => outcome,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        });

    let mut indexed = Vec::with_capacity(counts.len());
    let mut first_error: Option<(usize, Error)> = None;
    for outcome in outcomes {
        match outcome {
            Ok(local) => indexed.extend(local),
            Err((index, err)) => {
                if first_error.as_ref().is_none_or(|(seen, _)| index < *seen) {
                    first_error = Some((index, err));
                }
            }
        }
    }
    if let Some((_, err)) = first_error {
        return Err(err);
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, point)| point).collect())
}
