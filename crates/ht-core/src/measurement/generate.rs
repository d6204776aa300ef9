//! Reproducible sample generation.
//!
//! Writes exponential inter-event times in the data file format read by
//! [`super::source`]. Variates come from a seeded ChaCha8 stream through the
//! inverse CDF, so the same `(rate, count, seed)` always yields the same file.

use std::io::{BufWriter, Write};
use std::path::Path;

use ht_common::{Error, Result};
use ht_math::exp_quantile;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::events::{event_names, Phase, ProgressEmitter, ProgressEvent};
use crate::logging::event_names as log_events;

use super::source::RATE_HEADER;

/// Default generator seed.
pub const DEFAULT_SEED: u64 = 314_159;

/// Validated generator parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerateParams {
    pub rate: f64,
    pub count: usize,
    pub seed: u64,
}

impl GenerateParams {
    /// Validate raw CLI values. A non-positive rate or count is rejected
    /// rather than replaced with a default.
    pub fn new(rate: f64, count: i64, seed: u64) -> Result<Self> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(Error::invalid_parameter(
                "rate",
                rate,
                "must be a positive finite number",
            ));
        }
        if count <= 0 {
            return Err(Error::invalid_parameter(
                "measures",
                count,
                "must be a positive integer",
            ));
        }
        let count = usize::try_from(count)
            .map_err(|_| Error::invalid_parameter("measures", count, "too large"))?;
        Ok(GenerateParams { rate, count, seed })
    }
}

/// Draw `params.count` exponential variates.
pub fn generate_samples(params: &GenerateParams) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
    (0..params.count)
        .map(|_| exp_quantile(rng.random::<f64>(), params.rate))
        .collect()
}

/// Stream a data file to `writer`, reporting progress every 10 %.
pub fn write_samples<W: Write>(
    writer: W,
    params: &GenerateParams,
    progress: Option<&dyn ProgressEmitter>,
) -> Result<()> {
    let mut out = BufWriter::new(writer);
    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
    let total = params.count as u64;

    writeln!(out, "{} {}", RATE_HEADER, params.rate)?;

    if let Some(emitter) = progress {
        emitter.emit(
            ProgressEvent::new(event_names::GENERATE_STARTED, Phase::Generate)
                .with_progress(0, Some(total))
                .with_detail("rate", params.rate)
                .with_detail("seed", params.seed),
        );
    }

    let mut next_decile = 1u64;
    for written in 1..=total {
        let value = exp_quantile(rng.random::<f64>(), params.rate);
        write!(out, "{} ", value)?;

        if written * 10 >= next_decile * total {
            let percent = written * 100 / total;
            tracing::info!(
                target: log_events::GENERATE_PROGRESS,
                percent,
                written,
                "{}% complete",
                percent
            );
            if let Some(emitter) = progress {
                emitter.emit(
                    ProgressEvent::new(event_names::GENERATE_PROGRESS, Phase::Generate)
                        .with_progress(written, Some(total))
                        .with_detail("percent", percent),
                );
            }
            while next_decile <= 10 && written * 10 >= next_decile * total {
                next_decile += 1;
            }
        }
    }

    out.flush()?;

    if let Some(emitter) = progress {
        emitter.emit(
            ProgressEvent::new(event_names::GENERATE_COMPLETE, Phase::Generate)
                .with_progress(total, Some(total)),
        );
    }
    Ok(())
}

/// Create (or truncate) `path` and write a data file to it.
pub fn write_sample_file(
    path: &Path,
    params: &GenerateParams,
    progress: Option<&dyn ProgressEmitter>,
) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_samples(file, params, progress)?;
    tracing::info!(
        target: log_events::GENERATE_FINISHED,
        path = %path.display(),
        count = params.count as u64,
        "wrote sample file"
    );
    Ok(())
}
