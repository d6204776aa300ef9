//! Structured event definitions for logging.
//!
//! Events carry a correlation ID (`run_id`) and the pipeline stage that
//! emitted them, so JSONL output can be grouped per invocation.

use serde::{Deserialize, Serialize};

/// Log levels for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Processing stages in the hypotest pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Reading measurement files.
    Load,
    /// Building LLR distributions.
    Build,
    /// Equal-error threshold search.
    Search,
    /// Sweep over measurements per experiment.
    Sweep,
    /// Report rendering.
    Render,
    /// Sample generation.
    Generate,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Load => "load",
            Stage::Build => "build",
            Stage::Search => "search",
            Stage::Sweep => "sweep",
            Stage::Render => "render",
            Stage::Generate => "generate",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used as tracing targets.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";
    pub const RUN_FAILED: &str = "run.failed";

    // Config
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";

    // Load stage
    pub const LOAD_HYPOTHESIS: &str = "load.hypothesis_loaded";

    // Sweep stage
    pub const SWEEP_STARTED: &str = "sweep.started";
    pub const SWEEP_STEP_DONE: &str = "sweep.step_done";
    pub const LLR_BUILT: &str = "build.llr_distributions";
    pub const CRITICAL_FOUND: &str = "search.critical_value";
    pub const SWEEP_FINISHED: &str = "sweep.finished";

    // Generate stage
    pub const GENERATE_PROGRESS: &str = "generate.progress";
    pub const GENERATE_FINISHED: &str = "generate.finished";
}

/// Context for emitting log events with a consistent run ID.
#[derive(Debug, Clone)]
pub struct LogContext {
    /// Unique ID for this invocation.
    pub run_id: String,
}

impl LogContext {
    /// Create a new log context.
    pub fn new(run_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
        }
    }
}
