//! Error types for hypotest.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Remediation suggestions for humans
//!
//! Every error is terminal for the run in which it occurs: the sweep never
//! retries, substitutes data, or returns a partial curve.
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Insufficient Data
//!   Reason: insufficient data for h0.txt: need 50000 measurements, have 1200
//!   Fix: Generate a larger sample or lower --n-exp / --mpe.
//! ```
//!
//! # Machine-Facing Output
//!
//! ```json
//! {
//!   "code": 21,
//!   "category": "input",
//!   "message": "insufficient data for h0.txt: need 50000 measurements, have 1200",
//!   "context": { "needed": 50000, "have": 1200 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use thiserror::Error;

/// Result type alias for hypotest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Sweep or generator parameters out of range.
    Parameter,
    /// Configuration file errors.
    Config,
    /// Measurement data that cannot drive the analysis.
    Input,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Parameter => write!(f, "parameter"),
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Input => write!(f, "input"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for hypotest.
#[derive(Error, Debug)]
pub enum Error {
    // Parameter and configuration errors (10-19)
    #[error("invalid parameter {name}={value}: {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("configuration error: {0}")]
    Config(String),

    // Input errors (20-29)
    #[error("malformed input {source_name}: {reason}")]
    MalformedInput { source_name: String, reason: String },

    #[error("insufficient data for {context}: need {needed} {unit}, have {have}")]
    InsufficientData {
        context: String,
        unit: &'static str,
        needed: usize,
        have: usize,
    },

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build an [`Error::InvalidParameter`].
    pub fn invalid_parameter(
        name: impl Into<String>,
        value: impl Display,
        reason: impl Into<String>,
    ) -> Self {
        Error::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Build an [`Error::MalformedInput`].
    pub fn malformed(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedInput {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Build an [`Error::InsufficientData`] counted in measurements.
    pub fn insufficient_measurements(context: impl Into<String>, needed: usize, have: usize) -> Self {
        Error::InsufficientData {
            context: context.into(),
            unit: "measurements",
            needed,
            have,
        }
    }

    /// Build an [`Error::InsufficientData`] for an empty LLR distribution.
    pub fn empty_distribution(context: impl Into<String>) -> Self {
        Error::InsufficientData {
            context: context.into(),
            unit: "LLR values",
            needed: 1,
            have: 0,
        }
    }

    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Parameter and configuration errors
    /// - 20-29: Input data errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::InvalidParameter { .. } => 10,
            Error::Config(_) => 11,
            Error::MalformedInput { .. } => 20,
            Error::InsufficientData { .. } => 21,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidParameter { .. } => ErrorCategory::Parameter,
            Error::Config(_) => ErrorCategory::Config,
            Error::MalformedInput { .. } | Error::InsufficientData { .. } => ErrorCategory::Input,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::InvalidParameter { .. } => {
                "Pass positive integers for --n-exp, --mpe, --step and --jobs, and a positive rate."
            }
            Error::Config(_) => {
                "Check the sweep config file syntax (TOML or JSON) and field names."
            }
            Error::MalformedInput { .. } => {
                "Data files must start with 'rate: <positive number>' followed by non-negative measurements. Regenerate with 'hypotest generate'."
            }
            Error::InsufficientData { .. } => {
                "Generate a larger sample with 'hypotest generate --measures', or lower --n-exp / --mpe."
            }
            Error::Io(_) => "Check that the file exists, is readable, and that the output directory is writable.",
            Error::Json(_) => "Invalid JSON. Check syntax with 'jq .' or regenerate the file.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::InvalidParameter { .. } => "Invalid Parameter",
            Error::Config(_) => "Configuration Error",
            Error::MalformedInput { .. } => "Malformed Input",
            Error::InsufficientData { .. } => "Insufficient Data",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Error",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Remediation hint.
    pub remediation: String,

    /// Additional structured context (e.g., parameter name, counts).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::InvalidParameter { name, value, .. } => {
                context.insert("parameter".to_string(), serde_json::json!(name));
                context.insert("value".to_string(), serde_json::json!(value));
            }
            Error::MalformedInput { source_name, .. } => {
                context.insert("source".to_string(), serde_json::json!(source_name));
            }
            Error::InsufficientData { needed, have, .. } => {
                context.insert("needed".to_string(), serde_json::json!(needed));
                context.insert("have".to_string(), serde_json::json!(have));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            remediation: err.remediation().to_string(),
            context,
        }
    }
}

impl StructuredError {
    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }

    /// Serialize to pretty JSON string.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.to_json())
    }
}

/// Format an error for human-readable stderr output.
///
/// Output format:
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        red = red,
        cyan = cyan,
        reset = reset,
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}
