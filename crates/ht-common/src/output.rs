//! Output format specifications.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Supported output formats for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Full structured report as JSON (default for machine consumption)
    #[default]
    Json,

    /// One-line summary for quick checks
    Summary,

    /// Human-readable Markdown table
    Md,

    /// Curve points as CSV (m_thousands,alpha)
    Csv,

    /// ASCII chart of the significance curve
    Plot,
}

impl OutputFormat {
    /// Whether this format is meant for machines rather than people.
    pub fn is_machine(self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Csv)
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Summary => write!(f, "summary"),
            OutputFormat::Md => write!(f, "md"),
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Plot => write!(f, "plot"),
        }
    }
}
