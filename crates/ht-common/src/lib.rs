//! Hypotest common types and errors.
//!
//! This crate provides foundational types shared across ht-core modules:
//! - Common error types with stable codes
//! - Output format specifications

pub mod error;
pub mod output;

pub use error::{Error, ErrorCategory, Result, StructuredError};
pub use output::OutputFormat;
