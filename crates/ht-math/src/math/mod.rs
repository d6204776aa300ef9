//! Core math modules.

pub mod exponential;
pub mod normal;
pub mod stable;
