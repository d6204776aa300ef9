//! Hypotest math utilities.

pub mod math;

pub use math::exponential::*;
pub use math::normal::*;
pub use math::stable::*;
