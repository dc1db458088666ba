//! Data models

pub mod feature;
pub mod prediction;

pub use feature::*;
pub use prediction::*;
