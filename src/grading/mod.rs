//! Per-student grade reduction.
//!
//! Merged question mappings are folded into one total and one composite
//! comment, then turned into the roster's grade field according to the
//! selected normalization.

pub mod aggregate;
pub mod format;
pub mod normalize;

pub use aggregate::{aggregate, finalize};
pub use normalize::Normalization;
