//! CLI command implementations.

pub mod resynth;
pub mod synth;
