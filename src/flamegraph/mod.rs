//! Flame graph construction from sampled profiles.
//!
//! This module wires the sample filters, stack resolver, stack processors
//! and tree aggregator into a single pass over a profile.

pub mod builder;

// Re-export main types
pub use builder::{aggregate_sample_weights, build_flame_graph, FlameGraphOptions};
