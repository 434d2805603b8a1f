//! flametree
//!
//! Flame graph construction from sampled CPU profiles.
//!
//! A profile (stack samples with timestamps and optional per-sample
//! metadata) goes through sample filters, stack resolution and a
//! runtime-specific stack processor before being folded into a
//! deduplicated, weighted call tree.
//!
//! ```ignore
//! let profile = flametree::profile::read_profile("app.json")?;
//! let options = FlameGraphOptions::new().with_stack_processor(StackProcessorKind::NodeJs);
//! let tree = flametree::flamegraph::build_flame_graph(&profile, &options)?;
//! ```

pub mod aggregator;
pub mod commands;
pub mod filter;
pub mod flamegraph;
pub mod output;
pub mod processor;
pub mod profile;
pub mod resolver;
pub mod utils;
