//! Aggregation of processed stacks into the flame graph tree.
//!
//! This module provides:
//! - The output tree (`FlameNode`) with sibling deduplication
//! - Tree merging for independently built graphs
//! - Hot path analysis and tree statistics

pub mod metrics;
pub mod tree;

// Re-export main types and functions
pub use metrics::{calculate_hot_paths, calculate_tree_stats, HotPath, TreeStats};
pub use tree::{FlameNode, NodeExtras};
