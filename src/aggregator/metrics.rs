//! Summary statistics and hot paths over a built flame graph.
//!
//! Hot paths are the root-to-node call paths holding the most self weight.
//! These are the primary targets for optimization.

use super::tree::FlameNode;
use log::debug;
use serde::{Deserialize, Serialize};

/// A call path with the weight spent in its last frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotPath {
    /// Frames joined with `;`, root excluded (e.g. "main;handle;parse")
    pub stack: String,

    /// Self weight of the last frame
    pub value: f64,

    /// Percentage of the root's total weight
    pub percentage: f64,
}

/// Calculate hot paths from a flame graph
///
/// **Public** - main entry point for metrics calculation
///
/// # Arguments
/// * `root` - Tree returned by the flame graph builder
/// * `top_n` - Number of top paths to return (e.g., 10)
///
/// # Returns
/// Vector of hot paths, sorted by self weight (descending)
pub fn calculate_hot_paths(root: &FlameNode, top_n: usize) -> Vec<HotPath> {
    let mut paths = Vec::new();
    let mut frames = Vec::new();
    collect_paths(root, &mut frames, &mut paths);

    debug!("Ranking {} call paths, keeping {}", paths.len(), top_n);

    paths.sort_by(|a, b| b.1.total_cmp(&a.1));
    paths
        .into_iter()
        .take(top_n)
        .map(|(stack, value)| HotPath {
            stack,
            value,
            percentage: percentage(value, root.value),
        })
        .collect()
}

fn collect_paths<'a>(node: &'a FlameNode, frames: &mut Vec<&'a str>, out: &mut Vec<(String, f64)>) {
    let self_value = node.self_value();
    if self_value > 0.0 && !frames.is_empty() {
        out.push((frames.join(";"), self_value));
    }
    for child in &node.children {
        frames.push(child.name.as_str());
        collect_paths(child, frames, out);
        frames.pop();
    }
}

fn percentage(value: f64, total: f64) -> f64 {
    if total > 0.0 {
        (value / total) * 100.0
    } else {
        0.0
    }
}

/// Shape statistics of a flame graph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeStats {
    /// Weight held by the root
    pub total_value: f64,

    /// Nodes below the root
    pub node_count: usize,

    /// Nodes without children, root excluded
    pub leaf_count: usize,

    /// Longest root-to-leaf path, in frames
    pub max_depth: usize,

    /// Weight credited to the root itself (fully skipped stacks)
    pub root_self_value: f64,
}

/// Calculate tree statistics
///
/// **Public** - provides summary statistics
pub fn calculate_tree_stats(root: &FlameNode) -> TreeStats {
    let mut stats = TreeStats {
        total_value: root.value,
        root_self_value: root.self_value(),
        ..Default::default()
    };

    let mut pending: Vec<(&FlameNode, usize)> = root.children.iter().map(|c| (c, 1)).collect();
    while let Some((node, depth)) = pending.pop() {
        stats.node_count += 1;
        stats.max_depth = stats.max_depth.max(depth);
        if node.children.is_empty() {
            stats.leaf_count += 1;
        }
        pending.extend(node.children.iter().map(|c| (c, depth + 1)));
    }

    stats
}

impl TreeStats {
    /// Get human-readable summary
    ///
    /// **Public** - for logging and debugging
    pub fn summary(&self) -> String {
        format!(
            "Total: {} | Nodes: {} | Leaves: {} | Depth: {} | Unattributed: {}",
            self.total_value, self.node_count, self.leaf_count, self.max_depth, self.root_self_value
        )
    }
}
