//! Profile validation command.

use crate::flamegraph::{build_flame_graph, FlameGraphOptions};
use crate::profile::read_profile;
use crate::resolver::ResolveStrategy;
use crate::utils::config::{
    HAS_NODE_STACK, HAS_PARENT, HAS_SAMPLES_CPU, HAS_SAMPLES_PID, HAS_SAMPLES_TID, HAS_VALUES,
};
use anyhow::{Context, Result};
use std::path::Path;

const CAPABILITIES: &[&str] = &[
    HAS_NODE_STACK,
    HAS_PARENT,
    HAS_SAMPLES_CPU,
    HAS_SAMPLES_PID,
    HAS_SAMPLES_TID,
    HAS_VALUES,
];

/// Validate a profile file and describe what it contains.
///
/// Every sampled stack is resolved once, so dangling ids and parent cycles
/// are reported here rather than at build time.
pub fn validate_profile_file(file_path: &Path) -> Result<String> {
    let profile = read_profile(file_path)
        .with_context(|| format!("Failed to read profile {}", file_path.display()))?;

    let tree = build_flame_graph(&profile, &FlameGraphOptions::default())
        .context("Profile stacks cannot be resolved")?;

    let mut lines = vec![
        format!("✓ Valid profile: {}", file_path.display()),
        format!("  Nodes: {}", profile.nodes.len()),
        format!("  Samples: {}", profile.samples.len()),
        format!("  Time span: {} .. {}", profile.start_time, profile.end_time),
        format!("  Stack strategy: {:?}", ResolveStrategy::select(&profile, false)),
        format!("  Total weight: {}", tree.value),
    ];

    let enabled: Vec<&str> = CAPABILITIES
        .iter()
        .copied()
        .filter(|flag| profile.has_capability(flag))
        .collect();
    lines.push(format!(
        "  Capabilities: {}",
        if enabled.is_empty() { "none".to_string() } else { enabled.join(", ") }
    ));

    Ok(lines.join("\n"))
}
