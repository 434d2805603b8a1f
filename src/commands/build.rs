//! Build command implementation.
//!
//! The build command:
//! 1. Reads each input profile
//! 2. Builds a flame graph per profile
//! 3. Merges the graphs
//! 4. Writes the tree JSON
//! 5. Optionally prints a summary

use crate::aggregator::{calculate_hot_paths, calculate_tree_stats, FlameNode};
use crate::flamegraph::{build_flame_graph, FlameGraphOptions};
use crate::output::write_tree;
use crate::profile::read_profile;
use crate::utils::config::DEFAULT_OUTPUT;
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::PathBuf;
use std::time::Instant;

/// Arguments for the build command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct BuildArgs {
    /// Input profiles (JSON)
    pub inputs: Vec<PathBuf>,

    /// Output path for the tree JSON
    pub output: PathBuf,

    /// Engine options
    pub options: FlameGraphOptions,

    /// Write JSON without indentation
    pub compact: bool,

    /// Print text summary to stdout
    pub print_summary: bool,

    /// Number of hot paths in the summary
    pub top_paths: usize,
}

impl Default for BuildArgs {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            options: FlameGraphOptions::default(),
            compact: false,
            print_summary: false,
            top_paths: 10,
        }
    }
}

/// Execute the build command
///
/// **Public** - main entry point called from main.rs
///
/// # Returns
/// The merged flame graph that was written
pub fn execute_build(args: &BuildArgs) -> Result<FlameNode> {
    let start_time = Instant::now();

    info!("Building flame graph from {} profile(s)", args.inputs.len());

    let tree = build_merged_tree(&args.inputs, &args.options)?;

    write_tree(&tree, &args.output, !args.compact).context("Failed to write flame graph JSON")?;
    info!("✓ Flame graph written to: {}", args.output.display());

    if args.print_summary {
        println!("{}", render_summary(&tree, args.top_paths));
    }

    let elapsed = start_time.elapsed();
    info!("Build completed in {:.2}s", elapsed.as_secs_f64());

    Ok(tree)
}

/// Build one tree per input and merge them in input order
fn build_merged_tree(inputs: &[PathBuf], options: &FlameGraphOptions) -> Result<FlameNode> {
    let mut merged: Option<FlameNode> = None;

    for input in inputs {
        let profile = read_profile(input)
            .with_context(|| format!("Failed to read profile {}", input.display()))?;

        let tree = build_flame_graph(&profile, options)
            .with_context(|| format!("Failed to build flame graph for {}", input.display()))?;

        debug!("{}: {} total weight", input.display(), tree.value);

        match merged.as_mut() {
            Some(merged) => merged.merge(tree),
            None => merged = Some(tree),
        }
    }

    Ok(merged.unwrap_or_default())
}

/// Human-readable statistics and hot paths
pub fn render_summary(tree: &FlameNode, top_paths: usize) -> String {
    let stats = calculate_tree_stats(tree);
    let mut lines = vec![
        "=".repeat(80),
        "FLAME GRAPH SUMMARY".to_string(),
        "=".repeat(80),
        stats.summary(),
        String::new(),
        format!("Top {} hot paths:", top_paths),
    ];

    for (i, path) in calculate_hot_paths(tree, top_paths).iter().enumerate() {
        lines.push(format!(
            "  {:>2}. {:>10} ({:>5.1}%)  {}",
            i + 1,
            path.value,
            path.percentage,
            path.stack
        ));
    }
    lines.push("=".repeat(80));

    lines.join("\n")
}

/// Validate build arguments
///
/// **Public** - can be called before execute_build for early validation
pub fn validate_args(args: &BuildArgs) -> Result<()> {
    if args.inputs.is_empty() {
        anyhow::bail!("At least one input profile is required");
    }

    if let Some(missing) = args.inputs.iter().find(|p| !p.exists()) {
        anyhow::bail!("Input profile not found: {}", missing.display());
    }

    if args.top_paths == 0 {
        anyhow::bail!("top_paths must be greater than 0");
    }

    args.options
        .validate()
        .context("Invalid flame graph options")?;

    Ok(())
}
