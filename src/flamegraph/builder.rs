//! Flame graph construction.
//!
//! One pass over the sample sequence: filter, pre-aggregate weights per
//! sampled node, resolve each node's stack once and hand it to the stack
//! processor.

use crate::aggregator::FlameNode;
use crate::filter::{SampleFilter, SampleFilterChain};
use crate::processor::{ProcessorOptions, StackProcessorKind};
use crate::profile::Profile;
use crate::resolver::StackResolver;
use crate::utils::config::HAS_VALUES;
use crate::utils::error::FlameGraphError;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Flame graph options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlameGraphOptions {
    /// Leaf-first stacks (icicle graph)
    pub inverted: bool,

    /// Build the tree from `/`-separated package names instead of stacks
    pub package_name: bool,

    /// Weight samples by `samples_value` instead of counting them
    pub use_sample_value: bool,

    pub cpu: Option<u32>,
    pub pid: Option<u32>,
    pub tid: Option<u32>,

    /// Time window relative to the profile start, in profile time units
    pub range_start: Option<f64>,
    pub range_end: Option<f64>,

    pub ignore_libtype: bool,

    pub middle_out: Option<String>,

    pub stack_processor: StackProcessorKind,

    /// Display names for a node's own frame, keyed by pid
    pub pid_names: HashMap<u32, String>,
}

impl FlameGraphOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stack_processor(mut self, kind: StackProcessorKind) -> Self {
        self.stack_processor = kind;
        self
    }

    pub fn with_range(mut self, range_start: f64, range_end: f64) -> Self {
        self.range_start = Some(range_start);
        self.range_end = Some(range_end);
        self
    }

    pub fn with_middle_out(mut self, target: impl Into<String>) -> Self {
        self.middle_out = Some(target.into());
        self
    }

    /// Reject option combinations no processor can honour
    pub fn validate(&self) -> Result<(), FlameGraphError> {
        if self.package_name && self.stack_processor != StackProcessorKind::Default {
            return Err(FlameGraphError::UnsupportedConfiguration(format!(
                "package_name stacks cannot be processed by the {} stack processor",
                self.stack_processor
            )));
        }
        if let (Some(start), Some(end)) = (self.range_start, self.range_end) {
            if start > end {
                return Err(FlameGraphError::UnsupportedConfiguration(format!(
                    "range_start {} is after range_end {}",
                    start, end
                )));
            }
        }
        Ok(())
    }

    pub fn processor_options(&self) -> ProcessorOptions {
        ProcessorOptions {
            ignore_libtype: self.ignore_libtype,
            middle_out: self.middle_out.clone(),
        }
    }
}

/// Build a flame graph from a profile
///
/// **Public** - main entry point of the engine
///
/// # Errors
/// * `FlameGraphError::UnsupportedConfiguration` - incompatible options
/// * `FlameGraphError::MalformedProfile` - the profile is inconsistent; no
///   partial tree is returned
pub fn build_flame_graph(
    profile: &Profile,
    options: &FlameGraphOptions,
) -> Result<FlameNode, FlameGraphError> {
    options.validate()?;
    profile.validate()?;

    let weights = aggregate_sample_weights(profile, options);
    debug!("{} distinct sampled nodes after filtering", weights.len());

    let resolver = StackResolver::new(profile, options.package_name, options.inverted)?
        .with_pid_names(&options.pid_names);
    let processor = options.stack_processor.build(options.processor_options());

    let mut root = FlameNode::root();
    for (node_id, weight) in weights {
        let stack = resolver.resolve(node_id)?;
        processor.process(&mut root, &stack, weight);
    }

    info!(
        "Built flame graph with {} stack processor ({} total weight)",
        options.stack_processor, root.value
    );
    Ok(root)
}

/// Sum the weight of included samples per node id, in first-appearance order.
///
/// The final sample has no trailing time delta and is never included.
pub fn aggregate_sample_weights(profile: &Profile, options: &FlameGraphOptions) -> Vec<(u64, f64)> {
    let filters = SampleFilterChain::from_options(profile, options);

    let values = if options.use_sample_value && profile.has_capability(HAS_VALUES) {
        profile.samples_value.as_deref()
    } else {
        None
    };
    if options.use_sample_value && values.is_none() {
        warn!("Profile has no sample values, counting samples instead");
    }

    let mut weights: Vec<(u64, f64)> = Vec::new();
    let mut positions: HashMap<u64, usize> = HashMap::new();
    let mut current_time = profile.start_time + profile.time_deltas.first().copied().unwrap_or(0.0);

    let included = profile.samples.len().saturating_sub(1);
    for (index, &sample) in profile.samples.iter().enumerate().take(included) {
        current_time += profile.time_deltas.get(index + 1).copied().unwrap_or(0.0);

        if filters.should_skip(sample, index, current_time) {
            continue;
        }

        let weight = values
            .and_then(|values| values.get(index).copied())
            .unwrap_or(1.0);

        match positions.entry(sample) {
            Entry::Occupied(entry) => weights[*entry.get()].1 += weight,
            Entry::Vacant(entry) => {
                entry.insert(weights.len());
                weights.push((sample, weight));
            }
        }
    }

    weights
}
