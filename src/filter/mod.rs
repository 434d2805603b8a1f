//! Per-sample inclusion filters.
//!
//! A sample is dropped as soon as any filter in the chain asks for it to be
//! skipped. Filters whose inputs are missing are inert rather than errors,
//! so older profiles without per-sample metadata still build.

pub mod range;
pub mod tag;

pub use range::RangeSampleFilter;
pub use tag::{SampleTag, TagSampleFilter};

use crate::flamegraph::FlameGraphOptions;
use crate::profile::Profile;
use log::debug;

/// Decides whether a single sample takes part in the flame graph
pub trait SampleFilter {
    /// `sample` is the node id, `index` its position in the sample sequence
    fn should_skip(&self, sample: u64, index: usize, current_time: f64) -> bool;
}

/// Short-circuiting OR over a list of filters
pub struct SampleFilterChain<'a> {
    filters: Vec<Box<dyn SampleFilter + 'a>>,
}

impl<'a> SampleFilterChain<'a> {
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Build the chain requested by `options` for `profile`.
    ///
    /// Tag filters are only installed when the profile advertises the
    /// matching per-sample array and a target was requested.
    pub fn from_options(profile: &'a Profile, options: &FlameGraphOptions) -> Self {
        let mut chain = Self::new();
        chain.push(RangeSampleFilter::new(
            profile,
            options.range_start,
            options.range_end,
        ));

        let targets = [
            (SampleTag::Cpu, options.cpu),
            (SampleTag::Pid, options.pid),
            (SampleTag::Tid, options.tid),
        ];
        for (tag, target) in targets {
            if let Some(target) = target {
                if profile.has_capability(tag.capability()) {
                    chain.push(TagSampleFilter::new(profile, tag, target));
                } else {
                    debug!(
                        "Ignoring {:?} filter: profile lacks {}",
                        tag,
                        tag.capability()
                    );
                }
            }
        }

        chain
    }

    pub fn push(&mut self, filter: impl SampleFilter + 'a) {
        self.filters.push(Box::new(filter));
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl Default for SampleFilterChain<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleFilter for SampleFilterChain<'_> {
    fn should_skip(&self, sample: u64, index: usize, current_time: f64) -> bool {
        self.filters
            .iter()
            .any(|f| f.should_skip(sample, index, current_time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::config::HAS_SAMPLES_CPU;

    struct SkipIndex(usize);

    impl SampleFilter for SkipIndex {
        fn should_skip(&self, _sample: u64, index: usize, _current_time: f64) -> bool {
            index == self.0
        }
    }

    #[test]
    fn test_empty_chain_keeps_everything() {
        let chain = SampleFilterChain::new();
        assert!(chain.is_empty());
        assert!(!chain.should_skip(1, 0, 0.0));
    }

    #[test]
    fn test_chain_skips_when_any_filter_skips() {
        let mut chain = SampleFilterChain::new();
        chain.push(SkipIndex(1));
        chain.push(SkipIndex(3));

        assert!(!chain.should_skip(0, 0, 0.0));
        assert!(chain.should_skip(0, 1, 0.0));
        assert!(chain.should_skip(0, 3, 0.0));
    }

    #[test]
    fn test_from_options_installs_only_advertised_tags() {
        let mut profile = Profile::default();
        profile.samples_cpu = Some(vec![0, 1]);

        let options = FlameGraphOptions {
            cpu: Some(1),
            pid: Some(5),
            ..Default::default()
        };

        // only the range filter: cpu flag not set, pid has no array
        assert_eq!(SampleFilterChain::from_options(&profile, &options).len(), 1);

        profile.set_capability(HAS_SAMPLES_CPU);
        let chain = SampleFilterChain::from_options(&profile, &options);
        assert_eq!(chain.len(), 2);
        assert!(chain.should_skip(0, 0, 0.0));
        assert!(!chain.should_skip(0, 1, 0.0));
    }
}
