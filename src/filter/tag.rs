//! CPU / PID / TID match filters.

use super::SampleFilter;
use crate::profile::Profile;
use crate::utils::config::{HAS_SAMPLES_CPU, HAS_SAMPLES_PID, HAS_SAMPLES_TID};

/// Per-sample metadata a filter can match on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleTag {
    Cpu,
    Pid,
    Tid,
}

impl SampleTag {
    /// Capability flag advertising the per-sample array
    pub fn capability(self) -> &'static str {
        match self {
            Self::Cpu => HAS_SAMPLES_CPU,
            Self::Pid => HAS_SAMPLES_PID,
            Self::Tid => HAS_SAMPLES_TID,
        }
    }

    fn values(self, profile: &Profile) -> Option<&[u32]> {
        match self {
            Self::Cpu => profile.samples_cpu.as_deref(),
            Self::Pid => profile.samples_pid.as_deref(),
            Self::Tid => profile.samples_tid.as_deref(),
        }
    }
}

/// Skips samples whose tag differs from the target.
///
/// A no-op when the profile does not advertise the tag or carries no array
/// for it.
#[derive(Debug, Clone)]
pub struct TagSampleFilter<'a> {
    tag: SampleTag,
    target: u32,
    values: Option<&'a [u32]>,
}

impl<'a> TagSampleFilter<'a> {
    pub fn new(profile: &'a Profile, tag: SampleTag, target: u32) -> Self {
        let values = if profile.has_capability(tag.capability()) {
            tag.values(profile)
        } else {
            None
        };
        Self {
            tag,
            target,
            values,
        }
    }

    pub fn tag(&self) -> SampleTag {
        self.tag
    }
}

impl SampleFilter for TagSampleFilter<'_> {
    fn should_skip(&self, _sample: u64, index: usize, _current_time: f64) -> bool {
        match self.values.and_then(|values| values.get(index)) {
            Some(&value) => value != self.target,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tid_filter_matches_target() {
        let mut profile = Profile {
            samples_tid: Some(vec![10, 11, 10]),
            ..Default::default()
        };
        profile.set_capability(HAS_SAMPLES_TID);

        let filter = TagSampleFilter::new(&profile, SampleTag::Tid, 10);
        assert_eq!(filter.tag(), SampleTag::Tid);
        assert!(!filter.should_skip(0, 0, 0.0));
        assert!(filter.should_skip(0, 1, 0.0));
        assert!(!filter.should_skip(0, 2, 0.0));
    }

    #[test]
    fn test_filter_without_capability_is_noop() {
        let profile = Profile {
            samples_pid: Some(vec![1, 2]),
            ..Default::default()
        };

        let filter = TagSampleFilter::new(&profile, SampleTag::Pid, 1);
        assert!(!filter.should_skip(0, 1, 0.0));
    }

    #[test]
    fn test_filter_without_array_is_noop() {
        let mut profile = Profile::default();
        profile.set_capability(HAS_SAMPLES_CPU);

        let filter = TagSampleFilter::new(&profile, SampleTag::Cpu, 3);
        assert!(!filter.should_skip(0, 0, 0.0));
    }
}
