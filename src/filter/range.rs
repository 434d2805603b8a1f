//! Time range filter.

use super::SampleFilter;
use crate::profile::Profile;

/// Keeps samples whose timestamp falls in `[start + range_start, start + range_end)`,
/// where `start` is the profile start time rounded down.
///
/// Inert when either bound is missing.
#[derive(Debug, Clone)]
pub struct RangeSampleFilter {
    bounds: Option<(f64, f64)>,
}

impl RangeSampleFilter {
    pub fn new(profile: &Profile, range_start: Option<f64>, range_end: Option<f64>) -> Self {
        let start_time = profile.start_time.floor();
        let bounds = match (range_start, range_end) {
            (Some(range_start), Some(range_end)) => {
                Some((start_time + range_start, start_time + range_end))
            }
            _ => None,
        };
        Self { bounds }
    }

    pub fn is_inert(&self) -> bool {
        self.bounds.is_none()
    }
}

impl SampleFilter for RangeSampleFilter {
    fn should_skip(&self, _sample: u64, _index: usize, current_time: f64) -> bool {
        match self.bounds {
            Some((start, end)) => !(start <= current_time && current_time < end),
            None => false,
        }
    }
}
