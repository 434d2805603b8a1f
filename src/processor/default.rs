//! Identity processor.

use super::{ProcessorOptions, StackProcessor};

/// Inserts frames as resolved
#[derive(Debug, Clone, Default)]
pub struct DefaultStackProcessor {
    options: ProcessorOptions,
}

impl DefaultStackProcessor {
    pub fn new(options: ProcessorOptions) -> Self {
        Self { options }
    }
}

impl StackProcessor for DefaultStackProcessor {
    fn options(&self) -> &ProcessorOptions {
        &self.options
    }
}
