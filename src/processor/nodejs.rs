//! Node.js processor.
//!
//! V8 names JIT-compiled functions in perf maps as
//! `LazyCompile:*name /path/to/file.js:42` (optimized tier) or
//! `InterpretedFunction:name /path/to/file.js:42` (bytecode tier). Both
//! tiers of a function collapse into one node named `name` with the file
//! location split out. Arguments adaptor frames are hidden and their weight
//! shown on the frame they lead into.

use super::{FrameExtras, ProcessorOptions, StackProcessor, StackScratch};
use crate::aggregator::FlameNode;
use crate::profile::{SourceLocation, StackFrame};
use crate::utils::config::{V8_INTERPRETED_PREFIX, V8_OPTIMIZED_PREFIX};

const ANONYMOUS: &str = "(anonymous)";
const ARGUMENTS_ADAPTOR: &str = "ArgumentsAdaptorTrampoline";

#[derive(Debug, Clone, Default)]
pub struct NodeJsStackProcessor {
    options: ProcessorOptions,
}

impl NodeJsStackProcessor {
    pub fn new(options: ProcessorOptions) -> Self {
        Self { options }
    }
}

/// Strip a V8 tier prefix and the optimization marker.
///
/// Returns the remainder and whether the frame ran optimized code.
pub(crate) fn strip_tier_prefix(name: &str) -> Option<(&str, bool)> {
    let (rest, optimized) = if let Some(rest) = name.strip_prefix(V8_OPTIMIZED_PREFIX) {
        (rest, true)
    } else if let Some(rest) = name.strip_prefix(V8_INTERPRETED_PREFIX) {
        (rest, false)
    } else {
        return None;
    };
    Some((rest.strip_prefix('*').unwrap_or(rest), optimized))
}

/// Split `name location` at the last space. The location is `None` when
/// there is no space or nothing follows it.
pub(crate) fn split_code_location(rest: &str) -> (&str, Option<&str>) {
    match rest.rfind(' ') {
        Some(index) if index + 1 < rest.len() => (&rest[..index], Some(&rest[index + 1..])),
        _ => (rest, None),
    }
}

/// Parse `path[:line]`
fn parse_location(location: &str) -> SourceLocation {
    let (file_name, line) = match location.rsplit_once(':') {
        Some((path, line)) => match line.parse::<u32>() {
            Ok(line) => (path, Some(line)),
            Err(_) => (location, None),
        },
        None => (location, None),
    };
    SourceLocation {
        file_name: file_name.to_string(),
        line,
        column: None,
    }
}

impl StackProcessor for NodeJsStackProcessor {
    fn options(&self) -> &ProcessorOptions {
        &self.options
    }

    fn process_frame(&self, frame: &StackFrame) -> (StackFrame, FrameExtras) {
        let mut processed = frame.clone();
        let mut extras = FrameExtras {
            real_name: frame.function_name.clone(),
            ..Default::default()
        };

        if let Some((rest, optimized)) = strip_tier_prefix(&frame.function_name) {
            extras.v8_jit = true;
            extras.javascript = true;
            extras.optimized = Some(optimized);

            let (name, location) = split_code_location(rest);
            if let Some(location) = location {
                processed.file = Some(parse_location(location));
            }
            processed.function_name = if name.is_empty() {
                ANONYMOUS.to_string()
            } else {
                name.to_string()
            };
        }

        (processed, extras)
    }

    fn should_skip_frame(
        &self,
        frame: &StackFrame,
        _extras: &FrameExtras,
        value: f64,
        scratch: &mut StackScratch,
    ) -> bool {
        if frame.function_name.contains(ARGUMENTS_ADAPTOR) {
            scratch.argument_adaptor = Some(value);
            return true;
        }
        false
    }

    fn process_extras(
        &self,
        node: &mut FlameNode,
        _frame: &StackFrame,
        extras: &FrameExtras,
        value: f64,
        scratch: &mut StackScratch,
    ) {
        let mut node_extras = node.extras.take().unwrap_or_default();

        node_extras.javascript = Some(extras.javascript);
        node_extras.v8_jit = Some(extras.v8_jit);
        let optimized = if extras.optimized == Some(true) { value } else { 0.0 };
        node_extras.optimized = Some(node_extras.optimized.unwrap_or(0.0) + optimized);
        node_extras.real_name = Some(extras.real_name.clone());

        if let Some(adaptor) = scratch.argument_adaptor.take() {
            node_extras.argument_adaptor =
                Some(node_extras.argument_adaptor.unwrap_or(0.0) + adaptor);
        }

        node.set_extras(node_extras);
    }
}
