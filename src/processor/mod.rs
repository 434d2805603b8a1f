//! Stack processors: per-runtime rewriting of stacks before insertion.
//!
//! Every processor shares the same fold (`fold_stack`) and only overrides
//! the hooks it needs:
//! - `process_frame` rewrites a frame's name/location
//! - `should_skip_frame` drops a frame, possibly leaving state for the next one
//! - `process_extras` records metrics on the node a frame landed in

pub mod default;
pub mod java;
pub mod nodejs;
pub mod nodejs_package;

pub use default::DefaultStackProcessor;
pub use java::JavaStackProcessor;
pub use nodejs::NodeJsStackProcessor;
pub use nodejs_package::NodeJsPackageStackProcessor;

use crate::aggregator::FlameNode;
use crate::profile::StackFrame;
use crate::utils::error::FlameGraphError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Options shared by every processor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessorOptions {
    /// Match siblings on name and location only
    pub ignore_libtype: bool,

    /// Keep only the part of each stack leading into a frame containing this
    pub middle_out: Option<String>,
}

/// Per-frame information produced by `process_frame`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameExtras {
    /// Frame is V8-compiled code (either tier)
    pub v8_jit: bool,
    pub javascript: bool,
    /// Name before any rewriting
    pub real_name: String,
    /// Fully-optimized tier; `None` when not a JS frame
    pub optimized: Option<bool>,
}

/// State carried between frames of a single stack
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StackScratch {
    /// Weight of a skipped arguments adaptor, owed to the next kept frame
    pub argument_adaptor: Option<f64>,
}

/// A pluggable stack transform applied before tree insertion
pub trait StackProcessor {
    fn options(&self) -> &ProcessorOptions;

    fn process_frame(&self, frame: &StackFrame) -> (StackFrame, FrameExtras) {
        (frame.clone(), FrameExtras::default())
    }

    fn should_skip_frame(
        &self,
        _frame: &StackFrame,
        _extras: &FrameExtras,
        _value: f64,
        _scratch: &mut StackScratch,
    ) -> bool {
        false
    }

    fn process_extras(
        &self,
        _node: &mut FlameNode,
        _frame: &StackFrame,
        _extras: &FrameExtras,
        _value: f64,
        _scratch: &mut StackScratch,
    ) {
    }

    /// Insert a root-first stack with weight `value` under `root`
    fn process(&self, root: &mut FlameNode, stack: &[StackFrame], value: f64) {
        fold_stack(self, root, stack, value);
    }
}

/// The shared insertion loop.
///
/// Every node on the inserted path, `root` included, gains `value`. When all
/// frames are skipped the weight stays on `root`.
pub fn fold_stack<P: StackProcessor + ?Sized>(
    processor: &P,
    root: &mut FlameNode,
    stack: &[StackFrame],
    value: f64,
) {
    let options = processor.options();
    let middle_out = options.middle_out.as_deref();
    let mut isolating = middle_out.is_some();
    let mut scratch = StackScratch::default();

    root.value += value;
    let mut cursor = root;

    for (index, raw) in stack.iter().enumerate() {
        let (frame, extras) = processor.process_frame(raw);
        if processor.should_skip_frame(&frame, &extras, value, &mut scratch) {
            continue;
        }

        if let Some(target) = middle_out.filter(|_| isolating) {
            // keep skipping until the next frame is the one we isolate
            match stack.get(index + 1) {
                Some(next) if next.function_name.contains(target) => isolating = false,
                _ => continue,
            }
        }

        cursor = cursor.child_for(&frame, options.ignore_libtype);
        cursor.value += value;
        processor.process_extras(cursor, &frame, &extras, value, &mut scratch);
    }
}

/// Variant selector for the processors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StackProcessorKind {
    #[default]
    #[serde(rename = "default")]
    Default,
    #[serde(rename = "java")]
    Java,
    #[serde(rename = "nodejs")]
    NodeJs,
    #[serde(rename = "nodejs-package")]
    NodeJsPackage,
}

impl StackProcessorKind {
    pub fn build(self, options: ProcessorOptions) -> Box<dyn StackProcessor> {
        match self {
            Self::Default => Box::new(DefaultStackProcessor::new(options)),
            Self::Java => Box::new(JavaStackProcessor::new(options)),
            Self::NodeJs => Box::new(NodeJsStackProcessor::new(options)),
            Self::NodeJsPackage => Box::new(NodeJsPackageStackProcessor::new(options)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Java => "java",
            Self::NodeJs => "nodejs",
            Self::NodeJsPackage => "nodejs-package",
        }
    }
}

impl FromStr for StackProcessorKind {
    type Err = FlameGraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Self::Default),
            "java" => Ok(Self::Java),
            "nodejs" => Ok(Self::NodeJs),
            "nodejs-package" => Ok(Self::NodeJsPackage),
            other => Err(FlameGraphError::UnsupportedConfiguration(format!(
                "unknown stack processor '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for StackProcessorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(names: &[&str]) -> Vec<StackFrame> {
        names.iter().map(|n| StackFrame::new(*n, "user")).collect()
    }

    fn middle_out(target: &str) -> DefaultStackProcessor {
        DefaultStackProcessor::new(ProcessorOptions {
            middle_out: Some(target.to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("nodejs-package".parse::<StackProcessorKind>().unwrap(), StackProcessorKind::NodeJsPackage);
        assert_eq!("java".parse::<StackProcessorKind>().unwrap().to_string(), "java");
        assert!(matches!(
            "erlang".parse::<StackProcessorKind>(),
            Err(FlameGraphError::UnsupportedConfiguration(_))
        ));
    }

    #[test]
    fn test_kind_serde_names() {
        let kind: StackProcessorKind = serde_json::from_str("\"nodejs\"").unwrap();
        assert_eq!(kind, StackProcessorKind::NodeJs);
        assert_eq!(
            serde_json::to_string(&StackProcessorKind::NodeJsPackage).unwrap(),
            "\"nodejs-package\""
        );
    }

    #[test]
    fn test_middle_out_keeps_suffix_from_predecessor() {
        let mut root = FlameNode::root();
        middle_out("C").process(&mut root, &frames(&["A", "B", "C", "D"]), 1.0);

        assert_eq!(root.children.len(), 1);
        let b = &root.children[0];
        assert_eq!(b.name, "B");
        let c = &b.children[0];
        assert_eq!(c.name, "C");
        let d = &c.children[0];
        assert_eq!(d.name, "D");
        assert_eq!(d.value, 1.0);
        assert!(d.children.is_empty());
    }

    #[test]
    fn test_middle_out_without_match_credits_root() {
        let mut root = FlameNode::root();
        middle_out("Z").process(&mut root, &frames(&["A", "B"]), 4.0);

        assert!(root.children.is_empty());
        assert_eq!(root.value, 4.0);
    }

    #[test]
    fn test_middle_out_match_on_first_frame_is_unreachable() {
        // the first frame has no predecessor, so only later matches isolate
        let mut root = FlameNode::root();
        middle_out("A").process(&mut root, &frames(&["A", "B"]), 1.0);
        assert!(root.children.is_empty());
    }
}
