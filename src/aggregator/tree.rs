//! Output flame graph tree and frame insertion.
//!
//! Children keep first-appearance order and are matched by linear scan on
//! (trimmed name, lib-type, file location). Values are inclusive: a node
//! holds the weight of every stack that passes through it.

use crate::profile::StackFrame;
use crate::utils::config::{ROOT_LIBTYPE, ROOT_NAME};
use serde::{Deserialize, Serialize};

/// Processor-specific metrics attached to a node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeExtras {
    /// `file:line` of the frame, part of the sibling dedup key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub javascript: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v8_jit: Option<bool>,

    /// Weight of samples that ran this frame as optimized code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimized: Option<f64>,

    #[serde(
        default,
        rename = "realName",
        skip_serializing_if = "Option::is_none"
    )]
    pub real_name: Option<String>,

    /// Weight of samples that entered this frame through an arguments adaptor
    #[serde(
        default,
        rename = "argumentAdaptor",
        skip_serializing_if = "Option::is_none"
    )]
    pub argument_adaptor: Option<f64>,
}

impl NodeExtras {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Fold `other` into `self`: counters add up, descriptive fields keep
    /// the first value seen.
    pub fn merge(&mut self, other: &NodeExtras) {
        if self.file.is_none() {
            self.file.clone_from(&other.file);
        }
        if self.real_name.is_none() {
            self.real_name.clone_from(&other.real_name);
        }
        self.javascript = self.javascript.or(other.javascript);
        self.v8_jit = self.v8_jit.or(other.v8_jit);
        self.optimized = add_counters(self.optimized, other.optimized);
        self.argument_adaptor = add_counters(self.argument_adaptor, other.argument_adaptor);
    }
}

fn add_counters(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a + b),
        (a, b) => a.or(b),
    }
}

/// A node of the flame graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlameNode {
    pub name: String,

    #[serde(rename = "libtype", alias = "lib_type")]
    pub lib_type: String,

    pub value: f64,

    #[serde(default)]
    pub children: Vec<FlameNode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<NodeExtras>,
}

impl FlameNode {
    pub fn new(name: impl Into<String>, lib_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lib_type: lib_type.into(),
            value: 0.0,
            children: Vec::new(),
            extras: None,
        }
    }

    /// The fixed `root` sentinel
    pub fn root() -> Self {
        Self::new(ROOT_NAME, ROOT_LIBTYPE)
    }

    /// File location part of the dedup key, empty when unknown
    pub fn location_key(&self) -> &str {
        self.extras
            .as_ref()
            .and_then(|e| e.file.as_deref())
            .unwrap_or_default()
    }

    /// Replace the extras, dropping them when nothing is recorded
    pub fn set_extras(&mut self, extras: NodeExtras) {
        self.extras = if extras.is_empty() { None } else { Some(extras) };
    }

    /// Child matching `frame`, created and appended when absent.
    ///
    /// A created child records the frame's file location in its extras.
    pub fn child_for(&mut self, frame: &StackFrame, ignore_libtype: bool) -> &mut FlameNode {
        let name = frame.function_name.trim();
        let location = frame.location_key();

        let position = self
            .children
            .iter()
            .position(|child| child.matches(name, &frame.lib_type, &location, ignore_libtype));

        let index = match position {
            Some(index) => index,
            None => {
                let lib_type = if ignore_libtype { "" } else { frame.lib_type.as_str() };
                let mut child = FlameNode::new(name, lib_type);
                if !location.is_empty() {
                    child.extras = Some(NodeExtras {
                        file: Some(location),
                        ..Default::default()
                    });
                }
                self.children.push(child);
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }

    fn matches(&self, name: &str, lib_type: &str, location: &str, ignore_libtype: bool) -> bool {
        self.name.trim() == name
            && (ignore_libtype || self.lib_type == lib_type)
            && self.location_key() == location
    }

    /// Fold another tree into this one under the same dedup key, summing
    /// values. Children absent here are appended after the existing ones.
    pub fn merge(&mut self, other: FlameNode) {
        self.value += other.value;

        if let Some(other_extras) = &other.extras {
            let mut extras = self.extras.take().unwrap_or_default();
            extras.merge(other_extras);
            self.set_extras(extras);
        }

        for child in other.children {
            let position = self.children.iter().position(|existing| {
                existing.matches(child.name.trim(), &child.lib_type, child.location_key(), false)
            });
            match position {
                Some(index) => self.children[index].merge(child),
                None => self.children.push(child),
            }
        }
    }

    /// Value not attributed to any child
    pub fn self_value(&self) -> f64 {
        let children: f64 = self.children.iter().map(|c| c.value).sum();
        (self.value - children).max(0.0)
    }

    pub fn find_child(&self, name: &str) -> Option<&FlameNode> {
        self.children.iter().find(|c| c.name == name)
    }
}

impl Default for FlameNode {
    fn default() -> Self {
        Self::root()
    }
}
