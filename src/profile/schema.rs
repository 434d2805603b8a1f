//! Input profile model.
//!
//! This is the logical content of a sampled CPU profile as produced by the
//! format converters. Field names follow the persisted profile so that a
//! JSON rendition of it deserializes directly.

use crate::utils::config::{
    HAS_SAMPLES_CPU, HAS_SAMPLES_PID, HAS_SAMPLES_TID, HAS_VALUES, ROOT_NODE_ID,
};
use crate::utils::error::FlameGraphError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Source location attached to a frame
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    #[serde(default)]
    pub file_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

/// One frame of a call stack
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    #[serde(default)]
    pub function_name: String,

    /// Coarse origin of the frame: kernel, user, jit, inlined or empty
    #[serde(default, rename = "libtype", alias = "lib_type")]
    pub lib_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<SourceLocation>,
}

impl StackFrame {
    pub fn new(function_name: impl Into<String>, lib_type: impl Into<String>) -> Self {
        Self {
            function_name: function_name.into(),
            lib_type: lib_type.into(),
            file: None,
        }
    }

    pub fn with_location(mut self, file_name: impl Into<String>, line: Option<u32>) -> Self {
        self.file = Some(SourceLocation {
            file_name: file_name.into(),
            line,
            column: None,
        });
        self
    }

    /// The `file:line` string used to tell apart frames that share a name.
    ///
    /// Empty when the frame has no file name.
    pub fn location_key(&self) -> String {
        match &self.file {
            Some(loc) if !loc.file_name.is_empty() => match loc.line {
                Some(line) => format!("{}:{}", loc.file_name, line),
                None => loc.file_name.clone(),
            },
            _ => String::new(),
        }
    }
}

/// A node of the profile's call graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileNode {
    #[serde(default)]
    pub function_name: String,

    #[serde(default, rename = "libtype", alias = "lib_type")]
    pub lib_type: String,

    #[serde(default)]
    pub pid: Option<u32>,

    #[serde(default)]
    pub parent: Option<u64>,

    #[serde(default)]
    pub children: Vec<u64>,

    /// Precomputed root-first stack, populated when `has_node_stack` is set
    #[serde(default)]
    pub stack: Vec<StackFrame>,
}

impl ProfileNode {
    pub fn new(function_name: impl Into<String>, lib_type: impl Into<String>) -> Self {
        Self {
            function_name: function_name.into(),
            lib_type: lib_type.into(),
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent: u64) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_children(mut self, children: Vec<u64>) -> Self {
        self.children = children;
        self
    }

    pub fn with_stack(mut self, stack: Vec<StackFrame>) -> Self {
        self.stack = stack;
        self
    }

    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    /// Parent id, treating the synthetic root as "no parent"
    pub fn parent_id(&self) -> Option<u64> {
        self.parent.filter(|&id| id != ROOT_NODE_ID)
    }
}

/// A captured, finite sequence of stack samples
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub nodes: HashMap<u64, ProfileNode>,

    /// Node id of each sample
    #[serde(default)]
    pub samples: Vec<u64>,

    /// `samples.len() + 1` deltas; entry `i + 1` is the delay before sample `i`
    #[serde(default)]
    pub time_deltas: Vec<f64>,

    #[serde(default)]
    pub samples_value: Option<Vec<f64>>,

    #[serde(default)]
    pub samples_cpu: Option<Vec<u32>>,

    #[serde(default)]
    pub samples_pid: Option<Vec<u32>>,

    #[serde(default)]
    pub samples_tid: Option<Vec<u32>>,

    /// Capability flags
    #[serde(default)]
    pub params: HashMap<String, String>,

    #[serde(default)]
    pub start_time: f64,

    #[serde(default)]
    pub end_time: f64,
}

impl Profile {
    /// Whether a capability flag is set to `"true"`
    pub fn has_capability(&self, key: &str) -> bool {
        self.params.get(key).is_some_and(|v| v == "true")
    }

    pub fn set_capability(&mut self, key: &str) {
        self.params.insert(key.to_string(), "true".to_string());
    }

    /// Look up a node, failing on dangling ids
    pub fn node(&self, id: u64) -> Result<&ProfileNode, FlameGraphError> {
        self.nodes.get(&id).ok_or_else(|| {
            FlameGraphError::MalformedProfile(format!("unknown node id {}", id))
        })
    }

    /// Check the sample arrays against each other and the capability flags.
    ///
    /// Node graph problems (cycles, unreachable nodes) are only found while
    /// stacks are resolved.
    pub fn validate(&self) -> Result<(), FlameGraphError> {
        let expected = self.samples.len() + 1;
        if !(self.samples.is_empty() && self.time_deltas.is_empty())
            && self.time_deltas.len() != expected
        {
            return Err(FlameGraphError::MalformedProfile(format!(
                "time_deltas has {} entries, expected {}",
                self.time_deltas.len(),
                expected
            )));
        }

        self.check_sample_array(HAS_VALUES, "samples_value", self.samples_value.as_ref().map(Vec::len))?;
        self.check_sample_array(HAS_SAMPLES_CPU, "samples_cpu", self.samples_cpu.as_ref().map(Vec::len))?;
        self.check_sample_array(HAS_SAMPLES_PID, "samples_pid", self.samples_pid.as_ref().map(Vec::len))?;
        self.check_sample_array(HAS_SAMPLES_TID, "samples_tid", self.samples_tid.as_ref().map(Vec::len))?;

        if let Some(missing) = self.samples.iter().find(|id| !self.nodes.contains_key(id)) {
            return Err(FlameGraphError::MalformedProfile(format!(
                "sample references unknown node id {}",
                missing
            )));
        }

        Ok(())
    }

    fn check_sample_array(
        &self,
        flag: &str,
        field: &str,
        len: Option<usize>,
    ) -> Result<(), FlameGraphError> {
        if !self.has_capability(flag) {
            return Ok(());
        }
        match len {
            None => Err(FlameGraphError::MalformedProfile(format!(
                "{} is set but {} is absent",
                flag, field
            ))),
            Some(len) if len < self.samples.len() => Err(FlameGraphError::MalformedProfile(format!(
                "{} has {} entries for {} samples",
                field,
                len,
                self.samples.len()
            ))),
            Some(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sampled_profile() -> Profile {
        let mut profile = Profile::default();
        profile.nodes.insert(0, ProfileNode::new("root", ""));
        profile.nodes.insert(1, ProfileNode::new("main", "user").with_parent(0));
        profile.samples = vec![1, 1];
        profile.time_deltas = vec![0.0, 1.0, 1.0];
        profile
    }

    #[test]
    fn test_location_key() {
        assert_eq!(StackFrame::new("f", "").location_key(), "");
        assert_eq!(
            StackFrame::new("f", "").with_location("a.js", Some(3)).location_key(),
            "a.js:3"
        );
        assert_eq!(
            StackFrame::new("f", "").with_location("a.js", None).location_key(),
            "a.js"
        );
    }

    #[test]
    fn test_capability_requires_true_string() {
        let mut profile = Profile::default();
        profile.params.insert(HAS_VALUES.to_string(), "yes".to_string());
        assert!(!profile.has_capability(HAS_VALUES));
        profile.set_capability(HAS_VALUES);
        assert!(profile.has_capability(HAS_VALUES));
    }

    #[test]
    fn test_validate_ok() {
        assert!(sampled_profile().validate().is_ok());
    }

    #[test]
    fn test_validate_time_delta_mismatch() {
        let mut profile = sampled_profile();
        profile.time_deltas.pop();
        assert!(matches!(
            profile.validate(),
            Err(FlameGraphError::MalformedProfile(_))
        ));
    }

    #[test]
    fn test_validate_flag_without_array() {
        let mut profile = sampled_profile();
        profile.set_capability(HAS_SAMPLES_CPU);
        assert!(profile.validate().is_err());

        profile.samples_cpu = Some(vec![0]);
        assert!(profile.validate().is_err());

        profile.samples_cpu = Some(vec![0, 1]);
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_validate_unknown_sample_node() {
        let mut profile = sampled_profile();
        profile.samples[0] = 42;
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_parent_id_skips_root() {
        assert_eq!(ProfileNode::new("a", "").with_parent(0).parent_id(), None);
        assert_eq!(ProfileNode::new("a", "").with_parent(7).parent_id(), Some(7));
    }

    #[test]
    fn test_deserialize_integer_node_keys() {
        let profile: Profile = serde_json::from_value(serde_json::json!({
            "nodes": {
                "0": { "function_name": "root" },
                "1": { "function_name": "main", "libtype": "user", "parent": 0 }
            },
            "samples": [1],
            "time_deltas": [0, 5],
            "params": { "has_parent": "true" }
        }))
        .unwrap();

        assert_eq!(profile.nodes[&1].lib_type, "user");
        assert!(profile.has_capability("has_parent"));
        assert_eq!(profile.time_deltas, vec![0.0, 5.0]);
    }
}
