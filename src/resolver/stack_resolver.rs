//! Build root-first frame sequences for sampled nodes.

use crate::profile::{Profile, StackFrame};
use crate::utils::config::{HAS_NODE_STACK, HAS_PARENT, ROOT_NODE_ID};
use crate::utils::error::FlameGraphError;
use log::debug;
use std::collections::{HashMap, HashSet, VecDeque};

/// How stacks are obtained for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStrategy {
    /// Split the leaf name into `/`-separated package segments
    PackageName,
    /// Use the node's precomputed stack
    NodeStack,
    /// Walk parent pointers up to the root
    ParentPointer,
    /// Generate every stack up front from the children lists
    ChildrenList,
}

impl ResolveStrategy {
    /// Pick the strategy for a profile's capability flags
    pub fn select(profile: &Profile, package_name: bool) -> Self {
        if package_name {
            Self::PackageName
        } else if profile.has_capability(HAS_NODE_STACK) {
            Self::NodeStack
        } else if profile.has_capability(HAS_PARENT) {
            Self::ParentPointer
        } else {
            Self::ChildrenList
        }
    }
}

/// Resolves sampled node ids into frame sequences
pub struct StackResolver<'a> {
    profile: &'a Profile,
    strategy: ResolveStrategy,
    inverted: bool,
    has_node_stack: bool,
    pid_names: Option<&'a HashMap<u32, String>>,
    generated: HashMap<u64, Vec<StackFrame>>,
}

impl<'a> StackResolver<'a> {
    /// Create a resolver, generating children-list stacks eagerly when needed.
    ///
    /// # Errors
    /// `MalformedProfile` if the children lists reference unknown nodes or
    /// reach a node twice.
    pub fn new(
        profile: &'a Profile,
        package_name: bool,
        inverted: bool,
    ) -> Result<Self, FlameGraphError> {
        let strategy = ResolveStrategy::select(profile, package_name);
        debug!("Resolving stacks with {:?} strategy", strategy);

        let generated = if strategy == ResolveStrategy::ChildrenList {
            generate_children_stacks(profile)?
        } else {
            HashMap::new()
        };

        Ok(Self {
            profile,
            strategy,
            inverted,
            has_node_stack: profile.has_capability(HAS_NODE_STACK),
            pid_names: None,
            generated,
        })
    }

    /// Display names substituted for a node's own frame, keyed by pid
    pub fn with_pid_names(mut self, pid_names: &'a HashMap<u32, String>) -> Self {
        if !pid_names.is_empty() {
            self.pid_names = Some(pid_names);
        }
        self
    }

    pub fn strategy(&self) -> ResolveStrategy {
        self.strategy
    }

    /// Frame sequence for `node_id`, root first unless inverted
    pub fn resolve(&self, node_id: u64) -> Result<Vec<StackFrame>, FlameGraphError> {
        let mut stack = match self.strategy {
            ResolveStrategy::PackageName => self.package_stack(node_id)?,
            ResolveStrategy::NodeStack => self.node_stack(node_id)?,
            ResolveStrategy::ParentPointer => self.parent_stack(node_id)?,
            ResolveStrategy::ChildrenList => self
                .generated
                .get(&node_id)
                .cloned()
                .ok_or_else(|| {
                    FlameGraphError::MalformedProfile(format!(
                        "node {} is not reachable from the root",
                        node_id
                    ))
                })?,
        };

        if self.inverted {
            stack.reverse();
        }
        Ok(stack)
    }

    fn package_stack(&self, node_id: u64) -> Result<Vec<StackFrame>, FlameGraphError> {
        let node = self.profile.node(node_id)?;

        // node-stack profiles keep the real leaf at the end of the stack
        let leaf_name = match node.stack.last() {
            Some(frame) if self.has_node_stack => frame.function_name.as_str(),
            _ => node.function_name.as_str(),
        };

        Ok(split_package_name(leaf_name)
            .map(|segment| StackFrame::new(segment, node.lib_type.clone()))
            .collect())
    }

    fn node_stack(&self, node_id: u64) -> Result<Vec<StackFrame>, FlameGraphError> {
        let node = self.profile.node(node_id)?;

        let name = node
            .pid
            .and_then(|pid| self.pid_names.and_then(|names| names.get(&pid)))
            .unwrap_or(&node.function_name);

        let mut stack = Vec::with_capacity(node.stack.len() + 1);
        stack.push(StackFrame::new(name.clone(), node.lib_type.clone()));
        stack.extend(node.stack.iter().cloned());
        Ok(stack)
    }

    fn parent_stack(&self, node_id: u64) -> Result<Vec<StackFrame>, FlameGraphError> {
        let mut visited = HashSet::new();
        let mut stack = Vec::new();
        let mut current = node_id;

        loop {
            if !visited.insert(current) {
                return Err(FlameGraphError::MalformedProfile(format!(
                    "parent chain of node {} loops through node {}",
                    node_id, current
                )));
            }
            let node = self.profile.node(current)?;
            stack.push(StackFrame::new(node.function_name.clone(), node.lib_type.clone()));

            match node.parent_id() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        // collected leaf first
        stack.reverse();
        Ok(stack)
    }
}

/// Segments of a package-style name: the part before any `;`, split on `/`
fn split_package_name(name: &str) -> impl Iterator<Item = &str> {
    name.split(';').next().unwrap_or_default().split('/')
}

/// Breadth-first walk of the children lists from the root.
///
/// Children of the root do not inherit a root frame.
fn generate_children_stacks(
    profile: &Profile,
) -> Result<HashMap<u64, Vec<StackFrame>>, FlameGraphError> {
    let mut stacks: HashMap<u64, Vec<StackFrame>> = HashMap::new();
    let mut queue: VecDeque<(u64, Option<u64>)> = VecDeque::new();
    queue.push_back((ROOT_NODE_ID, None));

    while let Some((node_id, parent_id)) = queue.pop_front() {
        let node = profile.node(node_id)?;
        let frame = StackFrame::new(node.function_name.clone(), node.lib_type.clone());

        let stack = match parent_id.filter(|&id| id != ROOT_NODE_ID) {
            Some(parent_id) => {
                let mut stack = stacks.get(&parent_id).cloned().unwrap_or_default();
                stack.push(frame);
                stack
            }
            None => vec![frame],
        };

        if stacks.insert(node_id, stack).is_some() {
            return Err(FlameGraphError::MalformedProfile(format!(
                "node {} is reachable more than once from the root",
                node_id
            )));
        }

        for &child in &node.children {
            queue.push_back((child, Some(node_id)));
        }
    }

    debug!("Generated {} stacks from children lists", stacks.len());
    Ok(stacks)
}
