//! Call-stack resolution for profile nodes.
//!
//! Which strategy applies depends on what the profile carries:
//! precomputed per-node stacks, parent pointers, or (in the oldest layout)
//! only children lists.

pub mod stack_resolver;

pub use stack_resolver::{ResolveStrategy, StackResolver};
