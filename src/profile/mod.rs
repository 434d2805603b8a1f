//! Profile input model and loading.
//!
//! This module handles:
//! - The sampled profile data model (nodes, samples, capability flags)
//! - Reading profiles from JSON
//! - Structural validation of the sample arrays

pub mod reader;
pub mod schema;

// Re-export main types
pub use reader::{parse_profile, read_profile};
pub use schema::{Profile, ProfileNode, SourceLocation, StackFrame};
