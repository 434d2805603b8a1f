//! Output writers for flame graphs.

pub mod json;

// Re-export main functions
pub use json::{read_tree, tree_to_string, write_tree};
