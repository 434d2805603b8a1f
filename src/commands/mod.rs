//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod build;
pub mod validate;

// Re-export main command functions
pub use build::{execute_build, render_summary, validate_args, BuildArgs};
pub use validate::validate_profile_file;
