//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors that abort flame graph construction
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlameGraphError {
    /// The profile contradicts itself: dangling node ids, parent cycles,
    /// or capability flags promising data that is not there.
    #[error("Malformed profile: {0}")]
    MalformedProfile(String),

    /// The requested options cannot be honoured together.
    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),
}

/// Errors that can occur while loading a profile
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Failed to read profile: {0}")]
    ReadFailed(#[from] std::io::Error),

    #[error("JSON deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid profile: {0}")]
    Invalid(#[from] FlameGraphError),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
