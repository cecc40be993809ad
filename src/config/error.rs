//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors
///
/// Every variant is fatal: the engine refuses to start with a partially
/// loaded routing table.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value for '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Duplicate identifier '{id}' in {section}")]
    DuplicateId { id: String, section: String },

    #[error("Agent '{agent}' rule #{rule} targets unknown handler '{target}'")]
    UnknownTarget {
        agent: String,
        rule: usize,
        target: String,
    },

    #[error("Invalid trigger pattern '{pattern}' for agent '{agent}': {message}")]
    InvalidPattern {
        agent: String,
        pattern: String,
        message: String,
    },
}
