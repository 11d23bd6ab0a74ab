//! Typed configuration errors. Runtime failures live in [`crate::failure`].

use thiserror::Error;

/// Errors detected while setting up a scheme. These are configuration defects:
/// they abort setup and are never rendered as responses.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid error category: {0}")]
    InvalidErrorCategory(String),
    #[error("unknown parent category '{parent}' for '{name}'")]
    UnknownParentCategory { name: String, parent: String },
    #[error("category '{name}' already defined with parent '{existing}'")]
    DuplicateCategory { name: String, existing: String },
    #[error("invalid model error pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("invalid code: {0}")]
    InvalidCode(String),
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}
