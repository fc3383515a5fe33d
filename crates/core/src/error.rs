use std::path::PathBuf;
use thiserror::Error;

/// Failures shared by every dotport crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A public entry point received an argument it cannot work with.
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    /// The caller's cancellation token fired before the operation finished.
    #[error("Operation was cancelled")]
    Cancelled,

    #[error("I/O error on {path}: {details}")]
    Io { path: PathBuf, details: String },
}

impl CoreError {
    pub fn invalid_argument(name: &'static str, reason: impl Into<String>) -> Self {
        CoreError::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }
}

/// Fails with [`CoreError::InvalidArgument`] when `value` is empty or whitespace.
pub fn require_non_empty(name: &'static str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::invalid_argument(name, "must not be empty"));
    }
    Ok(())
}
