use dotport_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NuGetError {
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error("'{0}' is not a valid NuGet version")]
    InvalidVersion(String),

    /// The lock file is missing. Running a restore and retrying resolves it.
    #[error("Restore required for {project}: lock file {lock_file} not found")]
    RestoreRequired { project: PathBuf, lock_file: PathBuf },

    #[error("Failed to read lock file {path}: {details}")]
    LockFile { path: PathBuf, details: String },

    #[error("Operation was cancelled")]
    Cancelled,
}

impl From<CoreError> for NuGetError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidArgument { name, reason } => NuGetError::InvalidArgument { name, reason },
            CoreError::Cancelled => NuGetError::Cancelled,
            CoreError::Io { path, details } => NuGetError::LockFile { path, details },
        }
    }
}

/// Failure talking to a package source.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// Protocol-level failure worth retrying (HTTP 429/5xx, connection reset, timeout).
    #[error("Transient error from {source_name}: {message}")]
    Transient { source_name: String, message: String },

    #[error("Package '{package}' not found on {source_name}")]
    NotFound { source_name: String, package: String },

    #[error("HTTP error from {source_name}: {message}")]
    Http {
        source_name: String,
        message: String,
        status_code: Option<u16>,
    },

    #[error("Unexpected response from {source_name}: {message}")]
    Parse { source_name: String, message: String },

    #[error("Registry query was cancelled")]
    Cancelled,
}

impl RegistryError {
    pub fn is_transient(&self) -> bool {
        matches!(self, RegistryError::Transient { .. })
    }
}
