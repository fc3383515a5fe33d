use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalyzerError {
    #[error("Failed to parse {path}: {details}")]
    Parse { path: PathBuf, details: String },

    /// An `*.apitargets` or `*.typemap` file could not be read.
    #[error("Invalid mapping file {path}: {details}")]
    MappingFile { path: PathBuf, details: String },

    #[error("Diagnostic {id} is missing fix property '{key}'")]
    MissingProperty { id: String, key: &'static str },

    #[error("Diagnostic {id} has invalid fix property '{key}': {value}")]
    InvalidProperty {
        id: String,
        key: &'static str,
        value: String,
    },

    #[error("Cannot fix {id} in {path}: {details}")]
    Fix {
        id: String,
        path: PathBuf,
        details: String,
    },

    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error("Analysis was cancelled")]
    Cancelled,
}

impl From<dotport_core::CoreError> for AnalyzerError {
    fn from(err: dotport_core::CoreError) -> Self {
        match err {
            dotport_core::CoreError::Cancelled => AnalyzerError::Cancelled,
            dotport_core::CoreError::Io { path, details } => AnalyzerError::Parse { path, details },
            dotport_core::CoreError::InvalidArgument { name, reason } => {
                AnalyzerError::InvalidArgument { name, reason }
            }
        }
    }
}
