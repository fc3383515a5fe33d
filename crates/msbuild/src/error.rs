use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Failed to read project file {path}: {details}")]
    Read { path: PathBuf, details: String },

    #[error("Project file {path} is not valid MSBuild XML: {details}")]
    Xml { path: PathBuf, details: String },

    #[error("'{0}' is not a recognized target framework moniker")]
    InvalidTargetFramework(String),
}
