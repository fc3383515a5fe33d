use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TfmError {
    /// Two monikers name different platforms and cannot be combined.
    #[error("Cannot merge target frameworks with different platforms: {left} and {right}")]
    PlatformMismatch { left: String, right: String },

    #[error("Invalid {setting} '{value}': {reason}")]
    InvalidSetting {
        setting: &'static str,
        value: String,
        reason: String,
    },
}
