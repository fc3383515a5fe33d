//! Shared plumbing for the dotport workspace: configuration, error kinds,
//! file system access, logging and cooperative cancellation.

pub mod cancel;
pub mod config;
pub mod error;
pub mod fs;
pub mod logging;

pub use cancel::{CancellationSource, CancellationToken};
pub use config::{ConfigError, DotportConfig, TfmSupport};
pub use error::{require_non_empty, CoreError};
pub use fs::{FileSystem, MockFileSystem, RealFileSystem};
pub use logging::{init_default, init_from_env, init_logging, LoggingConfig};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
