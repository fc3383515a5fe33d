pub mod commands;
pub mod output;

pub use commands::{AnalyzeArgs, CliArgs, Commands, ComponentsArgs, FixArgs, TfmArgs, VersionsArgs};
pub use output::{OutputFormat, OutputFormatter};
