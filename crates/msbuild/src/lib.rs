//! Static reading of MSBuild project files, solutions and target framework monikers.

pub mod error;
pub mod graph;
pub mod msbuild_project;
pub mod project;
pub mod reference;
pub mod solution;
pub mod tfm;

pub use error::ProjectError;
pub use graph::ProjectGraph;
pub use msbuild_project::{normalize_path, MsBuildProject};
pub use project::{ProjectFile, ProjectOutputType};
pub use reference::{FrameworkReference, NuGetReference, Reference};
pub use solution::{Solution, SolutionProject};
pub use tfm::{DefaultCompatibilityProvider, FrameworkFamily, TargetFrameworkMoniker, TfmVersion};
