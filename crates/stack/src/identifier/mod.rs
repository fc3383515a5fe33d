//! Component identification.
//!
//! Each identifier is an independent rule set that reads a project and
//! returns the components it recognizes. [`CompositeComponentIdentifier`]
//! ORs the results, so identifier order never changes the outcome.

mod old_style;
mod packages;
mod sdk_style;
mod windows;

pub use old_style::OldStyleComponentIdentifier;
pub use packages::PackageComponentIdentifier;
pub use sdk_style::SdkStyleComponentIdentifier;
pub use windows::WindowsComponentIdentifier;

use crate::components::ProjectComponents;
use async_trait::async_trait;
use dotport_core::CancellationToken;
use dotport_msbuild::ProjectFile;
use dotport_nuget::{NuGetError, TransitiveDependencyIdentifier};
use std::sync::Arc;
use tracing::debug;

#[async_trait]
pub trait ComponentIdentifier: Send + Sync {
    fn name(&self) -> &'static str;

    /// Components this identifier recognizes. Must not mutate the project.
    async fn get_components(
        &self,
        project: &dyn ProjectFile,
        token: &CancellationToken,
    ) -> Result<ProjectComponents, NuGetError>;
}

pub struct CompositeComponentIdentifier {
    identifiers: Vec<Arc<dyn ComponentIdentifier>>,
}

impl CompositeComponentIdentifier {
    pub fn new(identifiers: Vec<Arc<dyn ComponentIdentifier>>) -> Self {
        Self { identifiers }
    }

    /// Old-style, SDK-style, package and Windows identifiers. The last two
    /// query `transitive` for the project's package closure.
    pub fn with_defaults(transitive: Arc<dyn TransitiveDependencyIdentifier>) -> Self {
        Self::new(vec![
            Arc::new(OldStyleComponentIdentifier),
            Arc::new(SdkStyleComponentIdentifier),
            Arc::new(PackageComponentIdentifier::new(transitive.clone())),
            Arc::new(WindowsComponentIdentifier::new(transitive)),
        ])
    }

    pub fn identifiers(&self) -> &[Arc<dyn ComponentIdentifier>] {
        &self.identifiers
    }
}

#[async_trait]
impl ComponentIdentifier for CompositeComponentIdentifier {
    fn name(&self) -> &'static str {
        "composite"
    }

    async fn get_components(
        &self,
        project: &dyn ProjectFile,
        token: &CancellationToken,
    ) -> Result<ProjectComponents, NuGetError> {
        let mut components = ProjectComponents::empty();
        for identifier in &self.identifiers {
            token.check()?;
            let found = identifier.get_components(project, token).await?;
            debug!(
                project = %project.file_path().display(),
                identifier = identifier.name(),
                components = %found,
                "Identified components"
            );
            components |= found;
        }
        Ok(components)
    }
}

pub(crate) fn references_any(project: &dyn ProjectFile, names: &[&str]) -> bool {
    project
        .references()
        .iter()
        .any(|r| names.iter().any(|n| r.matches(n)))
}

pub(crate) fn framework_references_any(project: &dyn ProjectFile, names: &[&str]) -> bool {
    project
        .framework_references()
        .iter()
        .any(|r| names.iter().any(|n| r.matches(n)))
}
