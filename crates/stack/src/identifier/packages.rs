use super::ComponentIdentifier;
use crate::components::ProjectComponents;
use async_trait::async_trait;
use dotport_core::CancellationToken;
use dotport_msbuild::ProjectFile;
use dotport_nuget::{NuGetError, TransitiveDependencyIdentifier};
use std::sync::Arc;

const WINRT_PACKAGES: &[&str] = &["Microsoft.Windows.SDK.Contracts", "Microsoft.Windows.CsWinRT"];
const XAMARIN_ANDROID_PACKAGE_PREFIX: &str = "xamarin.android";

/// Package-driven components, checked against the transitive closure for
/// SDK-style and old-style projects alike.
pub struct PackageComponentIdentifier {
    transitive: Arc<dyn TransitiveDependencyIdentifier>,
}

impl PackageComponentIdentifier {
    pub fn new(transitive: Arc<dyn TransitiveDependencyIdentifier>) -> Self {
        Self { transitive }
    }
}

#[async_trait]
impl ComponentIdentifier for PackageComponentIdentifier {
    fn name(&self) -> &'static str {
        "packages"
    }

    async fn get_components(
        &self,
        project: &dyn ProjectFile,
        token: &CancellationToken,
    ) -> Result<ProjectComponents, NuGetError> {
        let packages = self
            .transitive
            .transitive_package_references(project, token)
            .await?;

        let mut components = ProjectComponents::empty();
        if packages
            .iter()
            .any(|p| WINRT_PACKAGES.iter().any(|name| p.matches(name)))
        {
            components |= ProjectComponents::WIN_RT;
        }
        if packages
            .iter()
            .any(|p| p.name.to_lowercase().starts_with(XAMARIN_ANDROID_PACKAGE_PREFIX))
        {
            components |= ProjectComponents::XAMARIN_ANDROID;
        }
        Ok(components)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dotport_msbuild::MsBuildProject;
    use dotport_nuget::DirectReferenceIdentifier;
    use std::path::Path;

    fn with_packages(packages: &[&str]) -> MsBuildProject {
        let items: String = packages
            .iter()
            .map(|p| format!(r#"<PackageReference Include="{}" Version="1.0.0" />"#, p))
            .collect();
        let xml = format!(
            r#"<Project Sdk="Microsoft.NET.Sdk"><ItemGroup>{}</ItemGroup></Project>"#,
            items
        );
        MsBuildProject::parse(Path::new("/src/App/App.csproj"), &xml).unwrap()
    }

    async fn identify(packages: &[&str]) -> ProjectComponents {
        PackageComponentIdentifier::new(Arc::new(DirectReferenceIdentifier))
            .get_components(&with_packages(packages), &CancellationToken::none())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_winrt_contracts() {
        assert_eq!(
            identify(&["Microsoft.Windows.SDK.Contracts"]).await,
            ProjectComponents::WIN_RT
        );
    }

    #[tokio::test]
    async fn test_xamarin_android_packages() {
        assert_eq!(
            identify(&["Xamarin.AndroidX.AppCompat"]).await,
            ProjectComponents::XAMARIN_ANDROID
        );
    }

    #[tokio::test]
    async fn test_unrelated_packages() {
        assert_eq!(identify(&["Newtonsoft.Json", "Serilog"]).await, ProjectComponents::empty());
    }
}
