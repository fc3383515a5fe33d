use super::ComponentIdentifier;
use crate::components::ProjectComponents;
use async_trait::async_trait;
use dotport_core::CancellationToken;
use dotport_msbuild::ProjectFile;
use dotport_nuget::{NuGetError, TransitiveDependencyIdentifier};
use std::sync::Arc;
use tracing::debug;

const WINUI_PACKAGES: &[&str] = &[
    "Microsoft.NETCore.UniversalWindowsPlatform",
    "Microsoft.WindowsAppSDK",
    "Microsoft.ProjectReunion",
];

/// WinUI detection for UWP and Windows App SDK projects.
pub struct WindowsComponentIdentifier {
    transitive: Arc<dyn TransitiveDependencyIdentifier>,
}

impl WindowsComponentIdentifier {
    pub fn new(transitive: Arc<dyn TransitiveDependencyIdentifier>) -> Self {
        Self { transitive }
    }
}

#[async_trait]
impl ComponentIdentifier for WindowsComponentIdentifier {
    fn name(&self) -> &'static str {
        "windows"
    }

    async fn get_components(
        &self,
        project: &dyn ProjectFile,
        token: &CancellationToken,
    ) -> Result<ProjectComponents, NuGetError> {
        if project.property_is_true("UseWinUI") {
            return Ok(ProjectComponents::WIN_UI);
        }

        for package in WINUI_PACKAGES {
            if self
                .transitive
                .is_transitively_available(project, package, token)
                .await?
            {
                debug!(project = %project.file_path().display(), package, "WinUI package found");
                return Ok(ProjectComponents::WIN_UI);
            }
        }

        Ok(ProjectComponents::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dotport_msbuild::MsBuildProject;
    use dotport_nuget::DirectReferenceIdentifier;
    use std::path::Path;

    fn identifier() -> WindowsComponentIdentifier {
        WindowsComponentIdentifier::new(Arc::new(DirectReferenceIdentifier))
    }

    #[tokio::test]
    async fn test_use_winui_property() {
        let project = MsBuildProject::parse(
            Path::new("/src/App/App.csproj"),
            r#"<Project Sdk="Microsoft.NET.Sdk"><PropertyGroup><UseWinUI>true</UseWinUI></PropertyGroup></Project>"#,
        )
        .unwrap();
        let components = identifier()
            .get_components(&project, &CancellationToken::none())
            .await
            .unwrap();
        assert_eq!(components, ProjectComponents::WIN_UI);
    }

    #[tokio::test]
    async fn test_uwp_package() {
        let project = MsBuildProject::parse(
            Path::new("/src/Uwp/Uwp.csproj"),
            r#"<Project><ItemGroup><PackageReference Include="Microsoft.NETCore.UniversalWindowsPlatform" Version="6.2.12" /></ItemGroup></Project>"#,
        )
        .unwrap();
        let components = identifier()
            .get_components(&project, &CancellationToken::none())
            .await
            .unwrap();
        assert_eq!(components, ProjectComponents::WIN_UI);
    }

    #[tokio::test]
    async fn test_plain_project() {
        let project = MsBuildProject::parse(
            Path::new("/src/Lib/Lib.csproj"),
            r#"<Project Sdk="Microsoft.NET.Sdk" />"#,
        )
        .unwrap();
        let components = identifier()
            .get_components(&project, &CancellationToken::none())
            .await
            .unwrap();
        assert!(components.is_empty());
    }
}
