use super::{references_any, ComponentIdentifier};
use crate::components::ProjectComponents;
use async_trait::async_trait;
use dotport_core::CancellationToken;
use dotport_msbuild::ProjectFile;
use dotport_nuget::NuGetError;

const WEB_APPLICATION_TARGETS: &str = "Microsoft.WebApplication.targets";
const WINFORMS_REFERENCES: &[&str] = &["System.Windows.Forms", "System.Windows.Forms.DataVisualization"];
const WPF_REFERENCES: &[&str] = &["System.Xaml", "PresentationCore", "PresentationFramework", "WindowsBase"];
const WCF_PREFIX: &str = "System.ServiceModel";
const XAMARIN_ANDROID_REFERENCES: &[&str] = &["Mono.Android"];
const XAMARIN_IOS_REFERENCES: &[&str] = &["Xamarin.iOS"];

/// Assembly references and imports. Runs for every project, since SDK-style
/// projects can still carry `<Reference>` items.
pub struct OldStyleComponentIdentifier;

impl OldStyleComponentIdentifier {
    pub fn identify(project: &dyn ProjectFile) -> ProjectComponents {
        let mut components = ProjectComponents::empty();

        let web_import = project.imports().iter().any(|import| {
            import
                .to_lowercase()
                .ends_with(&WEB_APPLICATION_TARGETS.to_lowercase())
        });
        let web_reference = project
            .references()
            .iter()
            .any(|r| has_prefix(&r.name, "System.Web"));
        if web_import || web_reference {
            components |= ProjectComponents::ASP_NET;
        }

        if references_any(project, WINFORMS_REFERENCES) {
            components |= ProjectComponents::WIN_FORMS | ProjectComponents::WINDOWS_DESKTOP;
        }

        if references_any(project, WPF_REFERENCES) {
            components |= ProjectComponents::WPF | ProjectComponents::WINDOWS_DESKTOP;
        }

        if project
            .references()
            .iter()
            .any(|r| has_prefix(&r.name, WCF_PREFIX))
        {
            components |= ProjectComponents::WCF;
        }

        if references_any(project, XAMARIN_ANDROID_REFERENCES) {
            components |= ProjectComponents::XAMARIN_ANDROID;
        }

        if references_any(project, XAMARIN_IOS_REFERENCES) {
            components |= ProjectComponents::XAMARIN_IOS;
        }

        components
    }
}

/// Case-insensitive dotted-name prefix: `System.Web` matches `System.Web`
/// and `System.Web.Mvc`, not `System.WebSockets`.
fn has_prefix(name: &str, prefix: &str) -> bool {
    let name = name.to_lowercase();
    let prefix = prefix.to_lowercase();
    name == prefix || name.starts_with(&format!("{}.", prefix))
}

#[async_trait]
impl ComponentIdentifier for OldStyleComponentIdentifier {
    fn name(&self) -> &'static str {
        "old-style"
    }

    async fn get_components(
        &self,
        project: &dyn ProjectFile,
        token: &CancellationToken,
    ) -> Result<ProjectComponents, NuGetError> {
        token.check()?;
        Ok(Self::identify(project))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dotport_msbuild::MsBuildProject;
    use std::path::Path;
    use yare::parameterized;

    fn legacy(items: &str) -> MsBuildProject {
        let xml = format!(
            r#"<Project ToolsVersion="15.0" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <PropertyGroup><TargetFrameworkVersion>v4.7.2</TargetFrameworkVersion></PropertyGroup>
  {}
</Project>"#,
            items
        );
        MsBuildProject::parse(Path::new("/src/Legacy/Legacy.csproj"), &xml).unwrap()
    }

    #[parameterized(
        nothing = { "", ProjectComponents::empty() },
        system_web = {
            r#"<ItemGroup><Reference Include="System.Web" /></ItemGroup>"#,
            ProjectComponents::ASP_NET
        },
        mvc = {
            r#"<ItemGroup><Reference Include="System.Web.Mvc, Version=5.2.7.0" /></ItemGroup>"#,
            ProjectComponents::ASP_NET
        },
        web_import = {
            r#"<Import Project="$(VSToolsPath)\WebApplications\Microsoft.WebApplication.targets" />"#,
            ProjectComponents::ASP_NET
        },
        websockets_is_not_web = {
            r#"<ItemGroup><Reference Include="System.WebSockets" /></ItemGroup>"#,
            ProjectComponents::empty()
        },
        winforms = {
            r#"<ItemGroup><Reference Include="System.Windows.Forms" /></ItemGroup>"#,
            ProjectComponents::WIN_FORMS | ProjectComponents::WINDOWS_DESKTOP
        },
        wpf = {
            r#"<ItemGroup><Reference Include="PresentationFramework" /><Reference Include="WindowsBase" /></ItemGroup>"#,
            ProjectComponents::WPF | ProjectComponents::WINDOWS_DESKTOP
        },
        wcf = {
            r#"<ItemGroup><Reference Include="System.ServiceModel.Web" /></ItemGroup>"#,
            ProjectComponents::WCF
        },
        xamarin_android = {
            r#"<ItemGroup><Reference Include="Mono.Android" /></ItemGroup>"#,
            ProjectComponents::XAMARIN_ANDROID
        },
    )]
    fn test_identify(items: &str, expected: ProjectComponents) {
        assert_eq!(OldStyleComponentIdentifier::identify(&legacy(items)), expected);
    }

    #[tokio::test]
    async fn test_mixed_references_are_unioned() {
        let project = legacy(
            r#"<ItemGroup>
    <Reference Include="System.Web" />
    <Reference Include="System.Windows.Forms" />
  </ItemGroup>"#,
        );
        let components = OldStyleComponentIdentifier
            .get_components(&project, &CancellationToken::none())
            .await
            .unwrap();
        assert_eq!(
            components,
            ProjectComponents::ASP_NET | ProjectComponents::WIN_FORMS | ProjectComponents::WINDOWS_DESKTOP
        );
    }
}
