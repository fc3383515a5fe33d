use super::{framework_references_any, ComponentIdentifier};
use crate::components::ProjectComponents;
use async_trait::async_trait;
use dotport_core::CancellationToken;
use dotport_msbuild::ProjectFile;
use dotport_nuget::NuGetError;

const WEB_SDK: &str = "Microsoft.NET.Sdk.Web";
const DESKTOP_SDK: &str = "Microsoft.NET.Sdk.WindowsDesktop";

const WEB_FRAMEWORK_REFERENCES: &[&str] = &["Microsoft.AspNetCore.App"];
const DESKTOP_FRAMEWORK_REFERENCES: &[&str] = &["Microsoft.WindowsDesktop.App"];
const WINFORMS_FRAMEWORK_REFERENCES: &[&str] = &["Microsoft.WindowsDesktop.App.WindowsForms"];
const WPF_FRAMEWORK_REFERENCES: &[&str] = &["Microsoft.WindowsDesktop.App.WPF"];

/// SDK names, `UseWPF`/`UseWindowsForms`/`UseMaui` and framework references.
/// Non-SDK projects get nothing from this identifier.
pub struct SdkStyleComponentIdentifier;

impl SdkStyleComponentIdentifier {
    pub fn identify(project: &dyn ProjectFile) -> ProjectComponents {
        let mut components = ProjectComponents::empty();
        if !project.is_sdk() {
            return components;
        }

        if project.has_sdk(WEB_SDK) || framework_references_any(project, WEB_FRAMEWORK_REFERENCES) {
            components |= ProjectComponents::ASP_NET_CORE;
        }

        if project.has_sdk(DESKTOP_SDK) || framework_references_any(project, DESKTOP_FRAMEWORK_REFERENCES) {
            components |= ProjectComponents::WINDOWS_DESKTOP;
        }

        if project.property_is_true("UseWPF") || framework_references_any(project, WPF_FRAMEWORK_REFERENCES) {
            components |= ProjectComponents::WPF | ProjectComponents::WINDOWS_DESKTOP;
        }

        if project.property_is_true("UseWindowsForms")
            || framework_references_any(project, WINFORMS_FRAMEWORK_REFERENCES)
        {
            components |= ProjectComponents::WIN_FORMS | ProjectComponents::WINDOWS_DESKTOP;
        }

        if project.property_is_true("UseMaui") {
            components |= ProjectComponents::MAUI;
        }

        components
    }
}

#[async_trait]
impl ComponentIdentifier for SdkStyleComponentIdentifier {
    fn name(&self) -> &'static str {
        "sdk-style"
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
