use dotport_core::{CancellationSource, CancellationToken, MockFileSystem};
use dotport_msbuild::MsBuildProject;
use dotport_nuget::{DirectReferenceIdentifier, LockFileTransitiveIdentifier, NuGetError};
use dotport_stack::{ComponentIdentifier, CompositeComponentIdentifier, ProjectComponents};
use proptest::prelude::*;
use std::path::Path;
use std::sync::Arc;

const WINUI_ASSETS: &str = r#"{
  "version": 3,
  "targets": {
    "net6.0-windows10.0.19041.0": {
      "Microsoft.WindowsAppSDK/1.4.0": {
        "type": "package",
        "dependencies": { "Microsoft.Windows.SDK.BuildTools": "10.0.22621.756" }
      },
      "Microsoft.Windows.SDK.BuildTools/10.0.22621.756": { "type": "package" },
      "Microsoft.Windows.CsWinRT/2.0.4": { "type": "package" }
    }
  },
  "projectFileDependencyGroups": {
    "net6.0-windows10.0.19041.0": [ "Microsoft.WindowsAppSDK >= 1.4.0", "Microsoft.Windows.CsWinRT >= 2.0.4" ]
  }
}"#;

fn parse(xml: &str) -> MsBuildProject {
    MsBuildProject::parse(Path::new("/src/App/App.csproj"), xml).unwrap()
}

fn composite() -> CompositeComponentIdentifier {
    CompositeComponentIdentifier::with_defaults(Arc::new(DirectReferenceIdentifier))
}

#[tokio::test]
async fn test_wpf_desktop_sdk_project() {
    let project = parse(
        r#"<Project Sdk="Microsoft.NET.Sdk.WindowsDesktop">
  <PropertyGroup>
    <TargetFramework>netcoreapp3.1</TargetFramework>
    <UseWPF>true</UseWPF>
  </PropertyGroup>
</Project>"#,
    );

    let components = composite()
        .get_components(&project, &CancellationToken::none())
        .await
        .unwrap();
    assert_eq!(components, ProjectComponents::WPF | ProjectComponents::WINDOWS_DESKTOP);
}

#[tokio::test]
async fn test_plain_legacy_project_has_no_components() {
    let project = parse(
        r#"<Project ToolsVersion="15.0">
  <PropertyGroup><TargetFrameworkVersion>v4.7.2</TargetFrameworkVersion></PropertyGroup>
  <ItemGroup>
    <Reference Include="System" />
    <Reference Include="System.Core" />
  </ItemGroup>
</Project>"#,
    );

    let components = composite()
        .get_components(&project, &CancellationToken::none())
        .await
        .unwrap();
    assert_eq!(components, ProjectComponents::empty());
    assert_eq!(components.to_string(), "None");
}

#[tokio::test]
async fn test_winui_from_lock_file() {
    let fs = Arc::new(MockFileSystem::new());
    fs.add_file(
        "App/App.csproj",
        r#"<Project Sdk="Microsoft.NET.Sdk">
  <PropertyGroup><TargetFramework>net6.0-windows10.0.19041.0</TargetFramework></PropertyGroup>
  <ItemGroup><PackageReference Include="Microsoft.WindowsAppSDK" Version="1.4.0" /></ItemGroup>
</Project>"#,
    );
    fs.add_file("App/obj/project.assets.json", WINUI_ASSETS);
    let project = MsBuildProject::load(fs.as_ref(), Path::new("/mock/App/App.csproj")).unwrap();

    let identifier =
        CompositeComponentIdentifier::with_defaults(Arc::new(LockFileTransitiveIdentifier::new(fs)));
    let components = identifier
        .get_components(&project, &CancellationToken::none())
        .await
        .unwrap();
    assert_eq!(components, ProjectComponents::WIN_UI | ProjectComponents::WIN_RT);
}

#[tokio::test]
async fn test_sdk_project_without_restore() {
    let fs = Arc::new(MockFileSystem::new());
    fs.add_file(
        "App/App.csproj",
        r#"<Project Sdk="Microsoft.NET.Sdk"><PropertyGroup><TargetFramework>net6.0</TargetFramework></PropertyGroup></Project>"#,
    );
    let project = MsBuildProject::load(fs.as_ref(), Path::new("/mock/App/App.csproj")).unwrap();

    let identifier =
        CompositeComponentIdentifier::with_defaults(Arc::new(LockFileTransitiveIdentifier::new(fs)));
    let err = identifier
        .get_components(&project, &CancellationToken::none())
        .await
        .unwrap_err();
    assert!(matches!(err, NuGetError::RestoreRequired { .. }));
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let source = CancellationSource::new();
    source.cancel();
    let project = parse(r#"<Project Sdk="Microsoft.NET.Sdk.Web" />"#);

    let err = composite()
        .get_components(&project, &source.token())
        .await
        .unwrap_err();
    assert!(matches!(err, NuGetError::Cancelled));
}

const PROPERTIES: &[&str] = &[
    "<UseWPF>true</UseWPF>",
    "<UseWindowsForms>true</UseWindowsForms>",
    "<UseWinUI>true</UseWinUI>",
    "<UseMaui>true</UseMaui>",
    "<OutputType>WinExe</OutputType>",
];

const ITEMS: &[&str] = &[
    r#"<Reference Include="System.Web" />"#,
    r#"<Reference Include="PresentationCore" />"#,
    r#"<Reference Include="System.ServiceModel" />"#,
    r#"<FrameworkReference Include="Microsoft.AspNetCore.App" />"#,
    r#"<PackageReference Include="Microsoft.Windows.SDK.Contracts" Version="10.0.19041.1" />"#,
    r#"<PackageReference Include="Microsoft.WindowsAppSDK" Version="1.4.0" />"#,
];

const SDKS: &[Option<&str>] = &[
    None,
    Some("Microsoft.NET.Sdk"),
    Some("Microsoft.NET.Sdk.Web"),
    Some("Microsoft.NET.Sdk.WindowsDesktop"),
];

fn project_xml(sdk: Option<&str>, properties: &[bool], items: &[bool]) -> String {
    let properties: String = PROPERTIES
        .iter()
        .zip(properties)
        .filter(|(_, on)| **on)
        .map(|(p, _)| *p)
        .collect();
    let items: String = ITEMS
        .iter()
        .zip(items)
        .filter(|(_, on)| **on)
        .map(|(i, _)| *i)
        .collect();
    let sdk = sdk.map(|s| format!(r#" Sdk="{}""#, s)).unwrap_or_default();
    format!(
        "<Project{}><PropertyGroup><TargetFramework>net6.0</TargetFramework>{}</PropertyGroup><ItemGroup>{}</ItemGroup></Project>",
        sdk, properties, items
    )
}

fn identify(identifier: &CompositeComponentIdentifier, project: &MsBuildProject) -> ProjectComponents {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(identifier.get_components(project, &CancellationToken::none()))
        .unwrap()
}

proptest! {
    #[test]
    fn identification_is_idempotent_and_order_independent(
        sdk in 0..SDKS.len(),
        properties in proptest::collection::vec(any::<bool>(), PROPERTIES.len()),
        items in proptest::collection::vec(any::<bool>(), ITEMS.len()),
        rotation in 0usize..4,
    ) {
        let project = parse(&project_xml(SDKS[sdk], &properties, &items));

        let forward = composite();
        let first = identify(&forward, &project);
        let second = identify(&forward, &project);
        prop_assert_eq!(first, second);

        let mut identifiers = forward.identifiers().to_vec();
        identifiers.rotate_left(rotation);
        identifiers.reverse();
        let shuffled = CompositeComponentIdentifier::new(identifiers);
        prop_assert_eq!(identify(&shuffled, &project), first);
    }

    #[test]
    fn desktop_technologies_imply_windows_desktop(
        sdk in 0..SDKS.len(),
        properties in proptest::collection::vec(any::<bool>(), PROPERTIES.len()),
        items in proptest::collection::vec(any::<bool>(), ITEMS.len()),
    ) {
        let project = parse(&project_xml(SDKS[sdk], &properties, &items));
        let components = identify(&composite(), &project);
        if components.intersects(ProjectComponents::WPF | ProjectComponents::WIN_FORMS) {
            prop_assert!(components.contains(ProjectComponents::WINDOWS_DESKTOP));
        }
    }
}
