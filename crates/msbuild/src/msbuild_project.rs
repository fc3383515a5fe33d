use crate::error::ProjectError;
use crate::project::{ProjectFile, ProjectOutputType};
use crate::reference::{FrameworkReference, NuGetReference, Reference};
use crate::tfm::TargetFrameworkMoniker;
use dotport_core::FileSystem;
use roxmltree::{Document, Node};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

const PACKAGES_CONFIG: &str = "packages.config";
const LOCK_FILE_NAME: &str = "project.assets.json";

/// A project file read statically with roxmltree.
///
/// Only unconditional properties are evaluated; `$(Name)` references to
/// earlier properties are substituted in document order.
#[derive(Debug, Clone)]
pub struct MsBuildProject {
    path: PathBuf,
    sdk_style: bool,
    sdks: Vec<String>,
    properties: BTreeMap<String, String>,
    imports: Vec<String>,
    references: Vec<Reference>,
    package_references: Vec<NuGetReference>,
    framework_references: Vec<FrameworkReference>,
    target_frameworks: Vec<TargetFrameworkMoniker>,
    project_references: Vec<PathBuf>,
    output_type: ProjectOutputType,
    has_package_reference_items: bool,
}

impl MsBuildProject {
    /// Reads the project and, for old-style projects, a sibling `packages.config`.
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Result<Self, ProjectError> {
        let content = fs.read_to_string(path).map_err(|e| ProjectError::Read {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?;

        let mut project = Self::parse(path, &content)?;

        if !project.sdk_style {
            let packages_config = project.directory().join(PACKAGES_CONFIG);
            if fs.is_file(&packages_config) {
                let content = fs
                    .read_to_string(&packages_config)
                    .map_err(|e| ProjectError::Read {
                        path: packages_config.clone(),
                        details: e.to_string(),
                    })?;
                let packages = parse_packages_config(&packages_config, &content)?;
                debug!(
                    project = %path.display(),
                    count = packages.len(),
                    "Loaded packages.config"
                );
                for package in packages {
                    if !project.package_references.iter().any(|p| p.matches(&package.name)) {
                        project.package_references.push(package);
                    }
                }
            }
        }

        Ok(project)
    }

    /// Parses project XML without touching the file system.
    pub fn parse(path: &Path, content: &str) -> Result<Self, ProjectError> {
        let doc = Document::parse(content).map_err(|e| ProjectError::Xml {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?;

        let root = doc.root_element();
        if !root.has_tag_name("Project") {
            return Err(ProjectError::Xml {
                path: path.to_path_buf(),
                details: format!("expected <Project> root, found <{}>", root.tag_name().name()),
            });
        }

        let mut project = Self {
            path: path.to_path_buf(),
            sdk_style: false,
            sdks: Vec::new(),
            properties: builtin_properties(path),
            imports: Vec::new(),
            references: Vec::new(),
            package_references: Vec::new(),
            framework_references: Vec::new(),
            target_frameworks: Vec::new(),
            project_references: Vec::new(),
            output_type: ProjectOutputType::Library,
            has_package_reference_items: false,
        };

        if let Some(sdk) = root.attribute("Sdk") {
            project.add_sdks(sdk);
        }

        for child in root.children().filter(Node::is_element) {
            match child.tag_name().name() {
                "Sdk" => {
                    if let Some(name) = child.attribute("Name") {
                        project.add_sdks(name);
                    }
                }
                "Import" => project.read_import(child),
                "PropertyGroup" => {
                    if child.attribute("Condition").is_none() {
                        project.read_property_group(child);
                    }
                }
                "ItemGroup" => project.read_item_group(child),
                _ => {}
            }
        }

        project.output_type =
            ProjectOutputType::from_property(project.property("OutputType").as_deref());
        project.target_frameworks = project.read_target_frameworks();

        debug!(
            project = %path.display(),
            sdk_style = project.sdk_style,
            tfms = ?project.target_frameworks.iter().map(|t| t.name()).collect::<Vec<_>>(),
            "Parsed project"
        );

        Ok(project)
    }

    pub fn directory(&self) -> PathBuf {
        self.path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    fn add_sdks(&mut self, value: &str) {
        for sdk in value.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            // `Microsoft.NET.Sdk/6.0.100` pins a version; only the name matters here
            let name = sdk.split('/').next().unwrap_or(sdk).to_string();
            if !self.sdks.iter().any(|s| s.eq_ignore_ascii_case(&name)) {
                self.sdks.push(name);
            }
            self.sdk_style = true;
        }
    }

    fn read_import(&mut self, node: Node) {
        if let Some(sdk) = node.attribute("Sdk") {
            self.add_sdks(sdk);
        }
        if let Some(project) = node.attribute("Project") {
            self.imports.push(self.expand(project));
        }
    }

    fn read_property_group(&mut self, group: Node) {
        for property in group.children().filter(Node::is_element) {
            if property.attribute("Condition").is_some() {
                continue;
            }
            let raw = property.text().unwrap_or("").trim();
            let value = self.expand(raw);
            self.properties
                .insert(property.tag_name().name().to_lowercase(), value);
        }
    }

    fn read_item_group(&mut self, group: Node) {
        for item in group.children().filter(Node::is_element) {
            let include = item
                .attribute("Include")
                .or_else(|| item.attribute("Update"))
                .map(|v| self.expand(v));
            let Some(include) = include else {
                continue;
            };

            match item.tag_name().name() {
                "Reference" => {
                    let hint_path = child_text(item, "HintPath").map(|h| self.expand(&h));
                    self.references
                        .push(Reference::from_include(&include, hint_path));
                }
                "PackageReference" => {
                    let version = item
                        .attribute("Version")
                        .map(str::to_string)
                        .or_else(|| child_text(item, "Version"))
                        .map(|v| self.expand(&v))
                        .unwrap_or_default();
                    self.package_references
                        .push(NuGetReference::new(include, version));
                    self.has_package_reference_items = true;
                }
                "FrameworkReference" => {
                    self.framework_references
                        .push(FrameworkReference::new(include));
                }
                "ProjectReference" => {
                    let resolved = resolve_relative(&self.directory(), &include);
                    self.project_references.push(resolved);
                }
                _ => {}
            }
        }
    }

    fn read_target_frameworks(&self) -> Vec<TargetFrameworkMoniker> {
        let mut tfms = Vec::new();

        if let Some(value) = self.property("TargetFrameworks") {
            for name in value.split(';').map(str::trim).filter(|s| !s.is_empty()) {
                match TargetFrameworkMoniker::parse(name) {
                    Ok(tfm) => push_unique(&mut tfms, tfm),
                    Err(e) => warn!(project = %self.path.display(), "{}", e),
                }
            }
        }

        if let Some(value) = self.property("TargetFramework") {
            if !value.is_empty() {
                match TargetFrameworkMoniker::parse(&value) {
                    Ok(tfm) => push_unique(&mut tfms, tfm),
                    Err(e) => warn!(project = %self.path.display(), "{}", e),
                }
            }
        }

        if tfms.is_empty() {
            if let Some(value) = self.property("TargetFrameworkVersion") {
                match TargetFrameworkMoniker::from_framework_version(&value) {
                    Ok(tfm) => push_unique(&mut tfms, tfm),
                    Err(e) => warn!(project = %self.path.display(), "{}", e),
                }
            }
        }

        tfms
    }

    /// Substitutes `$(Name)` with known property values. Unknown names expand
    /// to the empty string, as MSBuild does.
    fn expand(&self, value: &str) -> String {
        let mut result = String::with_capacity(value.len());
        let mut rest = value;
        while let Some(start) = rest.find("$(") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find(')') {
                Some(end) => {
                    let name = after[..end].trim();
                    if let Some(v) = self.properties.get(&name.to_lowercase()) {
                        result.push_str(v);
                    }
                    rest = &after[end + 1..];
                }
                None => {
                    result.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        result.push_str(rest);
        result
    }
}

impl ProjectFile for MsBuildProject {
    fn file_path(&self) -> &Path {
        &self.path
    }

    fn is_sdk(&self) -> bool {
        self.sdk_style
    }

    fn sdks(&self) -> &[String] {
        &self.sdks
    }

    fn property(&self, name: &str) -> Option<String> {
        self.properties.get(&name.to_lowercase()).cloned()
    }

    fn imports(&self) -> &[String] {
        &self.imports
    }

    fn references(&self) -> &[Reference] {
        &self.references
    }

    fn package_references(&self) -> &[NuGetReference] {
        &self.package_references
    }

    fn framework_references(&self) -> &[FrameworkReference] {
        &self.framework_references
    }

    fn output_type(&self) -> ProjectOutputType {
        self.output_type
    }

    fn target_frameworks(&self) -> &[TargetFrameworkMoniker] {
        &self.target_frameworks
    }

    fn project_references(&self) -> &[PathBuf] {
        &self.project_references
    }

    /// An explicit `RestoreProjectStyle` wins; otherwise SDK-style projects
    /// and projects with `<PackageReference>` items restore to a lock file.
    fn uses_package_references(&self) -> bool {
        match self.property("RestoreProjectStyle").as_deref().map(str::trim) {
            Some(style) if style.eq_ignore_ascii_case("PackageReference") => true,
            Some(style) if style.eq_ignore_ascii_case("PackagesConfig") => false,
            _ => self.sdk_style || self.has_package_reference_items,
        }
    }

    fn lock_file_path(&self) -> PathBuf {
        if let Some(assets) = self.property("ProjectAssetsFile").filter(|v| !v.is_empty()) {
            return resolve_relative(&self.directory(), &assets);
        }
        let extensions = self
            .property("MSBuildProjectExtensionsPath")
            .or_else(|| self.property("BaseIntermediateOutputPath"))
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "obj".to_string());
        resolve_relative(&self.directory(), &extensions).join(LOCK_FILE_NAME)
    }
}

fn push_unique(tfms: &mut Vec<TargetFrameworkMoniker>, tfm: TargetFrameworkMoniker) {
    if !tfms.contains(&tfm) {
        tfms.push(tfm);
    }
}

fn builtin_properties(path: &Path) -> BTreeMap<String, String> {
    let mut properties = BTreeMap::new();
    let directory = path
        .parent()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_default();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    properties.insert("msbuildprojectdirectory".to_string(), directory.clone());
    properties.insert("msbuildthisfiledirectory".to_string(), format!("{}/", directory));
    properties.insert("msbuildprojectfile".to_string(), file_name);
    properties.insert("msbuildprojectname".to_string(), stem);
    properties
}

fn child_text(node: Node, name: &str) -> Option<String> {
    node.children()
        .find(|c| c.has_tag_name(name))
        .and_then(|c| c.text())
        .map(|t| t.trim().to_string())
}

/// Joins an MSBuild path (which may use `\`) onto `base` and folds `.` and `..`
/// lexically.
pub fn resolve_relative(base: &Path, relative: &str) -> PathBuf {
    let normalized = relative.replace('\\', "/");
    if Path::new(&normalized).is_absolute() {
        normalize_path(Path::new(&normalized))
    } else {
        normalize_path(&base.join(&normalized))
    }
}

/// Folds `.` and `..` components without touching the file system.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match result.components().next_back() {
                Some(Component::Normal(_)) => {
                    result.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => result.push(".."),
            },
            other => result.push(other.as_os_str()),
        }
    }
    result
}

fn parse_packages_config(path: &Path, content: &str) -> Result<Vec<NuGetReference>, ProjectError> {
    let doc = Document::parse(content).map_err(|e| ProjectError::Xml {
        path: path.to_path_buf(),
        details: e.to_string(),
    })?;

    Ok(doc
        .descendants()
        .filter(|n| n.has_tag_name("package"))
        .filter_map(|n| {
            let id = n.attribute("id")?;
            let version = n.attribute("version").unwrap_or_default();
            Some(NuGetReference::new(id, version))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dotport_core::MockFileSystem;

    const SDK_WEB: &str = r#"<Project Sdk="Microsoft.NET.Sdk.Web">
  <PropertyGroup>
    <TargetFramework>net6.0</TargetFramework>
    <RootNamespace>$(MSBuildProjectName).Web</RootNamespace>
  </PropertyGroup>
  <ItemGroup>
    <PackageReference Include="Serilog" Version="2.12.0" />
    <PackageReference Include="Polly">
      <Version>7.2.3</Version>
    </PackageReference>
    <FrameworkReference Include="Microsoft.AspNetCore.App" />
    <ProjectReference Include="..\Lib\Lib.csproj" />
  </ItemGroup>
</Project>"#;

    const OLD_STYLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Project ToolsVersion="15.0" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <PropertyGroup>
    <OutputType>WinExe</OutputType>
    <TargetFrameworkVersion>v4.7.2</TargetFrameworkVersion>
  </PropertyGroup>
  <PropertyGroup Condition=" '$(Configuration)|$(Platform)' == 'Debug|AnyCPU' ">
    <OutputPath>bin\Debug\</OutputPath>
  </PropertyGroup>
  <ItemGroup>
    <Reference Include="System.Windows.Forms" />
    <Reference Include="Newtonsoft.Json, Version=13.0.0.0, Culture=neutral">
      <HintPath>..\packages\Newtonsoft.Json.13.0.1\lib\net45\Newtonsoft.Json.dll</HintPath>
    </Reference>
  </ItemGroup>
  <Import Project="$(MSBuildToolsPath)\Microsoft.CSharp.targets" />
</Project>"#;

    #[test]
    fn test_parse_sdk_project() {
        let project = MsBuildProject::parse(Path::new("/repo/src/App/App.csproj"), SDK_WEB).unwrap();

        assert!(project.is_sdk());
        assert!(project.has_sdk("microsoft.net.sdk.web"));
        assert_eq!(project.target_frameworks().len(), 1);
        assert_eq!(project.target_frameworks()[0].name(), "net6.0");
        assert_eq!(project.property("RootNamespace").as_deref(), Some("App.Web"));
        assert_eq!(project.package_references().len(), 2);
        assert_eq!(project.package_references()[1].version, "7.2.3");
        assert!(project.framework_references()[0].matches("Microsoft.AspNetCore.App"));
        assert_eq!(
            project.project_references(),
            &[PathBuf::from("/repo/src/Lib/Lib.csproj")]
        );
        assert_eq!(project.output_type(), ProjectOutputType::Library);
        assert_eq!(
            project.lock_file_path(),
            PathBuf::from("/repo/src/App/obj/project.assets.json")
        );
    }

    #[test]
    fn test_parse_old_style_project() {
        let project = MsBuildProject::parse(Path::new("/repo/Legacy/Legacy.csproj"), OLD_STYLE).unwrap();

        assert!(!project.is_sdk());
        assert!(project.sdks().is_empty());
        assert_eq!(project.output_type(), ProjectOutputType::WinExe);
        assert_eq!(project.target_frameworks()[0].name(), "net472");
        assert!(project.property("OutputPath").is_none());
        assert_eq!(project.references().len(), 2);
        assert_eq!(project.references()[1].name, "Newtonsoft.Json");
        assert_eq!(project.imports(), &["\\Microsoft.CSharp.targets".to_string()]);
    }

    #[test]
    fn test_target_frameworks_multi() {
        let xml = r#"<Project Sdk="Microsoft.NET.Sdk">
  <PropertyGroup>
    <TargetFrameworks>netstandard2.0; net472;net6.0-windows;bogus</TargetFrameworks>
  </PropertyGroup>
</Project>"#;
        let project = MsBuildProject::parse(Path::new("/p/Multi.csproj"), xml).unwrap();
        let names: Vec<String> = project.target_frameworks().iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["netstandard2.0", "net472", "net6.0-windows"]);
    }

    #[test]
    fn test_target_frameworks_are_deduplicated() {
        let xml = r#"<Project Sdk="Microsoft.NET.Sdk">
  <PropertyGroup>
    <TargetFrameworks>net6.0;NET6.0;net8.0</TargetFrameworks>
    <TargetFramework>net8.0</TargetFramework>
  </PropertyGroup>
</Project>"#;
        let project = MsBuildProject::parse(Path::new("/p/Dup.csproj"), xml).unwrap();
        let names: Vec<String> = project.target_frameworks().iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["net6.0", "net8.0"]);
    }

    #[test]
    fn test_legacy_framework_version_is_fallback() {
        let xml = r#"<Project>
  <PropertyGroup>
    <TargetFrameworkVersion>v4.8</TargetFrameworkVersion>
  </PropertyGroup>
</Project>"#;
        let project = MsBuildProject::parse(Path::new("/p/Old.csproj"), xml).unwrap();
        let names: Vec<String> = project.target_frameworks().iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["net48"]);
    }

    #[test]
    fn test_uses_package_references() {
        let sdk = MsBuildProject::parse(Path::new("/p/Sdk.csproj"), SDK_WEB).unwrap();
        assert!(sdk.uses_package_references());

        let packages_config = MsBuildProject::parse(Path::new("/p/Old.csproj"), OLD_STYLE).unwrap();
        assert!(!packages_config.uses_package_references());

        let old_with_items = r#"<Project ToolsVersion="15.0">
  <PropertyGroup><TargetFrameworkVersion>v4.7.2</TargetFrameworkVersion></PropertyGroup>
  <ItemGroup><PackageReference Include="Newtonsoft.Json" Version="13.0.1" /></ItemGroup>
</Project>"#;
        let project = MsBuildProject::parse(Path::new("/p/Items.csproj"), old_with_items).unwrap();
        assert!(!project.is_sdk());
        assert!(project.uses_package_references());

        let explicit = r#"<Project ToolsVersion="15.0">
  <PropertyGroup><RestoreProjectStyle>PackageReference</RestoreProjectStyle></PropertyGroup>
</Project>"#;
        let project = MsBuildProject::parse(Path::new("/p/Explicit.csproj"), explicit).unwrap();
        assert!(project.uses_package_references());
    }

    #[test]
    fn test_sdk_elements_and_sdk_imports() {
        let xml = r#"<Project>
  <Sdk Name="Microsoft.NET.Sdk" />
  <Import Project="Sdk.targets" Sdk="Microsoft.NET.Sdk.Razor" />
</Project>"#;
        let project = MsBuildProject::parse(Path::new("/p/Razor.csproj"), xml).unwrap();
        assert!(project.is_sdk());
        assert_eq!(project.sdks(), &["Microsoft.NET.Sdk", "Microsoft.NET.Sdk.Razor"]);
    }

    #[test]
    fn test_custom_assets_path() {
        let xml = r#"<Project Sdk="Microsoft.NET.Sdk">
  <PropertyGroup>
    <MSBuildProjectExtensionsPath>..\artifacts\obj\</MSBuildProjectExtensionsPath>
  </PropertyGroup>
</Project>"#;
        let project = MsBuildProject::parse(Path::new("/repo/src/Lib.csproj"), xml).unwrap();
        assert_eq!(
            project.lock_file_path(),
            PathBuf::from("/repo/artifacts/obj/project.assets.json")
        );
    }

    #[test]
    fn test_rejects_non_project_root() {
        let err = MsBuildProject::parse(Path::new("/p/x.csproj"), "<Foo />").unwrap_err();
        assert!(matches!(err, ProjectError::Xml { .. }));

        let err = MsBuildProject::parse(Path::new("/p/x.csproj"), "<Project").unwrap_err();
        assert!(matches!(err, ProjectError::Xml { .. }));
    }

    #[test]
    fn test_load_reads_packages_config() {
        let fs = MockFileSystem::new();
        fs.add_file("Legacy/Legacy.csproj", OLD_STYLE);
        fs.add_file(
            "Legacy/packages.config",
            r#"<?xml version="1.0" encoding="utf-8"?>
<packages>
  <package id="Newtonsoft.Json" version="13.0.1" targetFramework="net472" />
  <package id="Microsoft.AspNet.Mvc" version="5.2.7" targetFramework="net472" />
</packages>"#,
        );

        let project = MsBuildProject::load(&fs, Path::new("/mock/Legacy/Legacy.csproj")).unwrap();
        let names: Vec<&str> = project
            .package_references()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["Newtonsoft.Json", "Microsoft.AspNet.Mvc"]);
    }

    #[test]
    fn test_load_missing_file() {
        let fs = MockFileSystem::new();
        let err = MsBuildProject::load(&fs, Path::new("/mock/none.csproj")).unwrap_err();
        assert!(matches!(err, ProjectError::Read { .. }));
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(
            resolve_relative(Path::new("/a/b"), r"..\c\.\d.csproj"),
            PathBuf::from("/a/c/d.csproj")
        );
        assert_eq!(
            resolve_relative(Path::new("/a"), "/abs/x.csproj"),
            PathBuf::from("/abs/x.csproj")
        );
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Path::new("./A.csproj")), PathBuf::from("A.csproj"));
        assert_eq!(normalize_path(Path::new("src/./Web/../Lib/Lib.csproj")), PathBuf::from("src/Lib/Lib.csproj"));
        assert_eq!(normalize_path(Path::new("../../x/Y.csproj")), PathBuf::from("../../x/Y.csproj"));
        assert_eq!(normalize_path(Path::new("/../a.csproj")), PathBuf::from("/a.csproj"));
    }
}
