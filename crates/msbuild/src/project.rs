//! The read-only project view every classification and selection rule works against.

use crate::reference::{FrameworkReference, NuGetReference, Reference};
use crate::tfm::TargetFrameworkMoniker;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectOutputType {
    Library,
    Exe,
    WinExe,
    AppContainerExe,
    Other,
}

impl ProjectOutputType {
    /// Maps the `OutputType` property. A missing property means a library.
    pub fn from_property(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            None | Some("") | Some("library") => ProjectOutputType::Library,
            Some("exe") => ProjectOutputType::Exe,
            Some("winexe") => ProjectOutputType::WinExe,
            Some("appcontainerexe") => ProjectOutputType::AppContainerExe,
            Some(_) => ProjectOutputType::Other,
        }
    }

    pub fn is_executable(&self) -> bool {
        matches!(
            self,
            ProjectOutputType::Exe | ProjectOutputType::WinExe | ProjectOutputType::AppContainerExe
        )
    }
}

impl fmt::Display for ProjectOutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProjectOutputType::Library => "Library",
            ProjectOutputType::Exe => "Exe",
            ProjectOutputType::WinExe => "WinExe",
            ProjectOutputType::AppContainerExe => "AppContainerExe",
            ProjectOutputType::Other => "Other",
        };
        f.write_str(name)
    }
}

/// Evaluated state of one project. Implementations must be cheap to query
/// and must not change while a classification or selection is running.
pub trait ProjectFile: Send + Sync {
    fn file_path(&self) -> &Path;

    /// `true` for `<Project Sdk="...">` style projects.
    fn is_sdk(&self) -> bool;

    fn sdks(&self) -> &[String];

    fn property(&self, name: &str) -> Option<String>;

    /// `Project` attribute of every `<Import>` element.
    fn imports(&self) -> &[String];

    fn references(&self) -> &[Reference];

    fn package_references(&self) -> &[NuGetReference];

    fn framework_references(&self) -> &[FrameworkReference];

    fn output_type(&self) -> ProjectOutputType;

    fn target_frameworks(&self) -> &[TargetFrameworkMoniker];

    /// Absolute paths of referenced projects.
    fn project_references(&self) -> &[PathBuf];

    /// `true` when restore resolves packages into a lock file rather than
    /// a `packages.config` folder.
    fn uses_package_references(&self) -> bool;

    /// Where restore writes the lock file (`project.assets.json`).
    fn lock_file_path(&self) -> PathBuf;

    fn has_sdk(&self, name: &str) -> bool {
        self.sdks().iter().any(|sdk| sdk.eq_ignore_ascii_case(name))
    }

    /// MSBuild truthiness: only a literal `true` (any case) counts.
    fn property_is_true(&self, name: &str) -> bool {
        self.property(name)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    fn file_name(&self) -> String {
        self.file_path()
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        missing = { None, ProjectOutputType::Library },
        library = { Some("Library"), ProjectOutputType::Library },
        exe = { Some("Exe"), ProjectOutputType::Exe },
        winexe = { Some(" winexe "), ProjectOutputType::WinExe },
        appcontainer = { Some("AppContainerExe"), ProjectOutputType::AppContainerExe },
        module = { Some("Module"), ProjectOutputType::Other },
    )]
    fn test_output_type_from_property(value: Option<&str>, expected: ProjectOutputType) {
        assert_eq!(ProjectOutputType::from_property(value), expected);
    }

    #[test]
    fn test_is_executable() {
        assert!(ProjectOutputType::Exe.is_executable());
        assert!(ProjectOutputType::WinExe.is_executable());
        assert!(!ProjectOutputType::Library.is_executable());
    }
}
