use serde::{Deserialize, Serialize};
use std::fmt;

/// Old-style `<Reference Include="System.Web" />` assembly dependency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    pub name: String,
    pub hint_path: Option<String>,
}

impl Reference {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hint_path: None,
        }
    }

    /// Builds from an `Include` value, dropping strong-name details
    /// (`System.Web, Version=4.0.0.0, Culture=neutral`).
    pub fn from_include(include: &str, hint_path: Option<String>) -> Self {
        let name = include.split(',').next().unwrap_or(include).trim();
        Self {
            name: name.to_string(),
            hint_path,
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// SDK-style `<FrameworkReference Include="Microsoft.AspNetCore.App" />`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameworkReference {
    pub name: String,
}

impl FrameworkReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

impl fmt::Display for FrameworkReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A package dependency. `version` is kept verbatim: it may be a fixed
/// version, an interval, or a floating range such as `4.*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NuGetReference {
    pub name: String,
    pub version: String,
}

impl NuGetReference {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

impl fmt::Display for NuGetReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, Version={}", self.name, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_strips_strong_name() {
        let reference = Reference::from_include(
            "System.Web.Mvc, Version=5.2.7.0, Culture=neutral, PublicKeyToken=31bf3856ad364e35",
            Some(r"..\packages\Microsoft.AspNet.Mvc.5.2.7\lib\net45\System.Web.Mvc.dll".to_string()),
        );
        assert_eq!(reference.name, "System.Web.Mvc");
        assert!(reference.hint_path.is_some());
        assert!(reference.matches("system.web.mvc"));
    }

    #[test]
    fn test_nuget_reference_equality_is_by_value() {
        let a = NuGetReference::new("Newtonsoft.Json", "13.0.1");
        let b = NuGetReference::new("Newtonsoft.Json", "13.0.1");
        let c = NuGetReference::new("Newtonsoft.Json", "13.0.2");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_string(), "Newtonsoft.Json, Version=13.0.1");
    }

    #[test]
    fn test_framework_reference_matches_case_insensitive() {
        let reference = FrameworkReference::new("Microsoft.AspNetCore.App");
        assert!(reference.matches("microsoft.aspnetcore.app"));
        assert!(!reference.matches("Microsoft.WindowsDesktop.App"));
    }
}
