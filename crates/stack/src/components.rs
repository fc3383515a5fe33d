//! Technology components a project is built on.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

bitflags! {
    /// Set of detected components. Detection rules only ever add bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ProjectComponents: u32 {
        const ASP_NET         = 1 << 0;
        const ASP_NET_CORE    = 1 << 1;
        const WIN_FORMS       = 1 << 2;
        const WPF             = 1 << 3;
        const WINDOWS_DESKTOP = 1 << 4;
        const WIN_RT          = 1 << 5;
        const WIN_UI          = 1 << 6;
        const XAMARIN_ANDROID = 1 << 7;
        const XAMARIN_IOS     = 1 << 8;
        const MAUI            = 1 << 9;
        const WCF             = 1 << 10;
    }
}

const NAMES: &[(ProjectComponents, &str)] = &[
    (ProjectComponents::ASP_NET, "AspNet"),
    (ProjectComponents::ASP_NET_CORE, "AspNetCore"),
    (ProjectComponents::WIN_FORMS, "WinForms"),
    (ProjectComponents::WPF, "Wpf"),
    (ProjectComponents::WINDOWS_DESKTOP, "WindowsDesktop"),
    (ProjectComponents::WIN_RT, "WinRT"),
    (ProjectComponents::WIN_UI, "WinUI"),
    (ProjectComponents::XAMARIN_ANDROID, "XamarinAndroid"),
    (ProjectComponents::XAMARIN_IOS, "XamarinIos"),
    (ProjectComponents::MAUI, "Maui"),
    (ProjectComponents::WCF, "Wcf"),
];

impl ProjectComponents {
    pub fn is_web(&self) -> bool {
        self.intersects(ProjectComponents::ASP_NET | ProjectComponents::ASP_NET_CORE)
    }

    pub fn names(&self) -> Vec<&'static str> {
        NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

/// `None` for the empty set, otherwise a comma list such as `Wpf, WindowsDesktop`.
impl fmt::Display for ProjectComponents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("None");
        }
        f.write_str(&self.names().join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a known project component")]
pub struct ComponentParseError(pub String);

impl FromStr for ProjectComponents {
    type Err = ComponentParseError;

    /// Accepts `,` or `|` separated names, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut components = ProjectComponents::empty();
        for part in s.split([',', '|']).map(str::trim).filter(|p| !p.is_empty()) {
            if part.eq_ignore_ascii_case("none") {
                continue;
            }
            let flag = NAMES
                .iter()
                .find(|(_, name)| name.eq_ignore_ascii_case(part))
                .map(|(flag, _)| *flag)
                .ok_or_else(|| ComponentParseError(part.to_string()))?;
            components |= flag;
        }
        Ok(components)
    }
}

impl Serialize for ProjectComponents {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ProjectComponents {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        empty = { ProjectComponents::empty(), "None" },
        single = { ProjectComponents::ASP_NET_CORE, "AspNetCore" },
        wpf = { ProjectComponents::WPF | ProjectComponents::WINDOWS_DESKTOP, "Wpf, WindowsDesktop" },
        winui = { ProjectComponents::WIN_RT | ProjectComponents::WIN_UI, "WinRT, WinUI" },
    )]
    fn test_display(components: ProjectComponents, expected: &str) {
        assert_eq!(components.to_string(), expected);
        assert_eq!(expected.parse::<ProjectComponents>().unwrap(), components);
    }

    #[test]
    fn test_parse_is_lenient_about_separators_and_case() {
        let parsed: ProjectComponents = "winforms | WINDOWSDESKTOP,wcf".parse().unwrap();
        assert_eq!(
            parsed,
            ProjectComponents::WIN_FORMS | ProjectComponents::WINDOWS_DESKTOP | ProjectComponents::WCF
        );
        assert_eq!("".parse::<ProjectComponents>().unwrap(), ProjectComponents::empty());
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "Wpf, Silverlight".parse::<ProjectComponents>().unwrap_err();
        assert_eq!(err, ComponentParseError("Silverlight".to_string()));
    }

    #[test]
    fn test_serde_as_string() {
        let components = ProjectComponents::ASP_NET | ProjectComponents::WCF;
        let json = serde_json::to_string(&components).unwrap();
        assert_eq!(json, "\"AspNet, Wcf\"");
        let back: ProjectComponents = serde_json::from_str(&json).unwrap();
        assert_eq!(back, components);
    }

    #[test]
    fn test_is_web() {
        assert!(ProjectComponents::ASP_NET.is_web());
        assert!((ProjectComponents::ASP_NET_CORE | ProjectComponents::WPF).is_web());
        assert!(!ProjectComponents::WIN_FORMS.is_web());
    }
}
