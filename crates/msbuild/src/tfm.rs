//! Target framework monikers and the framework compatibility rules NuGet applies
//! when deciding whether one framework can consume assets built for another.

use crate::error::ProjectError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Framework family of a moniker. `net5.0+` is modern .NET and shares the
/// `NetCoreApp` family with `netcoreappX.Y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameworkFamily {
    NetFramework,
    NetStandard,
    NetCoreApp,
}

/// Dotted version of up to four numeric parts. Comparison and hashing ignore
/// how many parts were written, formatting keeps them.
#[derive(Debug, Clone, Copy)]
pub struct TfmVersion {
    parts: [u32; 4],
    len: u8,
}

impl TfmVersion {
    pub fn new(major: u32, minor: u32) -> Self {
        Self {
            parts: [major, minor, 0, 0],
            len: 2,
        }
    }

    pub fn zero() -> Self {
        Self::new(0, 0)
    }

    pub fn major(&self) -> u32 {
        self.parts[0]
    }

    pub fn minor(&self) -> u32 {
        self.parts[1]
    }

    pub fn is_zero(&self) -> bool {
        self.parts.iter().all(|p| *p == 0)
    }

    /// Parses `10.0.19041.0` style versions.
    pub fn parse_dotted(value: &str) -> Option<Self> {
        let mut parts = [0u32; 4];
        let mut len = 0u8;
        for segment in value.split('.') {
            if len == 4 || segment.is_empty() {
                return None;
            }
            parts[len as usize] = segment.parse().ok()?;
            len += 1;
        }
        if len == 0 {
            return None;
        }
        Some(Self {
            parts,
            len: len.max(2),
        })
    }

    /// Parses .NET Framework short digits: `472` is 4.7.2, `48` is 4.8.
    fn parse_compact(value: &str) -> Option<Self> {
        if value.is_empty() || value.len() > 4 || !value.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let mut parts = [0u32; 4];
        for (i, b) in value.bytes().enumerate() {
            parts[i] = u32::from(b - b'0');
        }
        Some(Self {
            parts,
            len: (value.len() as u8).max(2),
        })
    }

    fn compact(&self) -> String {
        let mut significant = 4;
        while significant > 2 && self.parts[significant - 1] == 0 {
            significant -= 1;
        }
        self.parts[..significant]
            .iter()
            .map(u32::to_string)
            .collect::<String>()
    }
}

impl PartialEq for TfmVersion {
    fn eq(&self, other: &Self) -> bool {
        self.parts == other.parts
    }
}

impl Eq for TfmVersion {}

impl Hash for TfmVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parts.hash(state);
    }
}

impl PartialOrd for TfmVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TfmVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parts.cmp(&other.parts)
    }
}

impl fmt::Display for TfmVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text: Vec<String> = self.parts[..self.len as usize]
            .iter()
            .map(u32::to_string)
            .collect();
        write!(f, "{}", text.join("."))
    }
}

/// Immutable target framework moniker such as `net6.0-windows10.0.19041.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetFrameworkMoniker {
    family: FrameworkFamily,
    version: TfmVersion,
    platform: Option<String>,
    platform_version: Option<TfmVersion>,
}

impl TargetFrameworkMoniker {
    pub fn new(family: FrameworkFamily, version: TfmVersion) -> Self {
        Self {
            family,
            version,
            platform: None,
            platform_version: None,
        }
    }

    pub fn net_standard20() -> Self {
        Self::new(FrameworkFamily::NetStandard, TfmVersion::new(2, 0))
    }

    pub fn net_standard21() -> Self {
        Self::new(FrameworkFamily::NetStandard, TfmVersion::new(2, 1))
    }

    /// Parses a short folder name (`net472`, `netcoreapp3.1`, `net8.0-windows`)
    /// or a long framework name (`.NETCoreApp,Version=v6.0`).
    pub fn parse(value: &str) -> Result<Self, ProjectError> {
        let trimmed = value.trim();
        let invalid = || ProjectError::InvalidTargetFramework(value.to_string());

        if trimmed.starts_with('.') {
            return Self::parse_long_name(trimmed).ok_or_else(invalid);
        }

        let lower = trimmed.to_lowercase();
        let (framework, platform) = match lower.split_once('-') {
            Some((framework, platform)) => (framework, Some(platform)),
            None => (lower.as_str(), None),
        };

        let mut tfm = if let Some(rest) = framework.strip_prefix("netstandard") {
            Self::new(
                FrameworkFamily::NetStandard,
                TfmVersion::parse_dotted(rest).ok_or_else(invalid)?,
            )
        } else if let Some(rest) = framework.strip_prefix("netcoreapp") {
            Self::new(
                FrameworkFamily::NetCoreApp,
                TfmVersion::parse_dotted(rest).ok_or_else(invalid)?,
            )
        } else if let Some(rest) = framework.strip_prefix("net") {
            if rest.contains('.') {
                let version = TfmVersion::parse_dotted(rest).ok_or_else(invalid)?;
                let family = if version.major() >= 5 {
                    FrameworkFamily::NetCoreApp
                } else {
                    FrameworkFamily::NetFramework
                };
                Self::new(family, version)
            } else {
                let version = TfmVersion::parse_compact(rest).ok_or_else(invalid)?;
                let family = if version.major() >= 5 {
                    FrameworkFamily::NetCoreApp
                } else {
                    FrameworkFamily::NetFramework
                };
                Self::new(family, version)
            }
        } else {
            return Err(invalid());
        };

        if let Some(platform) = platform {
            if !tfm.supports_platform() {
                return Err(invalid());
            }
            let split = platform
                .find(|c: char| c.is_ascii_digit())
                .unwrap_or(platform.len());
            let (name, version) = platform.split_at(split);
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(invalid());
            }
            tfm.platform = Some(name.to_string());
            if !version.is_empty() {
                tfm.platform_version = Some(TfmVersion::parse_dotted(version).ok_or_else(invalid)?);
            }
        }

        Ok(tfm)
    }

    fn parse_long_name(value: &str) -> Option<Self> {
        let mut segments = value.split(',');
        let identifier = segments.next()?.trim().to_lowercase();
        let version = segments
            .find_map(|s| s.trim().strip_prefix("Version=").map(str::to_string))?;
        let version = TfmVersion::parse_dotted(version.trim_start_matches(['v', 'V']))?;

        let family = match identifier.as_str() {
            ".netframework" => FrameworkFamily::NetFramework,
            ".netstandard" => FrameworkFamily::NetStandard,
            ".netcoreapp" => FrameworkFamily::NetCoreApp,
            _ => return None,
        };
        Some(Self::new(family, version))
    }

    /// Maps the legacy `TargetFrameworkVersion` property (`v4.7.2`).
    pub fn from_framework_version(value: &str) -> Result<Self, ProjectError> {
        let version = TfmVersion::parse_dotted(value.trim().trim_start_matches(['v', 'V']))
            .ok_or_else(|| ProjectError::InvalidTargetFramework(value.to_string()))?;
        Ok(Self::new(FrameworkFamily::NetFramework, version))
    }

    pub fn family(&self) -> FrameworkFamily {
        self.family
    }

    pub fn version(&self) -> TfmVersion {
        self.version
    }

    pub fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    pub fn platform_version(&self) -> Option<TfmVersion> {
        self.platform_version
    }

    pub fn is_net_core(&self) -> bool {
        self.family == FrameworkFamily::NetCoreApp
    }

    pub fn is_net_standard(&self) -> bool {
        self.family == FrameworkFamily::NetStandard
    }

    pub fn is_framework(&self) -> bool {
        self.family == FrameworkFamily::NetFramework
    }

    pub fn is_windows(&self) -> bool {
        self.platform.as_deref() == Some("windows")
    }

    /// Platform suffixes only exist for .NET 5 and later.
    pub fn supports_platform(&self) -> bool {
        self.is_net_core() && self.version.major() >= 5
    }

    pub fn with_platform(&self, platform: &str, version: Option<TfmVersion>) -> Self {
        Self {
            platform: Some(platform.to_lowercase()),
            platform_version: version,
            ..self.clone()
        }
    }

    pub fn with_platform_version(&self, version: TfmVersion) -> Self {
        Self {
            platform_version: Some(version),
            ..self.clone()
        }
    }

    pub fn without_platform(&self) -> Self {
        Self {
            platform: None,
            platform_version: None,
            ..self.clone()
        }
    }

    /// Short folder form, e.g. `net6.0-windows10.0.19041.0`.
    pub fn name(&self) -> String {
        let mut name = match self.family {
            FrameworkFamily::NetFramework => format!("net{}", self.version.compact()),
            FrameworkFamily::NetStandard => format!(
                "netstandard{}.{}",
                self.version.major(),
                self.version.minor()
            ),
            FrameworkFamily::NetCoreApp if self.version.major() >= 5 => {
                format!("net{}.{}", self.version.major(), self.version.minor())
            }
            FrameworkFamily::NetCoreApp => format!(
                "netcoreapp{}.{}",
                self.version.major(),
                self.version.minor()
            ),
        };

        if let Some(platform) = &self.platform {
            name.push('-');
            name.push_str(platform);
            if let Some(version) = self.platform_version.filter(|v| !v.is_zero()) {
                name.push_str(&version.to_string());
            }
        }

        name
    }
}

impl fmt::Display for TargetFrameworkMoniker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for TargetFrameworkMoniker {
    type Err = ProjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for TargetFrameworkMoniker {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name())
    }
}

impl<'de> Deserialize<'de> for TargetFrameworkMoniker {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// NuGet's default framework compatibility rules.
pub struct DefaultCompatibilityProvider;

impl DefaultCompatibilityProvider {
    /// Whether a project targeting `target` can consume assets built for `candidate`.
    pub fn is_compatible(target: &TargetFrameworkMoniker, candidate: &TargetFrameworkMoniker) -> bool {
        use FrameworkFamily::*;

        match (target.family, candidate.family) {
            (NetCoreApp, NetCoreApp) => {
                candidate.version <= target.version && Self::platform_compatible(target, candidate)
            }
            (NetFramework, NetFramework) | (NetStandard, NetStandard) => {
                candidate.version <= target.version
            }
            (NetCoreApp, NetStandard) | (NetFramework, NetStandard) => {
                match Self::max_net_standard(target) {
                    Some(max) => candidate.version <= max,
                    None => false,
                }
            }
            _ => false,
        }
    }

    fn platform_compatible(target: &TargetFrameworkMoniker, candidate: &TargetFrameworkMoniker) -> bool {
        match (&target.platform, &candidate.platform) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(tp), Some(cp)) => {
                tp == cp
                    && candidate.platform_version.unwrap_or_else(TfmVersion::zero)
                        <= target.platform_version.unwrap_or_else(TfmVersion::zero)
            }
        }
    }

    /// Highest .NET Standard version a framework implements.
    fn max_net_standard(target: &TargetFrameworkMoniker) -> Option<TfmVersion> {
        let v = target.version;
        match target.family {
            FrameworkFamily::NetCoreApp => Some(match v.major() {
                0 | 1 => TfmVersion::new(1, 6),
                2 => TfmVersion::new(2, 0),
                _ => TfmVersion::new(2, 1),
            }),
            FrameworkFamily::NetFramework => {
                let at_least = |major, minor, build| {
                    v >= TfmVersion {
                        parts: [major, minor, build, 0],
                        len: 3,
                    }
                };
                if at_least(4, 6, 1) {
                    Some(TfmVersion::new(2, 0))
                } else if at_least(4, 6, 0) {
                    Some(TfmVersion::new(1, 3))
                } else if at_least(4, 5, 1) {
                    Some(TfmVersion::new(1, 2))
                } else if at_least(4, 5, 0) {
                    Some(TfmVersion::new(1, 1))
                } else {
                    None
                }
            }
            FrameworkFamily::NetStandard => Some(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    fn tfm(name: &str) -> TargetFrameworkMoniker {
        TargetFrameworkMoniker::parse(name).unwrap()
    }

    #[parameterized(
        framework_48 = { "net48", FrameworkFamily::NetFramework, "net48" },
        framework_472 = { "NET472", FrameworkFamily::NetFramework, "net472" },
        framework_40 = { "net40", FrameworkFamily::NetFramework, "net40" },
        standard = { "netstandard2.0", FrameworkFamily::NetStandard, "netstandard2.0" },
        core_app = { "netcoreapp3.1", FrameworkFamily::NetCoreApp, "netcoreapp3.1" },
        net5 = { "net5.0", FrameworkFamily::NetCoreApp, "net5.0" },
        net10 = { "net10.0", FrameworkFamily::NetCoreApp, "net10.0" },
        windows = { "net6.0-windows", FrameworkFamily::NetCoreApp, "net6.0-windows" },
        windows_sdk = { "net6.0-windows10.0.19041.0", FrameworkFamily::NetCoreApp, "net6.0-windows10.0.19041.0" },
        android = { "net8.0-Android34.0", FrameworkFamily::NetCoreApp, "net8.0-android34.0" },
        long_core = { ".NETCoreApp,Version=v6.0", FrameworkFamily::NetCoreApp, "net6.0" },
        long_framework = { ".NETFramework,Version=v4.7.2", FrameworkFamily::NetFramework, "net472" },
        long_standard = { ".NETStandard,Version=v2.1", FrameworkFamily::NetStandard, "netstandard2.1" },
    )]
    fn test_parse_and_format(input: &str, family: FrameworkFamily, name: &str) {
        let parsed = tfm(input);
        assert_eq!(parsed.family(), family);
        assert_eq!(parsed.name(), name);
    }

    #[parameterized(
        empty = { "" },
        unknown = { "monoandroid10" },
        platform_on_framework = { "net48-windows" },
        platform_on_standard = { "netstandard2.0-windows" },
        bad_platform = { "net6.0-10.0" },
        bad_version = { "net6.x" },
    )]
    fn test_parse_rejects(input: &str) {
        assert!(TargetFrameworkMoniker::parse(input).is_err());
    }

    #[test]
    fn test_platform_parts() {
        let t = tfm("net6.0-windows10.0.17763.0");
        assert_eq!(t.platform(), Some("windows"));
        assert_eq!(t.platform_version().unwrap().to_string(), "10.0.17763.0");
        assert!(t.is_windows());
        assert_eq!(t.without_platform().name(), "net6.0");
    }

    #[test]
    fn test_zero_platform_version_is_omitted() {
        let t = tfm("net6.0").with_platform("windows", Some(TfmVersion::zero()));
        assert_eq!(t.name(), "net6.0-windows");
    }

    #[test]
    fn test_equality_ignores_written_version_length() {
        assert_eq!(tfm("net6.0-windows10.0.19041"), tfm("net6.0-windows10.0.19041.0"));
    }

    #[test]
    fn test_legacy_framework_version() {
        let t = TargetFrameworkMoniker::from_framework_version("v4.6.1").unwrap();
        assert_eq!(t.name(), "net461");
        assert!(t.is_framework());
    }

    #[test]
    fn test_from_str() {
        let parsed: TargetFrameworkMoniker = "net8.0-windows".parse().unwrap();
        assert_eq!(parsed.to_string(), "net8.0-windows");
    }

    #[parameterized(
        core_consumes_standard = { "net6.0", "netstandard2.1", true },
        core2_rejects_standard21 = { "netcoreapp2.1", "netstandard2.1", false },
        core_consumes_older_core = { "net8.0", "netcoreapp3.1", true },
        core_rejects_newer_core = { "net6.0", "net8.0", false },
        windows_consumes_plain = { "net6.0-windows", "net6.0", true },
        plain_rejects_windows = { "net6.0", "net6.0-windows", false },
        higher_sdk_consumes_lower = { "net6.0-windows10.0.19041.0", "net6.0-windows10.0.17763.0", true },
        lower_sdk_rejects_higher = { "net6.0-windows10.0.17763.0", "net6.0-windows10.0.19041.0", false },
        other_platform = { "net6.0-android", "net6.0-windows", false },
        framework_consumes_standard20 = { "net472", "netstandard2.0", true },
        framework_rejects_standard21 = { "net48", "netstandard2.1", false },
        net45_standard11 = { "net45", "netstandard1.1", true },
        net45_rejects_standard12 = { "net45", "netstandard1.2", false },
        net40_rejects_standard = { "net40", "netstandard1.0", false },
        framework_consumes_older = { "net48", "net461", true },
        standard_rejects_framework = { "netstandard2.0", "net48", false },
        core_rejects_framework = { "net8.0", "net48", false },
    )]
    fn test_compatibility(target: &str, candidate: &str, expected: bool) {
        assert_eq!(
            DefaultCompatibilityProvider::is_compatible(&tfm(target), &tfm(candidate)),
            expected
        );
    }
}
