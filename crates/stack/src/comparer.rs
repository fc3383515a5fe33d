//! Ordering and merging of target framework monikers.

use crate::error::TfmError;
use dotport_msbuild::{DefaultCompatibilityProvider, TargetFrameworkMoniker, TfmVersion};
use std::cmp::Ordering;

pub struct TargetFrameworkMonikerComparer;

impl TargetFrameworkMonikerComparer {
    /// Orders two optional monikers. `None` sorts before any moniker.
    pub fn compare(x: Option<&TargetFrameworkMoniker>, y: Option<&TargetFrameworkMoniker>) -> Ordering {
        match (x, y) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => Self::compare_tfms(x, y),
        }
    }

    /// Orders by consumability: a framework that can consume the other's
    /// assets is the greater one.
    ///
    /// .NET Standard always sorts below .NET Framework. When neither side can
    /// consume the other the result is `Less`, which makes this a partial
    /// order in disguise: `compare(a, b)` and `compare(b, a)` can both be
    /// `Less` for unrelated frameworks.
    pub fn compare_tfms(x: &TargetFrameworkMoniker, y: &TargetFrameworkMoniker) -> Ordering {
        if x.is_net_standard() && y.is_framework() {
            return Ordering::Less;
        }

        let x_consumes_y = DefaultCompatibilityProvider::is_compatible(x, y);
        let y_consumes_x = DefaultCompatibilityProvider::is_compatible(y, x);

        match (x_consumes_y, y_consumes_x) {
            (true, true) => Ordering::Equal,
            (false, true) => Ordering::Less,
            (true, false) => Ordering::Greater,
            (false, false) => Ordering::Less,
        }
    }

    /// `tfm` is at least as capable as `other`.
    pub fn is_compatible(tfm: &TargetFrameworkMoniker, other: &TargetFrameworkMoniker) -> bool {
        Self::compare_tfms(tfm, other) != Ordering::Less
    }

    /// Combines two monikers: the higher base framework, the platform of
    /// whichever side has one, and the higher platform version.
    ///
    /// Fails when both sides name different platforms.
    pub fn merge(
        tfm1: &TargetFrameworkMoniker,
        tfm2: &TargetFrameworkMoniker,
    ) -> Result<TargetFrameworkMoniker, TfmError> {
        let platform = match (tfm1.platform(), tfm2.platform()) {
            (Some(p1), Some(p2)) if p1 != p2 => {
                return Err(TfmError::PlatformMismatch {
                    left: tfm1.name(),
                    right: tfm2.name(),
                });
            }
            (Some(p), _) | (None, Some(p)) => Some(p.to_string()),
            (None, None) => None,
        };

        let base1 = tfm1.without_platform();
        let base2 = tfm2.without_platform();
        let mut base = if Self::compare_tfms(&base1, &base2) == Ordering::Less {
            base2
        } else {
            base1
        };

        let Some(platform) = platform else {
            return Ok(base);
        };

        if !base.supports_platform() {
            // the higher base cannot carry a platform; keep the platform-bearing side's base
            base = if tfm1.platform().is_some() {
                tfm1.without_platform()
            } else {
                tfm2.without_platform()
            };
        }

        let version = match (tfm1.platform_version(), tfm2.platform_version()) {
            (Some(v1), Some(v2)) => v1.max(v2),
            (Some(v), None) | (None, Some(v)) => v,
            (None, None) => TfmVersion::zero(),
        };

        Ok(base.with_platform(&platform, Some(version)))
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
        same = { "net6.0", "net6.0", Ordering::Equal },
        newer_core = { "net5.0", "net6.0", Ordering::Less },
        older_core = { "net8.0", "net6.0", Ordering::Greater },
        standard_below_core = { "netstandard2.0", "net6.0", Ordering::Less },
        core_above_standard = { "net6.0", "netstandard2.1", Ordering::Greater },
        standard_versions = { "netstandard2.1", "netstandard2.0", Ordering::Greater },
        standard_below_framework = { "netstandard2.1", "net472", Ordering::Less },
        framework_above_standard = { "net472", "netstandard2.0", Ordering::Greater },
        framework_vs_core = { "net472", "net6.0", Ordering::Less },
        core_vs_framework = { "net6.0", "net472", Ordering::Less },
        platform_is_greater = { "net6.0-windows", "net6.0", Ordering::Greater },
        platform_versions = { "net6.0-windows10.0.17763.0", "net6.0-windows10.0.19041.0", Ordering::Less },
        different_platforms = { "net6.0-android", "net6.0-ios", Ordering::Less },
    )]
    fn test_compare(x: &str, y: &str, expected: Ordering) {
        assert_eq!(TargetFrameworkMonikerComparer::compare_tfms(&tfm(x), &tfm(y)), expected);
    }

    #[test]
    fn test_compare_none() {
        let net6 = tfm("net6.0");
        assert_eq!(TargetFrameworkMonikerComparer::compare(None, None), Ordering::Equal);
        assert_eq!(TargetFrameworkMonikerComparer::compare(None, Some(&net6)), Ordering::Less);
        assert_eq!(TargetFrameworkMonikerComparer::compare(Some(&net6), None), Ordering::Greater);
    }

    #[parameterized(
        platform_wins = { "net6.0-windows10.0.17763.0", "net6.0", "net6.0-windows10.0.17763.0" },
        platform_wins_reversed = { "net6.0", "net6.0-windows10.0.17763.0", "net6.0-windows10.0.17763.0" },
        higher_base = { "net6.0-windows", "net8.0", "net8.0-windows" },
        higher_platform_version = { "net6.0-windows10.0.17763.0", "net6.0-windows10.0.19041.0", "net6.0-windows10.0.19041.0" },
        standard_and_core = { "netstandard2.0", "net6.0", "net6.0" },
        standards = { "netstandard2.0", "netstandard2.1", "netstandard2.1" },
        versionless_platform = { "net5.0-windows", "netstandard2.0", "net5.0-windows" },
    )]
    fn test_merge(a: &str, b: &str, expected: &str) {
        let merged = TargetFrameworkMonikerComparer::merge(&tfm(a), &tfm(b)).unwrap();
        assert_eq!(merged.name(), expected);
    }

    #[test]
    fn test_merge_keeps_zero_platform_version_hidden() {
        let merged = TargetFrameworkMonikerComparer::merge(&tfm("net6.0-windows"), &tfm("net6.0")).unwrap();
        assert_eq!(merged.platform_version(), Some(TfmVersion::zero()));
        assert_eq!(merged.name(), "net6.0-windows");
    }

    #[test]
    fn test_merge_platform_mismatch() {
        let err = TargetFrameworkMonikerComparer::merge(&tfm("net6.0-android"), &tfm("net6.0-windows")).unwrap_err();
        assert_eq!(
            err,
            TfmError::PlatformMismatch {
                left: "net6.0-android".to_string(),
                right: "net6.0-windows".to_string(),
            }
        );
    }

    #[test]
    fn test_is_compatible() {
        assert!(TargetFrameworkMonikerComparer::is_compatible(&tfm("net6.0"), &tfm("netstandard2.0")));
        assert!(TargetFrameworkMonikerComparer::is_compatible(&tfm("net6.0"), &tfm("net6.0")));
        assert!(!TargetFrameworkMonikerComparer::is_compatible(&tfm("netstandard2.0"), &tfm("net6.0")));
    }
}
