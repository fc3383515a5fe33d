use crate::error::NuGetError;
use crate::version::NuGetVersion;
use std::fmt;

/// Which part of a floating range (`4.*`, `6.0.*`, `1.0.0-*`) floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatBehavior {
    Major,
    Minor,
    Patch,
    Revision,
    Prerelease,
}

/// A NuGet version range.
///
/// A bare version (`1.2.3`) means "at least 1.2.3". Intervals use the
/// bracket notation (`[1.0,2.0)`, `(,3.0]`, `[1.0]`). Floating ranges keep
/// their declared floor as the inclusive minimum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    min: Option<NuGetVersion>,
    min_inclusive: bool,
    max: Option<NuGetVersion>,
    max_inclusive: bool,
    float: Option<FloatBehavior>,
    original: String,
}

impl VersionRange {
    pub fn at_least(version: NuGetVersion) -> Self {
        let original = version.to_string();
        Self {
            min: Some(version),
            min_inclusive: true,
            max: None,
            max_inclusive: false,
            float: None,
            original,
        }
    }

    pub fn exact(version: NuGetVersion) -> Self {
        let original = format!("[{}]", version);
        Self {
            min: Some(version.clone()),
            min_inclusive: true,
            max: Some(version),
            max_inclusive: true,
            float: None,
            original,
        }
    }

    pub fn parse(value: &str) -> Result<Self, NuGetError> {
        Self::try_parse(value).ok_or_else(|| NuGetError::InvalidVersion(value.to_string()))
    }

    pub fn try_parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }

        let mut range = if trimmed.starts_with('[') || trimmed.starts_with('(') {
            Self::parse_interval(trimmed)?
        } else if trimmed.contains('*') {
            Self::parse_float(trimmed)?
        } else {
            Self::at_least(NuGetVersion::try_parse(trimmed)?)
        };
        range.original = trimmed.to_string();
        Some(range)
    }

    fn parse_interval(value: &str) -> Option<Self> {
        let min_inclusive = value.starts_with('[');
        let max_inclusive = value.ends_with(']');
        if !(value.ends_with(']') || value.ends_with(')')) || value.len() < 2 {
            return None;
        }
        let inner = value[1..value.len() - 1].trim();

        let Some((low, high)) = inner.split_once(',') else {
            // `[1.0]` pins an exact version; `(1.0)` is meaningless
            if !(min_inclusive && max_inclusive) {
                return None;
            }
            return Some(Self::exact(NuGetVersion::try_parse(inner)?));
        };

        let parse_bound = |s: &str| -> Option<Option<NuGetVersion>> {
            let s = s.trim();
            if s.is_empty() {
                Some(None)
            } else {
                NuGetVersion::try_parse(s).map(Some)
            }
        };
        let min = parse_bound(low)?;
        let max = parse_bound(high)?;
        if min.is_none() && max.is_none() {
            return None;
        }
        if let (Some(lo), Some(hi)) = (&min, &max) {
            if lo > hi {
                return None;
            }
        }

        Some(Self {
            min,
            min_inclusive,
            max,
            max_inclusive,
            float: None,
            original: String::new(),
        })
    }

    fn parse_float(value: &str) -> Option<Self> {
        if value == "*" {
            return Some(Self::floating(NuGetVersion::new(0, 0, 0), FloatBehavior::Major));
        }

        if let Some((numbers, label)) = value.split_once('-') {
            // `1.0.0-*` / `1.0.0-beta*`
            let prefix = label.strip_suffix('*')?;
            if prefix.contains('*') || numbers.contains('*') {
                return None;
            }
            let base = NuGetVersion::try_parse(numbers)?;
            let base = if prefix.is_empty() {
                // lowest possible prerelease of that version
                base.with_prerelease("0")
            } else {
                base.with_prerelease(prefix.trim_end_matches('.'))
            };
            return Some(Self::floating(base, FloatBehavior::Prerelease));
        }

        let floor = value.strip_suffix(".*")?;
        if floor.contains('*') {
            return None;
        }
        let parts = floor.split('.').count();
        let behavior = match parts {
            1 => FloatBehavior::Minor,
            2 => FloatBehavior::Patch,
            3 => FloatBehavior::Revision,
            _ => return None,
        };
        Some(Self::floating(NuGetVersion::try_parse(floor)?, behavior))
    }

    fn floating(min: NuGetVersion, behavior: FloatBehavior) -> Self {
        Self {
            min: Some(min),
            min_inclusive: true,
            max: None,
            max_inclusive: false,
            float: Some(behavior),
            original: String::new(),
        }
    }

    pub fn min_version(&self) -> Option<&NuGetVersion> {
        self.min.as_ref()
    }

    pub fn max_version(&self) -> Option<&NuGetVersion> {
        self.max.as_ref()
    }

    pub fn is_min_inclusive(&self) -> bool {
        self.min_inclusive
    }

    pub fn is_max_inclusive(&self) -> bool {
        self.max_inclusive
    }

    pub fn is_floating(&self) -> bool {
        self.float.is_some()
    }

    pub fn float_behavior(&self) -> Option<FloatBehavior> {
        self.float
    }

    /// `[1.2.3]` style range: both bounds present, inclusive and equal.
    pub fn is_exact(&self) -> bool {
        self.min_inclusive
            && self.max_inclusive
            && self.min.is_some()
            && self.min == self.max
    }

    pub fn satisfies(&self, version: &NuGetVersion) -> bool {
        let above_min = match &self.min {
            None => true,
            Some(min) if self.min_inclusive => version >= min,
            Some(min) => version > min,
        };
        let below_max = match &self.max {
            None => true,
            Some(max) if self.max_inclusive => version <= max,
            Some(max) => version < max,
        };
        above_min && below_max
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}
