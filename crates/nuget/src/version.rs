use crate::error::NuGetError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A NuGet package version: up to four numeric parts plus an optional
/// prerelease label. Build metadata (`+sha`) is accepted and dropped.
#[derive(Debug, Clone)]
pub struct NuGetVersion {
    major: u64,
    minor: u64,
    patch: u64,
    revision: u64,
    prerelease: Option<String>,
}

impl NuGetVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            revision: 0,
            prerelease: None,
        }
    }

    pub fn with_prerelease(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        self.prerelease = if label.is_empty() { None } else { Some(label) };
        self
    }

    pub fn with_revision(mut self, revision: u64) -> Self {
        self.revision = revision;
        self
    }

    pub fn parse(value: &str) -> Result<Self, NuGetError> {
        Self::try_parse(value).ok_or_else(|| NuGetError::InvalidVersion(value.to_string()))
    }

    pub fn try_parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let value = value.split('+').next()?;
        let (numbers, prerelease) = match value.split_once('-') {
            Some((numbers, label)) => (numbers, Some(label)),
            None => (value, None),
        };

        let parts: Vec<&str> = numbers.split('.').collect();
        if parts.is_empty() || parts.len() > 4 {
            return None;
        }
        let mut numeric = [0u64; 4];
        for (slot, part) in numeric.iter_mut().zip(&parts) {
            if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            *slot = part.parse().ok()?;
        }

        if let Some(label) = prerelease {
            let valid = !label.is_empty()
                && label
                    .split('.')
                    .all(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));
            if !valid {
                return None;
            }
        }

        Some(Self {
            major: numeric[0],
            minor: numeric[1],
            patch: numeric[2],
            revision: numeric[3],
            prerelease: prerelease.map(str::to_string),
        })
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    pub fn patch(&self) -> u64 {
        self.patch
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn prerelease(&self) -> Option<&str> {
        self.prerelease.as_deref()
    }

    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }

    fn numbers(&self) -> [u64; 4] {
        [self.major, self.minor, self.patch, self.revision]
    }
}

/// SemVer 2 label ordering: numeric identifiers compare numerically and sort
/// before alphanumeric ones; text compares case-insensitively.
fn compare_labels(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ordering = match (l.parse::<u64>(), r.parse::<u64>()) {
                    (Ok(l), Ok(r)) => l.cmp(&r),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => l.to_lowercase().cmp(&r.to_lowercase()),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

impl Ord for NuGetVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.numbers()
            .cmp(&other.numbers())
            .then_with(|| match (&self.prerelease, &other.prerelease) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => compare_labels(a, b),
            })
    }
}

impl PartialOrd for NuGetVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for NuGetVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NuGetVersion {}

impl std::hash::Hash for NuGetVersion {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.numbers().hash(state);
        self.prerelease.as_ref().map(|p| p.to_lowercase()).hash(state);
    }
}

/// Normalized form: three parts, a fourth only when non-zero.
impl fmt::Display for NuGetVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if self.revision > 0 {
            write!(f, ".{}", self.revision)?;
        }
        if let Some(label) = &self.prerelease {
            write!(f, "-{}", label)?;
        }
        Ok(())
    }
}

impl FromStr for NuGetVersion {
    type Err = NuGetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for NuGetVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for NuGetVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
