use crate::error::NuGetError;
use crate::range::VersionRange;
use crate::version::NuGetVersion;
use dotport_msbuild::NuGetReference;

/// Version helpers for package references.
pub trait NuGetReferenceExt {
    /// Best-effort version of the reference. Floating ranges resolve to their
    /// floor (`4.*` is `4.0.0`), `[x]` to `x`. Anything else is `None`.
    fn try_get_version(&self) -> Option<NuGetVersion>;

    fn version_range(&self) -> Option<VersionRange>;

    fn has_wildcard_version(&self) -> bool;

    /// The pinned version of the reference. Floating, interval and unparsable
    /// versions are rejected as invalid arguments.
    fn fixed_version(&self) -> Result<NuGetVersion, NuGetError>;
}

impl NuGetReferenceExt for NuGetReference {
    fn try_get_version(&self) -> Option<NuGetVersion> {
        if let Some(version) = NuGetVersion::try_parse(&self.version) {
            return Some(version);
        }

        let range = VersionRange::try_parse(&self.version)?;
        if range.is_floating() || range.is_exact() {
            range.min_version().cloned()
        } else {
            None
        }
    }

    fn version_range(&self) -> Option<VersionRange> {
        VersionRange::try_parse(&self.version)
    }

    fn has_wildcard_version(&self) -> bool {
        self.version.contains('*')
    }

    fn fixed_version(&self) -> Result<NuGetVersion, NuGetError> {
        if self.has_wildcard_version() {
            return Err(NuGetError::InvalidArgument {
                name: "reference",
                reason: format!("{} uses a floating version", self),
            });
        }
        self.try_get_version().ok_or_else(|| NuGetError::InvalidArgument {
            name: "reference",
            reason: format!("{} does not specify a fixed version", self),
        })
    }
}
