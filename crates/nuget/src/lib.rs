//! NuGet versions and ranges, restore lock files, transitive dependency
//! lookups and newer-version search over package sources.

pub mod error;
pub mod lockfile;
pub mod range;
pub mod reference;
pub mod search;
pub mod source;
pub mod transitive;
pub mod version;

pub use error::{NuGetError, RegistryError};
pub use lockfile::{LibraryKind, LockFile, LockFileDependency, LockFileLibrary, LockFileTarget};
pub use range::{FloatBehavior, VersionRange};
pub use reference::NuGetReferenceExt;
pub use search::{PackageSearcher, RetryPolicy, SourceVersions};
pub use source::{NuGetV3Source, PackageSource};
pub use transitive::{
    DirectReferenceIdentifier, LockFileTransitiveIdentifier, TransitiveDependencyIdentifier,
};
pub use version::NuGetVersion;
