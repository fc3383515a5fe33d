use crate::error::NuGetError;
use crate::lockfile::{LibraryKind, LockFile, LockFileTarget};
use crate::reference::NuGetReferenceExt;
use async_trait::async_trait;
use dotport_core::{require_non_empty, CancellationToken, FileSystem};
use dotport_msbuild::{NuGetReference, ProjectFile, TargetFrameworkMoniker};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Answers questions about a project's transitive package closure.
#[async_trait]
pub trait TransitiveDependencyIdentifier: Send + Sync {
    /// Every package the project pulls in for any of its frameworks.
    async fn transitive_package_references(
        &self,
        project: &dyn ProjectFile,
        token: &CancellationToken,
    ) -> Result<Vec<NuGetReference>, NuGetError>;

    /// Whether `package_name` appears anywhere in the project's closure.
    async fn is_transitively_available(
        &self,
        project: &dyn ProjectFile,
        package_name: &str,
        token: &CancellationToken,
    ) -> Result<bool, NuGetError>;

    /// Whether some other package in the closure depends on `reference` with
    /// a range whose lower bound is exactly the reference's version.
    async fn is_transitive_dependency(
        &self,
        project: &dyn ProjectFile,
        reference: &NuGetReference,
        token: &CancellationToken,
    ) -> Result<bool, NuGetError>;
}

/// Reads the answers from the project's restore lock file. Nothing is
/// cached, so results always reflect the lock file on disk.
pub struct LockFileTransitiveIdentifier {
    fs: Arc<dyn FileSystem>,
}

impl LockFileTransitiveIdentifier {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// `Ok(None)` for `packages.config` projects without a lock file;
    /// PackageReference-style projects need one.
    fn read_lock_file(
        &self,
        project: &dyn ProjectFile,
        token: &CancellationToken,
    ) -> Result<Option<LockFile>, NuGetError> {
        token.check()?;
        let path = project.lock_file_path();
        if !self.fs.is_file(&path) {
            if project.uses_package_references() {
                return Err(NuGetError::RestoreRequired {
                    project: project.file_path().to_path_buf(),
                    lock_file: path,
                });
            }
            debug!(project = %project.file_path().display(), "No lock file, using direct package references");
            return Ok(None);
        }
        LockFile::load(self.fs.as_ref(), &path).map(Some)
    }

    fn targets<'a>(lock: &'a LockFile, frameworks: &[TargetFrameworkMoniker]) -> Vec<&'a LockFileTarget> {
        if frameworks.is_empty() {
            return lock.targets().iter().filter(|t| t.runtime.is_none()).collect();
        }
        frameworks.iter().filter_map(|tfm| lock.target(tfm)).collect()
    }
}

#[async_trait]
impl TransitiveDependencyIdentifier for LockFileTransitiveIdentifier {
    async fn transitive_package_references(
        &self,
        project: &dyn ProjectFile,
        token: &CancellationToken,
    ) -> Result<Vec<NuGetReference>, NuGetError> {
        let Some(lock) = self.read_lock_file(project, token)? else {
            return Ok(project.package_references().to_vec());
        };

        let mut seen = BTreeSet::new();
        let mut references = Vec::new();
        for target in Self::targets(&lock, project.target_frameworks()) {
            for library in &target.libraries {
                if library.kind != LibraryKind::Package {
                    continue;
                }
                let key = (library.name.to_lowercase(), library.version.clone());
                if seen.insert(key) {
                    references.push(NuGetReference::new(
                        library.name.clone(),
                        library.version.to_string(),
                    ));
                }
            }
        }
        Ok(references)
    }

    async fn is_transitively_available(
        &self,
        project: &dyn ProjectFile,
        package_name: &str,
        token: &CancellationToken,
    ) -> Result<bool, NuGetError> {
        require_non_empty("package_name", package_name)?;

        let Some(lock) = self.read_lock_file(project, token)? else {
            return Ok(project
                .package_references()
                .iter()
                .any(|r| r.matches(package_name)));
        };

        let direct: Vec<&str> = project
            .package_references()
            .iter()
            .map(|r| r.name.as_str())
            .collect();

        Ok(Self::targets(&lock, project.target_frameworks())
            .into_iter()
            .any(|target| {
                let mut roots: Vec<&str> = target.direct_dependencies().iter().map(String::as_str).collect();
                roots.extend(direct.iter().copied());
                target
                    .transitive_closure(&roots)
                    .iter()
                    .any(|library| library.name.eq_ignore_ascii_case(package_name))
            }))
    }

    async fn is_transitive_dependency(
        &self,
        project: &dyn ProjectFile,
        reference: &NuGetReference,
        token: &CancellationToken,
    ) -> Result<bool, NuGetError> {
        require_non_empty("reference", &reference.name)?;

        let Some(version) = reference.try_get_version() else {
            return Ok(false);
        };
        let Some(lock) = self.read_lock_file(project, token)? else {
            return Ok(false);
        };

        let found = Self::targets(&lock, project.target_frameworks())
            .into_iter()
            .flat_map(|target| target.libraries.iter())
            .filter(|library| !library.name.eq_ignore_ascii_case(&reference.name))
            .filter_map(|library| library.depends_on(&reference.name))
            .any(|dependency| {
                dependency
                    .range
                    .as_ref()
                    .and_then(|r| r.min_version())
                    .map(|min| *min == version)
                    .unwrap_or(false)
            });

        debug!(
            project = %project.file_path().display(),
            package = %reference,
            transitive = found,
            "Checked transitive dependency"
        );
        Ok(found)
    }
}

/// Treats the project's direct package references as its whole closure.
/// Used when no restore has run and an approximate answer is acceptable.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectReferenceIdentifier;

#[async_trait]
impl TransitiveDependencyIdentifier for DirectReferenceIdentifier {
    async fn transitive_package_references(
        &self,
        project: &dyn ProjectFile,
        token: &CancellationToken,
    ) -> Result<Vec<NuGetReference>, NuGetError> {
        token.check()?;
        Ok(project.package_references().to_vec())
    }

    async fn is_transitively_available(
        &self,
        project: &dyn ProjectFile,
        package_name: &str,
        token: &CancellationToken,
    ) -> Result<bool, NuGetError> {
        require_non_empty("package_name", package_name)?;
        token.check()?;
        Ok(project
            .package_references()
            .iter()
            .any(|r| r.matches(package_name)))
    }

    async fn is_transitive_dependency(
        &self,
        _project: &dyn ProjectFile,
        reference: &NuGetReference,
        token: &CancellationToken,
    ) -> Result<bool, NuGetError> {
        require_non_empty("reference", &reference.name)?;
        token.check()?;
        Ok(false)
    }
}
