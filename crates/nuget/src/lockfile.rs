//! Reader for the restore lock file (`obj/project.assets.json`).

use crate::error::NuGetError;
use crate::range::VersionRange;
use crate::version::NuGetVersion;
use dotport_core::FileSystem;
use dotport_msbuild::TargetFrameworkMoniker;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct RawLockFile {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    targets: BTreeMap<String, BTreeMap<String, RawLibrary>>,
    #[serde(default, rename = "projectFileDependencyGroups")]
    project_file_dependency_groups: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawLibrary {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryKind {
    Package,
    Project,
    Other,
}

#[derive(Debug, Clone)]
pub struct LockFileDependency {
    pub name: String,
    /// `None` when the declared range could not be parsed.
    pub range: Option<VersionRange>,
}

#[derive(Debug, Clone)]
pub struct LockFileLibrary {
    pub name: String,
    pub version: NuGetVersion,
    pub kind: LibraryKind,
    pub dependencies: Vec<LockFileDependency>,
}

impl LockFileLibrary {
    pub fn depends_on(&self, name: &str) -> Option<&LockFileDependency> {
        self.dependencies
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
    }
}

/// The resolved closure for one framework (and optionally one runtime).
#[derive(Debug, Clone)]
pub struct LockFileTarget {
    pub key: String,
    pub framework: Option<TargetFrameworkMoniker>,
    pub runtime: Option<String>,
    pub libraries: Vec<LockFileLibrary>,
    direct: Vec<String>,
}

impl LockFileTarget {
    pub fn library(&self, name: &str) -> Option<&LockFileLibrary> {
        self.libraries
            .iter()
            .find(|l| l.name.eq_ignore_ascii_case(name))
    }

    /// Names the project itself depends on for this framework.
    pub fn direct_dependencies(&self) -> &[String] {
        &self.direct
    }

    /// Every library reachable from `roots`, roots included. Names are
    /// compared case-insensitively; missing libraries are ignored.
    pub fn transitive_closure<S: AsRef<str>>(&self, roots: &[S]) -> Vec<&LockFileLibrary> {
        let mut seen = BTreeSet::new();
        let mut closure = Vec::new();
        let mut queue: VecDeque<String> = roots.iter().map(|r| r.as_ref().to_string()).collect();

        while let Some(name) = queue.pop_front() {
            if !seen.insert(name.to_lowercase()) {
                continue;
            }
            let Some(library) = self.library(&name) else {
                continue;
            };
            for dependency in &library.dependencies {
                queue.push_back(dependency.name.clone());
            }
            closure.push(library);
        }
        closure
    }

    fn matches(&self, tfm: &TargetFrameworkMoniker) -> bool {
        match &self.framework {
            Some(framework) => {
                framework == tfm || framework.name().eq_ignore_ascii_case(&tfm.name())
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LockFile {
    path: PathBuf,
    version: u32,
    targets: Vec<LockFileTarget>,
}

impl LockFile {
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Result<Self, NuGetError> {
        let content = fs.read_to_string(path).map_err(|e| NuGetError::LockFile {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?;
        Self::parse(path, &content)
    }

    pub fn parse(path: &Path, content: &str) -> Result<Self, NuGetError> {
        let raw: RawLockFile = serde_json::from_str(content).map_err(|e| NuGetError::LockFile {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?;

        let mut targets = Vec::with_capacity(raw.targets.len());
        for (key, libraries) in raw.targets {
            let (framework_name, runtime) = match key.split_once('/') {
                Some((framework, rid)) => (framework.to_string(), Some(rid.to_string())),
                None => (key.clone(), None),
            };
            let framework = match TargetFrameworkMoniker::parse(&framework_name) {
                Ok(tfm) => Some(tfm),
                Err(e) => {
                    warn!(lock_file = %path.display(), target = %key, "{}", e);
                    None
                }
            };

            let libraries = libraries
                .into_iter()
                .filter_map(|(id, library)| Self::convert_library(path, &id, library))
                .collect();

            let direct = raw
                .project_file_dependency_groups
                .get(&framework_name)
                .map(|group| {
                    group
                        .iter()
                        .filter_map(|entry| entry.split_whitespace().next())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();

            targets.push(LockFileTarget {
                key,
                framework,
                runtime,
                libraries,
                direct,
            });
        }

        debug!(lock_file = %path.display(), targets = targets.len(), "Parsed lock file");

        Ok(Self {
            path: path.to_path_buf(),
            version: raw.version,
            targets,
        })
    }

    fn convert_library(path: &Path, id: &str, library: RawLibrary) -> Option<LockFileLibrary> {
        let Some((name, version)) = id.rsplit_once('/') else {
            warn!(lock_file = %path.display(), library = %id, "Library key has no version");
            return None;
        };
        let Some(version) = NuGetVersion::try_parse(version) else {
            warn!(lock_file = %path.display(), library = %id, "Library has an unparsable version");
            return None;
        };
        let kind = match library.kind.as_deref() {
            Some(k) if k.eq_ignore_ascii_case("package") => LibraryKind::Package,
            Some(k) if k.eq_ignore_ascii_case("project") => LibraryKind::Project,
            _ => LibraryKind::Other,
        };
        let dependencies = library
            .dependencies
            .into_iter()
            .map(|(name, range)| LockFileDependency {
                range: VersionRange::try_parse(&range),
                name,
            })
            .collect();

        Some(LockFileLibrary {
            name: name.to_string(),
            version,
            kind,
            dependencies,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn targets(&self) -> &[LockFileTarget] {
        &self.targets
    }

    /// The runtime-independent target for `tfm`, falling back to a
    /// runtime-specific one when that is all the lock file has.
    pub fn target(&self, tfm: &TargetFrameworkMoniker) -> Option<&LockFileTarget> {
        self.targets
            .iter()
            .filter(|t| t.matches(tfm))
            .min_by_key(|t| t.runtime.is_some())
    }
}
