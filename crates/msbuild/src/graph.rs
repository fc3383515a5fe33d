use crate::error::ProjectError;
use crate::msbuild_project::{normalize_path, MsBuildProject};
use crate::project::ProjectFile;
use dotport_core::FileSystem;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Entry projects plus everything they reference, transitively.
#[derive(Debug, Default)]
pub struct ProjectGraph {
    projects: BTreeMap<PathBuf, Arc<MsBuildProject>>,
    entry_points: Vec<PathBuf>,
}

impl ProjectGraph {
    /// Loads the entry projects and walks `ProjectReference` edges.
    ///
    /// A referenced project that does not exist is logged and skipped; an entry
    /// project that cannot be read is an error. Cycles are tolerated. Entry
    /// paths are normalized like reference paths so each project loads once.
    pub fn load(fs: &dyn FileSystem, entry_points: &[PathBuf]) -> Result<Self, ProjectError> {
        let entry_points: Vec<PathBuf> = entry_points.iter().map(|p| normalize_path(p)).collect();
        let mut queue: VecDeque<(PathBuf, bool)> =
            entry_points.iter().map(|p| (p.clone(), true)).collect();
        let mut graph = Self {
            projects: BTreeMap::new(),
            entry_points,
        };

        while let Some((path, is_entry)) = queue.pop_front() {
            if graph.projects.contains_key(&path) {
                continue;
            }

            let project = match MsBuildProject::load(fs, &path) {
                Ok(project) => project,
                Err(e) if !is_entry => {
                    warn!(project = %path.display(), "Skipping unreadable project reference: {}", e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            for reference in project.project_references() {
                if !graph.projects.contains_key(reference) {
                    queue.push_back((reference.clone(), false));
                }
            }

            debug!(project = %path.display(), "Added project to graph");
            graph.projects.insert(path, Arc::new(project));
        }

        Ok(graph)
    }

    pub fn entry_points(&self) -> &[PathBuf] {
        &self.entry_points
    }

    pub fn get(&self, path: &Path) -> Option<Arc<MsBuildProject>> {
        self.projects.get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn projects(&self) -> impl Iterator<Item = &Arc<MsBuildProject>> {
        self.projects.values()
    }

    /// Projects whose `ProjectReference`s include `path`.
    pub fn dependents_of(&self, path: &Path) -> Vec<Arc<MsBuildProject>> {
        self.projects
            .values()
            .filter(|p| p.project_references().iter().any(|r| r == path))
            .cloned()
            .collect()
    }

    /// Every project with its references ahead of it. Members of a cycle keep
    /// their path order relative to each other.
    pub fn upgrade_order(&self) -> Vec<Arc<MsBuildProject>> {
        let mut ordered = Vec::with_capacity(self.projects.len());
        let mut visited = BTreeSet::new();
        for path in self.projects.keys() {
            self.visit(path, &mut visited, &mut ordered);
        }
        ordered
    }

    fn visit(
        &self,
        path: &Path,
        visited: &mut BTreeSet<PathBuf>,
        ordered: &mut Vec<Arc<MsBuildProject>>,
    ) {
        if !visited.insert(path.to_path_buf()) {
            return;
        }
        let Some(project) = self.projects.get(path) else {
            return;
        };
        for reference in project.project_references() {
            self.visit(reference, visited, ordered);
        }
        ordered.push(project.clone());
    }
}
