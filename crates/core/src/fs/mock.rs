use super::{DirEntry, FileSystem, FileType};
use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// In-memory file system for tests. Directories are implied by file paths.
pub struct MockFileSystem {
    files: RwLock<BTreeMap<PathBuf, String>>,
    root: PathBuf,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::with_root(PathBuf::from("/mock"))
    }

    pub fn with_root(root: PathBuf) -> Self {
        Self {
            files: RwLock::new(BTreeMap::new()),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: &str) {
        let path = self.normalize_path(path.as_ref());
        self.files
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path, content.to_string());
    }

    pub fn remove_file(&self, path: impl AsRef<Path>) {
        let path = self.normalize_path(path.as_ref());
        self.files
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&path);
    }

    fn normalize_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.is_file(path) || self.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        let path = self.normalize_path(path);
        self.files
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        let path = self.normalize_path(path);
        self.files
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .any(|p| p != &path && p.starts_with(&path))
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let path = self.normalize_path(path);
        self.files
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&path)
            .cloned()
            .ok_or_else(|| anyhow!("File not found: {:?}", path))
    }

    fn write_string(&self, path: &Path, content: &str) -> Result<()> {
        self.add_file(path, content);
        Ok(())
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let dir = self.normalize_path(path);
        if !self.is_dir(&dir) {
            return Err(anyhow!("Directory not found: {:?}", dir));
        }

        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        let mut entries: BTreeMap<PathBuf, FileType> = BTreeMap::new();
        for file in files.keys() {
            let Ok(relative) = file.strip_prefix(&dir) else {
                continue;
            };
            let mut components = relative.components();
            let Some(first) = components.next() else {
                continue;
            };
            let file_type = if components.next().is_some() {
                FileType::Directory
            } else {
                FileType::File
            };
            entries.insert(dir.join(first), file_type);
        }

        Ok(entries
            .into_iter()
            .map(|(path, file_type)| DirEntry {
                name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default(),
                path,
                file_type,
            })
            .collect())
    }
}
