//! FileSystem trait definition

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Type of file system entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    File,
    Directory,
}

/// A directory entry returned by read_dir
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub path: PathBuf,
    pub name: String,
    pub file_type: FileType,
}

impl DirEntry {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.name
    }

    pub fn is_file(&self) -> bool {
        self.file_type == FileType::File
    }
}

/// Abstraction over the file operations dotport performs
pub trait FileSystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    fn is_file(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Replace the contents of a file, creating it if needed
    fn write_string(&self, path: &Path, content: &str) -> Result<()>;

    /// List directory contents (not recursive)
    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>>;

    /// Files directly under `dir` whose name ends with `suffix` (case-insensitive)
    fn files_with_suffix(&self, dir: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
        let suffix = suffix.to_lowercase();
        let mut files: Vec<PathBuf> = self
            .read_dir(dir)?
            .into_iter()
            .filter(|e| e.is_file() && e.name.to_lowercase().ends_with(&suffix))
            .map(|e| e.path)
            .collect();
        files.sort();
        Ok(files)
    }
}
