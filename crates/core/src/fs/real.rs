use super::{DirEntry, FileSystem, FileType};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub struct RealFileSystem;

impl RealFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RealFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).context(format!("Failed to read file {:?}", path))
    }

    fn write_string(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .context(format!("Failed to create directory {:?}", parent))?;
            }
        }
        fs::write(path, content).context(format!("Failed to write file {:?}", path))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let entries = fs::read_dir(path).context(format!("Failed to read directory {:?}", path))?;

        let mut result = Vec::new();
        for entry in entries {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();
            let file_type = if path.is_dir() {
                FileType::Directory
            } else {
                FileType::File
            };

            result.push(DirEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                path,
                file_type,
            });
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_read() {
        let temp = TempDir::new().unwrap();
        let fs = RealFileSystem::new();
        let path = temp.path().join("obj").join("project.assets.json");

        fs.write_string(&path, "{}").unwrap();

        assert!(fs.exists(&path));
        assert!(fs.is_file(&path));
        assert!(fs.is_dir(&temp.path().join("obj")));
        assert_eq!(fs.read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_read_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        let fs = RealFileSystem::new();
        assert!(fs.read_to_string(&temp.path().join("missing.csproj")).is_err());
    }

    #[test]
    fn test_files_with_suffix() {
        let temp = TempDir::new().unwrap();
        let fs = RealFileSystem::new();
        fs.write_string(&temp.path().join("web.typemap"), "").unwrap();
        fs.write_string(&temp.path().join("Rules.APITARGETS"), "[]").unwrap();
        fs.write_string(&temp.path().join("App.cs"), "").unwrap();

        let typemaps = fs.files_with_suffix(temp.path(), ".typemap").unwrap();
        assert_eq!(typemaps, vec![temp.path().join("web.typemap")]);

        let targets = fs.files_with_suffix(temp.path(), ".apitargets").unwrap();
        assert_eq!(targets.len(), 1);
    }
}
