//! Locating projects, source files and analyzer inputs on disk.

use anyhow::{bail, Context, Result};
use dotport_analyzers::{AdditionalText, Compilation, Language, SymbolTable};
use dotport_core::FileSystem;
use dotport_msbuild::{normalize_path, Solution};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

const PROJECT_SUFFIXES: &[&str] = &[".csproj", ".vbproj", ".fsproj"];
const ADDITIONAL_FILE_SUFFIXES: &[&str] = &[".apitargets", ".typemap"];
const SKIPPED_DIRS: &[&str] = &["bin", "obj", ".git", ".vs", "node_modules", "packages"];

/// Entry-point project files for `path`.
///
/// A solution yields its projects; a project file yields itself. For a
/// directory the first solution wins, otherwise every project file directly
/// inside it is used. Returned paths have `.` and `..` folded.
pub fn resolve_projects(fs: &dyn FileSystem, path: &Path) -> Result<Vec<PathBuf>> {
    let mut projects = find_projects(fs, path)?;
    for project in &mut projects {
        *project = normalize_path(project);
    }
    projects.dedup();
    Ok(projects)
}

fn find_projects(fs: &dyn FileSystem, path: &Path) -> Result<Vec<PathBuf>> {
    if fs.is_file(path) {
        if has_suffix(path, &[".sln"]) {
            let solution = Solution::load(fs, path)
                .with_context(|| format!("Failed to read solution {}", path.display()))?;
            let projects = solution.project_paths();
            if projects.is_empty() {
                bail!("Solution {} contains no projects", path.display());
            }
            return Ok(projects);
        }
        if has_suffix(path, PROJECT_SUFFIXES) {
            return Ok(vec![path.to_path_buf()]);
        }
        bail!(
            "{} is neither a solution nor a project file",
            path.display()
        );
    }

    if !fs.is_dir(path) {
        bail!("Path does not exist: {}", path.display());
    }

    let solutions = fs.files_with_suffix(path, ".sln")?;
    if let Some(solution) = solutions.first() {
        if solutions.len() > 1 {
            warn!(solution = %solution.display(), "Multiple solutions found, using the first");
        }
        return find_projects(fs, solution);
    }

    let mut projects = Vec::new();
    for suffix in PROJECT_SUFFIXES {
        projects.extend(fs.files_with_suffix(path, suffix)?);
    }
    projects.sort();
    if projects.is_empty() {
        bail!("No solution or project file found in {}", path.display());
    }
    Ok(projects)
}

/// Source and analyzer input files under one directory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SourceSet {
    pub sources: Vec<PathBuf>,
    pub additional_files: Vec<PathBuf>,
}

/// Walks the directory of `path` (or `path` itself when it is a directory),
/// skipping build output and tool folders.
pub fn collect_sources(path: &Path) -> SourceSet {
    let root = if path.is_file() {
        path.parent().unwrap_or(Path::new(".")).to_path_buf()
    } else {
        path.to_path_buf()
    };

    let mut set = SourceSet::default();
    let walker = WalkDir::new(&root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let file = entry.into_path();
        if Language::from_path(&file).is_some() {
            set.sources.push(file);
        } else if has_suffix(&file, ADDITIONAL_FILE_SUFFIXES) {
            set.additional_files.push(file);
        }
    }

    debug!(
        root = %root.display(),
        sources = set.sources.len(),
        additional_files = set.additional_files.len(),
        "Collected source files"
    );
    set
}

/// Builds a compilation from the sources under `path`.
///
/// `extra_files` are added after the discovered `*.apitargets` and
/// `*.typemap` files. `references` is a symbol list with one
/// documentation-comment id (`T:Namespace.Type`) per line.
pub fn load_compilation(
    fs: &dyn FileSystem,
    path: &Path,
    references: Option<&Path>,
    extra_files: &[PathBuf],
) -> Result<Compilation> {
    let set = collect_sources(path);

    let mut compilation = Compilation::new();
    if let Some(references) = references {
        let text = fs
            .read_to_string(references)
            .with_context(|| format!("Failed to read reference list {}", references.display()))?;
        compilation = compilation.with_references(SymbolTable::parse_reference_list(&text));
    }

    for source in &set.sources {
        let text = match fs.read_to_string(source) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %source.display(), "Skipping unreadable source file: {}", e);
                continue;
            }
        };
        if let Err(e) = compilation.add_source(source.clone(), text) {
            warn!(path = %source.display(), "Skipping source file: {}", e);
        }
    }

    for file in set.additional_files.iter().chain(extra_files) {
        let text = fs
            .read_to_string(file)
            .with_context(|| format!("Failed to read additional file {}", file.display()))?;
        compilation.add_additional_file(AdditionalText::new(file.clone(), text));
    }

    Ok(compilation)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| SKIPPED_DIRS.iter().any(|d| name.eq_ignore_ascii_case(d)))
            .unwrap_or(false)
}

fn has_suffix(path: &Path, suffixes: &[&str]) -> bool {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    suffixes.iter().any(|s| name.ends_with(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dotport_core::{MockFileSystem, RealFileSystem};
    use std::fs;
    use tempfile::TempDir;
    use yare::parameterized;

    const SOLUTION: &str = r#"
Microsoft Visual Studio Solution File, Format Version 12.00
Project("{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}") = "Web", "src\Web\Web.csproj", "{11111111-1111-1111-1111-111111111111}"
EndProject
"#;

    #[parameterized(
        csharp = { "src/App.csproj", PROJECT_SUFFIXES, true },
        upper_case = { "LEGACY.VBPROJ", PROJECT_SUFFIXES, true },
        solution = { "Shop.sln", PROJECT_SUFFIXES, false },
        typemap = { "rules/web.typemap", ADDITIONAL_FILE_SUFFIXES, true },
        no_extension = { "apitargets", ADDITIONAL_FILE_SUFFIXES, false },
    )]
    fn test_has_suffix(path: &str, suffixes: &[&str], expected: bool) {
        assert_eq!(has_suffix(Path::new(path), suffixes), expected);
    }

    #[test]
    fn test_project_file_resolves_to_itself() {
        let fs = MockFileSystem::new();
        fs.add_file("App/App.csproj", "<Project Sdk=\"Microsoft.NET.Sdk\" />");
        let projects = resolve_projects(&fs, Path::new("/mock/App/App.csproj")).unwrap();
        assert_eq!(projects, vec![PathBuf::from("/mock/App/App.csproj")]);
    }

    #[test]
    fn test_relative_project_path_is_normalized() {
        let fs = MockFileSystem::new();
        fs.add_file("App/App.csproj", "<Project Sdk=\"Microsoft.NET.Sdk\" />");
        let projects = resolve_projects(&fs, Path::new("./App/App.csproj")).unwrap();
        assert_eq!(projects, vec![PathBuf::from("App/App.csproj")]);
    }

    #[test]
    fn test_directory_prefers_solution() {
        let fs = MockFileSystem::new();
        fs.add_file("Shop.sln", SOLUTION);
        fs.add_file("Other.csproj", "<Project />");
        fs.add_file("src/Web/Web.csproj", "<Project />");

        let projects = resolve_projects(&fs, Path::new("/mock")).unwrap();
        assert_eq!(projects.len(), 1);
        assert!(projects[0].ends_with("Web.csproj"));
    }

    #[test]
    fn test_directory_without_solution_uses_project_files() {
        let fs = MockFileSystem::new();
        fs.add_file("Lib.vbproj", "<Project />");
        fs.add_file("App.csproj", "<Project />");
        fs.add_file("readme.md", "");

        let projects = resolve_projects(&fs, Path::new("/mock")).unwrap();
        assert_eq!(
            projects,
            vec![PathBuf::from("/mock/App.csproj"), PathBuf::from("/mock/Lib.vbproj")]
        );
    }

    #[test]
    fn test_empty_directory_is_an_error() {
        let fs = MockFileSystem::new();
        fs.add_file("docs/readme.md", "");
        assert!(resolve_projects(&fs, Path::new("/mock/docs")).is_err());
        assert!(resolve_projects(&fs, Path::new("/mock/missing")).is_err());
    }

    #[test]
    fn test_collect_sources_skips_build_output() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("Controllers")).unwrap();
        fs::create_dir_all(root.join("obj/Debug")).unwrap();
        fs::create_dir_all(root.join("bin")).unwrap();
        fs::write(root.join("App.csproj"), "<Project />").unwrap();
        fs::write(root.join("Controllers/Home.cs"), "class Home {}").unwrap();
        fs::write(root.join("Module.vb"), "Module M\nEnd Module\n").unwrap();
        fs::write(root.join("obj/Debug/Generated.cs"), "class G {}").unwrap();
        fs::write(root.join("bin/Old.cs"), "class O {}").unwrap();
        fs::write(root.join("rules.apitargets"), "[]").unwrap();
        fs::write(root.join("extra.typemap"), "").unwrap();

        let set = collect_sources(&root.join("App.csproj"));
        let names: Vec<String> = set
            .sources
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["Home.cs", "Module.vb"]);
        assert_eq!(set.additional_files.len(), 2);
    }

    #[test]
    fn test_load_compilation_with_references() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Home.cs"), "using System.Web.Mvc;\nclass Home {}\n").unwrap();
        fs::write(dir.path().join("refs.txt"), "T:System.Web.Mvc.Controller\n").unwrap();

        let fs = RealFileSystem::new();
        let compilation =
            load_compilation(&fs, dir.path(), Some(&dir.path().join("refs.txt")), &[]).unwrap();
        assert_eq!(compilation.trees().len(), 1);
        assert!(!compilation.references().is_empty());
    }
}
