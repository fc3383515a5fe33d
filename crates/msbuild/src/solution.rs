use crate::error::ProjectError;
use crate::msbuild_project::resolve_relative;
use dotport_core::FileSystem;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const SOLUTION_FOLDER_TYPE: &str = "2150E333-8FDC-42A3-9474-1A3956D46DE8";
const PROJECT_EXTENSIONS: &[&str] = &["csproj", "vbproj", "fsproj"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionProject {
    pub name: String,
    pub path: PathBuf,
    pub type_guid: String,
}

#[derive(Debug, Clone)]
pub struct Solution {
    path: PathBuf,
    projects: Vec<SolutionProject>,
}

fn project_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^Project\("\{([0-9A-Fa-f-]+)\}"\)\s*=\s*"([^"]*)"\s*,\s*"([^"]*)"\s*,"#)
            .expect("Invalid solution project regex")
    })
}

impl Solution {
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Result<Self, ProjectError> {
        let content = fs.read_to_string(path).map_err(|e| ProjectError::Read {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?;
        Ok(Self::parse(path, &content))
    }

    /// Extracts `Project(...)` entries. Solution folders are skipped.
    pub fn parse(path: &Path, content: &str) -> Self {
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let projects = content
            .lines()
            .filter_map(|line| project_line().captures(line.trim()))
            .filter(|caps| !caps[1].eq_ignore_ascii_case(SOLUTION_FOLDER_TYPE))
            .map(|caps| SolutionProject {
                name: caps[2].to_string(),
                path: resolve_relative(&directory, &caps[3]),
                type_guid: caps[1].to_uppercase(),
            })
            .collect();

        Self {
            path: path.to_path_buf(),
            projects,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn projects(&self) -> &[SolutionProject] {
        &self.projects
    }

    /// Paths of entries that are MSBuild project files.
    pub fn project_paths(&self) -> Vec<PathBuf> {
        self.projects
            .iter()
            .filter(|p| {
                p.path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| PROJECT_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
                    .unwrap_or(false)
            })
            .map(|p| p.path.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dotport_core::MockFileSystem;

    const SLN: &str = r#"
Microsoft Visual Studio Solution File, Format Version 12.00
# Visual Studio Version 17
Project("{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}") = "Web", "src\Web\Web.csproj", "{11111111-1111-1111-1111-111111111111}"
EndProject
Project("{2150E333-8FDC-42A3-9474-1A3956D46DE8}") = "Solution Items", "Solution Items", "{22222222-2222-2222-2222-222222222222}"
EndProject
Project("{F184B08F-C81C-45F6-A57F-5ABD9991F28F}") = "Legacy", "src\Legacy\Legacy.vbproj", "{33333333-3333-3333-3333-333333333333}"
EndProject
Project("{54435603-DBB4-11D2-8724-00A0C9A8B90C}") = "Setup", "setup\Setup.vdproj", "{44444444-4444-4444-4444-444444444444}"
EndProject
Global
EndGlobal
"#;

    #[test]
    fn test_parse_solution() {
        let solution = Solution::parse(Path::new("/repo/App.sln"), SLN);

        assert_eq!(solution.projects().len(), 3);
        assert_eq!(solution.projects()[0].name, "Web");
        assert_eq!(
            solution.project_paths(),
            vec![
                PathBuf::from("/repo/src/Web/Web.csproj"),
                PathBuf::from("/repo/src/Legacy/Legacy.vbproj"),
            ]
        );
    }

    #[test]
    fn test_load_solution() {
        let fs = MockFileSystem::new();
        fs.add_file("App.sln", SLN);
        let solution = Solution::load(&fs, Path::new("/mock/App.sln")).unwrap();
        assert_eq!(solution.path(), Path::new("/mock/App.sln"));
        assert_eq!(solution.project_paths().len(), 2);
    }
}
