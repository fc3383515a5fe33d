//! Output formatting for JSON, YAML and human-readable text.
//!
//! Every report type serializes as-is for the machine formats. The human
//! format renders a header followed by one tree per project or file.

use anyhow::{Context, Result};
use dotport_analyzers::Diagnostic;
use dotport_core::DotportConfig;
use dotport_msbuild::TargetFrameworkMoniker;
use dotport_nuget::NuGetVersion;
use dotport_stack::ProjectComponents;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

const RULE: &str = "\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}";
const BRANCH: &str = "\u{251C}\u{2500}";
const LAST: &str = "\u{2514}\u{2500}";

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format
    Yaml,
    /// Human-readable formatted text
    Human,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentsReport {
    pub project: PathBuf,
    pub components: ProjectComponents,
}

#[derive(Debug, Clone, Serialize)]
pub struct TfmReport {
    pub project: PathBuf,
    pub current: Vec<TargetFrameworkMoniker>,
    pub recommended: TargetFrameworkMoniker,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackageReport {
    pub project: PathBuf,
    pub package: String,
    pub current_version: String,
    pub latest: Option<NuGetVersion>,
    pub newer: Vec<NuGetVersion>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FixReport {
    pub path: PathBuf,
    pub applied: usize,
    pub skipped: usize,
    pub written: bool,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_components(&self, reports: &[ComponentsReport]) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(reports, "components"),
            OutputFormat::Yaml => to_yaml(reports, "components"),
            OutputFormat::Human => Ok(self.format_components_human(reports)),
        }
    }

    pub fn format_tfm(&self, reports: &[TfmReport]) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(reports, "target framework results"),
            OutputFormat::Yaml => to_yaml(reports, "target framework results"),
            OutputFormat::Human => Ok(self.format_tfm_human(reports)),
        }
    }

    pub fn format_diagnostics(&self, diagnostics: &[Diagnostic]) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(diagnostics, "diagnostics"),
            OutputFormat::Yaml => to_yaml(diagnostics, "diagnostics"),
            OutputFormat::Human => Ok(self.format_diagnostics_human(diagnostics)),
        }
    }

    pub fn format_fixes(&self, reports: &[FixReport]) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(reports, "fix results"),
            OutputFormat::Yaml => to_yaml(reports, "fix results"),
            OutputFormat::Human => Ok(self.format_fixes_human(reports)),
        }
    }

    pub fn format_versions(&self, reports: &[PackageReport]) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(reports, "package versions"),
            OutputFormat::Yaml => to_yaml(reports, "package versions"),
            OutputFormat::Human => Ok(self.format_versions_human(reports)),
        }
    }

    pub fn format_config(&self, config: &DotportConfig) -> Result<String> {
        let map: BTreeMap<String, String> = config.to_display_map().into_iter().collect();
        match self.format {
            OutputFormat::Json => to_json(&map, "configuration"),
            OutputFormat::Yaml => to_yaml(&map, "configuration"),
            OutputFormat::Human => Ok(config.to_string()),
        }
    }

    fn format_components_human(&self, reports: &[ComponentsReport]) -> String {
        let mut output = header("\u{2713} Project Components");
        for report in reports {
            output.push_str(&format!("{}\n", report.project.display()));
            output.push_str(&format!("{} {}\n\n", LAST, report.components));
        }
        output
    }

    fn format_tfm_human(&self, reports: &[TfmReport]) -> String {
        let mut output = header("\u{2713} Target Framework Recommendations");
        for report in reports {
            let current: Vec<String> = report.current.iter().map(|t| t.to_string()).collect();
            output.push_str(&format!("{}\n", report.project.display()));
            output.push_str(&format!("{} Current:     {}\n", BRANCH, current.join(";")));
            output.push_str(&format!("{} Recommended: {}\n\n", LAST, report.recommended));
        }
        output
    }

    fn format_diagnostics_human(&self, diagnostics: &[Diagnostic]) -> String {
        if diagnostics.is_empty() {
            return "\u{2713} No upgrade issues found\n".to_string();
        }

        let mut output = header(&format!("\u{26A0} {} upgrade issue(s)", diagnostics.len()));
        for diagnostic in diagnostics {
            output.push_str(&format!(
                "{}: {} {}: {}\n",
                diagnostic.location, diagnostic.severity, diagnostic.id, diagnostic.message
            ));
            if let Some(url) = diagnostic
                .fix_hint()
                .ok()
                .and_then(|hint| hint.documentation_url)
            {
                output.push_str(&format!("  {} {}\n", LAST, url));
            }
        }
        output
    }

    fn format_fixes_human(&self, reports: &[FixReport]) -> String {
        let mut output = header("\u{2713} Code Fixes");
        if reports.is_empty() {
            output.push_str("Nothing to fix\n");
            return output;
        }
        for report in reports {
            let state = if report.written { "written" } else { "not written" };
            output.push_str(&format!(
                "{}: {} applied, {} skipped ({})\n",
                report.path.display(),
                report.applied,
                report.skipped,
                state
            ));
        }
        output
    }

    fn format_versions_human(&self, reports: &[PackageReport]) -> String {
        let mut output = header("\u{2713} Package Versions");
        let mut by_project: BTreeMap<&PathBuf, Vec<&PackageReport>> = BTreeMap::new();
        for report in reports {
            by_project.entry(&report.project).or_default().push(report);
        }

        for (project, packages) in by_project {
            output.push_str(&format!("{}\n", project.display()));
            for (i, package) in packages.iter().enumerate() {
                let connector = if i == packages.len() - 1 { LAST } else { BRANCH };
                let latest = package
                    .latest
                    .as_ref()
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "up to date".to_string());
                output.push_str(&format!(
                    "{} {} {} -> {}\n",
                    connector, package.package, package.current_version, latest
                ));
            }
            output.push('\n');
        }
        output
    }
}

fn header(title: &str) -> String {
    format!("{}\n{}\n\n", title, RULE)
}

fn to_json<T: Serialize + ?Sized>(value: &T, what: &str) -> Result<String> {
    serde_json::to_string_pretty(value).with_context(|| format!("Failed to serialize {} to JSON", what))
}

fn to_yaml<T: Serialize + ?Sized>(value: &T, what: &str) -> Result<String> {
    serde_yaml::to_string(value).with_context(|| format!("Failed to serialize {} to YAML", what))
}
