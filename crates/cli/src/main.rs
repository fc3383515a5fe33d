use anyhow::{Context, Result};
use clap::Parser;
use dotport_analyzers::{AnalysisDriver, BatchFixer};
use dotport_cli::cli::commands::{
    AnalyzeArgs, CliArgs, Commands, ComponentsArgs, ConfigArgs, FixArgs, TfmArgs, VersionsArgs,
};
use dotport_cli::cli::output::{
    ComponentsReport, FixReport, OutputFormatter, PackageReport, TfmReport,
};
use dotport_cli::workspace::{load_compilation, resolve_projects};
use dotport_core::logging::parse_level;
use dotport_core::{
    init_logging, CancellationSource, CancellationToken, DotportConfig, FileSystem, LoggingConfig,
    RealFileSystem,
};
use dotport_msbuild::{MsBuildProject, ProjectFile, ProjectGraph, TargetFrameworkMoniker};
use dotport_nuget::{DirectReferenceIdentifier, LockFileTransitiveIdentifier, NuGetError, PackageSearcher};
use dotport_stack::{
    ComponentIdentifier, CompositeComponentIdentifier, ProjectComponents, SelectorOptions,
    TargetFrameworkSelector,
};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing::{debug, error, info, warn, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    init_logging_from_args(&args);

    debug!("dotport v{} starting", dotport_cli::VERSION);
    debug!("Command: {:?}", args.command);

    let cancellation = Arc::new(CancellationSource::new());
    let token = cancellation.token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            cancellation.cancel();
        }
    });

    let result = match &args.command {
        Commands::Components(components_args) => handle_components(components_args, &token).await,
        Commands::Tfm(tfm_args) => handle_tfm(tfm_args, &token).await,
        Commands::Analyze(analyze_args) => handle_analyze(analyze_args, &token),
        Commands::Fix(fix_args) => handle_fix(fix_args, &token),
        Commands::Versions(versions_args) => handle_versions(versions_args, &token).await,
        Commands::Config(config_args) => handle_config(config_args),
    };

    let exit_code = match result {
        Ok(()) => 0,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    };

    process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let level = if args.quiet {
        Level::ERROR
    } else if args.verbose {
        Level::DEBUG
    } else if let Some(level) = &args.log_level {
        parse_level(level)
    } else if let Ok(level) = env::var("DOTPORT_LOG_LEVEL") {
        parse_level(&level)
    } else {
        Level::WARN
    };

    let use_json = env::var("DOTPORT_LOG_JSON")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);

    init_logging(LoggingConfig {
        level,
        use_json,
        include_target: args.verbose,
        include_location: false,
        include_thread_ids: false,
    });
}

fn load_config() -> Result<DotportConfig> {
    let config = DotportConfig::from_env().context("Failed to read configuration")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn target_path(path: &Option<PathBuf>) -> PathBuf {
    path.clone().unwrap_or_else(|| PathBuf::from("."))
}

fn load_graph(fs: &dyn FileSystem, path: &Path) -> Result<ProjectGraph> {
    let entry_points = resolve_projects(fs, path)?;
    info!(projects = entry_points.len(), "Loading projects");
    ProjectGraph::load(fs, &entry_points).context("Failed to load projects")
}

/// Components from lock-file packages, or from direct references when no
/// restore has produced a lock file.
async fn identify_components(
    fs: Arc<dyn FileSystem>,
    project: &MsBuildProject,
    token: &CancellationToken,
) -> Result<ProjectComponents> {
    let identifier =
        CompositeComponentIdentifier::with_defaults(Arc::new(LockFileTransitiveIdentifier::new(fs)));

    match identifier.get_components(project, token).await {
        Ok(components) => Ok(components),
        Err(NuGetError::RestoreRequired { project: path, lock_file }) => {
            warn!(
                project = %path.display(),
                lock_file = %lock_file.display(),
                "No lock file, using direct package references only"
            );
            eprintln!("Hint: run 'dotnet restore' to include transitive packages");
            let fallback = CompositeComponentIdentifier::with_defaults(Arc::new(DirectReferenceIdentifier));
            fallback
                .get_components(project, token)
                .await
                .with_context(|| format!("Failed to identify components of {}", path.display()))
        }
        Err(e) => Err(e)
            .with_context(|| format!("Failed to identify components of {}", project.file_path().display())),
    }
}

fn write_output(output: &str, file: Option<&Path>) -> Result<()> {
    match file {
        Some(path) => {
            fs::write(path, output).with_context(|| format!("Failed to write output to {}", path.display()))?;
            info!("Output written to {}", path.display());
        }
        None => println!("{}", output),
    }
    Ok(())
}

async fn handle_components(args: &ComponentsArgs, token: &CancellationToken) -> Result<()> {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem::new());
    let graph = load_graph(fs.as_ref(), &target_path(&args.path))?;

    let mut reports = Vec::new();
    for project in graph.upgrade_order() {
        let components = identify_components(fs.clone(), &project, token).await?;
        debug!(project = %project.file_path().display(), %components, "Identified components");
        reports.push(ComponentsReport {
            project: project.file_path().to_path_buf(),
            components,
        });
    }

    let formatter = OutputFormatter::new(args.format.into());
    write_output(&formatter.format_components(&reports)?, args.output.as_deref())
}

async fn handle_tfm(args: &TfmArgs, token: &CancellationToken) -> Result<()> {
    let mut config = load_config()?;
    if let Some(support) = args.support {
        config.tfm_support = support.into();
    }
    let options = SelectorOptions::from_config(&config)?;
    let selector = TargetFrameworkSelector::with_defaults(options);

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem::new());
    let graph = load_graph(fs.as_ref(), &target_path(&args.path))?;

    let mut selected: HashMap<PathBuf, TargetFrameworkMoniker> = HashMap::new();
    let mut reports = Vec::new();

    // dependencies come first, so their selections are known when needed
    for project in graph.upgrade_order() {
        token.check()?;
        let components = identify_components(fs.clone(), &project, token).await?;
        let dependencies: Vec<TargetFrameworkMoniker> = project
            .project_references()
            .iter()
            .filter_map(|reference| selected.get(reference).cloned())
            .collect();

        let recommended = selector
            .select(&*project, components, &dependencies)
            .with_context(|| format!("Failed to select a framework for {}", project.file_path().display()))?;
        info!(project = %project.file_path().display(), tfm = %recommended, "Selected target framework");

        selected.insert(project.file_path().to_path_buf(), recommended.clone());
        reports.push(TfmReport {
            project: project.file_path().to_path_buf(),
            current: project.target_frameworks().to_vec(),
            recommended,
        });
    }

    let formatter = OutputFormatter::new(args.format.into());
    write_output(&formatter.format_tfm(&reports)?, args.output.as_deref())
}

fn handle_analyze(args: &AnalyzeArgs, token: &CancellationToken) -> Result<()> {
    let fs = RealFileSystem::new();
    let path = target_path(&args.path);
    let compilation = load_compilation(&fs, &path, args.references.as_deref(), &args.additional_files)?;
    if compilation.trees().is_empty() {
        warn!(path = %path.display(), "No C# or Visual Basic sources found");
    }

    let diagnostics = AnalysisDriver::with_defaults()
        .analyze(&compilation, token)
        .context("Analysis failed")?;

    let formatter = OutputFormatter::new(args.format.into());
    write_output(&formatter.format_diagnostics(&diagnostics)?, args.output.as_deref())
}

fn handle_fix(args: &FixArgs, token: &CancellationToken) -> Result<()> {
    let fs = RealFileSystem::new();
    let path = target_path(&args.path);
    let compilation = load_compilation(&fs, &path, args.references.as_deref(), &args.additional_files)?;

    let diagnostics = AnalysisDriver::with_defaults()
        .analyze(&compilation, token)
        .context("Analysis failed")?;
    let results = BatchFixer::with_defaults()
        .fix_all(&compilation, &diagnostics)
        .context("Failed to compute fixes")?;

    let mut reports = Vec::with_capacity(results.len());
    for result in results {
        token.check()?;
        let write = result.changed() && !args.dry_run;
        if write {
            fs.write_string(&result.path, &result.text)
                .with_context(|| format!("Failed to write {}", result.path.display()))?;
            info!(path = %result.path.display(), applied = result.applied, "Wrote fixed file");
        }
        reports.push(FixReport {
            path: result.path,
            applied: result.applied,
            skipped: result.skipped,
            written: write,
        });
    }

    let formatter = OutputFormatter::new(args.format.into());
    write_output(&formatter.format_fixes(&reports)?, None)
}

async fn handle_versions(args: &VersionsArgs, token: &CancellationToken) -> Result<()> {
    let config = load_config()?;
    let searcher = PackageSearcher::from_config(&config).context("Failed to configure package sources")?;

    let fs = RealFileSystem::new();
    let graph = load_graph(&fs, &target_path(&args.path))?;

    let mut reports = Vec::new();
    for project in graph.upgrade_order() {
        for reference in project.package_references() {
            let newer = searcher
                .get_newer_versions(reference, args.prerelease, token)
                .await
                .with_context(|| format!("Failed to look up versions of {}", reference.name))?;
            reports.push(PackageReport {
                project: project.file_path().to_path_buf(),
                package: reference.name.clone(),
                current_version: reference.version.clone(),
                latest: newer.last().cloned(),
                newer,
            });
        }
    }

    let formatter = OutputFormatter::new(args.format.into());
    write_output(&formatter.format_versions(&reports)?, args.output.as_deref())
}

fn handle_config(args: &ConfigArgs) -> Result<()> {
    let config = load_config()?;
    let formatter = OutputFormatter::new(args.format.into());
    write_output(&formatter.format_config(&config)?, None)
}
