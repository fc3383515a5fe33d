use clap::{Parser, Subcommand, ValueEnum};
use dotport_core::TfmSupport;
use std::path::PathBuf;

/// Upgrade assistant for .NET projects
#[derive(Parser, Debug)]
#[command(
    name = "dotport",
    about = "Upgrade assistant for .NET projects",
    version,
    long_about = "dotport reads MSBuild projects and solutions statically, classifies the \
                  technologies they use, recommends the target framework to upgrade to, \
                  looks up newer package versions and reports (or fixes) source code that \
                  uses APIs removed by the upgrade."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - only log errors"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Identify the components of each project",
        long_about = "Classifies every project (web, WinForms, WPF, WinUI, Maui...) from its \
                      SDK, properties, references and packages. Transitive packages are read \
                      from obj/project.assets.json when a restore has produced one.\n\n\
                      Examples:\n  \
                      dotport components\n  \
                      dotport components MySolution.sln\n  \
                      dotport components src/Web/Web.csproj --format json"
    )]
    Components(ComponentsArgs),

    #[command(
        about = "Recommend the target framework for each project",
        long_about = "Selects the framework each project should move to, visiting dependencies \
                      before the projects that reference them.\n\n\
                      Examples:\n  \
                      dotport tfm MySolution.sln\n  \
                      dotport tfm --support preview\n  \
                      dotport tfm App.csproj --format yaml"
    )]
    Tfm(TfmArgs),

    #[command(
        about = "Report source code that needs changes",
        long_about = "Runs the upgrade analyzers over every C# and Visual Basic file under the \
                      project directory. Additional *.apitargets and *.typemap files found \
                      there (or passed with --additional-file) extend the built-in rules.\n\n\
                      Examples:\n  \
                      dotport analyze\n  \
                      dotport analyze src/Web --references refs.txt\n  \
                      dotport analyze App.csproj --format json"
    )]
    Analyze(AnalyzeArgs),

    #[command(
        about = "Apply code fixes for analyzer diagnostics",
        long_about = "Analyzes the sources and rewrites every file that has fixable \
                      diagnostics.\n\n\
                      Examples:\n  \
                      dotport fix src/Web\n  \
                      dotport fix App.csproj --dry-run"
    )]
    Fix(FixArgs),

    #[command(
        about = "Find newer versions of package references",
        long_about = "Queries the configured package sources for versions newer than each \
                      PackageReference.\n\n\
                      Examples:\n  \
                      dotport versions App.csproj\n  \
                      dotport versions MySolution.sln --prerelease --format json"
    )]
    Versions(VersionsArgs),

    #[command(about = "Show the effective configuration")]
    Config(ConfigArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct ComponentsArgs {
    #[arg(
        value_name = "PATH",
        help = "Project, solution or directory (defaults to current directory)"
    )]
    pub path: Option<PathBuf>,

    #[arg(short = 'f', long, value_enum, default_value = "human", help = "Output format")]
    pub format: OutputFormatArg,

    #[arg(short = 'o', long, value_name = "FILE", help = "Write output to file instead of stdout")]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct TfmArgs {
    #[arg(
        value_name = "PATH",
        help = "Project, solution or directory (defaults to current directory)"
    )]
    pub path: Option<PathBuf>,

    #[arg(
        short = 's',
        long,
        value_enum,
        help = "Release channel for applications (overrides DOTPORT_TFM_SUPPORT)"
    )]
    pub support: Option<SupportArg>,

    #[arg(short = 'f', long, value_enum, default_value = "human", help = "Output format")]
    pub format: OutputFormatArg,

    #[arg(short = 'o', long, value_name = "FILE", help = "Write output to file instead of stdout")]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct AnalyzeArgs {
    #[arg(
        value_name = "PATH",
        help = "Project file or source directory (defaults to current directory)"
    )]
    pub path: Option<PathBuf>,

    #[arg(
        short = 'r',
        long,
        value_name = "FILE",
        help = "Reference symbol list (one 'T:Namespace.Type' entry per line)"
    )]
    pub references: Option<PathBuf>,

    #[arg(
        short = 'a',
        long = "additional-file",
        value_name = "FILE",
        help = "Extra *.apitargets or *.typemap file (repeatable)"
    )]
    pub additional_files: Vec<PathBuf>,

    #[arg(short = 'f', long, value_enum, default_value = "human", help = "Output format")]
    pub format: OutputFormatArg,

    #[arg(short = 'o', long, value_name = "FILE", help = "Write output to file instead of stdout")]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct FixArgs {
    #[arg(
        value_name = "PATH",
        help = "Project file or source directory (defaults to current directory)"
    )]
    pub path: Option<PathBuf>,

    #[arg(short = 'r', long, value_name = "FILE", help = "Reference symbol list")]
    pub references: Option<PathBuf>,

    #[arg(
        short = 'a',
        long = "additional-file",
        value_name = "FILE",
        help = "Extra *.apitargets or *.typemap file (repeatable)"
    )]
    pub additional_files: Vec<PathBuf>,

    #[arg(long, help = "Report what would change without writing files")]
    pub dry_run: bool,

    #[arg(short = 'f', long, value_enum, default_value = "human", help = "Output format")]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct VersionsArgs {
    #[arg(
        value_name = "PATH",
        help = "Project, solution or directory (defaults to current directory)"
    )]
    pub path: Option<PathBuf>,

    #[arg(long, help = "Include prerelease versions")]
    pub prerelease: bool,

    #[arg(short = 'f', long, value_enum, default_value = "human", help = "Output format")]
    pub format: OutputFormatArg,

    #[arg(short = 'o', long, value_name = "FILE", help = "Write output to file instead of stdout")]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(short = 'f', long, value_enum, default_value = "human", help = "Output format")]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportArg {
    Current,
    Lts,
    Preview,
}

impl From<SupportArg> for TfmSupport {
    fn from(arg: SupportArg) -> Self {
        match arg {
            SupportArg::Current => TfmSupport::Current,
            SupportArg::Lts => TfmSupport::Lts,
            SupportArg::Preview => TfmSupport::Preview,
        }
    }
}
