//! CLI command definitions and subcommands

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::debug;

/// templatefix - keep generated C# projects wired for T4 templates
#[derive(Parser)]
#[command(
    name = "tf",
    about = "Patch generated .csproj files for T4 text templates and run transforms",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Directory holding the generated project files (overrides config)
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Patch project files, transforming them if templates changed
    Fix {
        /// Include every project, not only the primary one
        #[arg(short, long)]
        all: bool,
    },

    /// Run the transform target on project files
    Transform {
        /// Include every project, not only the primary one
        #[arg(short, long)]
        all: bool,
    },

    /// Report changed source files, then run a fix pass
    Changed {
        /// Paths of added or modified files
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Include every project, not only the primary one
        #[arg(short, long)]
        all: bool,
    },

    /// Patch a single project file
    Patch {
        /// Project file to patch
        file: PathBuf,

        /// Report whether the file would change without writing it
        #[arg(long)]
        check: bool,
    },

    /// Toggle the transform run at the end of a fix pass
    AutoTransform {
        #[arg(value_enum)]
        action: ToggleAction,
    },

    /// Create a new template from the default runtime template
    New {
        /// Directory to create the template in
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Template name (without extension)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Watch the project root and fix projects as files change
    Watch {
        /// Include every project, not only the primary one
        #[arg(short, long)]
        all: bool,
    },

    /// Show the resolved MSBuild path
    Tool {
        /// Forget cached tool locations
        #[arg(long)]
        reset: bool,
    },
}

/// Enable, disable or query a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ToggleAction {
    Enable,
    Disable,
    Status,
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("templatefix")
        .join("logs")
        .join("templatefix.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// Generate the after_help text showing where logs go
pub fn generate_after_help() -> String {
    format!("Logs are written to: {}\n", get_log_path().display())
}
