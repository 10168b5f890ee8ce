//! templatefix CLI entry point
//!
//! Patches generated project files for T4 templates and runs transforms.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use templatefix::cli::{Cli, Command, ToggleAction, generate_after_help, get_log_path};
use templatefix::config::Config;
use templatefix::{
    Capabilities, FilePrefStore, PassOutcome, PassReport, ProjectWatcher, Session, TOOL_UNAVAILABLE_MESSAGE, templates,
};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level).map(|s| s.to_uppercase()) {
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if let Some(root) = cli.root {
        config.project.root = root;
    }

    let prefs_path = config.prefs.path.clone().unwrap_or_else(FilePrefStore::default_path);
    let prefs = FilePrefStore::open(&prefs_path).context("Failed to open preference store")?;
    let caps = Capabilities::from_config(&config.tools);
    info!(root = ?config.project.root, platform = %caps.platform, "templatefix starting");

    let mut session = Session::new(config.project.clone(), prefs, caps)?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Fix { all } => {
            session.set_primary_only(session_primary_only(&config, all));
            let outcome = session.on_before_reload()?;
            print_outcome("fix", &outcome);
        }
        Command::Transform { all } => {
            session.set_primary_only(session_primary_only(&config, all));
            let outcome = session.run_transform_all()?;
            print_outcome("transform", &outcome);
        }
        Command::Changed { paths, all } => {
            session.set_primary_only(session_primary_only(&config, all));
            if !session.on_template_files_changed(&paths) {
                println!("No template sources among the changed files");
            }
            let outcome = session.on_before_reload()?;
            print_outcome("fix", &outcome);
        }
        Command::Patch { file, check } => cmd_patch(&session, &file, check)?,
        Command::AutoTransform { action } => cmd_auto_transform(&mut session, action)?,
        Command::New { dir, name } => {
            let path = templates::create_default_template(&dir, name.as_deref())?;
            println!("Created {}", path.display());
        }
        Command::Watch { all } => {
            session.set_primary_only(session_primary_only(&config, all));
            println!(
                "Watching {} (Ctrl-C to stop)",
                session.root().display().to_string().bold()
            );
            ProjectWatcher::new(config.watch.clone()).run(&mut session)?;
        }
        Command::Tool { reset } => cmd_tool(&mut session, reset)?,
    }

    Ok(())
}

fn session_primary_only(config: &Config, all: bool) -> bool {
    config.project.primary_only && !all
}

fn cmd_patch(session: &Session<FilePrefStore>, file: &Path, check: bool) -> Result<()> {
    debug!(?file, check, "cmd_patch: called");
    let report = session.patch_file(file, &session.patch_options(), !check)?;

    let state = match (report.changed, check) {
        (false, _) => "unchanged".green(),
        (true, true) => "would change".yellow(),
        (true, false) => "patched".cyan(),
    };
    println!(
        "{} {} ({} template{})",
        state,
        file.display(),
        report.template_count,
        if report.template_count == 1 { "" } else { "s" }
    );

    if check && report.changed {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_auto_transform(session: &mut Session<FilePrefStore>, action: ToggleAction) -> Result<()> {
    debug!(?action, "cmd_auto_transform: called");
    match action {
        ToggleAction::Enable => session.set_automatic_transform(true)?,
        ToggleAction::Disable => session.set_automatic_transform(false)?,
        ToggleAction::Status => {}
    }

    let state = if session.automatic_transform_enabled() {
        "enabled".green()
    } else {
        "disabled".red()
    };
    println!("Automatic transform: {}", state);
    Ok(())
}

fn cmd_tool(session: &mut Session<FilePrefStore>, reset: bool) -> Result<()> {
    debug!(reset, "cmd_tool: called");
    if reset && session.reset_tool_cache()? {
        println!("Cleared cached tool locations");
    }

    let path: Option<PathBuf> = session.msbuild_path()?;
    match path {
        Some(path) => println!("MSBuild: {}", path.display()),
        None => println!("{}", TOOL_UNAVAILABLE_MESSAGE.yellow()),
    }
    println!("Preferences: {}", session.prefs().path().display());
    Ok(())
}

fn print_outcome(pass: &str, outcome: &PassOutcome) {
    match outcome {
        PassOutcome::ToolUnavailable => println!("{}", TOOL_UNAVAILABLE_MESSAGE.yellow()),
        PassOutcome::Unsupported => {
            println!("{}", format!("The {} pass is not supported on this platform", pass).yellow())
        }
        PassOutcome::Completed(report) => print_report(pass, report),
    }
}

fn print_report(pass: &str, report: &PassReport) {
    if report.projects.is_empty() {
        println!("No project files found");
        return;
    }

    for project in &report.projects {
        let mut notes = Vec::new();
        if project.changed {
            notes.push("patched".cyan().to_string());
        }
        if project.transformed {
            notes.push("transformed".green().to_string());
        }
        if notes.is_empty() {
            notes.push("unchanged".dimmed().to_string());
        }
        println!("  {} {}", project.path.display(), notes.join(", "));
    }

    println!(
        "{} {}: {} project(s), {} template(s), {} transformed",
        "\u{2705}",
        pass,
        report.projects.len(),
        report.template_count(),
        report.transformed_count()
    );
}
