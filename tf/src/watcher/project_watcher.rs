//! Polling watcher over templates and project files

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, error, info};
use walkdir::WalkDir;

use super::config::WatchConfig;
use crate::error::Result;
use crate::prefs::PrefStore;
use crate::session::{PassOutcome, Session};
use crate::tracker::is_template;

type Snapshot = HashMap<PathBuf, SystemTime>;

/// What one poll saw and did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchSummary {
    pub templates_changed: Vec<PathBuf>,
    pub projects_changed: Vec<PathBuf>,
    /// Result of the fix pass, if one ran
    pub outcome: Option<PassOutcome>,
}

/// The ProjectWatcher turns file modifications into session hook calls
pub struct ProjectWatcher {
    config: WatchConfig,
    templates: Snapshot,
    projects: Snapshot,
    initialized: bool,
}

impl ProjectWatcher {
    /// Create a new ProjectWatcher
    pub fn new(config: WatchConfig) -> Self {
        Self {
            config,
            templates: Snapshot::new(),
            projects: Snapshot::new(),
            initialized: false,
        }
    }

    fn scan_templates(&self, root: &Path) -> Snapshot {
        WalkDir::new(root)
            .into_iter()
            .filter_entry(|entry| {
                !(entry.depth() > 0
                    && entry.file_type().is_dir()
                    && self.config.is_ignored(&entry.file_name().to_string_lossy()))
            })
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file() && is_template(entry.path()))
            .filter_map(|entry| {
                let modified = entry.metadata().ok()?.modified().ok()?;
                Some((entry.into_path(), modified))
            })
            .collect()
    }

    fn scan_projects<S: PrefStore>(&self, session: &Session<S>) -> Result<Snapshot> {
        Ok(session
            .project_files()?
            .into_iter()
            .filter_map(|path| {
                let modified = path.metadata().ok()?.modified().ok()?;
                Some((path, modified))
            })
            .collect())
    }

    /// Poll once; the first poll only records the baseline
    pub fn check_once<S: PrefStore>(&mut self, session: &mut Session<S>) -> Result<WatchSummary> {
        let templates = self.scan_templates(session.root());
        let projects = self.scan_projects(session)?;

        if !self.initialized {
            debug!(
                templates = templates.len(),
                projects = projects.len(),
                "ProjectWatcher::check_once: initial snapshot"
            );
            self.templates = templates;
            self.projects = projects;
            self.initialized = true;
            return Ok(WatchSummary::default());
        }

        let mut summary = WatchSummary {
            templates_changed: changed_paths(&self.templates, &templates),
            projects_changed: changed_paths(&self.projects, &projects),
            outcome: None,
        };
        self.templates = templates;
        self.projects = projects;

        if summary.templates_changed.is_empty() && summary.projects_changed.is_empty() {
            debug!("ProjectWatcher::check_once: nothing changed");
            return Ok(summary);
        }

        info!(
            templates = summary.templates_changed.len(),
            projects = summary.projects_changed.len(),
            "Changes detected"
        );
        if !summary.templates_changed.is_empty() {
            session.on_template_files_changed(&summary.templates_changed);
        }
        summary.outcome = Some(session.on_before_reload()?);

        // The fix pass rewrote the projects itself
        self.projects = self.scan_projects(session)?;
        Ok(summary)
    }

    /// Run the watcher loop on the calling thread
    ///
    /// This never returns; errors from a poll are logged and polling continues.
    pub fn run<S: PrefStore>(mut self, session: &mut Session<S>) -> Result<()> {
        info!(
            root = ?session.root(),
            interval_ms = self.config.poll_interval_ms,
            "ProjectWatcher started"
        );

        loop {
            match self.check_once(session) {
                Ok(summary) => {
                    if let Some(outcome) = summary.outcome {
                        debug!(?outcome, "Fix pass finished");
                    }
                }
                Err(e) => {
                    error!(error = %e, "Error while checking for changes");
                }
            }

            std::thread::sleep(self.config.poll_interval());
        }
    }
}

fn changed_paths(old: &Snapshot, new: &Snapshot) -> Vec<PathBuf> {
    let mut changed: Vec<PathBuf> = new
        .iter()
        .filter(|(path, modified)| old.get(*path) != Some(*modified))
        .map(|(path, _)| path.clone())
        .collect();
    changed.sort();
    changed
}
