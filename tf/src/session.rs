//! Fix and transform passes over a project root
//!
//! A `Session` is what the host talks to. It owns the change tracker, the
//! preference store and the platform capabilities, and exposes the two host
//! hooks: `on_template_files_changed` and `on_before_reload`.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::ProjectConfig;
use crate::error::{Result, TOOL_UNAVAILABLE_MESSAGE, TemplateFixError};
use crate::patcher::{PatchOptions, ProjectFilePatcher};
use crate::platform::Capabilities;
use crate::prefs::{DISABLE_AUTOMATIC_TRANSFORM_KEY, PrefStore, USER_EXTENSIONS_KEY};
use crate::tool::ToolResolver;
use crate::tracker::ChangeTracker;

const TEMPLATE_EXTENSION: &str = "tt";

/// How a pass ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// The transformation tool could not be found; nothing was touched
    ToolUnavailable,
    /// The host platform cannot run this pass
    Unsupported,
    /// The pass ran over the selected projects
    Completed(PassReport),
}

impl PassOutcome {
    pub fn report(&self) -> Option<&PassReport> {
        match self {
            Self::Completed(report) => Some(report),
            _ => None,
        }
    }
}

/// Per-project results of a completed pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub projects: Vec<ProjectReport>,
}

impl PassReport {
    pub fn template_count(&self) -> usize {
        self.projects.iter().map(|p| p.template_count).sum()
    }

    pub fn changed_count(&self) -> usize {
        self.projects.iter().filter(|p| p.changed).count()
    }

    pub fn transformed_count(&self) -> usize {
        self.projects.iter().filter(|p| p.transformed).count()
    }
}

/// What happened to one project file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectReport {
    pub path: PathBuf,
    /// Template entries rewritten in this pass
    pub template_count: usize,
    /// Whether the project declares any template, rewritten now or earlier
    pub has_templates: bool,
    pub changed: bool,
    pub transformed: bool,
}

/// Host-facing state for one project root
pub struct Session<S: PrefStore> {
    project: ProjectConfig,
    prefs: S,
    caps: Capabilities,
    patcher: ProjectFilePatcher,
    tracker: ChangeTracker,
}

impl<S: PrefStore> Session<S> {
    pub fn new(project: ProjectConfig, prefs: S, caps: Capabilities) -> Result<Self> {
        debug!(root = ?project.root, ?caps, "Session::new: called");
        Ok(Self {
            project,
            prefs,
            caps,
            patcher: ProjectFilePatcher::new()?,
            tracker: ChangeTracker::new(),
        })
    }

    pub fn prefs(&self) -> &S {
        &self.prefs
    }

    pub fn prefs_mut(&mut self) -> &mut S {
        &mut self.prefs
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    pub fn root(&self) -> &Path {
        &self.project.root
    }

    pub fn is_dirty(&self) -> bool {
        self.tracker.is_dirty()
    }

    /// Include every project, not only the primary one
    pub fn set_primary_only(&mut self, primary_only: bool) {
        self.project.primary_only = primary_only;
    }

    /// Host hook: some source files were added or modified
    pub fn on_template_files_changed<P: AsRef<Path>>(&mut self, paths: &[P]) -> bool {
        let marked = self.tracker.mark_changed(paths);
        if marked {
            info!(count = paths.len(), "Template sources changed, transform pending");
        }
        marked
    }

    /// Host hook: project files were (re)generated
    pub fn on_before_reload(&mut self) -> Result<PassOutcome> {
        debug!("Session::on_before_reload: called");
        self.ensure_template_extension()?;
        self.fix_project_solution()
    }

    /// Register `tt` in the project-generation user extensions
    ///
    /// Returns true if it had to be added.
    pub fn ensure_template_extension(&mut self) -> Result<bool> {
        let current = self.prefs.get_string(USER_EXTENSIONS_KEY).unwrap_or_default();
        let mut extensions: Vec<&str> = current.split(',').map(str::trim).filter(|e| !e.is_empty()).collect();

        if extensions.contains(&TEMPLATE_EXTENSION) {
            debug!(%current, "Session::ensure_template_extension: already registered");
            return Ok(false);
        }

        extensions.push(TEMPLATE_EXTENSION);
        let updated = extensions.join(",");
        info!(%updated, "Registering template extension for project generation");
        self.prefs.set_string(USER_EXTENSIONS_KEY, &updated)?;
        Ok(true)
    }

    pub fn automatic_transform_enabled(&self) -> bool {
        !self.prefs.get_bool(DISABLE_AUTOMATIC_TRANSFORM_KEY).unwrap_or(false)
    }

    pub fn set_automatic_transform(&mut self, enabled: bool) -> Result<()> {
        info!(enabled, "Setting automatic transform");
        self.prefs.set_bool(DISABLE_AUTOMATIC_TRANSFORM_KEY, !enabled)
    }

    /// Forget the cached tool locations so the next pass searches again
    pub fn reset_tool_cache(&mut self) -> Result<bool> {
        let msbuild = self.prefs.delete_key(crate::prefs::MSBUILD_PATH_KEY)?;
        let transform = self.prefs.delete_key(crate::prefs::HAS_TEXT_TRANSFORM_KEY)?;
        Ok(msbuild || transform)
    }

    /// Cached or freshly located MSBuild path
    pub fn msbuild_path(&mut self) -> Result<Option<PathBuf>> {
        ToolResolver::new(&*self.caps.locator).msbuild_path(&mut self.prefs)
    }

    /// Project files under the root matching the pattern and marker, sorted
    pub fn project_files(&self) -> Result<Vec<PathBuf>> {
        let root = glob::Pattern::escape(&self.project.root.to_string_lossy());
        let pattern = Path::new(&root).join(&self.project.pattern);
        let pattern = pattern.to_string_lossy();
        debug!(%pattern, primary_only = self.project.primary_only, "Session::project_files: called");

        let mut files = Vec::new();
        for entry in glob::glob(&pattern)? {
            match entry {
                Ok(path) if path.is_file() => {
                    if self.project.primary_only && !self.is_primary(&path) {
                        debug!(?path, "Session::project_files: skipping non-primary project");
                        continue;
                    }
                    files.push(path);
                }
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable project entry: {}", e),
            }
        }

        files.sort();
        debug!(count = files.len(), "Session::project_files: returning files");
        Ok(files)
    }

    fn is_primary(&self, path: &Path) -> bool {
        path.file_name()
            .is_some_and(|name| name.to_string_lossy().contains(&self.project.marker))
    }

    /// Patch every selected project and transform those with templates if
    /// templates changed since the last pass
    pub fn fix_project_solution(&mut self) -> Result<PassOutcome> {
        debug!(dirty = self.tracker.is_dirty(), "Session::fix_project_solution: called");
        let resolver = ToolResolver::new(&*self.caps.locator);

        if !resolver.ensure_text_transform(&mut self.prefs)? {
            warn!("{}", TOOL_UNAVAILABLE_MESSAGE);
            return Ok(PassOutcome::ToolUnavailable);
        }

        let Some(msbuild) = resolver.msbuild_path(&mut self.prefs)? else {
            warn!("{}", TOOL_UNAVAILABLE_MESSAGE);
            return Ok(PassOutcome::ToolUnavailable);
        };

        let rebuild = self.tracker.is_dirty() && self.automatic_transform_enabled() && self.caps.supports_transform;
        let options = self.patch_options();

        let mut report = PassReport::default();
        for path in self.project_files()? {
            let mut project = self.patch_file(&path, &options, true)?;

            if rebuild && project.has_templates {
                project.transformed = self.transform(&msbuild, &path);
            }
            report.projects.push(project);
        }

        self.tracker.take();
        info!(
            projects = report.projects.len(),
            changed = report.changed_count(),
            transformed = report.transformed_count(),
            "Fix pass complete"
        );
        Ok(PassOutcome::Completed(report))
    }

    /// Run the transform target on every selected project
    pub fn run_transform_all(&mut self) -> Result<PassOutcome> {
        debug!("Session::run_transform_all: called");
        if !self.caps.supports_transform {
            info!(platform = %self.caps.platform, "Transform is not supported on this platform");
            return Ok(PassOutcome::Unsupported);
        }

        let Some(msbuild) = self.msbuild_path()? else {
            warn!("{}", TOOL_UNAVAILABLE_MESSAGE);
            return Ok(PassOutcome::ToolUnavailable);
        };

        let mut report = PassReport::default();
        for path in self.project_files()? {
            let transformed = self.transform(&msbuild, &path);
            report.projects.push(ProjectReport {
                path,
                template_count: 0,
                has_templates: false,
                changed: false,
                transformed,
            });
        }

        info!(projects = report.projects.len(), "Transform pass complete");
        Ok(PassOutcome::Completed(report))
    }

    /// Patch one project file; writes only when `write` is set
    pub fn patch_file(&self, path: &Path, options: &PatchOptions, write: bool) -> Result<ProjectReport> {
        debug!(?path, write, "Session::patch_file: called");
        let original = fs::read_to_string(path).map_err(|e| TemplateFixError::io(path, e))?;
        let patched = self.patcher.patch(&original, options);
        let changed = patched.changed(&original);

        if write {
            fs::write(path, &patched.content).map_err(|e| TemplateFixError::io(path, e))?;
        }

        debug!(?path, changed, templates = patched.template_count, "Session::patch_file: done");
        Ok(ProjectReport {
            path: path.to_path_buf(),
            template_count: patched.template_count,
            has_templates: patched.has_templates(),
            changed,
            transformed: false,
        })
    }

    /// Patch options matching this host's capabilities
    pub fn patch_options(&self) -> PatchOptions {
        PatchOptions {
            rewrite_build_import: self.caps.rewrite_build_import,
        }
    }

    /// Run the tool and wait; the exit status is informational only
    fn transform(&self, msbuild: &Path, project: &Path) -> bool {
        info!(?project, "Running text transformation");
        match self.caps.runner.run(msbuild, project) {
            Ok(status) => {
                debug!(?status, "Session::transform: tool exited");
                true
            }
            Err(e) => {
                warn!("Failed to launch {}: {}", msbuild.display(), e);
                false
            }
        }
    }
}
