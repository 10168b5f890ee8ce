//! External transformation tool: locating, caching and running MSBuild

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::ToolsConfig;
use crate::error::Result;
use crate::prefs::{HAS_TEXT_TRANSFORM_KEY, MSBUILD_PATH_KEY, PrefStore};

/// Strategy for finding the tools on a host
pub trait ToolLocator {
    /// Path proving T4 transformation support is installed
    fn locate_text_transform(&self) -> Option<PathBuf>;

    /// Path or command of the MSBuild executable
    fn locate_msbuild(&self) -> Option<PathBuf>;
}

/// Searches a Visual Studio installation tree on Windows
#[derive(Debug, Clone)]
pub struct VisualStudioLocator {
    search_root: Option<PathBuf>,
    msbuild_exe: String,
    text_transform_exe: String,
}

impl VisualStudioLocator {
    pub fn new(search_root: Option<PathBuf>, msbuild_exe: &str, text_transform_exe: &str) -> Self {
        Self {
            search_root,
            msbuild_exe: msbuild_exe.to_string(),
            text_transform_exe: text_transform_exe.to_string(),
        }
    }

    /// Search root is `$<install-root-env>/<visual-studio-dir>`
    pub fn from_config(tools: &ToolsConfig) -> Self {
        let search_root = std::env::var_os(&tools.install_root_env)
            .filter(|root| !root.is_empty())
            .map(|root| PathBuf::from(root).join(&tools.visual_studio_dir));
        debug!(?search_root, env = %tools.install_root_env, "VisualStudioLocator::from_config: called");
        Self::new(search_root, &tools.msbuild_exe, &tools.text_transform_exe)
    }

    /// Last match for `file_name` in sorted traversal order
    fn find_last(&self, file_name: &str) -> Option<PathBuf> {
        let root = self.search_root.as_ref()?;
        debug!(?root, %file_name, "VisualStudioLocator::find_last: called");

        let found = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| entry.file_name().to_string_lossy().eq_ignore_ascii_case(file_name))
            .map(|entry| entry.into_path())
            .last();

        debug!(?found, "VisualStudioLocator::find_last: search finished");
        found
    }
}

impl ToolLocator for VisualStudioLocator {
    fn locate_text_transform(&self) -> Option<PathBuf> {
        self.find_last(&self.text_transform_exe)
    }

    fn locate_msbuild(&self) -> Option<PathBuf> {
        self.find_last(&self.msbuild_exe)
    }
}

/// Mono / Visual Studio for Mac: add-in directory and `msbuild` on PATH
#[derive(Debug, Clone)]
pub struct MonoLocator {
    addin_dir: PathBuf,
    msbuild_command: String,
    search_path: Option<OsString>,
}

impl MonoLocator {
    pub fn new(addin_dir: PathBuf, msbuild_command: &str, search_path: Option<OsString>) -> Self {
        Self {
            addin_dir,
            msbuild_command: msbuild_command.to_string(),
            search_path,
        }
    }

    pub fn from_config(tools: &ToolsConfig) -> Self {
        Self::new(
            tools.text_templating_addin.clone(),
            &tools.msbuild_command,
            std::env::var_os("PATH"),
        )
    }
}

impl ToolLocator for MonoLocator {
    fn locate_text_transform(&self) -> Option<PathBuf> {
        debug!(addin_dir = ?self.addin_dir, "MonoLocator::locate_text_transform: called");
        self.addin_dir.is_dir().then(|| self.addin_dir.clone())
    }

    fn locate_msbuild(&self) -> Option<PathBuf> {
        debug!(command = %self.msbuild_command, "MonoLocator::locate_msbuild: called");
        let command = Path::new(&self.msbuild_command);
        if command.components().count() > 1 {
            return command.is_file().then(|| command.to_path_buf());
        }

        let search_path = self.search_path.as_ref()?;
        std::env::split_paths(search_path)
            .map(|dir| dir.join(command))
            .find(|candidate| candidate.is_file())
            .map(|_| command.to_path_buf())
    }
}

/// Resolves tool paths once and caches them in the preference store
pub struct ToolResolver<'a> {
    locator: &'a dyn ToolLocator,
}

impl<'a> ToolResolver<'a> {
    pub fn new(locator: &'a dyn ToolLocator) -> Self {
        Self { locator }
    }

    /// Whether T4 support is known or can be found; remembered once found
    pub fn ensure_text_transform(&self, prefs: &mut dyn PrefStore) -> Result<bool> {
        if prefs.has_key(HAS_TEXT_TRANSFORM_KEY) {
            debug!("ToolResolver::ensure_text_transform: cached");
            return Ok(true);
        }

        match self.locator.locate_text_transform() {
            Some(path) => {
                info!(?path, "Found text transformation support");
                prefs.set_string(HAS_TEXT_TRANSFORM_KEY, &path.to_string_lossy())?;
                Ok(true)
            }
            None => {
                debug!("ToolResolver::ensure_text_transform: not found");
                Ok(false)
            }
        }
    }

    /// Cached MSBuild path, locating and storing it on first use
    pub fn msbuild_path(&self, prefs: &mut dyn PrefStore) -> Result<Option<PathBuf>> {
        if let Some(cached) = prefs.get_string(MSBUILD_PATH_KEY) {
            debug!(%cached, "ToolResolver::msbuild_path: cached");
            return Ok((!cached.is_empty()).then(|| PathBuf::from(cached)));
        }

        match self.locator.locate_msbuild() {
            Some(path) => {
                info!(?path, "Found MSBuild");
                prefs.set_string(MSBUILD_PATH_KEY, &path.to_string_lossy())?;
                Ok(Some(path))
            }
            None => {
                debug!("ToolResolver::msbuild_path: not found");
                Ok(None)
            }
        }
    }
}

/// Strategy for invoking the transformation on one project
pub trait TransformRunner {
    /// Run the transformation and block until it exits
    fn run(&self, tool: &Path, project: &Path) -> std::io::Result<ExitStatus>;
}

/// Runs `<msbuild> <project> <target>` with no console attached
#[derive(Debug, Clone)]
pub struct MsBuildRunner {
    target: String,
}

impl MsBuildRunner {
    pub fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
        }
    }
}

impl TransformRunner for MsBuildRunner {
    fn run(&self, tool: &Path, project: &Path) -> std::io::Result<ExitStatus> {
        debug!(?tool, ?project, target = %self.target, "MsBuildRunner::run: called");
        let status = Command::new(tool)
            .arg(project)
            .arg(&self.target)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;
        debug!(?status, "MsBuildRunner::run: process exited");
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::MemoryPrefStore;
    use std::cell::Cell;
    use std::fs;
    use tempfile::tempdir;

    struct CountingLocator {
        msbuild: Option<PathBuf>,
        calls: Cell<usize>,
    }

    impl ToolLocator for CountingLocator {
        fn locate_text_transform(&self) -> Option<PathBuf> {
            self.msbuild.clone()
        }

        fn locate_msbuild(&self) -> Option<PathBuf> {
            self.calls.set(self.calls.get() + 1);
            self.msbuild.clone()
        }
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_visual_studio_locator_picks_last_match() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("Microsoft Visual Studio");
        touch(&root.join("2017/BuildTools/MSBuild/15.0/Bin/MSBuild.exe"));
        touch(&root.join("2019/Community/MSBuild/Current/Bin/MSBuild.exe"));
        touch(&root.join("2019/Community/Common7/IDE/TextTransform.exe"));

        let locator = VisualStudioLocator::new(Some(root.clone()), "MSBuild.exe", "TextTransform.exe");

        assert_eq!(
            locator.locate_msbuild(),
            Some(root.join("2019/Community/MSBuild/Current/Bin/MSBuild.exe"))
        );
        assert_eq!(
            locator.locate_text_transform(),
            Some(root.join("2019/Community/Common7/IDE/TextTransform.exe"))
        );
    }

    #[test]
    fn test_visual_studio_locator_without_root() {
        let locator = VisualStudioLocator::new(None, "MSBuild.exe", "TextTransform.exe");
        assert!(locator.locate_msbuild().is_none());
        assert!(locator.locate_text_transform().is_none());
    }

    #[test]
    fn test_visual_studio_locator_missing_tool() {
        let temp = tempdir().unwrap();
        touch(&temp.path().join("2019/readme.txt"));

        let locator = VisualStudioLocator::new(Some(temp.path().to_path_buf()), "MSBuild.exe", "TextTransform.exe");
        assert!(locator.locate_msbuild().is_none());
    }

    #[test]
    fn test_mono_locator_searches_path() {
        let temp = tempdir().unwrap();
        let bin = temp.path().join("bin");
        touch(&bin.join("msbuild"));
        let addin = temp.path().join("MonoDevelop.TextTemplating");
        fs::create_dir_all(&addin).unwrap();

        let search_path = std::env::join_paths([temp.path().join("empty"), bin]).unwrap();
        let locator = MonoLocator::new(addin.clone(), "msbuild", Some(search_path));

        assert_eq!(locator.locate_msbuild(), Some(PathBuf::from("msbuild")));
        assert_eq!(locator.locate_text_transform(), Some(addin));
    }

    #[test]
    fn test_mono_locator_missing() {
        let temp = tempdir().unwrap();
        let locator = MonoLocator::new(temp.path().join("nope"), "msbuild", None);

        assert!(locator.locate_msbuild().is_none());
        assert!(locator.locate_text_transform().is_none());
    }

    #[test]
    fn test_resolver_caches_path() {
        let locator = CountingLocator {
            msbuild: Some(PathBuf::from("C:\\VS\\MSBuild.exe")),
            calls: Cell::new(0),
        };
        let resolver = ToolResolver::new(&locator);
        let mut prefs = MemoryPrefStore::new();

        let first = resolver.msbuild_path(&mut prefs).unwrap();
        let second = resolver.msbuild_path(&mut prefs).unwrap();

        assert_eq!(first, Some(PathBuf::from("C:\\VS\\MSBuild.exe")));
        assert_eq!(second, first);
        assert_eq!(locator.calls.get(), 1);
        assert_eq!(prefs.get_string(MSBUILD_PATH_KEY).as_deref(), Some("C:\\VS\\MSBuild.exe"));
    }

    #[test]
    fn test_resolver_unavailable_leaves_prefs_untouched() {
        let locator = CountingLocator {
            msbuild: None,
            calls: Cell::new(0),
        };
        let resolver = ToolResolver::new(&locator);
        let mut prefs = MemoryPrefStore::new();

        assert!(resolver.msbuild_path(&mut prefs).unwrap().is_none());
        assert!(!resolver.ensure_text_transform(&mut prefs).unwrap());
        assert!(!prefs.has_key(MSBUILD_PATH_KEY));
        assert!(!prefs.has_key(HAS_TEXT_TRANSFORM_KEY));
    }

    #[cfg(unix)]
    #[test]
    fn test_msbuild_runner_passes_arguments() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempdir().unwrap();
        let out = temp.path().join("args.txt");
        let script = temp.path().join("fake-msbuild");
        fs::write(&script, format!("#!/bin/sh\necho \"$@\" > '{}'\nexit 3\n", out.display())).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let runner = MsBuildRunner::new("/t:TransformAll");
        let status = runner.run(&script, Path::new("Assembly-CSharp.csproj")).unwrap();

        assert_eq!(status.code(), Some(3));
        let args = fs::read_to_string(&out).unwrap();
        assert_eq!(args.trim(), "Assembly-CSharp.csproj /t:TransformAll");
    }

    #[test]
    fn test_msbuild_runner_missing_tool() {
        let runner = MsBuildRunner::new("/t:TransformAll");
        let result = runner.run(Path::new("/definitely/not/msbuild"), Path::new("x.csproj"));
        assert!(result.is_err());
    }
}
