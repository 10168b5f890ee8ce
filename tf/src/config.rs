//! templatefix configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::platform::PlatformChoice;
use crate::watcher::WatchConfig;

/// Main templatefix configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Which project files to patch
    pub project: ProjectConfig,

    /// Where to find the transformation tools
    pub tools: ToolsConfig,

    /// Preference store location
    pub prefs: PrefsConfig,

    /// Watcher settings
    pub watch: WatchConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .templatefix.yml
        let local_config = PathBuf::from(".templatefix.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/templatefix/templatefix.yml
        if let Some(user_config) = Self::user_config_path()
            && user_config.exists()
        {
            match Self::load_from_file(&user_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed here; the full load reports them later.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates: Vec<PathBuf> = match config_path {
            Some(path) => vec![path.clone()],
            None => std::iter::once(PathBuf::from(".templatefix.yml"))
                .chain(Self::user_config_path())
                .collect(),
        };

        candidates
            .iter()
            .filter(|p| p.exists())
            .find_map(|p| Self::load_from_file(p).ok())
            .and_then(|config| config.log_level)
    }

    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("templatefix").join("templatefix.yml"))
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Project file selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Directory holding the generated project files
    pub root: PathBuf,

    /// Glob for project files, relative to `root`
    pub pattern: String,

    /// Substring marking the primary generated project
    pub marker: String,

    /// Only touch projects whose path contains `marker`
    #[serde(rename = "primary-only")]
    pub primary_only: bool,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            pattern: "*.csproj".to_string(),
            marker: "Assembly-CSharp".to_string(),
            primary_only: true,
        }
    }
}

/// Tool search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Force a platform strategy instead of detecting it
    pub platform: PlatformChoice,

    /// Environment variable naming the base installation directory
    #[serde(rename = "install-root-env")]
    pub install_root_env: String,

    /// Directory under the installation root to search
    #[serde(rename = "visual-studio-dir")]
    pub visual_studio_dir: String,

    /// MSBuild executable name searched for on Windows
    #[serde(rename = "msbuild-exe")]
    pub msbuild_exe: String,

    /// Text transformation executable proving T4 support on Windows
    #[serde(rename = "text-transform-exe")]
    pub text_transform_exe: String,

    /// MSBuild command used on macOS and Linux
    #[serde(rename = "msbuild-command")]
    pub msbuild_command: String,

    /// Add-in directory proving T4 support on macOS and Linux
    #[serde(rename = "text-templating-addin")]
    pub text_templating_addin: PathBuf,

    /// Target passed to MSBuild
    #[serde(rename = "transform-target")]
    pub transform_target: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            platform: PlatformChoice::Auto,
            install_root_env: "ProgramFiles(x86)".to_string(),
            visual_studio_dir: "Microsoft Visual Studio".to_string(),
            msbuild_exe: "MSBuild.exe".to_string(),
            text_transform_exe: "TextTransform.exe".to_string(),
            msbuild_command: "msbuild".to_string(),
            text_templating_addin: PathBuf::from(
                "/Applications/Visual Studio.app/Contents/Resources/lib/monodevelop/AddIns/MonoDevelop.TextTemplating",
            ),
            transform_target: "/t:TransformAll".to_string(),
        }
    }
}

/// Preference store location
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefsConfig {
    /// Path of the YAML store; defaults to the user data directory
    pub path: Option<PathBuf>,
}
