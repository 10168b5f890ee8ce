//! Host platform capabilities
//!
//! Resolved once at startup. Picks the tool search strategy and which passes
//! the host can run, instead of branching at every call site.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ToolsConfig;
use crate::tool::{MonoLocator, MsBuildRunner, ToolLocator, TransformRunner, VisualStudioLocator};

/// Platform selection in config
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformChoice {
    #[default]
    Auto,
    Windows,
    Unix,
}

/// Host platform family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Visual Studio on Windows: full patching and MSBuild transforms
    Windows,
    /// Visual Studio for Mac / Mono: template entries only
    Unix,
}

impl Platform {
    /// Platform of the running process
    pub fn detect() -> Self {
        if cfg!(windows) { Self::Windows } else { Self::Unix }
    }

    /// Apply a config override
    pub fn resolve(choice: PlatformChoice) -> Self {
        debug!(?choice, "Platform::resolve: called");
        match choice {
            PlatformChoice::Auto => Self::detect(),
            PlatformChoice::Windows => Self::Windows,
            PlatformChoice::Unix => Self::Unix,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Windows => write!(f, "windows"),
            Self::Unix => write!(f, "unix"),
        }
    }
}

/// What the host can do, and how it finds and runs the tools
pub struct Capabilities {
    pub platform: Platform,

    /// Tool search strategy
    pub locator: Box<dyn ToolLocator>,

    /// Tool invocation strategy
    pub runner: Box<dyn TransformRunner>,

    /// Whether MSBuild transforms can run on this host
    pub supports_transform: bool,

    /// Whether the build import region is rewritten
    pub rewrite_build_import: bool,
}

impl Capabilities {
    /// Capabilities for `platform` with the configured tool settings
    pub fn for_platform(platform: Platform, tools: &ToolsConfig) -> Self {
        debug!(%platform, "Capabilities::for_platform: called");
        let runner = Box::new(MsBuildRunner::new(&tools.transform_target));
        match platform {
            Platform::Windows => Self {
                platform,
                locator: Box::new(VisualStudioLocator::from_config(tools)),
                runner,
                supports_transform: true,
                rewrite_build_import: true,
            },
            Platform::Unix => Self {
                platform,
                locator: Box::new(MonoLocator::from_config(tools)),
                runner,
                supports_transform: false,
                rewrite_build_import: false,
            },
        }
    }

    /// Capabilities from config, detecting the platform unless forced
    pub fn from_config(tools: &ToolsConfig) -> Self {
        Self::for_platform(Platform::resolve(tools.platform), tools)
    }
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities")
            .field("platform", &self.platform)
            .field("supports_transform", &self.supports_transform)
            .field("rewrite_build_import", &self.rewrite_build_import)
            .finish_non_exhaustive()
    }
}
