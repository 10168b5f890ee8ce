//! templatefix - T4 text template support for generated C# projects
//!
//! Editors that generate `.csproj` files list `.tt` templates as plain
//! `None` items, so Visual Studio never treats them as templates. templatefix
//! rewrites those project files after every regeneration and can run
//! MSBuild's `TransformAll` target when templates change.
//!
//! # Modules
//!
//! - [`patcher`] - Project file rewrite engine
//! - [`tool`] - Locating, caching and running MSBuild
//! - [`tracker`] - Template change tracking
//! - [`session`] - Fix and transform passes, host hooks
//! - [`prefs`] - Persisted key/value preferences
//! - [`platform`] - Host platform capabilities
//! - [`watcher`] - Polling file watcher
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod error;
pub mod patcher;
pub mod platform;
pub mod prefs;
pub mod session;
pub mod templates;
pub mod tool;
pub mod tracker;
pub mod watcher;

// Re-export commonly used types
pub use config::{Config, ProjectConfig, ToolsConfig};
pub use error::{Result, TOOL_UNAVAILABLE_MESSAGE, TemplateFixError};
pub use patcher::{CANONICAL_BUILD_IMPORT, PatchOptions, Patched, ProjectFilePatcher};
pub use platform::{Capabilities, Platform, PlatformChoice};
pub use prefs::{FilePrefStore, MemoryPrefStore, PrefStore, PrefValue};
pub use session::{PassOutcome, PassReport, ProjectReport, Session};
pub use tool::{MonoLocator, MsBuildRunner, ToolLocator, ToolResolver, TransformRunner, VisualStudioLocator};
pub use tracker::ChangeTracker;
pub use watcher::{ProjectWatcher, WatchConfig, WatchSummary};
