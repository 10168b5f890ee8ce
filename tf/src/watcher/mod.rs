//! Watcher module for template and project file changes
//!
//! The ProjectWatcher polls the project root and drives the session hooks
//! the way an editor host would: template edits mark the session dirty, and
//! any change runs a fix pass.

mod config;
mod project_watcher;

pub use config::WatchConfig;
pub use project_watcher::{ProjectWatcher, WatchSummary};
