//! Error types for project patching and tool invocation

use std::path::PathBuf;
use thiserror::Error;

/// Warning shown whenever the transformation tool cannot be found
pub const TOOL_UNAVAILABLE_MESSAGE: &str =
    "You do not have T4 executable installed so code generation won't be run.";

/// Errors that can occur during a fix or transform pass
#[derive(Debug, Error)]
pub enum TemplateFixError {
    #[error("Failed to access {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Preference store {path} is unusable: {reason}")]
    Prefs { path: PathBuf, reason: String },

    #[error("Template already exists: {path}")]
    TemplateExists { path: PathBuf },

    #[error("Invalid project pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Invalid patch expression: {0}")]
    Regex(#[from] regex::Error),
}

impl TemplateFixError {
    /// Wrap an io error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TemplateFixError>;
