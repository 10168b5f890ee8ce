//! Embedded templates
//!
//! These are compiled into the binary from .tt files at build time.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Result, TemplateFixError};

/// Default runtime (preprocessed) T4 template
pub const DEFAULT_RUNTIME_TEMPLATE: &str = include_str!("../templates/DefaultRuntimeTemplateT4.tt");

/// File name used when none is given
pub const DEFAULT_TEMPLATE_NAME: &str = "NewDefaultTemplateT4";

/// Get the embedded template by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "default" | "runtime" => Some(DEFAULT_RUNTIME_TEMPLATE),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}

/// Write the default template to `dir/<name>.tt`, refusing to overwrite
pub fn create_default_template(dir: &Path, name: Option<&str>) -> Result<PathBuf> {
    let name = name.unwrap_or(DEFAULT_TEMPLATE_NAME);
    let file_name = if name.ends_with(".tt") {
        name.to_string()
    } else {
        format!("{name}.tt")
    };
    let path = dir.join(file_name);
    debug!(?path, "create_default_template: called");

    if path.exists() {
        return Err(TemplateFixError::TemplateExists { path });
    }

    fs::create_dir_all(dir).map_err(|e| TemplateFixError::io(dir, e))?;
    fs::write(&path, DEFAULT_RUNTIME_TEMPLATE).map_err(|e| TemplateFixError::io(&path, e))?;
    info!(?path, "Created template");
    Ok(path)
}
