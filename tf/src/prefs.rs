//! Persisted key/value preferences
//!
//! Stands in for the editor preference store: the cached tool path, the
//! transform capability flag, the automatic transform toggle and the
//! project-generation user extensions all live here by name.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, TemplateFixError};

/// Cached path to the MSBuild executable
pub const MSBUILD_PATH_KEY: &str = "MSBuildPath";

/// Set once the text transformation capability has been located
pub const HAS_TEXT_TRANSFORM_KEY: &str = "HasTextTransformPath";

/// When true, fix passes never invoke MSBuild
pub const DISABLE_AUTOMATIC_TRANSFORM_KEY: &str = "DisableAutomaticTransformTask";

/// Comma-separated extensions included in generated projects
pub const USER_EXTENSIONS_KEY: &str = "ProjectGenerationUserExtensions";

/// Stored preference value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    Bool(bool),
    String(String),
}

/// Opaque key/value store keyed by name
pub trait PrefStore {
    /// Whether a value exists for `key`
    fn has_key(&self, key: &str) -> bool;

    /// Raw value for `key`
    fn get(&self, key: &str) -> Option<PrefValue>;

    /// Store `value` under `key`
    fn set(&mut self, key: &str, value: PrefValue) -> Result<()>;

    /// Remove `key`, returning whether it existed
    fn delete_key(&mut self, key: &str) -> Result<bool>;

    /// String value for `key`, booleans rendered as text
    fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            PrefValue::String(s) => Some(s),
            PrefValue::Bool(b) => Some(b.to_string()),
        }
    }

    /// Bool value for `key`; strings "true"/"false" are accepted
    fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            PrefValue::Bool(b) => Some(b),
            PrefValue::String(s) => s.trim().parse().ok(),
        }
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<()> {
        self.set(key, PrefValue::String(value.to_string()))
    }

    fn set_bool(&mut self, key: &str, value: bool) -> Result<()> {
        self.set(key, PrefValue::Bool(value))
    }
}

/// In-memory store for tests and dry runs
#[derive(Debug, Clone, Default)]
pub struct MemoryPrefStore {
    values: BTreeMap<String, PrefValue>,
}

impl MemoryPrefStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PrefStore for MemoryPrefStore {
    fn has_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    fn get(&self, key: &str) -> Option<PrefValue> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: PrefValue) -> Result<()> {
        debug!(%key, ?value, "MemoryPrefStore::set: called");
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn delete_key(&mut self, key: &str) -> Result<bool> {
        Ok(self.values.remove(key).is_some())
    }
}

/// YAML file store, written through on every change
#[derive(Debug, Clone)]
pub struct FilePrefStore {
    path: PathBuf,
    values: BTreeMap<String, PrefValue>,
}

impl FilePrefStore {
    /// Open the store at `path`, starting empty if the file does not exist
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        debug!(?path, "FilePrefStore::open: called");

        let values = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| TemplateFixError::io(&path, e))?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_yaml::from_str(&content).map_err(|e| TemplateFixError::Prefs {
                    path: path.clone(),
                    reason: e.to_string(),
                })?
            }
        } else {
            debug!(?path, "FilePrefStore::open: no file yet, starting empty");
            BTreeMap::new()
        };

        Ok(Self { path, values })
    }

    /// Default location: `<data-local-dir>/templatefix/prefs.yml`
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("templatefix")
            .join("prefs.yml")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        debug!(path = ?self.path, count = self.values.len(), "FilePrefStore::save: called");
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| TemplateFixError::io(parent, e))?;
        }

        let content = serde_yaml::to_string(&self.values).map_err(|e| TemplateFixError::Prefs {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        fs::write(&self.path, content).map_err(|e| TemplateFixError::io(&self.path, e))
    }
}

impl PrefStore for FilePrefStore {
    fn has_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    fn get(&self, key: &str) -> Option<PrefValue> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: PrefValue) -> Result<()> {
        debug!(%key, ?value, "FilePrefStore::set: called");
        self.values.insert(key.to_string(), value);
        self.save()
    }

    fn delete_key(&mut self, key: &str) -> Result<bool> {
        debug!(%key, "FilePrefStore::delete_key: called");
        let existed = self.values.remove(key).is_some();
        if existed {
            self.save()?;
        }
        Ok(existed)
    }
}
