//! Watcher configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the ProjectWatcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Polling interval in milliseconds
    #[serde(rename = "poll-interval-ms", default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Directory names never scanned for templates
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_ignore() -> Vec<String> {
    ["Library", "Temp", "Logs", "obj", ".git"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            ignore: default_ignore(),
        }
    }
}

impl WatchConfig {
    /// Get the poll interval as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Whether a directory with this name is skipped
    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignore.iter().any(|i| i == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WatchConfig::default();
        assert_eq!(config.poll_interval_ms, 1000);
        assert!(config.is_ignored("Library"));
        assert!(!config.is_ignored("Assets"));
    }

    #[test]
    fn test_poll_interval_duration() {
        let config = WatchConfig {
            poll_interval_ms: 250,
            ..Default::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_partial_yaml() {
        let config: WatchConfig = serde_yaml::from_str("ignore: [Build]").unwrap();
        assert_eq!(config.poll_interval_ms, 1000);
        assert!(config.is_ignored("Build"));
        assert!(!config.is_ignored("Library"));
    }
}
