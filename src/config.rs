// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Project configuration
//!
//! Loaded from `.stagegraph.yaml`, `.stagegraph.yml` or `.stagegraph.toml`
//! in the working directory. Every field has a default, so a missing file
//! or a partial one is fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::descriptor::DescriptorFormat;
use crate::errors::{StagegraphError, StagegraphResult};

/// File names searched by [`Config::discover`], in order
pub const CONFIG_FILE_NAMES: &[&str] = &[".stagegraph.yaml", ".stagegraph.yml", ".stagegraph.toml"];

/// Project configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Descriptor store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory of the filesystem store, relative to the project root
    #[serde(default = "default_store_directory")]
    pub directory: PathBuf,
}

fn default_store_directory() -> PathBuf {
    PathBuf::from(".stagegraph").join("pipelines")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            directory: default_store_directory(),
        }
    }
}

/// Notification policy persistence settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Quiescence window before a policy snapshot is written
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    crate::notification::DEFAULT_DEBOUNCE.as_millis() as u64
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl NotificationConfig {
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Output settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Format used when writing descriptors
    #[serde(default)]
    pub format: DescriptorFormat,
}

impl Config {
    /// Load configuration from a file, choosing the parser by extension
    pub fn load(path: &Path) -> StagegraphResult<Self> {
        let content = std::fs::read_to_string(path)?;

        let parsed = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&content).map_err(|e| e.to_string()),
            _ => serde_yaml::from_str::<Option<Config>>(&content)
                .map(Option::unwrap_or_default)
                .map_err(|e| e.to_string()),
        };

        parsed.map_err(|message| StagegraphError::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Load the first configuration file found in `dir`, or defaults
    pub fn discover(dir: &Path) -> StagegraphResult<Self> {
        match Self::find(dir) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading configuration");
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Path of the configuration file in `dir`, if there is one
    pub fn find(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Store directory resolved against the project root
    pub fn store_directory(&self, root: &Path) -> PathBuf {
        root.join(&self.store.directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file() {
        let temp = TempDir::new().unwrap();
        let config = Config::discover(temp.path()).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.notifications.debounce_window(), Duration::from_secs(1));
        assert_eq!(config.output.format, DescriptorFormat::Yaml);
        assert_eq!(
            config.store_directory(temp.path()),
            temp.path().join(".stagegraph").join("pipelines")
        );
    }

    #[test]
    fn test_load_partial_yaml() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(".stagegraph.yaml"),
            "notifications:\n  debounce_ms: 250\noutput:\n  format: json\n",
        )
        .unwrap();

        let config = Config::discover(temp.path()).unwrap();
        assert_eq!(config.notifications.debounce_ms, 250);
        assert_eq!(config.output.format, DescriptorFormat::Json);
        assert_eq!(config.store, StoreConfig::default());
    }

    #[test]
    fn test_load_toml() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(".stagegraph.toml"),
            "[store]\ndirectory = \"pipelines\"\n",
        )
        .unwrap();

        let config = Config::discover(temp.path()).unwrap();
        assert_eq!(config.store.directory, PathBuf::from("pipelines"));
        assert_eq!(config.notifications.debounce_ms, 1000);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".stagegraph.yml");
        std::fs::write(&path, "").unwrap();

        assert_eq!(Config::load(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".stagegraph.yaml");
        std::fs::write(&path, "output:\n  format: xml\n").unwrap();

        match Config::load(&path) {
            Err(StagegraphError::Config { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected config error, got {:?}", other),
        }
    }
}
