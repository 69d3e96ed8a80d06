//! Application settings.
//!
//! Defaults can be overridden by a JSON file in the XDG config directory
//! (`~/.config/portprobe/settings.json` on Linux) or by an explicit
//! `--config` path. Command-line flags override both.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Scan defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Requested worker count.
    pub threads: usize,
    /// Per-probe timeout in seconds.
    pub timeout_secs: u64,
    /// Protocol name; validated when the scan runs.
    pub protocol: String,
    /// Lower bound of the default port range.
    pub min_port: u16,
    /// Upper bound of the default port range.
    pub max_port: u16,
    /// Shuffle ports before probing.
    pub randomize: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            threads: 10,
            timeout_secs: 10,
            protocol: "tcp".to_string(),
            min_port: 1,
            max_port: 65535,
            randomize: true,
        }
    }
}

impl Settings {
    /// Path of the settings file in the XDG config directory.
    pub fn default_path() -> ConfigResult<PathBuf> {
        let project = ProjectDirs::from("com", "portprobe", "portprobe")
            .ok_or(ConfigError::DirectoryNotFound)?;
        Ok(project.config_dir().join("settings.json"))
    }

    /// Load settings from the default location, falling back to defaults
    /// when there is no config directory or no file in it.
    pub fn load() -> ConfigResult<Self> {
        let file = match Self::default_path() {
            Ok(file) => file,
            Err(ConfigError::DirectoryNotFound) => return Ok(Self::default()),
            Err(e) => return Err(e),
        };
        if !file.exists() {
            debug!(path = %file.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let settings =
            serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
