//! Global configuration loaded from `~/.config/irqwatch-rs/config.ron`.
//!
//! The file is optional: an absent file yields the defaults, and every
//! field has a serde default so partial files are fine. Command-line
//! arguments override whatever the file provides.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{MonitorError, Result};

/// Global configuration for the monitor.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GlobalConfig {
    /// Sampling interval in seconds.
    #[serde(default = "default_interval")]
    pub interval: u64,
    /// Tracked-name patterns fed into the running totals.
    #[serde(default)]
    pub track: Vec<String>,
    /// Patterns excluding matching lines from the ever-changed judgment.
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_interval() -> u64 {
    1
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            track: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

impl GlobalConfig {
    /// Default config path, `~/.config/irqwatch-rs/config.ron`.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("irqwatch-rs").join("config.ron"))
    }

    /// Load the global config, falling back to defaults when no file
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns an error only for a file that exists but cannot be read or
    /// parsed.
    pub fn load() -> Result<Self> {
        match Self::default_config_path() {
            Some(path) if path.exists() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load a config file from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an I/O error for an unreadable file and a configuration
    /// error for invalid RON.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).map_err(|e| MonitorError::io(path.display().to_string(), e))?;
        ron::from_str(&text).map_err(|e| {
            MonitorError::config(format!("invalid config {}: {e}", path.display()))
        })
    }

    /// Write an example config for the user to edit.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the file or its parent directory cannot be
    /// written.
    pub fn save_example_config_to_file(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| MonitorError::io(parent.display().to_string(), e))?;
        }
        let example = Self {
            interval: 1,
            track: vec!["eth".to_owned()],
            exclude: vec!["^LOC".to_owned()],
        };
        let pretty = ron::ser::to_string_pretty(&example, ron::ser::PrettyConfig::default())
            .map_err(|e| MonitorError::config(format!("serialize example config: {e}")))?;
        fs::write(path, pretty).map_err(|e| MonitorError::io(path.display().to_string(), e))
    }
}
