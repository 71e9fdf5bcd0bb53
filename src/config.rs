//! Application configuration
//!
//! A single JSON file at an explicit path; every field is optional and
//! merges over the built-in defaults, so a partial file only overrides what
//! it names:
//!
//! ```json
//! { "baud_rate": 57600, "max_points": 10000 }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, ScopeError};

/// Default serial baud rate
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default cadence for the main update tick (logging, indicators)
pub const DEFAULT_UPDATE_INTERVAL_MS: u64 = 5;

/// Default cadence for display refreshes
pub const DEFAULT_PLOT_UPDATE_INTERVAL_MS: u64 = 30;

/// Default per-signal retention bound
pub const DEFAULT_MAX_POINTS: usize = 5000;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Serial baud rate for new connections
    pub baud_rate: u32,

    /// Main update tick interval in milliseconds
    pub update_interval_ms: u64,

    /// Display refresh interval in milliseconds
    pub plot_update_interval_ms: u64,

    /// Maximum data points to store per signal
    pub max_points: usize,

    /// Path to the signal definition database
    pub database_file: PathBuf,

    /// Path to the layout restored at startup
    pub default_layout_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            update_interval_ms: DEFAULT_UPDATE_INTERVAL_MS,
            plot_update_interval_ms: DEFAULT_PLOT_UPDATE_INTERVAL_MS,
            max_points: DEFAULT_MAX_POINTS,
            database_file: PathBuf::from("database.json"),
            default_layout_file: PathBuf::from("default_layout.json"),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    ///
    /// Fields absent from the file keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ScopeError::Config(format!("Failed to read config {:?}: {}", path, e)))?;
        serde_json::from_str(&content)
            .map_err(|e| ScopeError::Config(format!("Failed to parse config {:?}: {}", path, e)))
    }

    /// Load configuration, falling back to defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Using default configuration: {e}");
            Self::default()
        })
    }
}
