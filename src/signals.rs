//! Signal definitions loaded from the device database
//!
//! The database is an external, read-only JSON file consumed once at
//! startup:
//!
//! ```json
//! {
//!   "signal_keys": [
//!     { "key": "TEMP", "dir": "RX", "name": "Temperature" },
//!     { "key": "SETP", "dir": "TX", "name": "Setpoint" }
//!   ]
//! }
//! ```
//!
//! The core only consumes `key → {dir, name}` lookups. Direction matters to
//! TX-capable consumers (a setpoint entry widget must know it may send);
//! display names are presentation sugar and fall back to the key itself.

use crate::error::{Result, ScopeError};
use crate::types::SignalDirection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// One entry of the signal database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalDef {
    /// Unique wire key (the text before `:` on the line protocol)
    pub key: String,
    /// Direction relative to the host
    pub dir: SignalDirection,
    /// Human-readable name for display
    pub name: String,
}

/// On-disk shape of the signal database file
#[derive(Debug, Default, Deserialize)]
struct SignalFile {
    #[serde(default)]
    signal_keys: Vec<SignalDef>,
}

/// Lookup table from signal key to its definition
#[derive(Debug, Clone, Default)]
pub struct SignalCatalog {
    signals: HashMap<String, SignalDef>,
}

impl SignalCatalog {
    /// Load the catalog from a JSON database file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScopeError::Config(format!("Failed to read signal database {:?}: {}", path, e))
        })?;

        let file: SignalFile = serde_json::from_str(&content).map_err(|e| {
            ScopeError::Config(format!("Failed to parse signal database {:?}: {}", path, e))
        })?;

        tracing::info!(
            "Loaded {} signal definitions from {:?}",
            file.signal_keys.len(),
            path
        );
        Ok(Self::from_defs(file.signal_keys))
    }

    /// Build a catalog from definitions already in memory
    ///
    /// Later entries win when the file repeats a key.
    pub fn from_defs(defs: impl IntoIterator<Item = SignalDef>) -> Self {
        let signals = defs
            .into_iter()
            .map(|def| (def.key.clone(), def))
            .collect();
        Self { signals }
    }

    /// Look up a full definition by key
    pub fn get(&self, key: &str) -> Option<&SignalDef> {
        self.signals.get(key)
    }

    /// Direction for the given key, if known
    pub fn direction(&self, key: &str) -> Option<SignalDirection> {
        self.signals.get(key).map(|def| def.dir)
    }

    /// Display name for the given key, falling back to the key itself
    pub fn display_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.signals.get(key).map_or(key, |def| def.name.as_str())
    }

    /// All known keys in sorted order
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.signals.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Number of known signals
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_catalog() -> SignalCatalog {
        SignalCatalog::from_defs([
            SignalDef {
                key: "TEMP".to_string(),
                dir: SignalDirection::Rx,
                name: "Temperature".to_string(),
            },
            SignalDef {
                key: "SETP".to_string(),
                dir: SignalDirection::Tx,
                name: "Setpoint".to_string(),
            },
        ])
    }

    #[test]
    fn test_lookups() {
        let catalog = sample_catalog();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.direction("TEMP"), Some(SignalDirection::Rx));
        assert_eq!(catalog.direction("SETP"), Some(SignalDirection::Tx));
        assert_eq!(catalog.direction("NOPE"), None);
        assert_eq!(catalog.display_name("TEMP"), "Temperature");
    }

    #[test]
    fn test_display_name_falls_back_to_key() {
        let catalog = sample_catalog();
        assert_eq!(catalog.display_name("UNKNOWN"), "UNKNOWN");
    }

    #[test]
    fn test_keys_sorted() {
        let catalog = sample_catalog();
        assert_eq!(catalog.keys(), vec!["SETP", "TEMP"]);
    }

    #[test]
    fn test_parse_database_json() {
        let json = r#"{
            "signal_keys": [
                { "key": "RPM", "dir": "RX", "name": "Engine speed" }
            ]
        }"#;
        let file: SignalFile = serde_json::from_str(json).unwrap();
        let catalog = SignalCatalog::from_defs(file.signal_keys);
        assert_eq!(catalog.direction("RPM"), Some(SignalDirection::Rx));
        assert_eq!(catalog.display_name("RPM"), "Engine speed");
    }

    #[test]
    fn test_missing_signal_keys_field_is_empty_catalog() {
        let file: SignalFile = serde_json::from_str("{}").unwrap();
        assert!(file.signal_keys.is_empty());
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let err = SignalCatalog::load("/nonexistent/database.json").unwrap_err();
        assert!(matches!(err, ScopeError::Config(_)));
    }
}
