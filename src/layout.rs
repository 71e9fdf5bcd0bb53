//! Plot layout persistence
//!
//! The layout file is an external collaborator format: a JSON document
//! listing plot descriptors, each carrying the signal keys assigned to that
//! plot. The core stores and round-trips the signal-key lists only —
//! geometry, splitters, and styling belong to the shell. Loading a layout is
//! a sequence of "create a consumer, then re-append its signal keys"
//! operations driven by the shell.
//!
//! ```json
//! {
//!   "plots": [
//!     { "signals": ["TEMP", "SETP"] },
//!     { "signals": ["RPM"] }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, ScopeError};

/// Signal assignment of one plot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotDescriptor {
    /// Signal keys shown by this plot, in assignment order
    #[serde(default)]
    pub signals: Vec<String>,
}

/// The full persisted layout
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotLayout {
    /// One descriptor per plot, in display order
    #[serde(default)]
    pub plots: Vec<PlotDescriptor>,
}

impl PlotLayout {
    /// Load a layout from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ScopeError::Config(format!("Failed to read layout {:?}: {}", path, e)))?;
        serde_json::from_str(&content)
            .map_err(|e| ScopeError::Config(format!("Failed to parse layout {:?}: {}", path, e)))
    }

    /// Save the layout as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ScopeError::Config(format!("Failed to serialize layout: {}", e)))?;
        std::fs::write(path, content)
            .map_err(|e| ScopeError::Config(format!("Failed to write layout {:?}: {}", path, e)))
    }

    /// Whether the layout describes no plots
    pub fn is_empty(&self) -> bool {
        self.plots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_layout() -> PlotLayout {
        PlotLayout {
            plots: vec![
                PlotDescriptor {
                    signals: vec!["TEMP".to_string(), "SETP".to_string()],
                },
                PlotDescriptor {
                    signals: vec!["RPM".to_string()],
                },
            ],
        }
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("layout.json");

        let layout = sample_layout();
        layout.save(&path).unwrap();

        let loaded = PlotLayout::load(&path).unwrap();
        assert_eq!(loaded, layout);
    }

    #[test]
    fn test_parse_external_format() {
        let json = r#"{ "plots": [ { "signals": ["A"] }, { "signals": [] } ] }"#;
        let layout: PlotLayout = serde_json::from_str(json).unwrap();
        assert_eq!(layout.plots.len(), 2);
        assert_eq!(layout.plots[0].signals, vec!["A".to_string()]);
        assert!(layout.plots[1].signals.is_empty());
    }

    #[test]
    fn test_missing_fields_default_empty() {
        let layout: PlotLayout = serde_json::from_str("{}").unwrap();
        assert!(layout.is_empty());
    }

    #[test]
    fn test_load_errors_are_config_errors() {
        assert!(matches!(
            PlotLayout::load("/nonexistent/layout.json"),
            Err(ScopeError::Config(_))
        ));

        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            PlotLayout::load(&path),
            Err(ScopeError::Config(_))
        ));
    }
}
