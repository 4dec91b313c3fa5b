//! Engine configuration.
//!
//! Loaded from an optional TOML file; every field has a default, so an
//! empty or missing file yields [`EngineConfig::default`].
//!
//! ```toml
//! [navigation]
//! toggle_mode = "accordion"
//! click_debounce_ms = 220
//!
//! [bus]
//! capacity = 256
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// How toggling a folder treats its expanded siblings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ToggleMode {
    /// Each folder opens and closes on its own.
    #[default]
    Independent,
    /// Opening a folder closes its expanded siblings in the same context.
    Accordion,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub toggle_mode: ToggleMode,
    /// Delay separating a single folder click from a double click.
    pub click_debounce_ms: u64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            toggle_mode: ToggleMode::Independent,
            click_debounce_ms: 220,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    pub capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self { capacity: 256 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Schema version stamped on written snapshots.
    pub version: u32,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            version: shiori_types::SNAPSHOT_VERSION,
        }
    }
}

/// Top-level engine configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub navigation: NavigationConfig,
    pub bus: BusConfig,
    pub snapshot: SnapshotConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl EngineConfig {
    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load `path`, falling back to defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn click_debounce(&self) -> Duration {
        Duration::from_millis(self.navigation.click_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(EngineConfig::from_toml("").unwrap(), EngineConfig::default());
        assert_eq!(EngineConfig::default().click_debounce(), Duration::from_millis(220));
    }

    #[test]
    fn test_partial_override() {
        let config = EngineConfig::from_toml(
            r#"
            [navigation]
            toggle_mode = "accordion"
            "#,
        )
        .unwrap();
        assert_eq!(config.navigation.toggle_mode, ToggleMode::Accordion);
        assert_eq!(config.navigation.click_debounce_ms, 220);
        assert_eq!(config.bus.capacity, 256);
    }

    #[test]
    fn test_malformed_is_parse_error() {
        let err = EngineConfig::from_toml("[navigation\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = EngineConfig::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}
