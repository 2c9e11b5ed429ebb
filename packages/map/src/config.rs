//! Map display configuration.
//!
//! Defaults come from `config/map.toml`, embedded at compile time. A TOML
//! file named by `ECOWATCH_MAP_CONFIG` is layered on top at runtime; keys
//! it omits keep their default values.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming an override config file.
pub const CONFIG_ENV_VAR: &str = "ECOWATCH_MAP_CONFIG";

const DEFAULT_CONFIG: &str = include_str!("../config/map.toml");

/// Where a location's aggregate severity comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeveritySource {
    /// Averaged from the location's reports on every load.
    #[default]
    Reports,
    /// Read from the location's `severity_level` field. Unrecognized
    /// values fall back to `Low`.
    Server,
}

/// Errors from loading a map config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read map config {path}: {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The file is not valid config TOML.
    #[error("invalid map config {path}: {source}")]
    Toml {
        /// Path that was parsed.
        path: String,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
}

/// Display settings for the rendered map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Initial map center as `[lat, lon]`.
    pub center: [f64; 2],
    /// Initial zoom level.
    pub zoom: u8,
    /// Tile layer URL template.
    pub tile_url: String,
    /// Tile layer attribution markup.
    pub attribution: String,
    /// Subtitle shown under the location name in popups.
    pub region_label: String,
    /// Detail view URL template; `{id}` is replaced by the location id.
    pub detail_url: String,
    /// Where aggregate severities come from.
    pub severity_source: SeveritySource,
}

impl Default for MapConfig {
    /// The embedded `config/map.toml`.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed, which the tests rule out.
    fn default() -> Self {
        toml::de::from_str(DEFAULT_CONFIG)
            .unwrap_or_else(|e| panic!("Failed to parse built-in map config: {e}"))
    }
}

impl MapConfig {
    /// Parses a config from TOML text. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns the TOML error if the text doesn't match the config shape.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        let mut merged: toml::Table = toml::de::from_str(DEFAULT_CONFIG)?;
        let overrides: toml::Table = toml::de::from_str(text)?;
        merged.extend(overrides);
        toml::Value::Table(merged).try_into()
    }

    /// Loads a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file can't be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Toml {
            path: path.display().to_string(),
            source,
        })
    }

    /// Loads the file named by `ECOWATCH_MAP_CONFIG`, or the built-in
    /// defaults when the variable is unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the named file can't be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.is_empty() => {
                log::info!("Loading map config from {path}");
                Self::from_path(Path::new(&path))
            }
            _ => Ok(Self::default()),
        }
    }

    /// Detail view URL for one location.
    #[must_use]
    pub fn detail_url_for(&self, location_id: i64) -> String {
        self.detail_url.replace("{id}", &location_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults_parse() {
        let config: MapConfig = toml::de::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, MapConfig::default());
        assert_eq!(MapConfig::from_toml("").unwrap(), config);
    }

    #[test]
    fn defaults() {
        let config = MapConfig::default();
        assert_eq!(config.zoom, 10);
        assert!((config.center[0] - 13.8595).abs() < 1e-9);
        assert_eq!(config.severity_source, SeveritySource::Reports);
        assert!(config.tile_url.contains("{z}"));
    }

    #[test]
    fn partial_override_keeps_defaults() {
        let config = MapConfig::from_toml(
            r#"
            zoom = 12
            severity_source = "server"
            "#,
        )
        .unwrap();
        assert_eq!(config.zoom, 12);
        assert_eq!(config.severity_source, SeveritySource::Server);
        assert_eq!(config.region_label, MapConfig::default().region_label);
    }

    #[test]
    fn rejects_unknown_source() {
        assert!(MapConfig::from_toml(r#"severity_source = "guess""#).is_err());
    }

    #[test]
    fn detail_url_substitutes_id() {
        assert_eq!(MapConfig::default().detail_url_for(7), "/map/locations/7");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = MapConfig::from_path(Path::new("/nonexistent/ecowatch/map.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
