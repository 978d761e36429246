//! Ambient configuration: the set of classpath roots a host scans for
//! external plugins, and its fail-fast policy, loaded from a TOML file or
//! string.
//!
//! This has no bearing on the core's semantics — `PluginManager` is handed
//! paths and a `ClassCatalog` directly by its caller (spec §1: the
//! metadata scanner is an external collaborator) — it only spares an
//! embedder from writing its own file-loading boilerplate.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Declares which classpath roots to scan for external plugins, and how to
/// react when loading one of them fails.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Archive/directory roots to hand to the host's metadata scanner and
    /// then to [`PluginManager::load_plugins`](pluginforge_core::PluginManager::load_plugins).
    pub search_paths: Vec<String>,

    /// When `true`, a single external plugin failing to load aborts the
    /// whole `load_plugins` call for the embedder; when `false` (the
    /// default), failures are logged and skipped (mirrors
    /// `PluginManager::load_plugins`'s own per-type error handling, which
    /// never aborts — this flag is read by the embedder, not the core).
    pub fail_fast: bool,
}

impl RuntimeConfig {
    /// Loads a config from a TOML file. Missing file is not an error: it
    /// yields [`RuntimeConfig::default`].
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content)
    }

    /// Parses a config from a TOML string.
    pub fn load_from_str(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(ConfigError::from)
    }
}

/// Errors reading or parsing a [`RuntimeConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file: {0}")]
    Read(#[from] std::io::Error),

    /// The configuration content is not valid TOML, or does not match
    /// [`RuntimeConfig`]'s shape.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_default() {
        let config = RuntimeConfig::load_from_file("/nonexistent/pluginforge.toml").unwrap();
        assert_eq!(config, RuntimeConfig::default());
    }

    #[test]
    fn parses_search_paths_and_fail_fast() {
        let config = RuntimeConfig::load_from_str(
            r#"
            search_paths = ["plugins/", "/opt/app/plugins"]
            fail_fast = true
            "#,
        )
        .unwrap();
        assert_eq!(config.search_paths, vec!["plugins/".to_string(), "/opt/app/plugins".to_string()]);
        assert!(config.fail_fast);
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = RuntimeConfig::load_from_str("search_paths = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
