//! Configuration file loading.
//!
//! An optional `gauntlet.toml` in the working directory supplies per-engine
//! UCI options (keyed by the engine's display name). Absence of the file is
//! not an error; engines then run with their defaults.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

/// Errors loading or parsing the configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),
    /// The file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Per-engine settings.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct EngineConfig {
    /// UCI options applied after the handshake, name to value.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

/// Top-level configuration.
#[derive(Debug, Deserialize, Default)]
pub struct HarnessConfig {
    /// Settings per engine display name.
    #[serde(default)]
    pub engines: HashMap<String, EngineConfig>,
}

impl HarnessConfig {
    /// Loads `gauntlet.toml` from the working directory, defaulting to an
    /// empty configuration when the file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// The configuration file path.
    #[must_use]
    pub fn config_path() -> PathBuf {
        PathBuf::from("gauntlet.toml")
    }

    /// Options configured for `name`, empty if the engine is not listed.
    #[must_use]
    pub fn options_for(&self, name: &str) -> BTreeMap<String, String> {
        self.engines
            .get(name)
            .map(|engine| engine.options.clone())
            .unwrap_or_default()
    }
}
