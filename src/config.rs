//! Configuration
//!
//! Loaded from a YAML file; every field has a default, so a missing file or
//! an empty document is a valid configuration.
//!
//! ```yaml
//! server:
//!   address: 0.0.0.0
//!   port: 5000
//! output_dir: /srv/vocabs
//! data_path: /var/lib/grove
//! prefixes:
//!   ex: http://example.com/ns#
//! ```

use crate::rdf::PrefixRegistry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const CONFIG_ENV: &str = "GROVE_CONFIG";
pub const OUTPUT_DIR_ENV: &str = "GROVE_OUTPUT_DIR";
pub const DATA_PATH_ENV: &str = "GROVE_DATA_PATH";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unable to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub address: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroveConfig {
    pub server: ServerConfig,
    /// Where published vocabulary files are written
    pub output_dir: PathBuf,
    /// Data directory for persistence (None = in-memory only)
    pub data_path: Option<PathBuf>,
    /// Extra namespace prefixes, added after the built-in ones
    pub prefixes: IndexMap<String, String>,
}

impl Default for GroveConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            output_dir: PathBuf::from("./vocabs"),
            data_path: None,
            prefixes: IndexMap::new(),
        }
    }
}

impl GroveConfig {
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded configuration from {}", path.display());
        Self::from_yaml(&yaml)
    }

    /// Load from `path`, else from `$GROVE_CONFIG`, else use the defaults;
    /// then apply the environment overrides
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let mut config = match path.or(env_path.as_deref()) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = var(OUTPUT_DIR_ENV) {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(path) = var(DATA_PATH_ENV) {
            self.data_path = Some(PathBuf::from(path));
        }
    }

    /// Built-in prefixes followed by the configured ones
    pub fn prefix_registry(&self) -> PrefixRegistry {
        let mut registry = PrefixRegistry::with_defaults();
        for (prefix, iri) in &self.prefixes {
            registry.add_prefix(prefix.as_str(), iri.as_str());
        }
        registry
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.address, self.server.port)
    }
}
