//! Configuration settings for the omnigraph access layer.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub cache: CacheConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::ReadFile)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        if self.store.embedding_dimension == 0 {
            return Err(ConfigError::Invalid(
                "store.embedding_dimension must be greater than zero".to_string(),
            )
            .into());
        }
        if self.cache.local_capacity == 0 {
            return Err(ConfigError::Invalid(
                "cache.local_capacity must be greater than zero".to_string(),
            )
            .into());
        }
        Ok(())
    }
}

/// Backing-store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Dimension of vector indexes created on entity collections.
    pub embedding_dimension: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            embedding_dimension: 1536,
        }
    }
}

/// Cache tier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries in the process-local tier.
    pub local_capacity: u64,
    /// Default time-to-live for shared-tier entries, in seconds.
    pub shared_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            local_capacity: 1000,
            shared_ttl_secs: 3600,
        }
    }
}
