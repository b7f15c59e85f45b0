//! Runtime configuration for the assistant.
//!
//! Values come from an optional TOML file with environment overrides on
//! top; everything has a sensible default so a bare process starts.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// ISO currency code used in rendered totals.
    pub currency: String,
    /// Upper bound for any single external collaborator call.
    pub external_timeout_secs: u64,
    /// Whether read-only collaborator calls are retried once on failure.
    /// Writes are never silently retried.
    pub retry_reads: bool,
    /// Maximum number of orders shown in a tracking listing.
    pub order_history_limit: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            external_timeout_secs: 10,
            retry_reads: true,
            order_history_limit: 10,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl AssistantConfig {
    pub fn external_timeout(&self) -> Duration {
        Duration::from_secs(self.external_timeout_secs)
    }

    pub fn from_toml_str(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)
            .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the file if present, then applies `CHATCART_*` env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) if path.exists() => {
                let raw = fs::read_to_string(path)
                    .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
                Self::from_toml_str(&raw, path)?
            }
            _ => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(value) = env::var("CHATCART_CURRENCY") {
            self.currency = value;
        }
        if let Ok(value) = env::var("CHATCART_EXTERNAL_TIMEOUT_SECS") {
            self.external_timeout_secs = value.parse().map_err(|_| {
                ConfigError::InvalidEnvOverride {
                    key: "CHATCART_EXTERNAL_TIMEOUT_SECS".to_string(),
                    value,
                }
            })?;
        }
        if let Ok(value) = env::var("CHATCART_RETRY_READS") {
            self.retry_reads = value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                key: "CHATCART_RETRY_READS".to_string(),
                value,
            })?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.external_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "external_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.currency.len() != 3 {
            return Err(ConfigError::Validation(format!(
                "currency must be a three-letter code, got `{}`",
                self.currency
            )));
        }
        Ok(())
    }
}
