use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Prefix of environment variable overrides, nested with `__`.
pub const ENV_PREFIX: &str = "STORYSYNC_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Data directory cannot be empty")]
    EmptyDataDir,

    #[error("Invalid port: {0}. Must be between 1 and 65535")]
    InvalidPort(u16),

    #[error("Invalid card_limit: {0}. Must be at least 1")]
    InvalidCardLimit(usize),

    #[error("Invalid debounce_ms: {0}. Must be at least 1")]
    InvalidDebounce(u64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid embedding provider: {0}. Must be one of: null, openai")]
    InvalidEmbeddingProvider(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .storysync/config.yaml (project config)
    /// 3. .storysync/local.yaml (project local overrides, optional)
    /// 4. Environment variables (STORYSYNC_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".storysync/config.yaml"))
            .merge(Yaml::file(".storysync/local.yaml"))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honouring
    /// environment overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.data_dir.trim().is_empty() {
            return Err(ConfigError::EmptyDataDir);
        }

        if config.server.port == 0 {
            return Err(ConfigError::InvalidPort(config.server.port));
        }

        if config.sync.card_limit == 0 {
            return Err(ConfigError::InvalidCardLimit(config.sync.card_limit));
        }

        if config.sync.debounce_ms == 0 {
            return Err(ConfigError::InvalidDebounce(config.sync.debounce_ms));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_providers = ["null", "openai"];
        if !valid_providers.contains(&config.embedding.provider.as_str()) {
            return Err(ConfigError::InvalidEmbeddingProvider(
                config.embedding.provider.clone(),
            ));
        }

        Ok(())
    }
}
