use std::path::Path;

use anyhow::{bail, Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Prefix of environment variables overriding file settings.
pub const ENV_PREFIX: &str = "BTS_SYNC_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("github_api_token is not set")]
    MissingApiToken,

    #[error("sync_label is not set")]
    MissingSyncLabel,

    #[error("No repositories configured")]
    NoRepositories,

    #[error("Invalid repository mapping: {0}")]
    InvalidRepository(String),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid backoff_factor: {0}. Must be a finite, non-negative number")]
    InvalidBackoffFactor(f64),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must not exceed max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Invalid URL for {0}: {1}")]
    InvalidUrl(&'static str, String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from `path`.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. The YAML file at `path`
    /// 3. Environment variables (`BTS_SYNC_*`, `__` separates nested keys)
    pub fn load(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!("Config file {} does not exist", path.display());
        }

        let config: Config = Self::figment(path)
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.github_api_token.trim().is_empty() {
            return Err(ConfigError::MissingApiToken);
        }

        if config.sync_label.trim().is_empty() {
            return Err(ConfigError::MissingSyncLabel);
        }

        if config.repositories.is_empty() {
            return Err(ConfigError::NoRepositories);
        }

        for mapping in &config.repositories {
            if mapping.debian_pkg.trim().is_empty() {
                return Err(ConfigError::InvalidRepository(format!(
                    "debian_pkg is empty for {}",
                    mapping.github_repo
                )));
            }
            let well_formed = mapping
                .github_repo
                .split_once('/')
                .is_some_and(|(owner, name)| {
                    !owner.is_empty() && !name.is_empty() && !name.contains('/')
                });
            if !well_formed {
                return Err(ConfigError::InvalidRepository(format!(
                    "github_repo '{}' must be of the form owner/name",
                    mapping.github_repo
                )));
            }
        }

        reqwest::Url::parse(&config.github.api_url)
            .map_err(|e| ConfigError::InvalidUrl("github.api_url", e.to_string()))?;
        reqwest::Url::parse(&config.debbugs.soap_url)
            .map_err(|e| ConfigError::InvalidUrl("debbugs.soap_url", e.to_string()))?;

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let factor = config.throttle.backoff_factor;
        if !factor.is_finite() || factor < 0.0 {
            return Err(ConfigError::InvalidBackoffFactor(factor));
        }

        if config.retry.initial_backoff_ms > config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms,
            ));
        }

        if config.cache.enabled && config.cache.dir.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "cache.dir cannot be empty while the cache is enabled".to_string(),
            ));
        }

        Ok(())
    }
}
