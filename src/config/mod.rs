//! Configuration loading
//!
//! Reads a JSON5 file from `$LIARVOTE_CONFIG_PATH` or
//! `<config dir>/liarvote/config.json5`, then applies environment overrides:
//!
//! - `LIARVOTE_STORE_URL`: REST store base URL (switches the backend to REST)
//! - `LIARVOTE_ADMIN_SECRET`: secret served by the bundled store server
//! - `LIARVOTE_PORT`: web front end port
//! - `LIARVOTE_LOG`: log filter directive

pub mod types;

pub use types::*;

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "LIARVOTE_CONFIG_PATH";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {message}")]
    InvalidEnv { key: String, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Resolve the configuration file path
pub fn get_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("liarvote")
        .join("config.json5")
}

/// Load configuration from the default location plus the process environment
pub fn load_config() -> Result<Config, ConfigError> {
    let mut config = load_config_from(&get_config_path())?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

/// Load a config file without environment overrides. A missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    json5::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Apply `LIARVOTE_*` overrides read through `lookup`
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("LIARVOTE_STORE_URL") {
        let timeout_seconds = match &config.store {
            StoreConfig::Rest {
                timeout_seconds, ..
            }
            | StoreConfig::Baas {
                timeout_seconds, ..
            } => *timeout_seconds,
            StoreConfig::Memory { .. } => 10,
        };
        config.store = StoreConfig::Rest {
            base_url: url,
            timeout_seconds,
        };
    }

    if let Some(secret) = lookup("LIARVOTE_ADMIN_SECRET") {
        config.store_server.admin_secret = Some(secret);
    }

    if let Some(port) = lookup("LIARVOTE_PORT") {
        config.server.port = port.trim().parse().map_err(|e| ConfigError::InvalidEnv {
            key: "LIARVOTE_PORT".to_string(),
            message: format!("{e}"),
        })?;
    }

    if let Some(level) = lookup("LIARVOTE_LOG") {
        config.logging.level = level;
    }

    Ok(())
}

impl Config {
    /// Reject configurations that cannot work
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.session_ttl_seconds == 0 {
            return Err(ConfigError::Invalid(
                "server.sessionTtlSeconds must be greater than zero".to_string(),
            ));
        }
        if self.server.max_sessions == 0 {
            return Err(ConfigError::Invalid(
                "server.maxSessions must be greater than zero".to_string(),
            ));
        }
        if let Some(public_url) = &self.server.public_url {
            url::Url::parse(public_url).map_err(|e| {
                ConfigError::Invalid(format!("server.publicUrl \"{public_url}\": {e}"))
            })?;
        }
        match &self.store {
            StoreConfig::Rest { base_url, .. } if base_url.trim().is_empty() => Err(
                ConfigError::Invalid("store.baseUrl is required".to_string()),
            ),
            StoreConfig::Baas { url, api_key, .. } if url.trim().is_empty() || api_key.trim().is_empty() => {
                Err(ConfigError::Invalid(
                    "store.url and store.apiKey are required for the baas backend".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}
