//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (HOLLOWBEAK_*)
//! 2. TOML config file (if HOLLOWBEAK_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! Run-scoped inputs (output format, fetcher order, no-cache flag, grammar
//! strictness, input source) are CLI flags and never appear here.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Realistic Chrome User-Agent sent by every fetcher variant.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (HOLLOWBEAK_*)
/// 2. TOML config file (if HOLLOWBEAK_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// User-Agent string for HTTP and scripted fetches.
    ///
    /// Set via HOLLOWBEAK_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Fetch timeout in milliseconds.
    ///
    /// Set via HOLLOWBEAK_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes to read per response body.
    ///
    /// Set via HOLLOWBEAK_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Days a cached title stays valid.
    ///
    /// Set via HOLLOWBEAK_CACHE_TTL_DAYS environment variable.
    #[serde(default = "default_cache_ttl_days")]
    pub cache_ttl_days: i64,

    /// Override for the cache file location.
    ///
    /// Set via HOLLOWBEAK_CACHE_PATH environment variable.
    /// Defaults to `<config-dir>/hollowbeak/data.json` when unset.
    #[serde(default)]
    pub cache_path: Option<PathBuf>,

    /// Override for the browser history database consulted by the
    /// history fetcher.
    ///
    /// Set via HOLLOWBEAK_HISTORY_DB_PATH environment variable.
    /// Defaults to the platform's Chrome default-profile History file.
    #[serde(default)]
    pub history_db_path: Option<PathBuf>,
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_cache_ttl_days() -> i64 {
    180
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            cache_ttl_days: default_cache_ttl_days(),
            cache_path: None,
            history_db_path: None,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// TTL applied to new cache entries.
    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.cache_ttl_days)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `HOLLOWBEAK_`
    /// 2. TOML file from `HOLLOWBEAK_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("HOLLOWBEAK_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("HOLLOWBEAK_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
