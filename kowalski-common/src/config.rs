//! Bootstrap configuration loading
//!
//! Resolution priority for the config file location:
//! 1. Command-line argument (highest priority)
//! 2. `KOWALSKI_CONFIG` environment variable
//! 3. Platform config file (`~/.config/kowalski/config.toml`, then `/etc/kowalski/config.toml`)
//! 4. Compiled defaults (fallback)
//!
//! Database URLs may additionally be overridden per-variable from the
//! environment after the file has been read.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "KOWALSKI_CONFIG";

/// Environment variable overriding the statistics database URL
pub const STATS_DATABASE_ENV_VAR: &str = "KOWALSKI_STATS_DATABASE_URL";

/// Environment variable overriding the core database URL
pub const CORE_DATABASE_ENV_VAR: &str = "KOWALSKI_CORE_DATABASE_URL";

/// Default fare-search endpoint
pub const DEFAULT_SEARCH_BASE_URL: &str = "https://api-deac.crpo.su/avia/fast_search.json";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TomlConfig {
    /// Bind address for the HTTP server
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// PostgreSQL URL of the statistics database (hit counters)
    #[serde(default = "default_stats_database_url")]
    pub stats_database_url: String,

    /// PostgreSQL URL of the core database (flight schedule)
    #[serde(default = "default_core_database_url")]
    pub core_database_url: String,

    /// Outbound fare-search settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Outbound fare-search settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SearchConfig {
    /// Fare-search endpoint; query parameters are appended to it
    #[serde(default = "default_search_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Upper bound on in-flight fare-search requests per comparison
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_stats_database_url() -> String {
    "postgres://localhost:5432/stats".to_string()
}

fn default_core_database_url() -> String {
    "postgres://localhost:5432/core".to_string()
}

fn default_search_base_url() -> String {
    DEFAULT_SEARCH_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    18
}

fn default_max_concurrent_fetches() -> usize {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            stats_database_url: default_stats_database_url(),
            core_database_url: default_core_database_url(),
            search: SearchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: default_search_base_url(),
            timeout_secs: default_timeout_secs(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Locates and loads the bootstrap configuration
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    /// Config file to read, if any
    ///
    /// An explicit CLI or environment path is returned even when it does not
    /// exist so that `load` can report it; platform paths are only returned
    /// when present.
    pub fn config_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.cli_path {
            return Some(path.clone());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        platform_config_candidates()
            .into_iter()
            .find(|candidate| candidate.exists())
    }

    /// Load configuration with graceful fallback
    ///
    /// A missing file logs a warning and yields defaults. A file that exists
    /// but cannot be parsed is an error.
    pub fn load(&self) -> Result<TomlConfig> {
        let mut config = match self.config_path() {
            Some(path) if path.exists() => {
                info!("Loading configuration from {}", path.display());
                load_toml_config(&path)?
            }
            Some(path) => {
                warn!(
                    "Config file {} not found, using compiled defaults",
                    path.display()
                );
                TomlConfig::default()
            }
            None => {
                warn!("No config file found, using compiled defaults");
                TomlConfig::default()
            }
        };

        apply_env_overrides(&mut config);
        validate(&config)?;
        Ok(config)
    }
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

fn platform_config_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("kowalski").join("config.toml"));
    }
    if cfg!(unix) {
        candidates.push(PathBuf::from("/etc/kowalski/config.toml"));
    }
    candidates
}

fn apply_env_overrides(config: &mut TomlConfig) {
    if let Ok(url) = std::env::var(STATS_DATABASE_ENV_VAR) {
        if !url.trim().is_empty() {
            config.stats_database_url = url;
        }
    }
    if let Ok(url) = std::env::var(CORE_DATABASE_ENV_VAR) {
        if !url.trim().is_empty() {
            config.core_database_url = url;
        }
    }
}

fn validate(config: &TomlConfig) -> Result<()> {
    if config.search.timeout_secs == 0 {
        return Err(Error::Config("search.timeout_secs must be positive".to_string()));
    }
    if config.search.max_concurrent_fetches == 0 {
        return Err(Error::Config(
            "search.max_concurrent_fetches must be positive".to_string(),
        ));
    }
    if config.search.base_url.trim().is_empty() {
        return Err(Error::Config("search.base_url must not be empty".to_string()));
    }
    Ok(())
}
