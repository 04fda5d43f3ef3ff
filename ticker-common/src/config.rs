//! Configuration management for the ticker dashboard.
//!
//! The service reads a single configuration file at `~/.ticker/config.json`.
//!
//! # Configuration Priority
//!
//! 1. Environment variables (TICKER_* prefix)
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `TICKER_CONFIG` → alternate config file path
//! - `TICKER_HOST` → server.host
//! - `TICKER_PORT` → server.port
//! - `TICKER_DATA_MODE` → data.mode
//! - `TICKER_UPSTREAM_URL` → data.upstream_url
//! - `TICKER_SNAPSHOT_DIR` → data.snapshot_dir
//! - `TICKER_LOG_LEVEL` → observability.log_level
//! - `TICKER_LOG_FORMAT` → observability.log_format

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".ticker"),
        |dirs| dirs.home_dir().join(".ticker"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("TICKER_CONFIG") {
        return PathBuf::from(path);
    }
    config_dir().join("config.json")
}

// ============================================================================
// Server Configuration
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address. Default is `127.0.0.1` (local only).
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

// ============================================================================
// Data Source Configuration
// ============================================================================

/// Where category data is resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceMode {
    /// Query the upstream endpoint (`/saved_stock_info`).
    Live,
    /// Read pre-generated snapshot files.
    Static,
}

impl std::fmt::Display for DataSourceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Live => write!(f, "live"),
            Self::Static => write!(f, "static"),
        }
    }
}

impl std::str::FromStr for DataSourceMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "static" => Ok(Self::Static),
            other => Err(format!("unknown data source mode: {other}")),
        }
    }
}

/// Data source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Data source mode (live or static).
    #[serde(default = "default_mode")]
    pub mode: DataSourceMode,

    /// Base URL of the upstream stock-info backend (live mode).
    #[serde(default = "default_upstream_url")]
    pub upstream_url: String,

    /// Root directory of the static site build (static mode). Per-category
    /// payloads are read from `<snapshot_dir>/data/<category>.json`.
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: String,

    /// Bundled cache file used when a per-category snapshot is missing.
    #[serde(default = "default_cache_file")]
    pub cache_file: String,

    /// Upstream request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Watchlist categories, in render order.
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,

    /// Category name used for the ETF view.
    #[serde(default = "default_etf_category")]
    pub etf_category: String,

    /// Background refresh interval in minutes. 0 disables the refresh task.
    #[serde(default)]
    pub refresh_interval_minutes: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            upstream_url: default_upstream_url(),
            snapshot_dir: default_snapshot_dir(),
            cache_file: default_cache_file(),
            request_timeout_secs: default_request_timeout(),
            categories: default_categories(),
            etf_category: default_etf_category(),
            refresh_interval_minutes: 0,
        }
    }
}

fn default_mode() -> DataSourceMode {
    DataSourceMode::Live
}

fn default_upstream_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_snapshot_dir() -> String {
    "site/html".to_string()
}

fn default_cache_file() -> String {
    "cache/stock_data.json".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_categories() -> Vec<String> {
    [
        "Owned",
        "Information Technology",
        "Industrials",
        "Energy & Utilities",
        "Financial Services",
        "Healthcare",
        "Communication Services",
        "Real Estate",
        "Consumer Staples",
        "Consumer Discretionary",
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect()
}

fn default_etf_category() -> String {
    "ETFs".to_string()
}

// ============================================================================
// Observability Configuration
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

// ============================================================================
// Top-level Configuration
// ============================================================================

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Data source settings
    #[serde(default)]
    pub data: DataConfig,

    /// Logging settings
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::info!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration with environment variable fallbacks.
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("TICKER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("TICKER_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(mode) = std::env::var("TICKER_DATA_MODE") {
            if let Ok(m) = mode.parse() {
                self.data.mode = m;
            }
        }
        if let Ok(url) = std::env::var("TICKER_UPSTREAM_URL") {
            self.data.upstream_url = url;
        }
        if let Ok(dir) = std::env::var("TICKER_SNAPSHOT_DIR") {
            self.data.snapshot_dir = dir;
        }
        if let Ok(level) = std::env::var("TICKER_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Ok(format) = std::env::var("TICKER_LOG_FORMAT") {
            self.observability.log_format = format;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.data.mode, DataSourceMode::Live);
        assert_eq!(config.data.categories.len(), 10);
        assert_eq!(config.data.categories[0], "Owned");
        assert_eq!(config.data.etf_category, "ETFs");
        assert_eq!(config.data.refresh_interval_minutes, 0);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_parse_partial_config() {
        let json = r#"{
            "server": { "port": 9090 },
            "data": { "mode": "static", "snapshot_dir": "/srv/site" }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.data.mode, DataSourceMode::Static);
        assert_eq!(config.data.snapshot_dir, "/srv/site");
        assert_eq!(config.data.upstream_url, "http://localhost:8000");
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!(
            "live".parse::<DataSourceMode>().unwrap(),
            DataSourceMode::Live
        );
        assert_eq!(
            "STATIC".parse::<DataSourceMode>().unwrap(),
            DataSourceMode::Static
        );
        assert!("hybrid".parse::<DataSourceMode>().is_err());
    }

    #[test]
    fn test_mode_display_roundtrip() {
        for mode in [DataSourceMode::Live, DataSourceMode::Static] {
            assert_eq!(mode.to_string().parse::<DataSourceMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "observability": { "log_level": "debug" } }"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.observability.log_level, "debug");
        assert_eq!(config.observability.log_format, "pretty");
    }
}
