//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Directory holding the store environment
    pub data_dir: PathBuf,
    /// Maximum size of the store environment in megabytes
    pub map_size_mb: usize,
    /// Credential refresh interval in seconds
    pub refresh_interval: u64,
    /// WeChat application id
    pub wx_app_id: String,
    /// WeChat application secret
    pub wx_app_secret: String,
    /// CORS origins allowed to call the API (empty = allow any)
    pub allowed_origins: Vec<String>,
    /// Regex patterns for hosts allowed to request share signatures
    pub whitelist_domains: Vec<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `DATA_DIR` - Store directory (default: "data")
    /// - `STORE_MAP_SIZE_MB` - Store map size in MB (default: 512)
    /// - `REFRESH_INTERVAL` - Credential refresh interval in seconds (default: 3600)
    /// - `WX_APP_ID` / `WX_APP_SECRET` - WeChat credentials (default: empty)
    /// - `ALLOWED_ORIGINS` - Comma-separated CORS origins (default: empty, allow any)
    /// - `WHITELIST_DOMAINS` - Comma-separated host regex patterns (default: empty)
    pub fn from_env() -> Self {
        Self {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            map_size_mb: env::var("STORE_MAP_SIZE_MB")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(512),
            refresh_interval: env::var("REFRESH_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
            wx_app_id: env::var("WX_APP_ID").unwrap_or_default(),
            wx_app_secret: env::var("WX_APP_SECRET").unwrap_or_default(),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),
            whitelist_domains: env::var("WHITELIST_DOMAINS")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            data_dir: PathBuf::from("data"),
            map_size_mb: 512,
            refresh_interval: 3600,
            wx_app_id: String::new(),
            wx_app_secret: String::new(),
            allowed_origins: Vec::new(),
            whitelist_domains: Vec::new(),
        }
    }
}

/// Splits a comma-separated env value into trimmed, non-empty entries.
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
