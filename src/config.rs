//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;

/// Default upstream endpoint for the SPPO GPS feed.
pub const DEFAULT_SPPO_API_URL: &str = "https://dados.mobilidade.rio/gps/sppo";

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Upstream GPS feed URL
    pub sppo_api_url: String,
    /// Upstream request timeout in milliseconds
    pub api_timeout_ms: u64,
    /// Extra attempts after a failed upstream request
    pub api_retry_count: u32,
    /// Default TTL in seconds for the general namespace
    pub cache_ttl: u64,
    /// Default TTL in seconds for the line namespace
    pub cache_ttl_line: u64,
    /// Default TTL in seconds for the position namespace
    pub cache_ttl_position: u64,
    /// TTL in seconds for the stale fallback snapshot
    pub cache_stale_ttl: u64,
    /// Maximum number of keys per cache namespace
    pub cache_max_keys: usize,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Inbound rate limit window in milliseconds
    pub rate_limit_window_ms: u64,
    /// Maximum requests per client within one window
    pub rate_limit_max: u32,
    /// HTTP server port
    pub server_port: u16,
}

/// Reads an env var and parses it, falling back on absence or parse failure.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SPPO_API_URL` - Upstream feed URL
    /// - `API_TIMEOUT` - Upstream timeout in ms (default: 30000)
    /// - `API_RETRY_COUNT` - Upstream retries (default: 3)
    /// - `CACHE_TTL` / `CACHE_TTL_LINE` / `CACHE_TTL_POSITION` - Namespace TTLs
    ///   in seconds (default: 300 / 180 / 120)
    /// - `CACHE_STALE_TTL` - Stale snapshot TTL in seconds (default: 1800)
    /// - `CACHE_MAX_KEYS` - Max keys per namespace (default: 1000)
    /// - `CLEANUP_INTERVAL` - Expired entry sweep in seconds (default: 60)
    /// - `RATE_LIMIT_WINDOW_MS` / `RATE_LIMIT_MAX` - Inbound limit (default: 15 min / 100)
    /// - `PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            sppo_api_url: env::var("SPPO_API_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.sppo_api_url),
            api_timeout_ms: env_or("API_TIMEOUT", defaults.api_timeout_ms),
            api_retry_count: env_or("API_RETRY_COUNT", defaults.api_retry_count),
            cache_ttl: env_or("CACHE_TTL", defaults.cache_ttl),
            cache_ttl_line: env_or("CACHE_TTL_LINE", defaults.cache_ttl_line),
            cache_ttl_position: env_or("CACHE_TTL_POSITION", defaults.cache_ttl_position),
            cache_stale_ttl: env_or("CACHE_STALE_TTL", defaults.cache_stale_ttl),
            cache_max_keys: env_or("CACHE_MAX_KEYS", defaults.cache_max_keys),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            rate_limit_window_ms: env_or("RATE_LIMIT_WINDOW_MS", defaults.rate_limit_window_ms),
            rate_limit_max: env_or("RATE_LIMIT_MAX", defaults.rate_limit_max),
            server_port: env_or("PORT", defaults.server_port),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sppo_api_url: DEFAULT_SPPO_API_URL.to_string(),
            api_timeout_ms: 30_000,
            api_retry_count: 3,
            cache_ttl: 300,
            cache_ttl_line: 180,
            cache_ttl_position: 120,
            cache_stale_ttl: 1800,
            cache_max_keys: 1000,
            cleanup_interval: 60,
            rate_limit_window_ms: 15 * 60 * 1000,
            rate_limit_max: 100,
            server_port: 3000,
        }
    }
}
