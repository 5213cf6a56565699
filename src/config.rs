//! Configuration Module
//!
//! Handles loading cache and store settings from environment variables.

use std::env;
use std::str::FromStr;

/// Cache and store configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Sweep interval (and default TTL) in milliseconds for expiring caches
    pub sweep_interval_ms: i64,
    /// Entry capacity for recency caches
    pub capacity: usize,
    /// HTTP port of the store server
    pub server_port: u16,
    /// Base URL of the remote store used by network-backed caches
    pub remote_url: String,
    /// Key prefix for network-backed caches; random per instance when unset
    pub namespace: Option<String>,
    /// Timeout applied to every remote store request, in milliseconds
    pub request_timeout_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SWEEP_INTERVAL_MS` - Sweep interval in milliseconds (default: 1000)
    /// - `CACHE_CAPACITY` - Recency cache capacity (default: 100)
    /// - `SERVER_PORT` - Store server port (default: 3000)
    /// - `REMOTE_URL` - Remote store base URL (default: http://127.0.0.1:3000)
    /// - `CACHE_NAMESPACE` - Remote key prefix (default: random UUID)
    /// - `REQUEST_TIMEOUT_MS` - Remote request timeout (default: 2000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            sweep_interval_ms: parse_var("SWEEP_INTERVAL_MS").unwrap_or(defaults.sweep_interval_ms),
            capacity: parse_var("CACHE_CAPACITY").unwrap_or(defaults.capacity),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            remote_url: env::var("REMOTE_URL").unwrap_or(defaults.remote_url),
            namespace: env::var("CACHE_NAMESPACE").ok().filter(|ns| !ns.is_empty()),
            request_timeout_ms: parse_var("REQUEST_TIMEOUT_MS")
                .unwrap_or(defaults.request_timeout_ms),
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sweep_interval_ms: 1000,
            capacity: 100,
            server_port: 3000,
            remote_url: "http://127.0.0.1:3000".to_string(),
            namespace: None,
            request_timeout_ms: 2000,
        }
    }
}
