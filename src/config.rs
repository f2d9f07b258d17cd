//! Configuration Module
//!
//! Handles loading and managing proxy configuration from environment variables.

use std::env;
use std::time::Duration;

/// Default cache version label
pub const DEFAULT_CACHE_VERSION: &str = "alive-light-v1";

/// Default essential resources seeded at install time
pub const DEFAULT_ESSENTIAL_RESOURCES: [&str; 2] = ["/", "/index.html"];

/// Proxy configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Origin the proxy performs live requests against
    pub upstream_url: String,
    /// Version label naming the active cache store
    pub cache_version: String,
    /// Paths seeded into the store on install
    pub essential_resources: Vec<String>,
    /// Bound on a live network attempt; None waits indefinitely
    pub fetch_timeout_ms: Option<u64>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `UPSTREAM_URL` - Upstream origin (default: http://127.0.0.1:8080)
    /// - `CACHE_VERSION` - Cache version label (default: alive-light-v1)
    /// - `ESSENTIAL_RESOURCES` - Comma-separated paths (default: /,/index.html)
    /// - `FETCH_TIMEOUT_MS` - Live request bound in milliseconds (default: unset)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            upstream_url: env::var("UPSTREAM_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.upstream_url),
            cache_version: env::var("CACHE_VERSION")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.cache_version),
            essential_resources: env::var("ESSENTIAL_RESOURCES")
                .ok()
                .map(|v| parse_resource_list(&v))
                .unwrap_or(defaults.essential_resources),
            fetch_timeout_ms: env::var("FETCH_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|ms| *ms > 0),
        }
    }

    /// Returns the live request bound as a Duration, if configured.
    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_ms.map(Duration::from_millis)
    }
}

/// Splits a comma-separated resource list, dropping empty items.
fn parse_resource_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            upstream_url: "http://127.0.0.1:8080".to_string(),
            cache_version: DEFAULT_CACHE_VERSION.to_string(),
            essential_resources: DEFAULT_ESSENTIAL_RESOURCES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            fetch_timeout_ms: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.upstream_url, "http://127.0.0.1:8080");
        assert_eq!(config.cache_version, "alive-light-v1");
        assert_eq!(config.essential_resources, vec!["/", "/index.html"]);
        assert!(config.fetch_timeout().is_none());
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("SERVER_PORT");
        env::remove_var("UPSTREAM_URL");
        env::remove_var("CACHE_VERSION");
        env::remove_var("ESSENTIAL_RESOURCES");
        env::remove_var("FETCH_TIMEOUT_MS");

        let config = Config::from_env();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cache_version, "alive-light-v1");
        assert_eq!(config.essential_resources.len(), 2);
        assert!(config.fetch_timeout_ms.is_none());
    }

    #[test]
    fn test_parse_resource_list() {
        let parsed = parse_resource_list(" /, /index.html ,, /app.js");
        assert_eq!(parsed, vec!["/", "/index.html", "/app.js"]);
        assert!(parse_resource_list("").is_empty());
    }
}
