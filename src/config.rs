//! Configuration Module
//!
//! Handles loading memoizer and store configuration from environment variables.

use std::env;

/// Default TTL in seconds applied when a producer is wrapped without one.
pub const DEFAULT_TTL_SECS: u64 = 120;

/// Default namespace prefix for store keys.
pub const DEFAULT_KEY_PREFIX: &str = "memos";

/// Memoizer configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis connection URL; `None` selects the in-process memory backend
    pub redis_url: Option<String>,
    /// TTL in seconds for producers wrapped without an explicit policy
    pub default_ttl: u64,
    /// Namespace prefix of every store key
    pub key_prefix: String,
    /// Memory backend sweep interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REDIS_URL` - Redis connection URL (default: unset, memory backend)
    /// - `MEMO_DEFAULT_TTL` - Default TTL in seconds (default: 120)
    /// - `MEMO_KEY_PREFIX` - Store key prefix (default: "memos")
    /// - `CLEANUP_INTERVAL` - Memory backend sweep frequency in seconds (default: 1)
    pub fn from_env() -> Self {
        Self {
            redis_url: env::var("REDIS_URL").ok().filter(|v| !v.is_empty()),
            default_ttl: env::var("MEMO_DEFAULT_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TTL_SECS),
            key_prefix: env::var("MEMO_KEY_PREFIX")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_KEY_PREFIX.to_string()),
            cleanup_interval: env::var("CLEANUP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: None,
            default_ttl: DEFAULT_TTL_SECS,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            cleanup_interval: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.redis_url.is_none());
        assert_eq!(config.default_ttl, 120);
        assert_eq!(config.key_prefix, "memos");
        assert_eq!(config.cleanup_interval, 1);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("REDIS_URL");
        env::remove_var("MEMO_DEFAULT_TTL");
        env::remove_var("MEMO_KEY_PREFIX");
        env::remove_var("CLEANUP_INTERVAL");

        let config = Config::from_env();
        assert!(config.redis_url.is_none());
        assert_eq!(config.default_ttl, 120);
        assert_eq!(config.key_prefix, "memos");
        assert_eq!(config.cleanup_interval, 1);
    }
}
