//! Configuration Module
//!
//! Cache construction parameters and sidecar settings loaded from the environment.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Construction parameters for a [`RequestCache`](crate::cache::RequestCache).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of resolved entries held at once
    pub max_entries: usize,
    /// TTL applied when a write does not override it
    pub default_ttl: Duration,
}

impl CacheConfig {
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        Self {
            max_entries,
            default_ttl,
        }
    }

    /// Rejects a zero capacity.
    ///
    /// A zero TTL is allowed: results are then never served from cache, but
    /// concurrent callers still share one in-flight request.
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(CacheError::InvalidConfig(
                "max_entries must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 100,
            default_ttl: Duration::from_secs(30),
        }
    }
}

/// Sidecar configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cache parameters
    pub cache: CacheConfig,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 100)
    /// - `DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 30000)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = CacheConfig::default();

        Self {
            cache: CacheConfig {
                max_entries: parse_var("MAX_ENTRIES").unwrap_or(defaults.max_entries),
                default_ttl: parse_var("DEFAULT_TTL_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.default_ttl),
            },
            server_port: parse_var("SERVER_PORT").unwrap_or(3000),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            server_port: 3000,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
