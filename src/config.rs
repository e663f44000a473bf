//! Configuration Module
//!
//! Handles loading and managing cache and server configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Collection key used when a call site does not choose its own partition.
pub const DEFAULT_COLLECTION: &str = "default cache";

/// Default time-to-live of a cached query result, in seconds.
pub const DEFAULT_TTL_SECS: u64 = 300;

/// Cache and server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Collection key query results are stored under
    pub collection_key: String,
    /// TTL in seconds applied to freshly fetched results
    pub default_ttl: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Directory for the persistent store; in-memory storage when unset
    pub storage_dir: Option<PathBuf>,
    /// Base URL prepended to relative request URLs
    pub upstream_base_url: Option<String>,
    /// Upstream fetch timeout in seconds
    pub fetch_timeout: u64,
    /// Expired-entry sweep interval in seconds, 0 disables the sweep
    pub sweep_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `COLLECTION_KEY` - Collection key (default: "default cache")
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `STORAGE_DIR` - Persistent store directory (default: in-memory)
    /// - `UPSTREAM_BASE_URL` - Base URL for relative request URLs (default: none)
    /// - `FETCH_TIMEOUT` - Upstream timeout in seconds (default: 30)
    /// - `SWEEP_INTERVAL` - Sweep frequency in seconds (default: 0, disabled)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            collection_key: non_empty_var("COLLECTION_KEY").unwrap_or(defaults.collection_key),
            default_ttl: parsed_var("DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            server_port: parsed_var("SERVER_PORT").unwrap_or(defaults.server_port),
            storage_dir: non_empty_var("STORAGE_DIR").map(PathBuf::from),
            upstream_base_url: non_empty_var("UPSTREAM_BASE_URL"),
            fetch_timeout: parsed_var("FETCH_TIMEOUT").unwrap_or(defaults.fetch_timeout),
            sweep_interval: parsed_var("SWEEP_INTERVAL").unwrap_or(defaults.sweep_interval),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            collection_key: DEFAULT_COLLECTION.to_string(),
            default_ttl: DEFAULT_TTL_SECS,
            server_port: 3000,
            storage_dir: None,
            upstream_base_url: None,
            fetch_timeout: 30,
            sweep_interval: 0,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
