//! Configuration Module
//!
//! Handles loading and managing orchestrator configuration from environment variables.

use std::env;

use serde::Serialize;

/// Orchestrator configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, Serialize)]
pub struct CacheConfig {
    /// Prefix prepended to every derived key
    pub key_prefix: String,
    /// Default timeout in seconds for keys without an explicit timeout,
    /// None = entries never expire
    pub default_timeout: Option<u64>,
    /// Whether the orchestrator emits hit/miss/set/flush debug events
    pub logging: bool,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_KEY_PREFIX` - Prefix for every derived key (default: "")
    /// - `CACHE_DEFAULT_TTL` - Default timeout in seconds (default: unset, no expiry)
    /// - `CACHE_LOGGING` - Enables debug events when set to "1" or "true" (default: false)
    pub fn from_env() -> Self {
        Self {
            key_prefix: env::var("CACHE_KEY_PREFIX").unwrap_or_default(),
            default_timeout: env::var("CACHE_DEFAULT_TTL")
                .ok()
                .and_then(|v| v.parse().ok()),
            logging: env::var("CACHE_LOGGING")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key_prefix: String::new(),
            default_timeout: None,
            logging: false,
        }
    }
}
