//! Configuration for the gateway core
//!
//! All values are constants supplied at process start; there is no runtime
//! reconfiguration surface.

pub mod models;

pub use models::{MonitorConfig, ProviderConfig, RateLimitConfig, RetryConfig, StoreConfig};

use crate::utils::error::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Root configuration for the gateway core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Shared counter store settings
    #[serde(default)]
    pub store: StoreConfig,
    /// Fixed-window rate limiter settings
    #[serde(default)]
    pub limiter: RateLimitConfig,
    /// Backend availability monitor settings
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// Outbound retry/backoff settings
    #[serde(default)]
    pub retry: RetryConfig,
    /// LLM provider endpoint settings
    #[serde(default)]
    pub provider: ProviderConfig,
}

impl Config {
    /// Load configuration from environment variables (reads `.env` first
    /// when present).
    ///
    /// A missing store URL falls back to the local default address rather
    /// than failing; settings that are present but nonsensical are fatal
    /// here, before anything is wired.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        info!("Loading configuration from environment");

        let mut config = Self::default();

        if let Ok(url) = std::env::var("REDIS_URL") {
            config.store.url = url;
        }
        if let Some(limit) = read_u32("RATE_LIMIT_MAX_REQUESTS")? {
            config.limiter.max_requests = limit;
        }
        if let Some(secs) = read_u64("RATE_LIMIT_WINDOW_SECS")? {
            config.limiter.window_secs = secs;
        }
        if let Ok(url) = std::env::var("BACKEND_HEALTH_URL") {
            config.monitor.health_url = url;
        }
        if let Some(secs) = read_u64("HEALTH_PROBE_TIMEOUT_SECS")? {
            config.monitor.probe_timeout_secs = secs;
        }
        if let Some(retries) = read_u32("PROVIDER_MAX_RETRIES")? {
            config.retry.max_retries = retries;
        }
        if let Ok(url) = std::env::var("PROVIDER_BASE_URL") {
            config.provider.base_url = url;
        }
        if let Ok(key) = std::env::var("PROVIDER_API_KEY") {
            config.provider.api_key = Some(key);
        }

        config.validate()?;
        debug!("Configuration loaded");
        Ok(config)
    }

    /// Validate invariants across every section.
    pub fn validate(&self) -> Result<()> {
        self.store.validate()?;
        self.limiter.validate()?;
        self.monitor.validate()?;
        self.retry.validate()?;
        self.provider.validate()?;
        Ok(())
    }
}

fn read_u32(name: &str) -> Result<Option<u32>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{name} must be an integer, got {raw:?}"))),
        Err(_) => Ok(None),
    }
}

fn read_u64(name: &str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{name} must be an integer, got {raw:?}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_deserialization_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.limiter.max_requests, 10);
        assert_eq!(config.limiter.window_secs, 60);
        assert_eq!(config.store.url, "redis://127.0.0.1:6379");
    }

    // One test owns all env mutation so parallel tests never observe a
    // half-written environment.
    #[test]
    fn test_from_env() {
        // SAFETY: no other test touches these variables.
        unsafe {
            std::env::set_var("RATE_LIMIT_MAX_REQUESTS", "25");
            std::env::set_var("REDIS_URL", "redis://counter-host:6379");
        }

        let config = Config::from_env().unwrap();
        assert_eq!(config.limiter.max_requests, 25);
        assert_eq!(config.store.url, "redis://counter-host:6379");

        unsafe {
            std::env::set_var("RATE_LIMIT_WINDOW_SECS", "sixty");
        }
        let result = Config::from_env();
        assert!(matches!(result, Err(Error::Config(_))));

        unsafe {
            std::env::remove_var("RATE_LIMIT_MAX_REQUESTS");
            std::env::remove_var("REDIS_URL");
            std::env::remove_var("RATE_LIMIT_WINDOW_SECS");
        }
    }
}
