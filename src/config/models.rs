//! Configuration model structs
//!
//! Every struct deserializes with sensible field defaults so a partial
//! config (or an empty environment) still yields a working setup.

use crate::utils::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Shared counter store connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store URL (`scheme://host:port`)
    #[serde(default = "default_store_url")]
    pub url: String,
    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl StoreConfig {
    /// Validate store settings.
    pub fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(Error::Config("store url must not be empty".to_string()));
        }
        if self.connect_timeout_secs == 0 {
            return Err(Error::Config(
                "store connect timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Connection timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Fixed-window rate limiter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests allowed per identity per window
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    /// Window length in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
        }
    }
}

impl RateLimitConfig {
    /// Validate limiter settings.
    pub fn validate(&self) -> Result<()> {
        if self.max_requests == 0 {
            return Err(Error::Config(
                "rate limit must allow at least one request per window".to_string(),
            ));
        }
        if self.window_secs == 0 {
            return Err(Error::Config(
                "rate limit window must be at least one second".to_string(),
            ));
        }
        Ok(())
    }

    /// Window length as a [`Duration`].
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Backend availability monitor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Health endpoint of the dependent backend service
    #[serde(default = "default_health_url")]
    pub health_url: String,
    /// Per-probe timeout in seconds
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
    /// Poll interval while the backend is healthy, in milliseconds
    #[serde(default = "default_base_interval_ms")]
    pub base_interval_ms: u64,
    /// Poll interval ceiling while the backend stays down, in milliseconds
    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            health_url: default_health_url(),
            probe_timeout_secs: default_probe_timeout(),
            base_interval_ms: default_base_interval_ms(),
            max_interval_ms: default_max_interval_ms(),
        }
    }
}

impl MonitorConfig {
    /// Validate monitor settings.
    pub fn validate(&self) -> Result<()> {
        if self.health_url.is_empty() {
            return Err(Error::Config("health url must not be empty".to_string()));
        }
        if self.probe_timeout_secs == 0 {
            return Err(Error::Config("probe timeout must be positive".to_string()));
        }
        if self.base_interval_ms == 0 {
            return Err(Error::Config("poll interval must be positive".to_string()));
        }
        if self.max_interval_ms < self.base_interval_ms {
            return Err(Error::Config(
                "poll interval ceiling must not be below the base interval".to_string(),
            ));
        }
        Ok(())
    }

    /// Per-probe timeout as a [`Duration`].
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    /// Base poll interval as a [`Duration`].
    pub fn base_interval(&self) -> Duration {
        Duration::from_millis(self.base_interval_ms)
    }

    /// Poll interval ceiling as a [`Duration`].
    pub fn max_interval(&self) -> Duration {
        Duration::from_millis(self.max_interval_ms)
    }
}

/// Retry and backoff settings for outbound provider calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt (2 retries = 3 attempts total)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// First inter-retry delay in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Inter-retry delay ceiling in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Per-attempt request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Spread retry delays with random jitter
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            request_timeout_secs: default_request_timeout(),
            jitter: false,
        }
    }
}

impl RetryConfig {
    /// Validate retry settings.
    pub fn validate(&self) -> Result<()> {
        if self.base_delay_ms == 0 {
            return Err(Error::Config("retry base delay must be positive".to_string()));
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err(Error::Config(
                "retry delay ceiling must not be below the base delay".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config("request timeout must be positive".to_string()));
        }
        Ok(())
    }

    /// First inter-retry delay as a [`Duration`].
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Inter-retry delay ceiling as a [`Duration`].
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Per-attempt request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// LLM provider endpoint settings.
///
/// The provider is an opaque HTTP collaborator; only the values needed to
/// address it live here, not its wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the provider API
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,
    /// Bearer token for the provider, if required
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model identifier sent with completion calls
    #[serde(default = "default_model")]
    pub model: String,
    /// Completion token budget
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_provider_base_url(),
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl ProviderConfig {
    /// Validate provider settings.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(Error::Config("provider base url must not be empty".to_string()));
        }
        if self.max_tokens == 0 {
            return Err(Error::Config("max_tokens must be positive".to_string()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(Error::Config(
                "temperature must be between 0.0 and 2.0".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_store_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_max_requests() -> u32 {
    10
}

fn default_window_secs() -> u64 {
    60
}

fn default_health_url() -> String {
    "http://127.0.0.1:3001/api/health".to_string()
}

fn default_probe_timeout() -> u64 {
    3
}

fn default_base_interval_ms() -> u64 {
    30_000
}

fn default_max_interval_ms() -> u64 {
    300_000
}

fn default_max_retries() -> u32 {
    2
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    8_000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_provider_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    1_024
}

fn default_temperature() -> f32 {
    0.7
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== StoreConfig Tests ====================

    #[test]
    fn test_store_config_default() {
        let config = StoreConfig::default();
        assert_eq!(config.url, "redis://127.0.0.1:6379");
        assert_eq!(config.connect_timeout_secs, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_store_config_rejects_empty_url() {
        let config = StoreConfig {
            url: String::new(),
            connect_timeout_secs: 5,
        };
        assert!(config.validate().is_err());
    }

    // ==================== RateLimitConfig Tests ====================

    #[test]
    fn test_rate_limit_config_default() {
        let config = RateLimitConfig::default();
        assert_eq!(config.max_requests, 10);
        assert_eq!(config.window_secs, 60);
        assert_eq!(config.window(), Duration::from_secs(60));
    }

    #[test]
    fn test_rate_limit_config_rejects_zero_limit() {
        let config = RateLimitConfig {
            max_requests: 0,
            window_secs: 60,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rate_limit_config_rejects_zero_window() {
        let config = RateLimitConfig {
            max_requests: 10,
            window_secs: 0,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rate_limit_config_deserialization() {
        let json = r#"{"max_requests": 100, "window_secs": 300}"#;
        let config: RateLimitConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.max_requests, 100);
        assert_eq!(config.window_secs, 300);
    }

    // ==================== MonitorConfig Tests ====================

    #[test]
    fn test_monitor_config_default() {
        let config = MonitorConfig::default();
        assert_eq!(config.probe_timeout(), Duration::from_secs(3));
        assert_eq!(config.base_interval(), Duration::from_secs(30));
        assert_eq!(config.max_interval(), Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_monitor_config_rejects_inverted_intervals() {
        let config = MonitorConfig {
            base_interval_ms: 60_000,
            max_interval_ms: 1_000,
            ..MonitorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    // ==================== RetryConfig Tests ====================

    #[test]
    fn test_retry_config_default() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.base_delay(), Duration::from_millis(500));
        assert_eq!(config.max_delay(), Duration::from_secs(8));
        assert!(!config.jitter);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_retry_config_rejects_inverted_delays() {
        let config = RetryConfig {
            base_delay_ms: 10_000,
            max_delay_ms: 100,
            ..RetryConfig::default()
        };
        assert!(config.validate().is_err());
    }

    // ==================== ProviderConfig Tests ====================

    #[test]
    fn test_provider_config_default() {
        let config = ProviderConfig::default();
        assert!(config.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_provider_config_rejects_wild_temperature() {
        let config = ProviderConfig {
            temperature: 3.5,
            ..ProviderConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
