//! Configuration types

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{ConfigError, ConfigResult};

/// Fixed-window request quota
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_ms: u64,
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 250,
            window_ms: 60_000,
        }
    }
}

/// Retry with exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1_000,
        }
    }
}

/// Per-provider HTTP client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub rate_limit: RateLimitConfig,
    pub retry: RetryConfig,
}

impl FetchConfig {
    pub const DEXSCREENER_URL: &'static str = "https://api.dexscreener.com";
    pub const JUPITER_URL: &'static str = "https://lite-api.jup.ag";

    /// DexScreener allows 300 requests/min, stay under it
    pub const DEXSCREENER_MAX_REQUESTS: u32 = 250;

    pub fn dexscreener() -> Self {
        Self {
            base_url: Self::DEXSCREENER_URL.to_string(),
            rate_limit: RateLimitConfig {
                max_requests: Self::DEXSCREENER_MAX_REQUESTS,
                ..RateLimitConfig::default()
            },
            ..Self::default()
        }
    }

    pub fn jupiter() -> Self {
        Self {
            base_url: Self::JUPITER_URL.to_string(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.base_url.is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".into()));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeout_ms must be > 0".into()));
        }
        if self.rate_limit.max_requests == 0 {
            return Err(ConfigError::Invalid("rate limit max_requests must be > 0".into()));
        }
        if self.rate_limit.window_ms == 0 {
            return Err(ConfigError::Invalid("rate limit window_ms must be > 0".into()));
        }
        Ok(())
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_ms: 10_000,
            rate_limit: RateLimitConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

/// Which cache backend to run against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    #[default]
    Redis,
    Memory,
    None,
}

/// Cache store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub backend: CacheBackendKind,
    pub redis_url: String,
    pub default_ttl_secs: u64,
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.default_ttl_secs == 0 {
            return Err(ConfigError::Invalid("cache ttl must be > 0".into()));
        }
        if self.backend == CacheBackendKind::Redis && self.redis_url.is_empty() {
            return Err(ConfigError::Invalid("redis url must be set for the redis backend".into()));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::Redis,
            redis_url: "redis://localhost:6379".to_string(),
            default_ttl_secs: 30,
        }
    }
}

/// Aggregation engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Search query sent to every provider on a full fetch
    pub default_query: String,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            default_query: "SOL".to_string(),
        }
    }
}

/// Background refresh and update fan-out configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub refresh_interval_secs: u64,
    pub update_interval_ms: u64,
    pub update_page_size: usize,
    pub update_channel_capacity: usize,
}

impl ServiceConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.refresh_interval_secs == 0 || self.update_interval_ms == 0 {
            return Err(ConfigError::Invalid("refresh and update intervals must be > 0".into()));
        }
        if self.update_page_size == 0 {
            return Err(ConfigError::Invalid("update page size must be > 0".into()));
        }
        if self.update_channel_capacity == 0 {
            return Err(ConfigError::Invalid("update channel capacity must be > 0".into()));
        }
        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 30,
            update_interval_ms: 5_000,
            update_page_size: 30,
            update_channel_capacity: 16,
        }
    }
}
