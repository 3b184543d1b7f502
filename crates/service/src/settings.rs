//! Environment-driven settings
//!
//! Variable names are the upper-case form of the field names
//! (`CACHE_TTL`, `RATE_LIMIT_MAX_REQUESTS`, ...). Unset variables keep
//! their defaults.

use config::{Config, Environment};
use serde::Deserialize;

use token_core::{
    AggregatorConfig, CacheBackendKind, CacheConfig, ConfigError, ConfigResult, FetchConfig,
    RateLimitConfig, RetryConfig, ServiceConfig,
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub redis_url: String,
    pub cache_backend: CacheBackendKind,
    /// Seconds
    pub cache_ttl: u64,

    /// Upstream quota for the primary provider
    pub rate_limit_max_requests: u32,
    pub rate_limit_window_ms: u64,
    pub request_timeout_ms: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub dexscreener_url: String,
    pub jupiter_url: String,

    pub token_query: String,

    /// Milliseconds between published updates
    pub ws_update_interval: u64,
    /// Seconds between snapshot refreshes
    pub cache_refresh_interval: u64,
    pub update_page_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        let cache = CacheConfig::default();
        let service = ServiceConfig::default();
        let fetch = FetchConfig::dexscreener();

        Self {
            redis_url: cache.redis_url,
            cache_backend: cache.backend,
            cache_ttl: cache.default_ttl_secs,
            rate_limit_max_requests: fetch.rate_limit.max_requests,
            rate_limit_window_ms: fetch.rate_limit.window_ms,
            request_timeout_ms: fetch.timeout_ms,
            max_retries: fetch.retry.max_retries,
            retry_base_delay_ms: fetch.retry.base_delay_ms,
            dexscreener_url: FetchConfig::DEXSCREENER_URL.to_string(),
            jupiter_url: FetchConfig::JUPITER_URL.to_string(),
            token_query: AggregatorConfig::default().default_query,
            ws_update_interval: service.update_interval_ms,
            cache_refresh_interval: service.refresh_interval_secs,
            update_page_size: service.update_page_size,
        }
    }
}

impl Settings {
    /// Load from the process environment
    pub fn load() -> ConfigResult<Self> {
        Self::from_environment(Environment::default())
    }

    pub fn from_environment(env: Environment) -> ConfigResult<Self> {
        let settings: Settings = Config::builder()
            .add_source(env.try_parsing(true))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| ConfigError::Load(e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.token_query.trim().is_empty() {
            return Err(ConfigError::Invalid("token query must not be empty".into()));
        }

        self.cache_config().validate()?;
        self.dexscreener_config().validate()?;
        self.jupiter_config().validate()?;
        self.service_config().validate()
    }

    fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            base_delay_ms: self.retry_base_delay_ms,
        }
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            backend: self.cache_backend,
            redis_url: self.redis_url.clone(),
            default_ttl_secs: self.cache_ttl,
        }
    }

    pub fn dexscreener_config(&self) -> FetchConfig {
        FetchConfig {
            base_url: self.dexscreener_url.clone(),
            timeout_ms: self.request_timeout_ms,
            rate_limit: RateLimitConfig {
                max_requests: self.rate_limit_max_requests,
                window_ms: self.rate_limit_window_ms,
            },
            retry: self.retry(),
        }
    }

    /// Shares timeout and retry settings; keeps its own default quota
    pub fn jupiter_config(&self) -> FetchConfig {
        FetchConfig {
            base_url: self.jupiter_url.clone(),
            timeout_ms: self.request_timeout_ms,
            retry: self.retry(),
            ..FetchConfig::jupiter()
        }
    }

    pub fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            default_query: self.token_query.clone(),
        }
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            refresh_interval_secs: self.cache_refresh_interval,
            update_interval_ms: self.ws_update_interval,
            update_page_size: self.update_page_size,
            ..ServiceConfig::default()
        }
    }
}
