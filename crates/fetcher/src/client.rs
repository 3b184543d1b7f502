//! Rate-limited HTTP client shared by all provider adapters

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use std::future::Future;
use tracing::debug;

use token_core::{FetchConfig, FetchError, FetchResult};

use crate::limiter::FixedWindowLimiter;
use crate::retry::RetryPolicy;

/// HTTP client with a per-provider request quota and retry policy
pub struct RateLimitedClient {
    name: &'static str,
    http: reqwest::Client,
    base_url: String,
    limiter: FixedWindowLimiter,
    retry: RetryPolicy,
}

impl RateLimitedClient {
    pub fn new(name: &'static str, config: &FetchConfig) -> FetchResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .user_agent(concat!("token-aggregator/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            name,
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            limiter: FixedWindowLimiter::new(name, config.rate_limit),
            retry: RetryPolicy::new(config.retry),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn limiter(&self) -> &FixedWindowLimiter {
        &self.limiter
    }

    /// Count one request against the quota, then run `op` under the retry policy.
    ///
    /// Retries of the same request do not consume additional quota.
    pub async fn request<T, F, Fut>(&self, op: F) -> FetchResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = FetchResult<T>>,
    {
        self.limiter.acquire().await;
        self.retry.run(self.name, op).await
    }

    /// GET `path` with query parameters and decode the JSON body
    pub async fn get_json<T>(&self, path: &str, query: &[(&str, &str)]) -> FetchResult<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        self.request(|| self.fetch_json(&url, query)).await
    }

    async fn fetch_json<T>(&self, url: &str, query: &[(&str, &str)]) -> FetchResult<T>
    where
        T: DeserializeOwned,
    {
        debug!("{} GET {}", self.name, url);

        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

fn map_transport_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use token_core::{RateLimitConfig, RetryConfig};

    fn unreachable_config() -> FetchConfig {
        FetchConfig {
            // nothing listens on port 1
            base_url: "http://127.0.0.1:1/".to_string(),
            timeout_ms: 500,
            rate_limit: RateLimitConfig {
                max_requests: 10,
                window_ms: 60_000,
            },
            retry: RetryConfig {
                max_retries: 2,
                base_delay_ms: 1,
            },
        }
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = RateLimitedClient::new("test", &unreachable_config()).unwrap();
        assert_eq!(client.base_url, "http://127.0.0.1:1");
        assert_eq!(client.name(), "test");
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_transport_error() {
        let client = RateLimitedClient::new("test", &unreachable_config()).unwrap();

        let result: FetchResult<serde_json::Value> = client.get_json("/ping", &[]).await;

        let err = result.unwrap_err();
        assert!(err.status().is_none());
        assert!(err.is_retryable());
        // retries share one unit of quota
        assert_eq!(client.limiter().used().await, 1);
    }
}
