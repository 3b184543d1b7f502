//! Retry with exponential backoff

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use token_core::{FetchError, FetchResult, RetryConfig};

/// Retries transient failures, delaying `base_delay * 2^attempt` between attempts
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries.max(1),
            base_delay: config.base_delay(),
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay after the given zero-based attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> FetchResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = FetchResult<T>>,
    {
        let mut last_error = None;

        for attempt in 0..self.max_retries {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() => {
                    debug!("{} request failed permanently: {}", label, e);
                    return Err(e);
                }
                Err(e) => {
                    if attempt + 1 < self.max_retries {
                        let delay = self.delay_for(attempt);
                        warn!(
                            "{} retry {}/{} after {:?}: {}",
                            label,
                            attempt + 1,
                            self.max_retries,
                            delay,
                            e
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| FetchError::Transport("no attempts made".into())))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}
