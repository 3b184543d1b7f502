//! Fixed-window request limiter
//!
//! The window state lock is held while waiting out an exhausted window, so
//! every other caller of the same provider queues behind it.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use token_core::RateLimitConfig;

#[derive(Debug)]
struct WindowState {
    count: u32,
    window_start: Instant,
}

/// Blocking fixed-window limiter
#[derive(Debug)]
pub struct FixedWindowLimiter {
    name: &'static str,
    max_requests: u32,
    window: Duration,
    state: Mutex<WindowState>,
}

impl FixedWindowLimiter {
    pub fn new(name: &'static str, config: RateLimitConfig) -> Self {
        Self {
            name,
            max_requests: config.max_requests.max(1),
            window: config.window(),
            state: Mutex::new(WindowState {
                count: 0,
                window_start: Instant::now(),
            }),
        }
    }

    /// Wait until the current window has room, then count one request
    pub async fn acquire(&self) {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        if now.duration_since(state.window_start) >= self.window {
            state.count = 0;
            state.window_start = now;
        }

        if state.count >= self.max_requests {
            let wait = self
                .window
                .saturating_sub(now.duration_since(state.window_start));
            warn!("{} rate limit hit, waiting {:?}", self.name, wait);

            tokio::time::sleep(wait).await;

            state.count = 0;
            state.window_start = Instant::now();
        }

        state.count += 1;
        debug!(
            "{} request {}/{} in current window",
            self.name, state.count, self.max_requests
        );
    }

    /// Requests counted in the current window
    pub async fn used(&self) -> u32 {
        self.state.lock().await.count
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_pending, assert_ready, task};

    fn limiter(max_requests: u32, window_ms: u64) -> FixedWindowLimiter {
        FixedWindowLimiter::new("test", RateLimitConfig { max_requests, window_ms })
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_within_quota_do_not_wait() {
        let limiter = limiter(3, 1_000);
        let start = Instant::now();

        for _ in 0..3 {
            limiter.acquire().await;
        }

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(limiter.used().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_window_blocks_until_reset() {
        let limiter = limiter(2, 1_000);
        limiter.acquire().await;
        limiter.acquire().await;

        let mut third = task::spawn(limiter.acquire());
        assert_pending!(third.poll());

        tokio::time::advance(Duration::from_millis(1_000)).await;
        assert_ready!(third.poll());
        drop(third);

        assert_eq!(limiter.used().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiters_are_serialized() {
        let limiter = limiter(1, 1_000);
        limiter.acquire().await;

        let mut first = task::spawn(limiter.acquire());
        let mut second = task::spawn(limiter.acquire());
        assert_pending!(first.poll());
        assert_pending!(second.poll());

        // first waiter gets the fresh window, second queues behind it
        tokio::time::advance(Duration::from_millis(1_000)).await;
        assert_ready!(first.poll());
        assert_pending!(second.poll());

        tokio::time::advance(Duration::from_millis(500)).await;
        assert_pending!(second.poll());

        tokio::time::advance(Duration::from_millis(500)).await;
        assert_ready!(second.poll());
        drop(first);
        drop(second);

        assert_eq!(limiter.used().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_is_remaining_window_time() {
        let limiter = limiter(1, 1_000);
        limiter.acquire().await;

        tokio::time::advance(Duration::from_millis(400)).await;
        let start = Instant::now();
        limiter.acquire().await;

        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(600));
        assert!(waited < Duration::from_millis(700));
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_window_resets_count() {
        let limiter = limiter(2, 1_000);
        limiter.acquire().await;
        limiter.acquire().await;

        tokio::time::advance(Duration::from_millis(1_500)).await;
        let start = Instant::now();
        limiter.acquire().await;

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(limiter.used().await, 1);
    }

    #[test]
    fn test_zero_quota_treated_as_one() {
        let limiter = limiter(0, 1_000);
        assert_eq!(limiter.max_requests(), 1);
        assert_eq!(limiter.window(), Duration::from_secs(1));
    }
}
