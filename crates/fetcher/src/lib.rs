//! Rate-limited upstream fetching
//!
//! Features:
//! - Fixed-window request quota per provider (blocking, never rejecting)
//! - Retry with exponential backoff for transient failures
//! - Provider adapters translating upstream shapes into token records

pub mod limiter;
pub mod retry;
pub mod client;
pub mod providers;

pub use limiter::FixedWindowLimiter;
pub use retry::RetryPolicy;
pub use client::RateLimitedClient;
pub use providers::{DexScreenerProvider, JupiterProvider, TokenProvider};
