//! Aggregation engine
//!
//! Fans a search out to every provider, merges the results by address and
//! keeps the merged snapshot in the cache. Reads are cache-aside: a snapshot
//! hit short-circuits every upstream call.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::iter;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use token_cache::Cache;
use token_core::{AggregatorConfig, PaginatedResponse, Token, TokenFilter};
use token_fetcher::TokenProvider;

use crate::merge::merge_tokens;
use crate::query::{filter_and_sort, paginate};

/// Cache key of the full merged snapshot
pub const SNAPSHOT_KEY: &str = "tokens:all";

fn token_key(address: &str) -> String {
    format!("token:{}", address)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    /// RFC 3339
    pub timestamp: String,
    pub uptime_secs: f64,
    pub cache: CacheStatus,
}

pub struct AggregationEngine {
    /// Fields from this provider win merge conflicts; also serves address lookups
    primary: Arc<dyn TokenProvider>,
    secondary: Vec<Arc<dyn TokenProvider>>,
    cache: Cache,
    config: AggregatorConfig,
    started_at: Instant,
}

impl AggregationEngine {
    pub fn new(
        primary: Arc<dyn TokenProvider>,
        secondary: Vec<Arc<dyn TokenProvider>>,
        cache: Cache,
        config: AggregatorConfig,
    ) -> Self {
        Self {
            primary,
            secondary,
            cache,
            config,
            started_at: Instant::now(),
        }
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    fn providers(&self) -> impl Iterator<Item = &Arc<dyn TokenProvider>> {
        iter::once(&self.primary).chain(self.secondary.iter())
    }

    /// Return the merged snapshot for `query`.
    ///
    /// With `use_cache` a cached snapshot is returned without touching any
    /// provider. Otherwise every provider is queried concurrently, the
    /// results are merged and the snapshot is written back to the cache.
    pub async fn fetch_and_aggregate(&self, query: &str, use_cache: bool) -> Vec<Token> {
        if use_cache {
            if let Some(cached) = self.cache.get::<Vec<Token>>(SNAPSHOT_KEY).await {
                debug!("Snapshot cache hit ({} tokens)", cached.len());
                return cached;
            }
        }

        let started = Instant::now();
        let results = join_all(self.providers().map(|p| p.search_tokens(query))).await;

        let fetched: Vec<Token> = results.into_iter().flatten().collect();
        let fetched_count = fetched.len();
        let merged = merge_tokens(fetched);

        info!(
            "Aggregated {} records into {} tokens in {:?}",
            fetched_count,
            merged.len(),
            started.elapsed()
        );

        self.cache.set(SNAPSHOT_KEY, &merged, None).await;
        merged
    }

    /// One sorted page of the current snapshot
    pub async fn get_tokens(&self, filter: &TokenFilter) -> PaginatedResponse<Token> {
        let tokens = self
            .fetch_and_aggregate(&self.config.default_query, true)
            .await;
        let sorted = filter_and_sort(&tokens, filter);
        paginate(&sorted, filter)
    }

    /// Single token lookup. Only the primary provider is asked.
    pub async fn get_token_by_address(&self, address: &str) -> Option<Token> {
        let key = token_key(address);

        if let Some(cached) = self.cache.get::<Token>(&key).await {
            return Some(cached);
        }

        let token = self.primary.get_token_by_address(address).await?;
        self.cache.set(&key, &token, None).await;
        Some(token)
    }

    /// Re-fetch from every provider, skipping the cache read
    pub async fn refresh_cache(&self) {
        let tokens = self
            .fetch_and_aggregate(&self.config.default_query, false)
            .await;
        info!("Snapshot refreshed with {} tokens", tokens.len());
    }

    pub fn health(&self) -> HealthReport {
        let cache = if self.cache.is_available() {
            CacheStatus::Connected
        } else {
            CacheStatus::Disconnected
        };

        HealthReport {
            status: "ok".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_secs: self.started_at.elapsed().as_secs_f64(),
            cache,
        }
    }
}
