//! Token aggregation service
//!
//! Wires the cache, provider adapters, engine and background refresher
//! together and owns their lifecycle.

pub mod settings;

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

use token_aggregator::{AggregationEngine, HealthReport, TokenPage, TokenRefresher};
use token_cache::Cache;
use token_core::{ServiceConfig, TokenFilter};
use token_fetcher::{DexScreenerProvider, JupiterProvider, TokenProvider};

pub use settings::Settings;

pub struct TokenService {
    engine: Arc<AggregationEngine>,
    refresher: TokenRefresher,
}

impl TokenService {
    /// Build every component from settings. An unreachable Redis leaves the
    /// service running without a cache.
    pub async fn build(settings: &Settings) -> anyhow::Result<Self> {
        let cache = Cache::from_config(&settings.cache_config()).await;

        let primary: Arc<dyn TokenProvider> =
            Arc::new(DexScreenerProvider::new(&settings.dexscreener_config())?);
        let secondary: Arc<dyn TokenProvider> =
            Arc::new(JupiterProvider::new(&settings.jupiter_config())?);

        let engine = AggregationEngine::new(
            primary,
            vec![secondary],
            cache,
            settings.aggregator_config(),
        );

        Ok(Self::with_engine(Arc::new(engine), settings.service_config()))
    }

    pub fn with_engine(engine: Arc<AggregationEngine>, config: ServiceConfig) -> Self {
        Self {
            engine,
            refresher: TokenRefresher::new(config),
        }
    }

    pub fn engine(&self) -> &Arc<AggregationEngine> {
        &self.engine
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TokenPage> {
        self.refresher.subscribe()
    }

    pub fn health(&self) -> HealthReport {
        self.engine.health()
    }

    /// Warm the snapshot once, then start periodic refresh and updates
    pub async fn start(&mut self) {
        let warm = self.engine.get_tokens(&TokenFilter::new()).await;
        info!("Snapshot warmed with {} tokens", warm.total);

        self.refresher.start(Arc::clone(&self.engine));
    }

    /// Stop background tasks and release the cache connection
    pub async fn shutdown(&mut self) {
        self.refresher.stop().await;
        self.engine.cache().close().await;
        info!("Token service stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use token_core::CacheBackendKind;

    fn offline_settings() -> Settings {
        Settings {
            cache_backend: CacheBackendKind::Memory,
            dexscreener_url: "http://127.0.0.1:1".to_string(),
            jupiter_url: "http://127.0.0.1:1".to_string(),
            request_timeout_ms: 500,
            max_retries: 1,
            retry_base_delay_ms: 1,
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn test_lifecycle_with_unreachable_upstreams() {
        let mut service = TokenService::build(&offline_settings()).await.unwrap();
        assert_eq!(service.health().status, "ok");

        service.start().await;

        let page = service.engine().get_tokens(&TokenFilter::new()).await;
        assert!(page.data.is_empty());
        assert!(!page.has_more);

        service.shutdown().await;
        assert!(!service.engine().cache().is_available());
    }

    #[tokio::test]
    async fn test_unreachable_redis_degrades() {
        let settings = Settings {
            cache_backend: CacheBackendKind::Redis,
            redis_url: "redis://127.0.0.1:1".to_string(),
            ..offline_settings()
        };

        let service = TokenService::build(&settings).await.unwrap();
        assert!(!service.engine().cache().is_available());
    }
}
