//! Cache facade over a pluggable backend

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use token_core::{CacheBackendKind, CacheConfig, CacheError, CacheResult};

use crate::memory::MemoryBackend;
use crate::redis_backend::RedisBackend;

/// Raw string key-value store with per-key expiry
#[async_trait]
pub trait CacheBackend: Send + Sync {
    fn name(&self) -> &'static str;
    fn is_available(&self) -> bool;
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;
    /// Replaces any existing value and resets its expiry
    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()>;
    async fn del(&self, key: &str) -> CacheResult<()>;
    async fn clear(&self) -> CacheResult<()>;
    async fn close(&self);
}

/// JSON cache with a default TTL. Cheap to clone.
#[derive(Clone)]
pub struct Cache {
    backend: Option<Arc<dyn CacheBackend>>,
    default_ttl: Duration,
}

impl Cache {
    pub fn new(backend: Arc<dyn CacheBackend>, default_ttl: Duration) -> Self {
        Self {
            backend: Some(backend),
            default_ttl,
        }
    }

    /// A cache that is never available
    pub fn disabled() -> Self {
        Self {
            backend: None,
            default_ttl: CacheConfig::default().default_ttl(),
        }
    }

    pub fn memory(default_ttl: Duration) -> Self {
        Self::new(Arc::new(MemoryBackend::new()), default_ttl)
    }

    /// Build the configured backend. A Redis connection failure yields a
    /// disabled cache rather than an error.
    pub async fn from_config(config: &CacheConfig) -> Self {
        let ttl = config.default_ttl();

        match config.backend {
            CacheBackendKind::Redis => match RedisBackend::connect(&config.redis_url).await {
                Ok(backend) => Self::new(Arc::new(backend), ttl),
                Err(e) => {
                    error!("Redis unavailable, running without cache: {}", e);
                    Self {
                        backend: None,
                        default_ttl: ttl,
                    }
                }
            },
            CacheBackendKind::Memory => {
                info!("Using in-process memory cache");
                Self::memory(ttl)
            }
            CacheBackendKind::None => {
                info!("Cache disabled by configuration");
                Self {
                    backend: None,
                    default_ttl: ttl,
                }
            }
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn is_available(&self) -> bool {
        self.backend.as_ref().map(|b| b.is_available()).unwrap_or(false)
    }

    fn live_backend(&self) -> Option<&Arc<dyn CacheBackend>> {
        self.backend.as_ref().filter(|b| b.is_available())
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let Some(backend) = self.live_backend() else {
            debug!("Cache unavailable, skipping get {}", key);
            return None;
        };

        let raw = match backend.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                error!("Cache get error for {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                error!("Cache get error for {}: {}", key, CacheError::from(e));
                None
            }
        }
    }

    /// Store `value`; a missing or zero `ttl` uses the default
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Option<Duration>) {
        let Some(backend) = self.live_backend() else {
            debug!("Cache unavailable, skipping set {}", key);
            return;
        };

        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                error!("Cache set error for {}: {}", key, CacheError::from(e));
                return;
            }
        };

        let ttl = ttl.filter(|t| !t.is_zero()).unwrap_or(self.default_ttl);
        if let Err(e) = backend.set(key, raw, ttl).await {
            error!("Cache set error for {}: {}", key, e);
        }
    }

    pub async fn del(&self, key: &str) {
        let Some(backend) = self.live_backend() else {
            return;
        };

        if let Err(e) = backend.del(key).await {
            error!("Cache delete error for {}: {}", key, e);
        }
    }

    pub async fn clear(&self) {
        let Some(backend) = self.live_backend() else {
            return;
        };

        if let Err(e) = backend.clear().await {
            error!("Cache clear error: {}", e);
        }
    }

    /// Release the backend connection
    pub async fn close(&self) {
        if let Some(backend) = &self.backend {
            info!("Closing {} cache", backend.name());
            backend.close().await;
        } else {
            warn!("Close called on a cache without backend");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Snapshot {
        data: String,
    }

    /// Backend that fails every command
    struct BrokenBackend {
        calls: AtomicU32,
    }

    #[async_trait]
    impl CacheBackend for BrokenBackend {
        fn name(&self) -> &'static str {
            "broken"
        }
        fn is_available(&self) -> bool {
            true
        }
        async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(CacheError::Command("boom".into()))
        }
        async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> CacheResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(CacheError::Command("boom".into()))
        }
        async fn del(&self, _key: &str) -> CacheResult<()> {
            Err(CacheError::Command("boom".into()))
        }
        async fn clear(&self) -> CacheResult<()> {
            Err(CacheError::Command("boom".into()))
        }
        async fn close(&self) {}
    }

    /// Backend that reports itself down and counts calls that reach it
    struct DownBackend {
        touched: AtomicBool,
    }

    #[async_trait]
    impl CacheBackend for DownBackend {
        fn name(&self) -> &'static str {
            "down"
        }
        fn is_available(&self) -> bool {
            false
        }
        async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
            self.touched.store(true, Ordering::SeqCst);
            Ok(None)
        }
        async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> CacheResult<()> {
            self.touched.store(true, Ordering::SeqCst);
            Ok(())
        }
        async fn del(&self, _key: &str) -> CacheResult<()> {
            self.touched.store(true, Ordering::SeqCst);
            Ok(())
        }
        async fn clear(&self) -> CacheResult<()> {
            self.touched.store(true, Ordering::SeqCst);
            Ok(())
        }
        async fn close(&self) {}
    }

    #[tokio::test]
    async fn test_set_and_get_roundtrip() {
        let cache = Cache::memory(Duration::from_secs(30));
        let value = Snapshot { data: "test-value".into() };

        cache.set("test-key", &value, None).await;
        let result: Option<Snapshot> = cache.get("test-key").await;

        assert_eq!(result, Some(value));
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let cache = Cache::memory(Duration::from_secs(30));
        assert!(cache.get::<Snapshot>("non-existent").await.is_none());
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let cache = Cache::memory(Duration::from_secs(30));
        cache.set("a", "value", None).await;
        cache.set("b", "value", None).await;

        cache.del("a").await;
        assert!(cache.get::<String>("a").await.is_none());
        assert_eq!(cache.get::<String>("b").await.as_deref(), Some("value"));

        cache.clear().await;
        assert!(cache.get::<String>("b").await.is_none());
    }

    #[tokio::test]
    async fn test_type_mismatch_is_a_miss() {
        let cache = Cache::memory(Duration::from_secs(30));
        cache.set("key", "plain string", None).await;

        assert!(cache.get::<Snapshot>("key").await.is_none());
    }

    #[tokio::test]
    async fn test_backend_errors_are_swallowed() {
        let backend = Arc::new(BrokenBackend { calls: AtomicU32::new(0) });
        let cache = Cache::new(backend.clone(), Duration::from_secs(30));

        cache.set("key", &1u32, None).await;
        assert!(cache.get::<u32>("key").await.is_none());
        cache.del("key").await;
        cache.clear().await;

        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unavailable_backend_is_not_called() {
        let backend = Arc::new(DownBackend { touched: AtomicBool::new(false) });
        let cache = Cache::new(backend.clone(), Duration::from_secs(30));

        cache.set("key", &1u32, None).await;
        assert!(cache.get::<u32>("key").await.is_none());
        cache.del("key").await;
        cache.clear().await;

        assert!(!cache.is_available());
        assert!(!backend.touched.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_disabled_cache() {
        let cache = Cache::disabled();
        cache.set("key", &1u32, None).await;

        assert!(!cache.is_available());
        assert!(cache.get::<u32>("key").await.is_none());
        cache.close().await;
    }

    #[tokio::test]
    async fn test_config_none_backend() {
        let config = CacheConfig {
            backend: CacheBackendKind::None,
            ..CacheConfig::default()
        };
        let cache = Cache::from_config(&config).await;
        assert!(!cache.is_available());
    }

    #[tokio::test]
    async fn test_config_memory_backend() {
        let config = CacheConfig {
            backend: CacheBackendKind::Memory,
            default_ttl_secs: 5,
            ..CacheConfig::default()
        };
        let cache = Cache::from_config(&config).await;

        assert!(cache.is_available());
        assert_eq!(cache.default_ttl(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_close_makes_cache_unavailable() {
        let cache = Cache::memory(Duration::from_secs(30));
        cache.set("key", &1u32, None).await;
        cache.close().await;

        assert!(!cache.is_available());
        assert!(cache.get::<u32>("key").await.is_none());
    }
}
