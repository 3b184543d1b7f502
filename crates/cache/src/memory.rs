//! Process-local cache backend
//!
//! Uses DashMap for concurrent reads/writes; expired entries are evicted
//! lazily on read and in bulk by `purge_expired`.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;

use token_core::{CacheError, CacheResult};

use crate::store::CacheBackend;

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: String,
    expires_at: Instant,
}

impl MemoryEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: DashMap<String, MemoryEntry>,
    closed: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry
    pub fn purge_expired(&self) {
        self.entries.retain(|_, entry| !entry.is_expired());
    }

    /// Entries currently held, including expired ones not yet purged
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn ensure_open(&self) -> CacheResult<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(CacheError::Unavailable)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn is_available(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.ensure_open()?;

        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove_if(key, |_, entry| entry.is_expired());
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
        self.ensure_open()?;

        self.entries.insert(
            key.to_string(),
            MemoryEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> CacheResult<()> {
        self.ensure_open()?;
        self.entries.remove(key);
        Ok(())
    }

    async fn clear(&self) -> CacheResult<()> {
        self.ensure_open()?;
        self.entries.clear();
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let backend = MemoryBackend::new();
        backend
            .set("test-ttl", "\"value\"".into(), Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(backend.get("test-ttl").await.unwrap().as_deref(), Some("\"value\""));

        tokio::time::advance(Duration::from_millis(1_500)).await;

        assert!(backend.get("test-ttl").await.unwrap().is_none());
        assert!(backend.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_resets_ttl() {
        let backend = MemoryBackend::new();
        backend.set("key", "1".into(), Duration::from_secs(2)).await.unwrap();

        tokio::time::advance(Duration::from_secs(1)).await;
        backend.set("key", "2".into(), Duration::from_secs(2)).await.unwrap();

        tokio::time::advance(Duration::from_millis(1_500)).await;
        assert_eq!(backend.get("key").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let backend = MemoryBackend::new();
        backend.set("short", "1".into(), Duration::from_secs(1)).await.unwrap();
        backend.set("long", "2".into(), Duration::from_secs(60)).await.unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;
        backend.purge_expired();

        assert_eq!(backend.len(), 1);
        assert!(backend.get("long").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_closed_backend_rejects_commands() {
        let backend = MemoryBackend::new();
        backend.close().await;

        assert!(!backend.is_available());
        assert!(matches!(backend.get("key").await, Err(CacheError::Unavailable)));
        assert!(backend.set("key", "v".into(), Duration::from_secs(1)).await.is_err());
    }
}
