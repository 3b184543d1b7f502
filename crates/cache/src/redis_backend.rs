//! Redis cache backend
//!
//! The connection manager reconnects on its own. After a connection-level
//! failure the backend reports itself unavailable for the retry interval, then
//! lets the next command through to find out whether Redis is back. A failed
//! attempt starts a new interval.

use async_trait::async_trait;
use parking_lot::Mutex;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, RedisError, RedisResult};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

use token_core::{CacheError, CacheResult};

use crate::store::CacheBackend;

const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// Reconnect attempts per failure; startup gives up quickly when Redis is down
const CONNECT_RETRIES: usize = 2;

/// Closed for `interval` after each connection failure
#[derive(Debug)]
struct OutageGate {
    interval: Duration,
    failed_at: Mutex<Option<Instant>>,
}

impl OutageGate {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            failed_at: Mutex::new(None),
        }
    }

    fn is_open(&self) -> bool {
        match *self.failed_at.lock() {
            Some(at) => at.elapsed() >= self.interval,
            None => true,
        }
    }

    /// Returns true when the backend was healthy before this failure
    fn record_failure(&self) -> bool {
        self.failed_at.lock().replace(Instant::now()).is_none()
    }

    /// Returns true when this success ends an outage
    fn record_success(&self) -> bool {
        self.failed_at.lock().take().is_some()
    }
}

pub struct RedisBackend {
    connection: Mutex<Option<ConnectionManager>>,
    gate: OutageGate,
}

impl RedisBackend {
    pub async fn connect(url: &str) -> CacheResult<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| CacheError::Connection(format!("invalid redis url: {}", e)))?;

        let config = ConnectionManagerConfig::new().set_number_of_retries(CONNECT_RETRIES);
        let manager = ConnectionManager::new_with_config(client, config)
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        info!("Redis connected");

        Ok(Self {
            connection: Mutex::new(Some(manager)),
            gate: OutageGate::new(DEFAULT_RETRY_INTERVAL),
        })
    }

    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.gate.interval = interval;
        self
    }

    fn connection(&self) -> CacheResult<ConnectionManager> {
        self.connection.lock().clone().ok_or(CacheError::Unavailable)
    }

    fn track<T>(&self, result: RedisResult<T>) -> CacheResult<T> {
        match result {
            Ok(value) => {
                if self.gate.record_success() {
                    info!("Redis connection restored");
                }
                Ok(value)
            }
            Err(e) if is_connection_error(&e) => {
                if self.gate.record_failure() {
                    warn!(
                        "Redis connection error, skipping cache for {:?}: {}",
                        self.gate.interval, e
                    );
                } else {
                    warn!("Redis still unreachable: {}", e);
                }
                Err(CacheError::Connection(e.to_string()))
            }
            Err(e) => Err(CacheError::Command(e.to_string())),
        }
    }
}

fn is_connection_error(e: &RedisError) -> bool {
    e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout()
}

#[async_trait]
impl CacheBackend for RedisBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    fn is_available(&self) -> bool {
        self.connection.lock().is_some() && self.gate.is_open()
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.connection()?;
        let result = conn.get::<_, Option<String>>(key).await;
        self.track(result)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.connection()?;
        // SETEX needs whole seconds > 0
        let seconds = ttl.as_secs().max(1);
        let result = conn.set_ex::<_, _, ()>(key, value, seconds).await;
        self.track(result)
    }

    async fn del(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.connection()?;
        let result = conn.del::<_, ()>(key).await;
        self.track(result)
    }

    async fn clear(&self) -> CacheResult<()> {
        let mut conn = self.connection()?;
        let result = redis::cmd("FLUSHDB").query_async::<()>(&mut conn).await;
        self.track(result)
    }

    async fn close(&self) {
        if self.connection.lock().take().is_some() {
            info!("Redis connection closed");
        }
    }
}
