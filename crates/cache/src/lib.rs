//! Best-effort cache store
//!
//! Every operation degrades to a no-op (or a miss) when the backend is
//! unavailable. Callers never see cache errors; they are logged here.

pub mod store;
pub mod memory;
pub mod redis_backend;

pub use store::{Cache, CacheBackend};
pub use memory::MemoryBackend;
pub use redis_backend::RedisBackend;
