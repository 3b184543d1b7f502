//! Token aggregation engine
//!
//! Features:
//! - Concurrent fan-out to every provider
//! - Address-keyed merge with primary-provider precedence
//! - Cache-aside snapshot with bounded staleness
//! - Stable sorting and cursor pagination
//! - Background refresh and update fan-out

pub mod merge;
pub mod query;
pub mod engine;
pub mod refresher;

#[cfg(test)]
pub(crate) mod testing;

pub use merge::merge_tokens;
pub use query::{filter_and_sort, paginate};
pub use engine::{AggregationEngine, CacheStatus, HealthReport, SNAPSHOT_KEY};
pub use refresher::{TokenPage, TokenRefresher};
