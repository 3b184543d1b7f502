//! Core type definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Upstream providers a token record can come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenSource {
    DexScreener,
    Jupiter,
}

impl TokenSource {
    pub fn name(&self) -> &'static str {
        match self {
            TokenSource::DexScreener => "dexscreener",
            TokenSource::Jupiter => "jupiter",
        }
    }

    /// Primary provider fields win merge conflicts
    pub fn is_primary(&self) -> bool {
        matches!(self, TokenSource::DexScreener)
    }
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Current wall clock time in epoch milliseconds
pub fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}
