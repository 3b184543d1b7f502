//! Token record definitions
//!
//! Field names are serialized exactly as downstream consumers expect them
//! (`token_address`, `price_sol`, ...). Amounts are denominated in SOL,
//! the network's base asset.

use serde::{Deserialize, Serialize};

use crate::TokenSource;

/// Merged token market record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub token_address: String,
    pub token_name: String,
    pub token_ticker: String,
    pub price_sol: f64,
    pub market_cap_sol: f64,
    pub volume_sol: f64,
    pub liquidity_sol: f64,
    pub transaction_count: u64,
    pub price_1hr_change: f64,
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<TokenSource>,
    /// Epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<u64>,
}

impl Token {
    pub fn new(address: &str, name: &str, ticker: &str) -> Self {
        Self {
            token_address: address.to_string(),
            token_name: name.to_string(),
            token_ticker: ticker.to_string(),
            price_sol: 0.0,
            market_cap_sol: 0.0,
            volume_sol: 0.0,
            liquidity_sol: 0.0,
            transaction_count: 0,
            price_1hr_change: 0.0,
            protocol: String::new(),
            source: None,
            updated_at: None,
        }
    }

    /// Replace negative or non-finite amounts with zero.
    ///
    /// Every adapter runs its output through this so no record can carry a
    /// negative volume, liquidity, price or market cap into the merge.
    pub fn normalized(mut self) -> Self {
        self.price_sol = non_negative(self.price_sol);
        self.market_cap_sol = non_negative(self.market_cap_sol);
        self.volume_sol = non_negative(self.volume_sol);
        self.liquidity_sol = non_negative(self.liquidity_sol);
        if !self.price_1hr_change.is_finite() {
            self.price_1hr_change = 0.0;
        }
        self
    }

    pub fn is_from(&self, source: TokenSource) -> bool {
        self.source == Some(source)
    }

    pub fn is_from_primary(&self) -> bool {
        self.source.map(|s| s.is_primary()).unwrap_or(false)
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
