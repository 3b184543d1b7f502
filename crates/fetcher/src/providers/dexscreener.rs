//! DexScreener adapter, the primary market data source
//!
//! Endpoints:
//! - `/latest/dex/search?q={query}` - pair search
//! - `/latest/dex/tokens/{address}` - pairs for one token

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error, info};

use token_core::{now_ms, FetchConfig, FetchResult, Token, TokenSource};

use crate::client::RateLimitedClient;
use crate::providers::{is_plausible_address, TokenProvider};

/// Only pairs on this chain are kept
pub const TARGET_CHAIN: &str = "solana";

/// Market cap estimate multiplier when a pair reports none
const ESTIMATED_SUPPLY: f64 = 1_000_000.0;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DexScreenerResponse {
    #[serde(default)]
    pub schema_version: Option<String>,
    #[serde(default)]
    pub pairs: Option<Vec<DexPair>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DexPair {
    #[serde(default)]
    pub chain_id: String,
    #[serde(default)]
    pub dex_id: String,
    #[serde(default)]
    pub pair_address: Option<String>,
    #[serde(default)]
    pub base_token: PairToken,
    #[serde(default)]
    pub quote_token: Option<PairToken>,
    #[serde(default)]
    pub price_native: Option<String>,
    #[serde(default)]
    pub price_usd: Option<String>,
    #[serde(default)]
    pub liquidity: Option<PairLiquidity>,
    #[serde(default)]
    pub volume: Option<PairVolume>,
    #[serde(default)]
    pub price_change: Option<PairPriceChange>,
    #[serde(default)]
    pub txns: Option<PairTxns>,
    #[serde(default)]
    pub market_cap: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PairToken {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PairLiquidity {
    #[serde(default)]
    pub usd: Option<f64>,
    #[serde(default)]
    pub base: Option<f64>,
    #[serde(default)]
    pub quote: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PairVolume {
    #[serde(default)]
    pub h24: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PairPriceChange {
    #[serde(default)]
    pub h1: Option<f64>,
    #[serde(default)]
    pub h24: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PairTxns {
    #[serde(default)]
    pub h24: Option<TxnCounts>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct TxnCounts {
    #[serde(default)]
    pub buys: u64,
    #[serde(default)]
    pub sells: u64,
}

/// Convert DexScreener pairs on the target chain into token records.
/// Pairs without a base token address are skipped.
pub fn transform_pairs(pairs: Vec<DexPair>, now_ms: u64) -> Vec<Token> {
    pairs
        .into_iter()
        .filter(|pair| pair.chain_id == TARGET_CHAIN && !pair.base_token.address.is_empty())
        .map(|pair| transform_pair(pair, now_ms))
        .collect()
}

fn transform_pair(pair: DexPair, now_ms: u64) -> Token {
    let price_sol = parse_amount(pair.price_native.as_deref()).unwrap_or(0.0);

    // USD figures are converted through the USD price; without one divide by 1
    let usd_divisor = parse_amount(pair.price_usd.as_deref())
        .filter(|p| *p > 0.0)
        .unwrap_or(1.0);

    let volume_sol = pair
        .volume
        .and_then(|v| v.h24)
        .map(|usd| usd / usd_divisor)
        .unwrap_or(0.0);

    let liquidity_sol = pair.liquidity.and_then(|l| l.quote).unwrap_or(0.0);

    let market_cap_sol = match pair.market_cap {
        Some(mc) if mc > 0.0 => mc / usd_divisor,
        _ => price_sol * ESTIMATED_SUPPLY,
    };

    let transaction_count = pair
        .txns
        .and_then(|t| t.h24)
        .map(|c| c.buys.saturating_add(c.sells))
        .unwrap_or(0);

    let price_1hr_change = pair.price_change.and_then(|c| c.h1).unwrap_or(0.0);

    let protocol = if pair.dex_id.is_empty() {
        TokenSource::DexScreener.name().to_string()
    } else {
        pair.dex_id
    };

    Token {
        token_address: pair.base_token.address,
        token_name: pair.base_token.name,
        token_ticker: pair.base_token.symbol,
        price_sol,
        market_cap_sol,
        volume_sol,
        liquidity_sol,
        transaction_count,
        price_1hr_change,
        protocol,
        source: Some(TokenSource::DexScreener),
        updated_at: Some(now_ms),
    }
    .normalized()
}

fn parse_amount(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Primary provider adapter
pub struct DexScreenerProvider {
    client: RateLimitedClient,
}

impl DexScreenerProvider {
    pub fn new(config: &FetchConfig) -> FetchResult<Self> {
        Ok(Self {
            client: RateLimitedClient::new(TokenSource::DexScreener.name(), config)?,
        })
    }
}

#[async_trait]
impl TokenProvider for DexScreenerProvider {
    fn source(&self) -> TokenSource {
        TokenSource::DexScreener
    }

    async fn search_tokens(&self, query: &str) -> Vec<Token> {
        let response: DexScreenerResponse = match self
            .client
            .get_json("/latest/dex/search", &[("q", query)])
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("DexScreener API error: {}", e);
                return vec![];
            }
        };

        let tokens = transform_pairs(response.pairs.unwrap_or_default(), now_ms());
        info!("DexScreener returned {} tokens for '{}'", tokens.len(), query);
        tokens
    }

    async fn get_token_by_address(&self, address: &str) -> Option<Token> {
        if !is_plausible_address(address) {
            debug!("Skipping DexScreener lookup for malformed address {:?}", address);
            return None;
        }

        let path = format!("/latest/dex/tokens/{}", address);
        let response: DexScreenerResponse = match self.client.get_json(&path, &[]).await {
            Ok(response) => response,
            Err(e) => {
                error!("DexScreener token fetch error for {}: {}", address, e);
                return None;
            }
        };

        transform_pairs(response.pairs.unwrap_or_default(), now_ms())
            .into_iter()
            .next()
    }
}
