//! Jupiter adapter, a token metadata source with no market data feed
//!
//! Jupiter's search endpoint returns token metadata only. Price, volume,
//! transaction count and price change are filled with placeholder values
//! drawn from a generator seeded by the token address, so the same token
//! always gets the same numbers.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::{error, info};

use token_core::{now_ms, FetchConfig, FetchResult, Token, TokenSource};

use crate::client::RateLimitedClient;
use crate::providers::TokenProvider;

/// Results kept per search, bounds merge cost
pub const MAX_RESULTS: usize = 20;

const PROTOCOL: &str = "Jupiter";

#[derive(Debug, Clone, Deserialize)]
pub struct JupiterToken {
    #[serde(alias = "id")]
    pub address: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub decimals: Option<u8>,
    #[serde(default)]
    pub daily_volume: Option<f64>,
}

/// Placeholder market figures for one token
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaceholderMarket {
    pub price_sol: f64,
    pub volume_sol: f64,
    pub transaction_count: u64,
    pub price_1hr_change: f64,
}

impl PlaceholderMarket {
    /// price in [0, 0.0001), volume in [0, 1000), txs in [0, 1000), change in [-50, 50)
    pub fn for_address(address: &str) -> Self {
        let mut rng = StdRng::seed_from_u64(address_seed(address));

        Self {
            price_sol: rng.gen_range(0.0..0.0001),
            volume_sol: rng.gen_range(0.0..1000.0),
            transaction_count: rng.gen_range(0..1000),
            price_1hr_change: rng.gen_range(-50.0..50.0),
        }
    }
}

/// FNV-1a over the address bytes
fn address_seed(address: &str) -> u64 {
    address.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(0x0100_0000_01b3)
    })
}

/// Convert Jupiter search results into token records
pub fn transform_tokens(tokens: Vec<JupiterToken>, now_ms: u64) -> Vec<Token> {
    tokens
        .into_iter()
        .take(MAX_RESULTS)
        .map(|token| transform_token(token, now_ms))
        .collect()
}

fn transform_token(token: JupiterToken, now_ms: u64) -> Token {
    let placeholder = PlaceholderMarket::for_address(&token.address);

    let volume_sol = token
        .daily_volume
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(placeholder.volume_sol);

    Token {
        price_sol: placeholder.price_sol,
        market_cap_sol: placeholder.price_sol * 1_000_000.0,
        volume_sol,
        liquidity_sol: volume_sol * 0.1,
        transaction_count: placeholder.transaction_count,
        price_1hr_change: placeholder.price_1hr_change,
        protocol: PROTOCOL.to_string(),
        source: Some(TokenSource::Jupiter),
        updated_at: Some(now_ms),
        ..Token::new(&token.address, &token.name, &token.symbol)
    }
    .normalized()
}

/// Secondary provider adapter
pub struct JupiterProvider {
    client: RateLimitedClient,
}

impl JupiterProvider {
    pub fn new(config: &FetchConfig) -> FetchResult<Self> {
        Ok(Self {
            client: RateLimitedClient::new(TokenSource::Jupiter.name(), config)?,
        })
    }
}

#[async_trait]
impl TokenProvider for JupiterProvider {
    fn source(&self) -> TokenSource {
        TokenSource::Jupiter
    }

    async fn search_tokens(&self, query: &str) -> Vec<Token> {
        let tokens: Vec<JupiterToken> = match self
            .client
            .get_json("/tokens/v2/search", &[("query", query)])
            .await
        {
            Ok(tokens) => tokens,
            Err(e) => {
                error!("Jupiter API error: {}", e);
                return vec![];
            }
        };

        let tokens = transform_tokens(tokens, now_ms());
        info!("Jupiter returned {} tokens for '{}'", tokens.len(), query);
        tokens
    }
}
