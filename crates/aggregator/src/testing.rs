//! In-memory provider for engine and refresher tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use token_core::{Token, TokenSource};
use token_fetcher::TokenProvider;

pub struct StaticProvider {
    source: TokenSource,
    tokens: Vec<Token>,
    pub search_calls: AtomicUsize,
    pub lookup_calls: AtomicUsize,
}

impl StaticProvider {
    pub fn new(source: TokenSource, tokens: Vec<Token>) -> Self {
        Self {
            source,
            tokens,
            search_calls: AtomicUsize::new(0),
            lookup_calls: AtomicUsize::new(0),
        }
    }

    pub fn searches(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn lookups(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenProvider for StaticProvider {
    fn source(&self) -> TokenSource {
        self.source
    }

    async fn search_tokens(&self, _query: &str) -> Vec<Token> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.tokens.clone()
    }

    async fn get_token_by_address(&self, address: &str) -> Option<Token> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        self.tokens.iter().find(|t| t.token_address == address).cloned()
    }
}

pub fn token(address: &str, source: TokenSource, volume: f64) -> Token {
    Token {
        price_sol: 0.5,
        volume_sol: volume,
        liquidity_sol: volume / 10.0,
        transaction_count: 1,
        protocol: source.name().to_string(),
        source: Some(source),
        updated_at: Some(1),
        ..Token::new(address, &format!("{} ({})", address, source), "TKN")
    }
}
