//! Upstream provider adapters
//!
//! Adapters never return errors. Any upstream or transport failure is
//! logged and reduced to an empty list (or `None` for single lookups), so
//! one failing provider cannot block or corrupt the aggregate.

pub mod dexscreener;
pub mod jupiter;

use async_trait::async_trait;

use token_core::{Token, TokenSource};

pub use dexscreener::DexScreenerProvider;
pub use jupiter::JupiterProvider;

/// Source of token records
#[async_trait]
pub trait TokenProvider: Send + Sync {
    fn source(&self) -> TokenSource;

    fn name(&self) -> &'static str {
        self.source().name()
    }

    /// Search tokens matching `query`; failures yield an empty list
    async fn search_tokens(&self, query: &str) -> Vec<Token>;

    /// Look up a single token; providers without an address lookup return `None`
    async fn get_token_by_address(&self, _address: &str) -> Option<Token> {
        None
    }
}

/// Addresses are base58/hex strings; anything else never reaches a URL path
pub(crate) fn is_plausible_address(address: &str) -> bool {
    !address.is_empty() && address.len() <= 128 && address.chars().all(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plausible_addresses() {
        assert!(is_plausible_address("So11111111111111111111111111111111111111112"));
        assert!(is_plausible_address("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"));
        assert!(!is_plausible_address(""));
        assert!(!is_plausible_address("../search?q=SOL"));
        assert!(!is_plausible_address("abc def"));
    }
}
