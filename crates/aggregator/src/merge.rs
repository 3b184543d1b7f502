//! Address-keyed merge of records from several providers
//!
//! For a duplicate address: volume and transaction count are summed,
//! liquidity takes the max, `updated_at` takes the max (missing counts as 0).
//! Every other field is taken from the incoming record only when it comes
//! from the primary provider, so precedence depends on the source and never
//! on arrival order.

use std::collections::HashMap;

use token_core::Token;

/// Merge duplicates, keeping first-seen order of addresses
pub fn merge_tokens<I>(tokens: I) -> Vec<Token>
where
    I: IntoIterator<Item = Token>,
{
    let mut merged: Vec<Token> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for token in tokens {
        match index.get(&token.token_address) {
            Some(&i) => merge_into(&mut merged[i], token),
            None => {
                index.insert(token.token_address.clone(), merged.len());
                merged.push(token);
            }
        }
    }

    merged
}

fn merge_into(existing: &mut Token, incoming: Token) {
    let volume_sol = existing.volume_sol + incoming.volume_sol;
    let liquidity_sol = existing.liquidity_sol.max(incoming.liquidity_sol);
    let transaction_count = existing
        .transaction_count
        .saturating_add(incoming.transaction_count);
    let updated_at = existing
        .updated_at
        .unwrap_or(0)
        .max(incoming.updated_at.unwrap_or(0));

    if incoming.is_from_primary() {
        *existing = incoming;
    }

    existing.volume_sol = volume_sol;
    existing.liquidity_sol = liquidity_sol;
    existing.transaction_count = transaction_count;
    existing.updated_at = Some(updated_at);
}
