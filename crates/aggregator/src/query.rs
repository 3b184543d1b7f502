//! Sorting and cursor pagination over a token snapshot

use std::cmp::Ordering;

use token_core::{PaginatedResponse, Token, TokenFilter};

/// Sort a copy of `tokens` by the filter's sort key. The sort is stable, so
/// equal keys keep their input order. Without a sort key the input order is
/// returned unchanged. `time_period` is accepted but does not filter.
pub fn filter_and_sort(tokens: &[Token], filter: &TokenFilter) -> Vec<Token> {
    let mut sorted = tokens.to_vec();

    if let Some(sort_by) = filter.sort_by {
        let ascending = filter.is_ascending();
        sorted.sort_by(|a, b| {
            let ord = sort_by
                .key(a)
                .partial_cmp(&sort_by.key(b))
                .unwrap_or(Ordering::Equal);
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        });
    }

    sorted
}

/// Slice one page out of `items`. The cursor is the decimal offset of the
/// first item; an offset past the end yields an empty page.
pub fn paginate<T: Clone>(items: &[T], filter: &TokenFilter) -> PaginatedResponse<T> {
    let total = items.len();
    let offset = filter.offset();
    let end = offset.saturating_add(filter.page_limit());

    let data = items[offset.min(total)..end.min(total)].to_vec();
    let has_more = end < total;

    PaginatedResponse {
        data,
        next_cursor: has_more.then(|| end.to_string()),
        has_more,
        total,
    }
}
