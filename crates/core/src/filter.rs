//! Filter, sort and pagination types

use serde::{Deserialize, Serialize};

use crate::Token;

/// Page size used when a filter does not specify one
pub const DEFAULT_PAGE_LIMIT: usize = 20;

/// Numeric field to sort tokens by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    Volume,
    PriceChange,
    MarketCap,
    Liquidity,
}

impl SortBy {
    pub fn key(&self, token: &Token) -> f64 {
        match self {
            SortBy::Volume => token.volume_sol,
            SortBy::PriceChange => token.price_1hr_change,
            SortBy::MarketCap => token.market_cap_sol,
            SortBy::Liquidity => token.liquidity_sol,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Requested time window. Accepted for compatibility, does not change results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimePeriod {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "24h")]
    OneDay,
    #[serde(rename = "7d")]
    SevenDays,
}

/// Request-scoped token query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_period: Option<TimePeriod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

impl TokenFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort(mut self, by: SortBy, order: SortOrder) -> Self {
        self.sort_by = Some(by);
        self.sort_order = Some(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    /// Page size; zero or missing falls back to the default
    pub fn page_limit(&self) -> usize {
        match self.limit {
            Some(limit) if limit > 0 => limit,
            _ => DEFAULT_PAGE_LIMIT,
        }
    }

    /// Offset encoded in the cursor; missing or unparsable cursors start at 0
    pub fn offset(&self) -> usize {
        self.cursor
            .as_deref()
            .and_then(|c| c.trim().parse::<usize>().ok())
            .unwrap_or(0)
    }

    pub fn is_ascending(&self) -> bool {
        self.sort_order == Some(SortOrder::Asc)
    }
}

/// One page of a sorted collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    pub has_more: bool,
    pub total: usize,
}

impl<T> PaginatedResponse<T> {
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            next_cursor: None,
            has_more: false,
            total: 0,
        }
    }
}
