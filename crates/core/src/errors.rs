//! Error types

use thiserror::Error;

/// Upstream fetch errors
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid response body: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Client errors other than 429 will fail the same way again
    pub fn is_retryable(&self) -> bool {
        match self.status() {
            Some(status) => !((400..500).contains(&status) && status != 429),
            None => true,
        }
    }
}

/// Cache store errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache unavailable")]
    Unavailable,

    #[error("Cache connection failed: {0}")]
    Connection(String),

    #[error("Cache command failed: {0}")]
    Command(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to load configuration: {0}")]
    Load(String),
}

/// Result type alias
pub type FetchResult<T> = Result<T, FetchError>;
pub type CacheResult<T> = Result<T, CacheError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
