//! Error types for the Traceline transport layer

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authorization token rejected")]
    Unauthorized,

    #[error("API error ({status_code}): {message}")]
    Api { status_code: u16, message: String },

    #[error("Rate limit exceeded{}", retry_after_secs.map(|s| format!(": retry after {}s", s)).unwrap_or_default())]
    RateLimitExceeded { retry_after_secs: Option<u64> },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Request timeout after {0}s")]
    Timeout(u64),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl TransportError {
    /// Whether a retry could plausibly succeed
    ///
    /// Authorization failures are excluded: they are handled by JWT
    /// reauthorization one layer up, not by replaying the same request.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            Self::Api { status_code, .. } => matches!(status_code, 500 | 502 | 503 | 504),
            Self::RateLimitExceeded { .. } => true,
            Self::Timeout(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
