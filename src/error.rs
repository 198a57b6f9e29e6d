//! Error types for catalog lookups and image loading

use thiserror::Error;

/// Unified error type for catalog and asset operations
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Failed to parse JSON response
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// HTTP error status code
    #[error("HTTP error: {0}")]
    HttpStatus(reqwest::StatusCode),
    /// The catalog reported that no entry exists for the name
    #[error("Pokemon not found: {0}")]
    NotFound(String),
    /// Image locator is not a fetchable URL
    #[error("Invalid image locator: {0}")]
    InvalidLocator(String),
    /// Image bytes could not be decoded
    #[error("Image error: {0}")]
    Image(String),
    /// Background fetch task panicked or was aborted
    #[error("Fetch task failed: {0}")]
    TaskFailed(String),
    /// Resolver was created outside of a Tokio runtime
    #[error("No async runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

/// Coarse classification of a failure for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The catalog affirmatively reported that the key does not exist
    NotFound,
    /// Anything else: network, decode, asset or task failure
    Transient,
}

impl ApiError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ApiError::NotFound(_) => FailureKind::NotFound,
            _ => FailureKind::Transient,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == FailureKind::NotFound
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;
