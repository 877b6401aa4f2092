//! Error types for marque.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using marque's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the page fetcher.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request did not complete within the configured timeout.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// The server responded with a non-2xx status.
    #[error("HTTP {0}")]
    HttpStatus(u16),

    /// Missing or non-HTML content type.
    #[error("Invalid content type: {}", .0.as_deref().unwrap_or("(none)"))]
    InvalidContentType(Option<String>),

    /// Declared body size exceeds the configured limit.
    #[error("Content too large: {declared} bytes (limit {limit})")]
    TooLarge { declared: u64, limit: u64 },

    /// Connection-level failure (DNS, TLS, reset).
    #[error("Network failure: {0}")]
    Network(String),
}

/// Core error type for marque operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Bookmark not found
    #[error("Bookmark not found: {0}")]
    BookmarkNotFound(Uuid),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Page fetch failed
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// HTML content extraction failed
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Enricher call failed (transport or backend)
    #[error("Enrichment error: {0}")]
    Enrichment(String),

    /// Enricher output failed shape validation
    #[error("Enrichment validation error: {0}")]
    EnrichmentValidation(String),

    /// Caller does not own the record
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Concurrent processing run detected for the same bookmark
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Fetch(FetchError::Network(format!("timeout: {}", e)))
        } else {
            Error::Fetch(FetchError::Network(e.to_string()))
        }
    }
}
