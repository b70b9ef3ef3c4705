//! Error types for discovery document handling

use thiserror::Error;

/// Result type alias for discovery operations
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Discovery error types
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to fetch discovery document: {0}")]
    FetchError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(String),
}
