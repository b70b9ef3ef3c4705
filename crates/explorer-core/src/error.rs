//! Error types for explorer-core

use std::time::Duration;

use thiserror::Error;

/// Result type alias for explorer operations
pub type Result<T> = std::result::Result<T, ExplorerError>;

/// Explorer error types
#[derive(Error, Debug)]
pub enum ExplorerError {
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Request path cannot be empty")]
    EmptyRequestPath,

    #[error("Request is already in flight - cancel it or wait for its callback")]
    AlreadyInFlight,

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}
