//! Client error types

use crate::local::StorageError;
use shared::document::DocumentError;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed (connect, timeout, body)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-2xx status
    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// Document did not map onto the expected model
    #[error("Malformed document: {0}")]
    Document(#[from] DocumentError),

    /// Input rejected before any I/O
    #[error("{0}")]
    Validation(#[from] AppError),

    /// Local durable store failed
    #[error("Local storage error: {0}")]
    Storage(#[from] StorageError),

    /// Store is unreachable (injected or probed)
    #[error("Offline")]
    Offline,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Transport-level failures and server errors that the offline paths absorb
    pub fn is_network(&self) -> bool {
        match self {
            Self::Http(_) | Self::Offline => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Stable code for display
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Http(e) if e.is_timeout() => ErrorCode::TimeoutError,
            Self::Http(_) | Self::Offline | Self::Status { .. } => ErrorCode::NetworkError,
            Self::InvalidResponse(_) | Self::Document(_) | Self::Serialization(_) => {
                ErrorCode::MalformedDocument
            }
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Validation(e) => e.code,
            Self::Storage(_) => ErrorCode::StorageError,
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
