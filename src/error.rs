//! Error types for the key/value store
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Storage Error Enum ==
/// Failures raised by a storage backend. Opaque to callers and never retried.
#[derive(Error, Debug)]
pub enum StorageError {
    /// SQLite engine failure
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Value payload could not be encoded or decoded
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A thread panicked while holding the backend lock
    #[error("storage lock poisoned")]
    Poisoned,
}

// == Store Error Enum ==
/// Unified error type for the store, the memoizer and the server.
#[derive(Error, Debug)]
pub enum Error {
    /// No live entry for the key/tag pair and no default supplied
    #[error("key not found: key: {key}, tag: {tag}")]
    KeyNotFound { key: String, tag: String },

    /// Expiration could not be resolved to "never" or an absolute timestamp
    #[error("invalid expiration: {0}")]
    InvalidExpirationKind(String),

    /// Failure from the underlying storage backend
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub(crate) fn not_found(key: &str, tag: &str) -> Self {
        Error::KeyNotFound {
            key: key.to_string(),
            tag: tag.to_string(),
        }
    }

    /// Returns true for the recoverable "no such live entry" case.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::KeyNotFound { .. })
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Storage(StorageError::Sqlite(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Storage(StorageError::Serialization(err))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::KeyNotFound { .. } => StatusCode::NOT_FOUND,
            Error::InvalidExpirationKind(_) | Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Error::Storage(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the store.
pub type Result<T> = std::result::Result<T, Error>;

/// Result type for backend operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
