//! Error normalization.
//!
//! Handlers never inspect store-specific error structures. Anything that
//! fails while serving a request is wrapped in a [`RawError`] and passed
//! through [`normalize`], which is the only place an error is classified and
//! turned into a `(status, message)` pair.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use store::StoreError;

/// Message used whenever the cause of a failure must not reach the caller.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal error processing the request";

/// Message used when a store call misses its deadline.
pub const STORE_TIMEOUT_MESSAGE: &str = "Timed out waiting for the record store";

/// A failure in its final, caller-facing shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{status}: {message}")]
pub struct NormalizedError {
    pub status: StatusCode,
    pub message: String,
}

impl NormalizedError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not found")
    }

    pub fn store_timeout() -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, STORE_TIMEOUT_MESSAGE)
    }
}

/// JSON body written for every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
}

/// Anything a request can fail with before normalization.
#[derive(Debug, thiserror::Error)]
pub enum RawError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Normalized(#[from] NormalizedError),
}

/// Classification of a [`RawError`], in normalization priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedParameter,
    ValidationFailed,
    StoreConflict,
    StoreTimeout,
    AlreadyNormalized,
    Unknown,
}

impl RawError {
    /// The only place a raw error is classified.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RawError::Store(StoreError::Cast { .. }) => ErrorKind::MalformedParameter,
            RawError::Store(StoreError::Validation { .. }) => ErrorKind::ValidationFailed,
            RawError::Store(StoreError::DuplicateKey { .. } | StoreError::Backend(_)) => {
                ErrorKind::StoreConflict
            }
            RawError::Store(StoreError::DeadlineExceeded) => ErrorKind::StoreTimeout,
            RawError::Normalized(_) => ErrorKind::AlreadyNormalized,
            RawError::Store(StoreError::Codec(_) | StoreError::Task(_)) => ErrorKind::Unknown,
        }
    }

    fn field_path(&self) -> Option<&str> {
        match self {
            RawError::Store(err) => err.field_path(),
            RawError::Normalized(_) => None,
        }
    }
}

/// Translate a raw failure into its caller-facing shape.
///
/// Returns `None` when there is no error.
pub fn normalize(err: Option<RawError>) -> Option<NormalizedError> {
    let err = err?;
    let normalized = match err.kind() {
        ErrorKind::MalformedParameter => NormalizedError::bad_request(format!(
            "Invalid parameter {}",
            err.field_path().unwrap_or_default()
        )),
        ErrorKind::ValidationFailed => {
            let mut message = err.to_string();
            if let Some(first) = err.field_path() {
                message.push_str(&format!(", Invalid {first}"));
            }
            NormalizedError::bad_request(message)
        }
        ErrorKind::StoreConflict => NormalizedError::bad_request(err.to_string()),
        ErrorKind::StoreTimeout => NormalizedError::store_timeout(),
        ErrorKind::AlreadyNormalized => match err {
            RawError::Normalized(normalized) => normalized,
            RawError::Store(_) => NormalizedError::internal(),
        },
        ErrorKind::Unknown => {
            tracing::error!(error = %err, "unclassified error while processing request");
            NormalizedError::internal()
        }
    };
    Some(normalized)
}
