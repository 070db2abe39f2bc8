use thiserror::Error;

/// A single failed field check inside a [`StoreError::Validation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFailure {
    /// Schema path of the offending field.
    pub path: String,
    /// Human readable description of the failure.
    pub message: String,
}

impl FieldFailure {
    pub fn required(path: &str) -> Self {
        Self {
            path: path.to_string(),
            message: format!("Path `{path}` is required."),
        }
    }
}

/// Errors surfaced by the record store.
///
/// The store never maps these onto transport concerns: callers receive the
/// raw variant and decide how to present it.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A caller-supplied value could not be cast to the schema type of `path`.
    #[error("Cast to {expected} failed for value \"{value}\" at path \"{path}\"")]
    Cast {
        path: String,
        expected: &'static str,
        value: String,
    },

    /// The cast document failed schema validation.
    #[error("{model} validation failed")]
    Validation {
        model: String,
        /// Failures in schema declaration order.
        failures: Vec<FieldFailure>,
    },

    /// A record with the same identifier already exists in the collection.
    #[error("E11000 duplicate key error collection: {collection} index: _id_ dup key: {id}")]
    DuplicateKey { collection: String, id: String },

    /// The storage backend reported a failure.
    #[error("{0}")]
    Backend(String),

    /// A stored document could not be encoded or decoded.
    #[error("document codec failure: {0}")]
    Codec(String),

    /// The write deadline passed before the backend was called. Nothing was
    /// written.
    #[error("deadline passed before the record was written")]
    DeadlineExceeded,

    /// The blocking task running a backend call did not complete.
    #[error("store task failed: {0}")]
    Task(String),
}

impl StoreError {
    pub fn backend<S: Into<String>>(msg: S) -> Self {
        StoreError::Backend(msg.into())
    }

    /// Path of the field that caused a cast or validation failure. For
    /// validation this is the first failure in schema declaration order.
    pub fn field_path(&self) -> Option<&str> {
        match self {
            StoreError::Cast { path, .. } => Some(path),
            StoreError::Validation { failures, .. } => failures.first().map(|f| f.path.as_str()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Codec(err.to_string())
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        StoreError::Task(err.to_string())
    }
}
