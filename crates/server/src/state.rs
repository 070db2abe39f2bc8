use crate::config::ServerConfig;
use crate::error::{NormalizedError, RawError};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use store::{CreatedRecord, FieldMap, RecordStore, StoreError};

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Record store (shared across requests)
    pub store: RecordStore,
}

impl ServerState {
    /// Create state with the backend selected by `config`.
    pub fn new(config: ServerConfig) -> Result<Self, StoreError> {
        let store = RecordStore::from_config(&config.backend())?;
        Ok(Self::with_store(config, store))
    }

    /// Create state around an existing store.
    pub fn with_store(config: ServerConfig, store: RecordStore) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }

    /// Save a person under the configured store deadline.
    ///
    /// Writes are never abandoned mid-flight: the store refuses to start one
    /// after the deadline, and one that started is awaited. A timeout
    /// response therefore always means nothing was written.
    pub async fn create_person(&self, fields: FieldMap) -> Result<CreatedRecord, RawError> {
        let deadline = Instant::now() + self.config.store_timeout();
        let created = self.store.create_person_within(fields, deadline).await?;
        Ok(created)
    }

    /// Run a read-only store call under the configured store deadline.
    pub async fn within_deadline<T, F>(&self, call: F) -> Result<T, RawError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.config.store_timeout(), call).await {
            Ok(result) => result.map_err(RawError::from),
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.config.store_timeout_secs,
                    "record store call exceeded its deadline"
                );
                Err(RawError::Normalized(NormalizedError::store_timeout()))
            }
        }
    }
}
