//! # People Store
//!
//! Persistence façade for the people service. It is the only layer that
//! touches stored records.
//!
//! ## Core Features
//!
//! - **Pluggable Backends**: storage goes through the [`DocumentBackend`]
//!   trait. An in-memory backend ships for tests and ephemeral runs, and a
//!   redb backend (feature `backend-redb`, on by default) persists to disk.
//! - **Generic Entities**: [`RecordStore::create_model`] persists any
//!   [`Entity`] described by a [`Model`] (label, collection, [`Schema`] and
//!   constructor). [`Person`] is the one entity the service ships.
//! - **Raw Errors**: every failure is returned as a [`StoreError`] exactly as
//!   the store saw it. Mapping errors onto a transport is the caller's job.
//!
//! ## Example Usage
//!
//! ```
//! use serde_json::json;
//! use store::RecordStore;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), store::StoreError> {
//! let store = RecordStore::in_memory();
//! let fields = json!({"firstName": "jimmy", "age": 34});
//! let created = store
//!     .create_person(fields.as_object().cloned().unwrap_or_default())
//!     .await?;
//! assert!(created.message.ends_with(created.id.as_str()));
//!
//! let people = store.get_all_people().await?;
//! assert_eq!(people.len(), 1);
//! # Ok(())
//! # }
//! ```

mod backend;
mod error;
mod model;
mod schema;

pub use backend::{BackendConfig, DocumentBackend, InMemoryBackend};
#[cfg(feature = "backend-redb")]
pub use backend::RedbBackend;
pub use error::{FieldFailure, StoreError};
pub use model::{Constructor, CreatedRecord, Entity, Model, Person, RecordId};
pub use schema::{FieldKind, FieldMap, FieldSpec, Schema};

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Shared handle to the record store.
///
/// Cloning is cheap; all clones talk to the same backend. Backend calls are
/// synchronous, so they run on tokio's blocking pool.
#[derive(Clone)]
pub struct RecordStore {
    backend: Arc<dyn DocumentBackend>,
}

impl RecordStore {
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryBackend::new()))
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, StoreError> {
        Ok(Self::new(Arc::from(config.build()?)))
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn DocumentBackend) -> Result<T, StoreError> + Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        tokio::task::spawn_blocking(move || op(backend.as_ref())).await?
    }

    /// Persist a new entity of the kind described by `model`.
    ///
    /// The store assigns the identifier; any `_id` in `data` is ignored.
    /// Errors are returned unmodified.
    pub async fn create_model<E: Entity>(
        &self,
        model: &Model<E>,
        data: FieldMap,
    ) -> Result<CreatedRecord, StoreError> {
        self.create(model, data, None).await
    }

    /// Like [`create_model`](Self::create_model), but refuses to start the
    /// write once `deadline` has passed.
    ///
    /// The check runs on the blocking pool right before the backend call, so
    /// [`StoreError::DeadlineExceeded`] guarantees nothing was stored. A write
    /// that started in time is always awaited to completion.
    pub async fn create_model_within<E: Entity>(
        &self,
        model: &Model<E>,
        data: FieldMap,
        deadline: Instant,
    ) -> Result<CreatedRecord, StoreError> {
        self.create(model, data, Some(deadline)).await
    }

    async fn create<E: Entity>(
        &self,
        model: &Model<E>,
        data: FieldMap,
        deadline: Option<Instant>,
    ) -> Result<CreatedRecord, StoreError> {
        debug!(model = model.name(), "creating new model");
        let result = self.insert_new(model, &data, deadline).await;
        match &result {
            Ok(created) => info!(
                model = model.name(),
                id = %created.id,
                "new model created"
            ),
            Err(err) => error!(model = model.name(), error = %err, "error adding new model"),
        }
        result
    }

    async fn insert_new<E: Entity>(
        &self,
        model: &Model<E>,
        data: &FieldMap,
        deadline: Option<Instant>,
    ) -> Result<CreatedRecord, StoreError> {
        let id = RecordId::generate();
        let entity = model.construct(id.clone(), data)?;
        let document = serde_json::to_vec(&entity)?;

        debug!(model = model.name(), "saving model");
        let collection = model.collection();
        let key = id.clone();
        self.blocking(move |backend| {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(StoreError::DeadlineExceeded);
            }
            backend.insert(collection, key.as_str(), &document)
        })
        .await?;

        Ok(CreatedRecord {
            message: format!("New {} created! with _id : {}", model.name(), id),
            id,
        })
    }

    /// Remove every entity of the kind described by `model`.
    pub async fn delete_all<E: Entity>(&self, model: &Model<E>) -> Result<u64, StoreError> {
        let collection = model.collection();
        let removed = self
            .blocking(move |backend| backend.clear(collection))
            .await?;
        debug!(model = model.name(), removed, "all records deleted");
        Ok(removed)
    }

    /// Every stored entity of the kind described by `model`, in backend order.
    pub async fn find_all<E: Entity>(&self, model: &Model<E>) -> Result<Vec<E>, StoreError> {
        let collection = model.collection();
        let records = self
            .blocking(move |backend| {
                let mut out = Vec::new();
                backend.scan(collection, &mut |bytes| {
                    out.push(serde_json::from_slice::<E>(bytes)?);
                    Ok(())
                })?;
                Ok(out)
            })
            .await?;
        debug!(model = model.name(), count = records.len(), "records retrieved");
        Ok(records)
    }

    pub async fn create_person(&self, data: FieldMap) -> Result<CreatedRecord, StoreError> {
        self.create_model(&Person::model(), data).await
    }

    pub async fn create_person_within(
        &self,
        data: FieldMap,
        deadline: Instant,
    ) -> Result<CreatedRecord, StoreError> {
        self.create_model_within(&Person::model(), data, deadline).await
    }

    pub async fn delete_all_people(&self) -> Result<u64, StoreError> {
        self.delete_all(&Person::model()).await
    }

    pub async fn get_all_people(&self) -> Result<Vec<Person>, StoreError> {
        self.find_all(&Person::model()).await
    }
}
