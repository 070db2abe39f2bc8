use crate::StoreError;
use std::collections::HashMap;
use std::sync::RwLock;

/// Trait for a document storage backend.
///
/// Documents are opaque byte strings grouped into named collections and keyed
/// by record id. Every method is a single atomic operation against the
/// backend; nothing spans more than one call.
pub trait DocumentBackend: Send + Sync {
    /// Insert a new document. Fails with [`StoreError::DuplicateKey`] if `id`
    /// is already present in `collection`.
    fn insert(&self, collection: &str, id: &str, document: &[u8]) -> Result<(), StoreError>;
    /// Visit every document of `collection` in backend-native order.
    fn scan(
        &self,
        collection: &str,
        visitor: &mut dyn FnMut(&[u8]) -> Result<(), StoreError>,
    ) -> Result<(), StoreError>;
    /// Remove every document of `collection`, returning how many were removed.
    fn clear(&self, collection: &str) -> Result<u64, StoreError>;
}

/// Configuration for selecting and building a backend.
///
/// # Example
/// ```
/// use store::BackendConfig;
///
/// // In-memory (for testing)
/// let config = BackendConfig::in_memory();
///
/// // Redb file on disk
/// let config = BackendConfig::redb("/data/people.redb");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum BackendConfig {
    /// Use a redb database file at `path`.
    ///
    /// Requires the `backend-redb` feature (enabled by default).
    Redb { path: String },
    /// Keep everything in process memory.
    #[default]
    InMemory,
}

impl BackendConfig {
    pub fn in_memory() -> Self {
        BackendConfig::InMemory
    }

    pub fn redb<P: Into<String>>(path: P) -> Self {
        BackendConfig::Redb { path: path.into() }
    }

    /// Build the backend described by this configuration.
    pub fn build(&self) -> Result<Box<dyn DocumentBackend>, StoreError> {
        match self {
            BackendConfig::InMemory => Ok(Box::new(InMemoryBackend::new())),
            BackendConfig::Redb { path } => {
                #[cfg(feature = "backend-redb")]
                {
                    Ok(Box::new(RedbBackend::open(path)?))
                }
                #[cfg(not(feature = "backend-redb"))]
                {
                    let _ = path;
                    Err(StoreError::backend("redb backend disabled at compile time"))
                }
            }
        }
    }
}

#[derive(Default)]
struct Collection {
    order: Vec<String>,
    documents: HashMap<String, Vec<u8>>,
}

/// An in-memory backend. Scans return documents in insertion order.
pub struct InMemoryBackend {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentBackend for InMemoryBackend {
    fn insert(&self, collection: &str, id: &str, document: &[u8]) -> Result<(), StoreError> {
        let mut guard = self
            .collections
            .write()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        let entry = guard.entry(collection.to_string()).or_default();
        if entry.documents.contains_key(id) {
            return Err(StoreError::DuplicateKey {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        entry.order.push(id.to_string());
        entry.documents.insert(id.to_string(), document.to_vec());
        Ok(())
    }

    fn scan(
        &self,
        collection: &str,
        visitor: &mut dyn FnMut(&[u8]) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let guard = self
            .collections
            .read()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        let Some(entry) = guard.get(collection) else {
            return Ok(());
        };
        for id in &entry.order {
            if let Some(document) = entry.documents.get(id) {
                visitor(document)?;
            }
        }
        Ok(())
    }

    fn clear(&self, collection: &str) -> Result<u64, StoreError> {
        let mut guard = self
            .collections
            .write()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        Ok(guard
            .remove(collection)
            .map(|entry| entry.order.len() as u64)
            .unwrap_or(0))
    }
}

#[cfg(feature = "backend-redb")]
pub mod redb;

#[cfg(feature = "backend-redb")]
pub use self::redb::RedbBackend;
