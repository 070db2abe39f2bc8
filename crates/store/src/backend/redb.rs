//! Redb (Rust embedded database) backend for document storage.
//!
//! Each collection maps to its own redb table keyed by record id. Every
//! backend call runs in a single redb transaction.
//!
//! # Configuration Example
//! ```toml
//! database_path = "/data/people.redb"
//! ```

use crate::{DocumentBackend, StoreError};
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition, TableError,
};
use std::path::Path;
use std::sync::Arc;

fn table_def(collection: &str) -> TableDefinition<'_, &'static str, &'static [u8]> {
    TableDefinition::new(collection)
}

fn backend_err<E: std::fmt::Display>(err: E) -> StoreError {
    StoreError::backend(err.to_string())
}

/// Redb backend implementation for persistent document storage.
///
/// The `Arc<Database>` wrapper allows sharing across threads; redb handles
/// its own locking and MVCC.
pub struct RedbBackend {
    db: Arc<Database>,
}

impl RedbBackend {
    /// Open or create a redb database at the given path.
    ///
    /// # Example
    /// ```no_run
    /// use store::RedbBackend;
    ///
    /// let backend = RedbBackend::open("/tmp/people.redb").unwrap();
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = Database::create(path).map_err(backend_err)?;
        Ok(Self { db: Arc::new(db) })
    }
}

impl DocumentBackend for RedbBackend {
    fn insert(&self, collection: &str, id: &str, document: &[u8]) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write().map_err(backend_err)?;
        {
            let mut table = write_txn
                .open_table(table_def(collection))
                .map_err(backend_err)?;
            if table.get(id).map_err(backend_err)?.is_some() {
                return Err(StoreError::DuplicateKey {
                    collection: collection.to_string(),
                    id: id.to_string(),
                });
            }
            table.insert(id, document).map_err(backend_err)?;
        }
        write_txn.commit().map_err(backend_err)?;
        Ok(())
    }

    fn scan(
        &self,
        collection: &str,
        visitor: &mut dyn FnMut(&[u8]) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let read_txn = self.db.begin_read().map_err(backend_err)?;
        let table = match read_txn.open_table(table_def(collection)) {
            Ok(table) => table,
            // Nothing was ever written to this collection.
            Err(TableError::TableDoesNotExist(_)) => return Ok(()),
            Err(err) => return Err(backend_err(err)),
        };

        for item in table.iter().map_err(backend_err)? {
            let (_, value) = item.map_err(backend_err)?;
            visitor(value.value())?;
        }
        Ok(())
    }

    fn clear(&self, collection: &str) -> Result<u64, StoreError> {
        let write_txn = self.db.begin_write().map_err(backend_err)?;
        let removed = {
            let table = write_txn
                .open_table(table_def(collection))
                .map_err(backend_err)?;
            table.len().map_err(backend_err)?
        };
        write_txn
            .delete_table(table_def(collection))
            .map_err(backend_err)?;
        write_txn.commit().map_err(backend_err)?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, RedbBackend) {
        let dir = tempfile::tempdir().unwrap();
        let backend = RedbBackend::open(dir.path().join("people.redb")).unwrap();
        (dir, backend)
    }

    fn count(backend: &RedbBackend, collection: &str) -> usize {
        let mut n = 0;
        backend
            .scan(collection, &mut |_| {
                n += 1;
                Ok(())
            })
            .unwrap();
        n
    }

    #[test]
    fn test_redb_insert_and_scan() {
        let (_dir, backend) = open_temp();
        backend.insert("people", "id1", b"doc1").unwrap();
        backend.insert("people", "id2", b"doc2").unwrap();

        let mut collected = Vec::new();
        backend
            .scan("people", &mut |value| {
                collected.push(value.to_vec());
                Ok(())
            })
            .unwrap();

        assert_eq!(collected.len(), 2);
        assert!(collected.contains(&b"doc1".to_vec()));
        assert!(collected.contains(&b"doc2".to_vec()));
    }

    #[test]
    fn test_redb_scan_of_unknown_collection_is_empty() {
        let (_dir, backend) = open_temp();
        assert_eq!(count(&backend, "nobody"), 0);
    }

    #[test]
    fn test_redb_duplicate_key() {
        let (_dir, backend) = open_temp();
        backend.insert("people", "id1", b"doc1").unwrap();
        let err = backend.insert("people", "id1", b"again").unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { .. }));
        assert_eq!(count(&backend, "people"), 1);
    }

    #[test]
    fn test_redb_clear() {
        let (_dir, backend) = open_temp();
        backend.insert("people", "id1", b"doc1").unwrap();
        backend.insert("people", "id2", b"doc2").unwrap();

        assert_eq!(backend.clear("people").unwrap(), 2);
        assert_eq!(count(&backend, "people"), 0);

        // the collection is usable again after a clear
        backend.insert("people", "id3", b"doc3").unwrap();
        assert_eq!(count(&backend, "people"), 1);
    }
}
