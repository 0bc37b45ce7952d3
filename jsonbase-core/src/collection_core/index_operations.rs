// src/collection_core/index_operations.rs
// Secondary index management for CollectionCore

use tracing::debug;

use super::CollectionCore;
use crate::error::Result;
use crate::storage::Storage;

impl<S: Storage> CollectionCore<S> {
    /// Create (or rebuild) the equality index on `field` and persist it
    ///
    /// Re-creating an existing index clears it and scans again.
    pub fn create_index(&mut self, field: &str) -> Result<()> {
        let documents = self.storage.load_documents()?;
        self.indexes.create_index(field, &documents);
        self.storage.save_indexes(&self.indexes)?;

        debug!(
            collection = %self.name,
            field,
            keys = self.indexes.get(field).map(|i| i.len()).unwrap_or(0),
            "index created"
        );
        Ok(())
    }

    /// Remove the index on `field`
    ///
    /// # Errors
    ///
    /// `IndexNotFound` when no such index exists.
    pub fn drop_index(&mut self, field: &str) -> Result<()> {
        self.indexes.drop_index(field)?;
        self.storage.save_indexes(&self.indexes)?;
        debug!(collection = %self.name, field, "index dropped");
        Ok(())
    }

    /// Indexed field paths, sorted
    pub fn list_indexes(&self) -> Vec<String> {
        self.indexes.list_indexes()
    }

    /// Rebuild every index from the stored documents and persist
    ///
    /// Repairs an index file that was edited by hand or left stale by
    /// another writer.
    pub fn reindex(&mut self) -> Result<()> {
        let documents = self.storage.load_documents()?;
        self.indexes.rebuild(&documents);
        self.storage.save_indexes(&self.indexes)?;
        debug!(collection = %self.name, documents = documents.len(), "indexes rebuilt");
        Ok(())
    }
}
