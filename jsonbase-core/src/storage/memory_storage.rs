// src/storage/memory_storage.rs
//! In-memory backend for tests
//!
//! Clones share the same state, so a test can hand one handle to a
//! collection and keep another to inspect what was persisted.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::document::Document;
use crate::error::Result;
use crate::index::IndexManager;
use crate::storage::Storage;

#[derive(Debug, Default)]
struct MemoryState {
    documents: Vec<Document>,
    indexes: Option<IndexManager>,
    document_saves: usize,
    index_saves: usize,
}

/// Ephemeral storage (data lost when the last handle is dropped)
///
/// # Examples
///
/// ```
/// use jsonbase_core::{CollectionCore, MemoryStorage};
/// use serde_json::json;
///
/// let storage = MemoryStorage::new();
/// let mut users = CollectionCore::new("users", storage.clone())?;
/// users.insert_one(json!({"name": "Alice"}))?;
/// assert_eq!(storage.documents().len(), 1);
/// # Ok::<(), jsonbase_core::JsonBaseError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }

    /// Pre-populated storage, as if the document artifact already existed
    pub fn with_documents(documents: Vec<Document>) -> Self {
        let storage = MemoryStorage::new();
        storage.state.lock().documents = documents;
        storage
    }

    /// Snapshot of the persisted document set
    pub fn documents(&self) -> Vec<Document> {
        self.state.lock().documents.clone()
    }

    /// Snapshot of the persisted index map (`None` if never saved)
    pub fn indexes(&self) -> Option<IndexManager> {
        self.state.lock().indexes.clone()
    }

    /// Number of `save_documents` calls so far
    pub fn document_saves(&self) -> usize {
        self.state.lock().document_saves
    }

    /// Number of `save_indexes` calls so far
    pub fn index_saves(&self) -> usize {
        self.state.lock().index_saves
    }
}

impl Storage for MemoryStorage {
    fn load_documents(&self) -> Result<Vec<Document>> {
        Ok(self.state.lock().documents.clone())
    }

    fn save_documents(&mut self, documents: &[Document]) -> Result<()> {
        let mut state = self.state.lock();
        state.documents = documents.to_vec();
        state.document_saves += 1;
        Ok(())
    }

    fn load_indexes(&self) -> Result<IndexManager> {
        Ok(self.state.lock().indexes.clone().unwrap_or_default())
    }

    fn save_indexes(&mut self, indexes: &IndexManager) -> Result<()> {
        let mut state = self.state.lock();
        state.indexes = Some(indexes.clone());
        state.index_saves += 1;
        Ok(())
    }
}
