// src/storage/traits.rs
//! Storage abstraction
//!
//! A collection persists exactly two artifacts: its document set and its
//! index map. Backends only move those two values in and out; all query and
//! index logic lives above this seam.
//!
//! ```text
//! Storage trait
//!   ├── FileStorage   (name.json + name.index.json)
//!   └── MemoryStorage (tests)
//! ```

use crate::document::Document;
use crate::error::Result;
use crate::index::IndexManager;

/// Persistence backend for a single collection
///
/// Every save replaces the whole artifact. Implementations must never let a
/// reader observe a half-written artifact unless configured otherwise.
pub trait Storage: Send {
    /// Full document set in insertion order
    ///
    /// # Errors
    ///
    /// `Storage` when the artifact is missing or is not an array of objects.
    fn load_documents(&self) -> Result<Vec<Document>>;

    /// Replace the document set
    fn save_documents(&mut self, documents: &[Document]) -> Result<()>;

    /// Persisted index map; an absent artifact means "no indexes"
    fn load_indexes(&self) -> Result<IndexManager>;

    /// Replace the index map
    fn save_indexes(&mut self, indexes: &IndexManager) -> Result<()>;
}
