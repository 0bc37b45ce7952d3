// src/collection_core/mod.rs
// Collection engine: CRUD, grouping and aggregation over one storage backend
//
// FILE STRUCTURE:
// ├── Constructor
// ├── Insert (insert_one, insert_many)
// ├── Query (find, find_one, count, distinct)
// ├── Update / Delete
// ├── Grouping & Aggregation
// └── Private helpers (index-narrowed candidate loading)
//
// Index management lives in index_operations.rs.

use ahash::AHashSet;
use serde_json::Value;
use tracing::{debug, trace};

use crate::aggregation::{group_documents, numeric_values, AggregateOp, Groups};
use crate::document::{Document, DocumentId};
use crate::error::{JsonBaseError, Result};
use crate::index::IndexManager;
use crate::query::Query;
use crate::storage::Storage;
use crate::value_utils::canonical_json_string;

mod index_operations;

/// A named collection of JSON documents
///
/// Generic over the storage backend:
/// - `CollectionCore<FileStorage>` - production, two JSON files
/// - `CollectionCore<MemoryStorage>` - tests
///
/// Every operation reloads the full document set from storage; the index
/// map is kept in memory and written back after each mutation.
pub struct CollectionCore<S: Storage> {
    name: String,
    storage: S,
    indexes: IndexManager,
}

impl<S: Storage> CollectionCore<S> {
    // ========== CONSTRUCTOR ==========

    /// Wrap `storage`, loading the persisted index map
    pub fn new(name: impl Into<String>, storage: S) -> Result<Self> {
        let name = name.into();
        let indexes = storage.load_indexes()?;
        debug!(
            collection = %name,
            indexes = indexes.list_indexes().len(),
            "collection opened"
        );

        Ok(CollectionCore {
            name,
            storage,
            indexes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// In-memory index map (mirrors the index artifact)
    pub fn indexes(&self) -> &IndexManager {
        &self.indexes
    }

    // ========== INSERT ==========

    /// Insert one document, assigning `_id` when missing
    ///
    /// # Errors
    ///
    /// `InvalidDocument` for non-objects or a bad `_id`, `DuplicateId` when the
    /// `_id` already exists. Nothing is written in either case.
    pub fn insert_one(&mut self, document: Value) -> Result<Document> {
        let mut documents = self.storage.load_documents()?;
        let doc = Document::prepare(document)?;

        if documents.iter().any(|existing| existing.id() == doc.id()) {
            return Err(JsonBaseError::DuplicateId(doc.id().to_string()));
        }

        documents.push(doc.clone());
        self.storage.save_documents(&documents)?;

        self.indexes.index_document(&doc);
        self.storage.save_indexes(&self.indexes)?;

        debug!(collection = %self.name, id = %doc.id(), "inserted document");
        Ok(doc)
    }

    /// Insert a batch with one load and one save of each artifact
    ///
    /// The whole batch is validated first (including duplicate ids inside
    /// the batch); on error nothing is written.
    pub fn insert_many(&mut self, documents: Vec<Value>) -> Result<Vec<Document>> {
        let mut stored = self.storage.load_documents()?;
        let mut seen: AHashSet<DocumentId> = stored.iter().map(|d| d.id().clone()).collect();

        let mut inserted = Vec::with_capacity(documents.len());
        for value in documents {
            let doc = Document::prepare(value)?;
            if !seen.insert(doc.id().clone()) {
                return Err(JsonBaseError::DuplicateId(doc.id().to_string()));
            }
            inserted.push(doc);
        }

        stored.extend(inserted.iter().cloned());
        self.storage.save_documents(&stored)?;

        for doc in &inserted {
            self.indexes.index_document(doc);
        }
        self.storage.save_indexes(&self.indexes)?;

        debug!(collection = %self.name, count = inserted.len(), "inserted documents");
        Ok(inserted)
    }

    // ========== QUERY ==========

    /// All matching documents in insertion order
    ///
    /// # Errors
    ///
    /// `InvalidQuery` for malformed queries, `TypeMismatch` when an ordered
    /// operator meets an incomparable value.
    pub fn find(&self, query_json: &Value) -> Result<Vec<Document>> {
        debug!(collection = %self.name, query = %query_json, "find");
        let query = Query::from_json(query_json)?;
        let documents = self.candidate_documents(&query)?;

        let mut results = Vec::new();
        for doc in documents {
            if query.matches(&doc)? {
                results.push(doc);
            }
        }
        Ok(results)
    }

    /// First matching document in insertion order
    pub fn find_one(&self, query_json: &Value) -> Result<Option<Document>> {
        debug!(collection = %self.name, query = %query_json, "find_one");
        let query = Query::from_json(query_json)?;

        for doc in self.candidate_documents(&query)? {
            if query.matches(&doc)? {
                return Ok(Some(doc));
            }
        }
        Ok(None)
    }

    pub fn count(&self, query_json: &Value) -> Result<usize> {
        Ok(self.find(query_json)?.len())
    }

    /// Distinct values at `field` in first-seen order (absent values skipped)
    pub fn distinct(&self, field: &str) -> Result<Vec<Value>> {
        let documents = self.storage.load_documents()?;
        let mut seen = AHashSet::new();
        let mut values = Vec::new();

        for doc in &documents {
            if let Some(value) = doc.get(field) {
                if seen.insert(canonical_json_string(value)) {
                    values.push(value.clone());
                }
            }
        }
        Ok(values)
    }

    // ========== UPDATE / DELETE ==========

    /// Shallow-merge `patch` into every matching document
    ///
    /// Returns the number of modified documents. Both artifacts are written
    /// once, even when nothing matched.
    ///
    /// # Errors
    ///
    /// `InvalidDocument` when `patch` is not an object or tries to change
    /// `_id`; query errors as in [`find`](Self::find). Nothing is written on
    /// error.
    pub fn update(&mut self, query_json: &Value, patch: &Value) -> Result<usize> {
        debug!(collection = %self.name, query = %query_json, "update");
        let query = Query::from_json(query_json)?;
        let patch = patch.as_object().ok_or_else(|| {
            JsonBaseError::InvalidDocument("update patch must be a JSON object".to_string())
        })?;

        let mut documents = self.storage.load_documents()?;

        // Evaluate and validate everything before touching storage
        let mut matched = Vec::new();
        for (position, doc) in documents.iter().enumerate() {
            if query.matches(doc)? {
                Document::check_patch(doc.id(), patch)?;
                matched.push(position);
            }
        }

        for &position in &matched {
            let doc = &mut documents[position];
            doc.merge(patch)?;
            trace!(id = %doc.id(), "patched document");
        }

        self.storage.save_documents(&documents)?;
        // Indexes follow only what actually reached storage
        for &position in &matched {
            self.indexes.refresh_document(&documents[position]);
        }
        self.storage.save_indexes(&self.indexes)?;

        debug!(collection = %self.name, modified = matched.len(), "update complete");
        Ok(matched.len())
    }

    /// Remove every matching document and rebuild all indexes
    ///
    /// Returns the number of deleted documents.
    pub fn delete(&mut self, query_json: &Value) -> Result<usize> {
        debug!(collection = %self.name, query = %query_json, "delete");
        let query = Query::from_json(query_json)?;
        let documents = self.storage.load_documents()?;
        let before = documents.len();

        let mut kept = Vec::with_capacity(before);
        for doc in documents {
            if !query.matches(&doc)? {
                kept.push(doc);
            }
        }
        let deleted = before - kept.len();

        self.storage.save_documents(&kept)?;
        self.indexes.rebuild(&kept);
        self.storage.save_indexes(&self.indexes)?;

        debug!(collection = %self.name, deleted, "delete complete");
        Ok(deleted)
    }

    // ========== GROUPING & AGGREGATION ==========

    /// Partition the whole collection by the value at `field`
    pub fn group_by(&self, field: &str) -> Result<Groups> {
        let documents = self.storage.load_documents()?;
        Ok(group_documents(documents, field))
    }

    /// Aggregate by operation name; unknown names yield `null`
    pub fn aggregate(&self, field: &str, operation: &str) -> Result<Value> {
        match operation.parse::<AggregateOp>() {
            Ok(op) => self.aggregate_with(field, op),
            Err(_) => {
                debug!(collection = %self.name, operation, "unknown aggregate operation");
                Ok(Value::Null)
            }
        }
    }

    pub fn aggregate_with(&self, field: &str, op: AggregateOp) -> Result<Value> {
        let documents = self.storage.load_documents()?;
        let values = numeric_values(&documents, field);
        trace!(field, %op, values = values.len(), "aggregate");
        Ok(op.apply(&values))
    }

    // ========== PRIVATE HELPERS ==========

    /// Load documents, narrowed by indexes when the query allows it
    ///
    /// Insertion order is preserved either way.
    fn candidate_documents(&self, query: &Query) -> Result<Vec<Document>> {
        let documents = self.storage.load_documents()?;

        match self.indexes.candidates(query) {
            Some(ids) => {
                trace!(candidates = ids.len(), "using indexes");
                Ok(documents
                    .into_iter()
                    .filter(|doc| ids.contains(doc.id()))
                    .collect())
            }
            None => Ok(documents),
        }
    }
}
