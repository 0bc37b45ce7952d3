// src/index.rs
// Equality indexes: field path -> stringified value -> document ids

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::trace;

use crate::document::{Document, DocumentId};
use crate::error::{JsonBaseError, Result};
use crate::query::Query;
use crate::value_utils::stringify_value;

/// Bucket key for a resolved value; `None` for null (never indexed)
pub fn index_key(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        other => Some(stringify_value(other)),
    }
}

/// Single-field index
///
/// Serialized as `{ "<stringified value>": [id, ...] }`. Buckets never hold
/// the same id twice and are dropped once empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldIndex {
    buckets: BTreeMap<String, Vec<DocumentId>>,
}

impl FieldIndex {
    pub fn new() -> Self {
        FieldIndex::default()
    }

    /// Add `id` under `key` (no-op if already there)
    pub fn insert(&mut self, key: String, id: &DocumentId) {
        let bucket = self.buckets.entry(key).or_default();
        if !bucket.contains(id) {
            bucket.push(id.clone());
        }
    }

    /// Remove `id` from every bucket
    pub fn remove_id(&mut self, id: &DocumentId) {
        self.buckets.retain(|_, ids| {
            ids.retain(|existing| existing != id);
            !ids.is_empty()
        });
    }

    pub fn get(&self, key: &str) -> Option<&[DocumentId]> {
        self.buckets.get(key).map(Vec::as_slice)
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }
}

/// All registered indexes of one collection
///
/// Serialized as the collection's index file:
/// `{ "<field path>": { "<value>": [id, ...] } }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexManager {
    indexes: BTreeMap<String, FieldIndex>,
}

impl IndexManager {
    pub fn new() -> Self {
        IndexManager::default()
    }

    /// Register (or clear) the index on `field` and fill it from `documents`
    pub fn create_index(&mut self, field: &str, documents: &[Document]) {
        let mut index = FieldIndex::new();
        for doc in documents {
            if let Some(key) = doc.get(field).and_then(index_key) {
                index.insert(key, doc.id());
            }
        }
        self.indexes.insert(field.to_string(), index);
    }

    pub fn drop_index(&mut self, field: &str) -> Result<()> {
        self.indexes
            .remove(field)
            .map(|_| ())
            .ok_or_else(|| JsonBaseError::IndexNotFound(field.to_string()))
    }

    pub fn has_index(&self, field: &str) -> bool {
        self.indexes.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&FieldIndex> {
        self.indexes.get(field)
    }

    /// Indexed field paths, sorted
    pub fn list_indexes(&self) -> Vec<String> {
        self.indexes.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// Add `doc` to every index where its resolved value is non-null
    pub fn index_document(&mut self, doc: &Document) {
        for (field, index) in self.indexes.iter_mut() {
            if let Some(key) = doc.get(field).and_then(index_key) {
                trace!(field = %field, key = %key, id = %doc.id(), "index insert");
                index.insert(key, doc.id());
            }
        }
    }

    /// Drop every entry for `doc` and re-add it under its current values
    pub fn refresh_document(&mut self, doc: &Document) {
        self.remove_document(doc.id());
        self.index_document(doc);
    }

    pub fn remove_document(&mut self, id: &DocumentId) {
        for index in self.indexes.values_mut() {
            index.remove_id(id);
        }
    }

    /// Clear every index and replay the whole document set
    pub fn rebuild(&mut self, documents: &[Document]) {
        for index in self.indexes.values_mut() {
            index.clear();
        }
        for doc in documents {
            self.index_document(doc);
        }
    }

    /// Candidate ids for a query, if indexes can answer it
    ///
    /// Only pure equality queries whose every field is indexed qualify; the
    /// result is the intersection of the matching buckets and is empty as
    /// soon as one bucket is missing. `None` means "scan everything". The
    /// caller must still run the predicate over the candidates.
    pub fn candidates(&self, query: &Query) -> Option<AHashSet<DocumentId>> {
        if query.is_empty() || self.indexes.is_empty() {
            return None;
        }

        let terms = query.equality_terms()?;
        let mut matched: Option<AHashSet<DocumentId>> = None;

        for (field, value) in terms {
            let index = self.indexes.get(field)?;
            // Null literals match explicit nulls, which are never indexed
            let key = index_key(value)?;

            let ids: AHashSet<DocumentId> = match index.get(&key) {
                Some(ids) => ids.iter().cloned().collect(),
                None => return Some(AHashSet::new()),
            };

            matched = Some(match matched {
                None => ids,
                Some(current) => current.intersection(&ids).cloned().collect(),
            });
        }

        matched
    }
}
