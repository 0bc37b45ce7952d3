// src/document.rs
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

use crate::error::{JsonBaseError, Result};
use crate::value_utils::resolve_path;

/// Reserved identity field present on every stored document
pub const ID_FIELD: &str = "_id";

/// Document identifier
///
/// Untagged so it appears as a plain value in documents and index files:
/// `{"_id": 2}` or `{"_id": "6f1c..."}`. Generated ids are UUID v4 strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(untagged)]
pub enum DocumentId {
    Int(i64),
    String(String),
}

impl DocumentId {
    /// New random id (UUID v4)
    pub fn generate() -> Self {
        DocumentId::String(Uuid::new_v4().to_string())
    }

    /// Interpret a JSON value as an id; only integers and strings qualify
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(DocumentId::String(s.clone())),
            Value::Number(n) => n.as_i64().map(DocumentId::Int).ok_or_else(|| {
                JsonBaseError::InvalidDocument(format!(
                    "_id must be an integer or string, got {}",
                    n
                ))
            }),
            other => Err(JsonBaseError::InvalidDocument(format!(
                "_id must be an integer or string, got {}",
                other
            ))),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            DocumentId::Int(i) => Value::from(*i),
            DocumentId::String(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentId::Int(i) => write!(f, "{}", i),
            DocumentId::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        DocumentId::String(s.to_string())
    }
}

impl From<i64> for DocumentId {
    fn from(i: i64) -> Self {
        DocumentId::Int(i)
    }
}

/// A stored document: an insertion-ordered JSON object that always holds `_id`
///
/// The id is cached next to the field map; the map still contains `_id` so
/// queries and serialization see it like any other field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Document {
    id: DocumentId,
    fields: Map<String, Value>,
}

impl Document {
    /// Build a document for insertion, assigning a fresh `_id` when missing
    ///
    /// A generated `_id` is appended after the caller's fields.
    pub fn prepare(value: Value) -> Result<Self> {
        let mut fields = match value {
            Value::Object(map) => map,
            other => {
                return Err(JsonBaseError::InvalidDocument(format!(
                    "document must be a JSON object, got {}",
                    crate::value_utils::type_name(&other)
                )))
            }
        };

        let id = match fields.get(ID_FIELD) {
            Some(existing) => DocumentId::from_value(existing)?,
            None => {
                let id = DocumentId::generate();
                fields.insert(ID_FIELD.to_string(), id.to_value());
                id
            }
        };

        Ok(Document { id, fields })
    }

    /// Wrap a stored object; `_id` must already be present
    pub fn from_map(fields: Map<String, Value>) -> Result<Self> {
        let id = fields
            .get(ID_FIELD)
            .ok_or_else(|| JsonBaseError::InvalidDocument("document has no _id".to_string()))
            .and_then(DocumentId::from_value)?;
        Ok(Document { id, fields })
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    /// Resolve a dot-separated field path (`"address.city"`)
    pub fn get(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return None;
        }
        match path.split_once('.') {
            None => self.fields.get(path),
            Some((head, rest)) => resolve_path(self.fields.get(head)?, rest),
        }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Shallow merge: patch fields overwrite, everything else is untouched
    ///
    /// `_id` may appear in the patch only with the document's current value.
    pub fn merge(&mut self, patch: &Map<String, Value>) -> Result<()> {
        Self::check_patch(&self.id, patch)?;
        for (key, value) in patch {
            self.fields.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    /// Validate a patch against an id without applying it
    pub fn check_patch(id: &DocumentId, patch: &Map<String, Value>) -> Result<()> {
        if let Some(new_id) = patch.get(ID_FIELD) {
            if DocumentId::from_value(new_id).ok().as_ref() != Some(id) {
                return Err(JsonBaseError::InvalidDocument(format!(
                    "_id is immutable (document {}, patch {})",
                    id, new_id
                )));
            }
        }
        Ok(())
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.fields)?)
    }
}

impl TryFrom<Map<String, Value>> for Document {
    type Error = JsonBaseError;

    fn try_from(fields: Map<String, Value>) -> Result<Self> {
        Document::from_map(fields)
    }
}

impl From<Document> for Map<String, Value> {
    fn from(doc: Document) -> Self {
        doc.fields
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        doc.into_value()
    }
}
