// src/error.rs
use thiserror::Error;

/// Every failure a collection, its storage or the database wrapper can report
#[derive(Error, Debug)]
pub enum JsonBaseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Document or index artifact is unreadable or has the wrong shape
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Ordered comparison between values that have no common ordering
    #[error("Type mismatch on '{field}': cannot compare {found} with {expected}")]
    TypeMismatch {
        field: String,
        found: &'static str,
        expected: &'static str,
    },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Duplicate _id: {0}")]
    DuplicateId(String),

    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("Invalid collection name: '{0}'")]
    InvalidCollectionName(String),
}

impl From<serde_json::Error> for JsonBaseError {
    fn from(err: serde_json::Error) -> Self {
        JsonBaseError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, JsonBaseError>;
