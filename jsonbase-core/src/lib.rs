// src/lib.rs
// Embedded JSON document store: collections, queries, indexes, aggregation

pub mod aggregation;
pub mod collection_core;
pub mod config;
pub mod database;
pub mod document;
pub mod error;
pub mod index;
pub mod query;
pub mod storage;
pub mod value_utils;

// Public exports
pub use aggregation::{AggregateOp, GroupKey, Groups};
pub use collection_core::CollectionCore;
pub use config::{DatabaseConfig, WriteMode};
pub use database::DatabaseCore;
pub use document::{Document, DocumentId, ID_FIELD};
pub use error::{JsonBaseError, Result};
pub use index::IndexManager;
pub use query::Query;
pub use storage::{FileStorage, MemoryStorage, Storage};
