// src/storage/file_storage.rs
//! JSON file backend
//!
//! ```text
//! FileStorage
//!   ├── <dir>/<name>.json        [ {doc}, {doc}, ... ]
//!   └── <dir>/<name>.index.json  { field: { value: [id, ...] } }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::io::{read_json, write_json};
use crate::config::DatabaseConfig;
use crate::document::Document;
use crate::error::Result;
use crate::index::IndexManager;
use crate::storage::Storage;

/// Production backend: one pretty-printed JSON file per artifact
///
/// # Examples
///
/// ```no_run
/// use jsonbase_core::{DatabaseConfig, FileStorage};
///
/// let storage = FileStorage::open("storage/users.json", DatabaseConfig::default())?;
/// assert!(storage.index_path().ends_with("users.index.json"));
/// # Ok::<(), jsonbase_core::JsonBaseError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileStorage {
    documents_path: PathBuf,
    index_path: PathBuf,
    config: DatabaseConfig,
}

impl FileStorage {
    /// Open the document file at `path`, creating an empty one when missing
    pub fn open<P: AsRef<Path>>(path: P, config: DatabaseConfig) -> Result<Self> {
        let documents_path = path.as_ref().to_path_buf();
        let index_path = Self::index_path_for(&documents_path);

        if let Some(parent) = documents_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        if !documents_path.exists() {
            debug!(path = %documents_path.display(), "creating empty document file");
            write_json(&documents_path, &[] as &[Document], &config)?;
        }

        Ok(FileStorage {
            documents_path,
            index_path,
            config,
        })
    }

    /// `users.json` -> `users.index.json`
    pub fn index_path_for(documents_path: &Path) -> PathBuf {
        documents_path.with_extension("index.json")
    }

    pub fn documents_path(&self) -> &Path {
        &self.documents_path
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }
}

impl Storage for FileStorage {
    fn load_documents(&self) -> Result<Vec<Document>> {
        read_json(&self.documents_path)
    }

    fn save_documents(&mut self, documents: &[Document]) -> Result<()> {
        write_json(&self.documents_path, documents, &self.config)
    }

    fn load_indexes(&self) -> Result<IndexManager> {
        if !self.index_path.exists() {
            return Ok(IndexManager::new());
        }
        read_json(&self.index_path)
    }

    fn save_indexes(&mut self, indexes: &IndexManager) -> Result<()> {
        write_json(&self.index_path, indexes, &self.config)
    }
}
