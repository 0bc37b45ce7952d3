// src/database.rs
// Directory of collections: maps a collection name to its two files

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::collection_core::CollectionCore;
use crate::config::DatabaseConfig;
use crate::error::{JsonBaseError, Result};
use crate::storage::FileStorage;

const DOCUMENT_SUFFIX: &str = ".json";
const INDEX_SUFFIX: &str = ".index.json";

/// A directory holding one `<name>.json` / `<name>.index.json` pair per collection
///
/// # Examples
///
/// ```no_run
/// use jsonbase_core::DatabaseCore;
/// use serde_json::json;
///
/// let db = DatabaseCore::open("storage")?;
/// let mut users = db.collection("users")?;
/// users.insert_one(json!({"name": "Alice", "age": 30}))?;
/// assert_eq!(db.list_collections()?, vec!["users"]);
/// # Ok::<(), jsonbase_core::JsonBaseError>(())
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseCore {
    base_dir: PathBuf,
    config: DatabaseConfig,
}

impl DatabaseCore {
    /// Open (creating if missing) the directory at `base_dir`
    pub fn open<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        Self::open_with_config(base_dir, DatabaseConfig::default())
    }

    pub fn open_with_config<P: AsRef<Path>>(base_dir: P, config: DatabaseConfig) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        debug!(dir = %base_dir.display(), ?config, "database opened");
        Ok(DatabaseCore { base_dir, config })
    }

    pub fn path(&self) -> &Path {
        &self.base_dir
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Open a collection, creating its empty document file on first use
    ///
    /// # Errors
    ///
    /// `InvalidCollectionName` unless `name` is non-empty ASCII alphanumerics,
    /// `_` or `-`.
    pub fn collection(&self, name: &str) -> Result<CollectionCore<FileStorage>> {
        validate_collection_name(name)?;
        let storage = FileStorage::open(self.documents_path(name), self.config)?;
        CollectionCore::new(name, storage)
    }

    /// Collection names found in the directory, sorted
    pub fn list_collections(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if file_name.ends_with(INDEX_SUFFIX) {
                continue;
            }
            if let Some(name) = file_name.strip_suffix(DOCUMENT_SUFFIX) {
                if validate_collection_name(name).is_ok() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Remove both files of a collection (missing files are ignored)
    pub fn drop_collection(&self, name: &str) -> Result<()> {
        validate_collection_name(name)?;
        for path in [self.documents_path(name), self.index_path(name)] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        debug!(collection = name, "collection dropped");
        Ok(())
    }

    fn documents_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(format!("{}{}", name, DOCUMENT_SUFFIX))
    }

    fn index_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(format!("{}{}", name, INDEX_SUFFIX))
    }
}

fn validate_collection_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(JsonBaseError::InvalidCollectionName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_directory() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("storage");
        let db = DatabaseCore::open(&base).unwrap();
        assert!(base.is_dir());
        assert_eq!(db.path(), base.as_path());
        assert!(db.list_collections().unwrap().is_empty());
    }

    #[test]
    fn test_collection_files() {
        let dir = TempDir::new().unwrap();
        let db = DatabaseCore::open(dir.path()).unwrap();

        let mut users = db.collection("users").unwrap();
        assert!(dir.path().join("users.json").exists());

        users.create_index("name").unwrap();
        assert!(dir.path().join("users.index.json").exists());
    }

    #[test]
    fn test_collection_name_validation() {
        let dir = TempDir::new().unwrap();
        let db = DatabaseCore::open(dir.path()).unwrap();

        for bad in ["", "../etc", "a b", "x.json", "naïve"] {
            assert!(
                matches!(
                    db.collection(bad),
                    Err(JsonBaseError::InvalidCollectionName(_))
                ),
                "{:?} should be rejected",
                bad
            );
        }
        assert!(db.collection("order_items-2024").is_ok());
    }

    #[test]
    fn test_list_collections_skips_index_files() {
        let dir = TempDir::new().unwrap();
        let db = DatabaseCore::open(dir.path()).unwrap();

        db.collection("zeta").unwrap().create_index("k").unwrap();
        db.collection("alpha").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

        assert_eq!(db.list_collections().unwrap(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_drop_collection() {
        let dir = TempDir::new().unwrap();
        let db = DatabaseCore::open(dir.path()).unwrap();

        let mut tmp = db.collection("tmp").unwrap();
        tmp.insert_one(json!({"a": 1})).unwrap();
        db.drop_collection("tmp").unwrap();

        assert!(!dir.path().join("tmp.json").exists());
        assert!(!dir.path().join("tmp.index.json").exists());
        // Dropping again is fine
        db.drop_collection("tmp").unwrap();
    }

    #[test]
    fn test_config_reaches_storage() {
        let dir = TempDir::new().unwrap();
        let db = DatabaseCore::open_with_config(
            dir.path(),
            DatabaseConfig::default().with_pretty(false),
        )
        .unwrap();

        let mut c = db.collection("c").unwrap();
        c.insert_one(json!({"_id": 1})).unwrap();
        let raw = fs::read_to_string(dir.path().join("c.json")).unwrap();
        assert_eq!(raw.trim(), r#"[{"_id":1}]"#);
    }
}
