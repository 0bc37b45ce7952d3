//! Storage configuration
//!
//! Controls how a collection's two artifacts are rewritten on every
//! mutating operation.

use serde::{Deserialize, Serialize};

/// How the document and index files are replaced on save
///
/// # Modes
///
/// - **Atomic**: write a sibling `*.tmp` file, flush it, then rename it over
///   the target. Readers see either the old or the new contents.
/// - **InPlace**: truncate the target and write into it directly. A crash
///   mid-write leaves a truncated file behind.
///
/// Neither mode protects against two processes writing the same collection;
/// the last full save wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    #[default]
    Atomic,
    InPlace,
}

impl WriteMode {
    pub fn is_atomic(&self) -> bool {
        matches!(self, WriteMode::Atomic)
    }
}

/// Options shared by every collection opened through a [`crate::DatabaseCore`]
///
/// # Examples
///
/// ```rust
/// use jsonbase_core::{DatabaseConfig, WriteMode};
///
/// let config = DatabaseConfig::default();
/// assert_eq!(config.write_mode, WriteMode::Atomic);
/// assert!(config.pretty);
///
/// let compact = DatabaseConfig::default().with_pretty(false);
/// assert!(!compact.pretty);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub write_mode: WriteMode,
    /// Pretty-print both artifacts (human readable, the default)
    pub pretty: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            write_mode: WriteMode::default(),
            pretty: true,
        }
    }
}

impl DatabaseConfig {
    pub fn with_write_mode(mut self, write_mode: WriteMode) -> Self {
        self.write_mode = write_mode;
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}
