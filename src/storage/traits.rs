//! Storage traits and error types
//!
//! This module defines the trait interface the crawler writes items through,
//! and the error types of the entry store and the run journal.

use crate::state::Section;
use crate::storage::{ItemRecord, PendingItem};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in the entry store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid item id '{0}': must be a plain, non-hidden path component")]
    InvalidItemId(String),

    #[error("Invalid file extension '{0}'")]
    InvalidExtension(String),

    #[error("Archive root not found: {0}")]
    RootNotFound(PathBuf),

    #[error("Malformed metadata in {path}: {source}")]
    Metadata {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for entry store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from the SQLite run journal
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Run not found: {0}")]
    RunNotFound(i64),
}

/// Result type for run journal operations
pub type JournalResult<T> = Result<T, JournalError>;

/// Idempotency layer the crawler archives items through
///
/// `has` must answer from durable state only, so that it is correct right
/// after a process restart. `put` must leave either nothing or a complete
/// entry behind, whatever happens while it runs.
pub trait ItemStore {
    /// Returns true if the item is completely archived
    fn has(&mut self, section: Section, id: &str) -> StoreResult<bool>;

    /// Writes a new item and promotes it atomically
    fn put(&mut self, item: PendingItem) -> StoreResult<ItemRecord>;
}
