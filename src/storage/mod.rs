//! Storage module for persisting archive data
//!
//! This module handles everything written under an archive root:
//! - The filesystem entry store, the sole source of truth for what is archived
//! - Atomic promotion of staged entries
//! - The SQLite run journal recording run history and item failures

mod archive_store;
mod journal;
mod schema;
mod traits;

pub use archive_store::{ArchiveStore, METADATA_FILE, STAGING_PREFIX};
pub use journal::{RunJournal, JOURNAL_FILE};
pub use traits::{ItemStore, JournalError, JournalResult, StoreError, StoreResult};

use crate::state::Section;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One archived item as described by its `metadata.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: String,
    pub section: Section,
    pub title: String,
    pub description: String,
    pub tags: BTreeSet<String>,
    pub posted_at: DateTime<Utc>,
    pub media_url: Option<String>,
    pub thumbnail_url: Option<String>,
    /// When the item was archived; the stable ordering key for chunking
    pub archived_at: DateTime<Utc>,
    pub files: EntryFiles,
    pub media_sha256: String,
}

/// File names inside an entry directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFiles {
    pub metadata: String,
    pub media: String,
    pub thumbnail: Option<String>,
}

impl EntryFiles {
    /// All file names of the entry, metadata first
    pub fn names(&self) -> Vec<&str> {
        let mut names = vec![self.metadata.as_str(), self.media.as_str()];
        if let Some(thumbnail) = &self.thumbnail {
            names.push(thumbnail.as_str());
        }
        names
    }
}

/// Raw bytes of a media or thumbnail file plus the extension to store it under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPayload {
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// A fully fetched item waiting to be written by [`ItemStore::put`]
#[derive(Debug, Clone)]
pub struct PendingItem {
    pub section: Section,
    pub id: String,
    pub title: String,
    pub description: String,
    pub tags: BTreeSet<String>,
    pub posted_at: DateTime<Utc>,
    pub media_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub archived_at: DateTime<Utc>,
    pub media: MediaPayload,
    pub thumbnail: Option<MediaPayload>,
}

/// Represents a recorded archive run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub artist: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
}

/// Per-section outcome stored in the journal
#[derive(Debug, Clone)]
pub struct SectionRecord {
    pub run_id: i64,
    pub section: Section,
    pub outcome: String,
    pub pages_fetched: u32,
    pub archived: u32,
    pub already_archived: u32,
    pub failed: u32,
    pub error_message: Option<String>,
}

/// Status of an archive run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Partial,
    Interrupted,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Partial => "partial",
            Self::Interrupted => "interrupted",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "partial" => Some(Self::Partial),
            "interrupted" => Some(Self::Interrupted),
            _ => None,
        }
    }
}
