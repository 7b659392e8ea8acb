//! Gallery Archive: a resumable, throttled gallery archiver
//!
//! This crate archives every gallery submission, scrap and journal of one artist
//! into a local directory tree, resuming safely after interruption, and splits a
//! finished archive into fixed-size chunks for import into a posting tool.

pub mod chunk;
pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for archive operations
///
/// Only setup failures surface as this type. Failures of single items or whole
/// sections are recorded in the run report instead.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Store(#[from] storage::StoreError),

    #[error("Journal error: {0}")]
    Journal(#[from] storage::JournalError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Directory already contains data for artist '{bound}', refusing to archive '{requested}'")]
    ArtistMismatch { bound: String, requested: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for archive operations
pub type Result<T> = std::result::Result<T, ArchiveError>;

// Re-export commonly used types
pub use chunk::{ChunkPlan, Chunker};
pub use config::Config;
pub use crawler::{ArchiveRun, RunReport, SectionCrawler, Throttle};
pub use state::{PageCursor, Section};
pub use storage::{ArchiveStore, ItemRecord, ItemStore};
