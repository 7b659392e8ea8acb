//! Chunk export
//!
//! Splits a finished (or partial) archive into consecutive groups of at most
//! `size_limit` items so that each group can be imported on its own. Chunking
//! is a pure function of the archive contents and the size limit.

mod materialize;
mod plan;

pub use materialize::{
    chunk_dir_name, default_output_dir, leftover_export_dirs, materialize, CHUNK_MARKER_FILE,
};
pub use plan::{ordered_items, plan_chunks, Chunk, ChunkPlan};

use crate::config::validate_chunk_size;
use crate::storage::{ArchiveStore, StoreError};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Chunk sizes from here on slow the downstream import tool down noticeably
pub const RECOMMENDED_MAX_CHUNK_SIZE: usize = 100;

/// Errors that can occur while chunking an archive
#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("Chunk size must be between 1 and 99999, got {0}")]
    InvalidSize(usize),

    #[error("Refusing to replace '{0}': it is not chunk output")]
    NotChunkOutput(PathBuf),

    #[error("Failed to read archive: {0}")]
    Store(#[from] StoreError),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ChunkError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for chunk operations
pub type ChunkResult<T> = Result<T, ChunkError>;

/// Plans and writes chunks of a fixed size
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    size_limit: usize,
}

impl Chunker {
    /// Creates a chunker, rejecting sizes outside `1..=99999`
    pub fn new(size_limit: usize) -> ChunkResult<Self> {
        validate_chunk_size(size_limit).map_err(|_| ChunkError::InvalidSize(size_limit))?;

        if size_limit >= RECOMMENDED_MAX_CHUNK_SIZE {
            tracing::warn!(
                "Chunk size {} is large; imports of {} or more items at once get slow",
                size_limit,
                RECOMMENDED_MAX_CHUNK_SIZE
            );
        }

        Ok(Self { size_limit })
    }

    pub fn size_limit(&self) -> usize {
        self.size_limit
    }

    /// Computes the plan for the current archive contents
    pub fn plan(&self, store: &ArchiveStore) -> ChunkResult<ChunkPlan> {
        plan_chunks(ordered_items(store)?, self.size_limit)
    }

    /// Plans and writes the chunks to `out_dir`
    pub fn export(&self, store: &ArchiveStore, out_dir: &Path) -> ChunkResult<ChunkPlan> {
        let plan = self.plan(store)?;
        materialize(&plan, store, out_dir)?;
        Ok(plan)
    }
}
