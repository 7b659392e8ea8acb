//! Writing a chunk plan to disk
//!
//! Output layout for a plan:
//!
//! ```text
//! <out_dir>/00001/archive.chunk        "0\n"
//! <out_dir>/00001/gallery/<id>/...     copies of the entry files
//! <out_dir>/00002/archive.chunk        "1\n"
//! ```
//!
//! The whole tree is built in a staging directory next to `out_dir` and only
//! then moved into place. Source entries are only ever read.

use crate::chunk::{ChunkError, ChunkPlan, ChunkResult};
use crate::storage::ArchiveStore;
use std::fs;
use std::path::{Path, PathBuf};

/// Marker file inside every chunk directory
pub const CHUNK_MARKER_FILE: &str = "archive.chunk";

const STAGING_PREFIX: &str = ".chunk-staging-";
const PREVIOUS_PREFIX: &str = ".chunk-previous-";

/// Directory name of a chunk: its 1-based position, zero padded to 5 digits
pub fn chunk_dir_name(index: usize) -> String {
    format!("{:05}", index + 1)
}

/// Lists staging and set-aside directories that an interrupted export left in `dir`
pub fn leftover_export_dirs(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut leftovers = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with(STAGING_PREFIX) || name.starts_with(PREVIOUS_PREFIX) {
            leftovers.push(entry.path());
        }
    }
    leftovers.sort();

    Ok(leftovers)
}

/// Default output location, `<root>/chunk<size_limit>`
pub fn default_output_dir(root: &Path, size_limit: usize) -> PathBuf {
    root.join(format!("chunk{}", size_limit))
}

/// Writes every chunk of the plan below `out_dir`, replacing earlier output
///
/// # Arguments
///
/// * `plan` - The plan to write
/// * `store` - The archive the planned items live in
/// * `out_dir` - Target directory; must be absent, empty, or earlier chunk output
pub fn materialize(plan: &ChunkPlan, store: &ArchiveStore, out_dir: &Path) -> ChunkResult<()> {
    ensure_replaceable(out_dir)?;

    let parent = out_dir
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|e| ChunkError::io(parent, e))?;

    for leftover in leftover_export_dirs(parent).map_err(|e| ChunkError::io(parent, e))? {
        tracing::info!("Removing unfinished export {}", leftover.display());
        fs::remove_dir_all(&leftover).map_err(|e| ChunkError::io(&leftover, e))?;
    }

    // Removed on drop unless moved into place below
    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(parent)
        .map_err(|e| ChunkError::io(parent, e))?;

    for chunk in &plan.chunks {
        let chunk_dir = staging.path().join(chunk_dir_name(chunk.index));
        create_dir(&chunk_dir)?;

        let marker = chunk_dir.join(CHUNK_MARKER_FILE);
        fs::write(&marker, format!("{}\n", chunk.index)).map_err(|e| ChunkError::io(&marker, e))?;

        for item in &chunk.items {
            let source = store.entry_dir(item.section, &item.id);
            let target = chunk_dir.join(item.section.as_str()).join(&item.id);
            create_dir(&target)?;

            for name in item.files.names() {
                let from = source.join(name);
                let to = target.join(name);
                fs::copy(&from, &to).map_err(|e| ChunkError::io(&from, e))?;
            }
        }

        tracing::debug!(
            "Prepared chunk {} with {} item(s)",
            chunk_dir_name(chunk.index),
            chunk.items.len()
        );
    }

    // Earlier output is moved aside first and deleted once the new tree is in place
    let previous = if out_dir.exists() {
        let holder = tempfile::Builder::new()
            .prefix(PREVIOUS_PREFIX)
            .tempdir_in(parent)
            .map_err(|e| ChunkError::io(parent, e))?;
        let moved = holder.path().join("output");
        fs::rename(out_dir, &moved).map_err(|e| ChunkError::io(out_dir, e))?;
        Some(holder)
    } else {
        None
    };

    fs::rename(staging.path(), out_dir).map_err(|e| ChunkError::io(out_dir, e))?;
    drop(staging);
    drop(previous);

    tracing::info!(
        "Wrote {} chunk(s) of up to {} item(s) to {}",
        plan.chunks.len(),
        plan.size_limit,
        out_dir.display()
    );
    Ok(())
}

/// Refuses to replace a directory that is not chunk output
fn ensure_replaceable(out_dir: &Path) -> ChunkResult<()> {
    if !out_dir.exists() {
        return Ok(());
    }
    if !out_dir.is_dir() {
        return Err(ChunkError::NotChunkOutput(out_dir.to_path_buf()));
    }

    for entry in fs::read_dir(out_dir).map_err(|e| ChunkError::io(out_dir, e))? {
        let entry = entry.map_err(|e| ChunkError::io(out_dir, e))?;
        let name = entry.file_name().to_string_lossy().to_string();
        let is_chunk = name.len() == 5
            && name.chars().all(|c| c.is_ascii_digit())
            && entry.path().join(CHUNK_MARKER_FILE).is_file();

        if !is_chunk {
            return Err(ChunkError::NotChunkOutput(out_dir.to_path_buf()));
        }
    }
    Ok(())
}

fn create_dir(path: &Path) -> ChunkResult<()> {
    fs::create_dir_all(path).map_err(|e| ChunkError::io(path, e))
}
