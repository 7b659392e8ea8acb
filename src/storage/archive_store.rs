//! Filesystem entry store
//!
//! Every archived item lives in its own directory `<root>/<section>/<id>/`.
//! Entries are written into a hidden staging directory next to their final
//! location and promoted with a single directory rename, so an entry is either
//! absent or complete. The directory tree itself is the index.

use crate::state::Section;
use crate::storage::traits::{ItemStore, StoreError, StoreResult};
use crate::storage::{EntryFiles, ItemRecord, PendingItem};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Name of the metadata file inside every entry
pub const METADATA_FILE: &str = "metadata.json";

/// Prefix of staging directories; never a valid entry name
pub const STAGING_PREFIX: &str = ".partial-";

/// Filesystem-backed archive of one artist
pub struct ArchiveStore {
    root: PathBuf,

    /// Entries known to be complete during this process
    known: HashSet<(Section, String)>,
}

impl ArchiveStore {
    /// Opens an archive root for writing, creating it if needed
    ///
    /// Staging directories left behind by a killed process are removed.
    pub fn open(root: &Path) -> StoreResult<Self> {
        fs::create_dir_all(root).map_err(|e| StoreError::io(root, e))?;

        let store = Self {
            root: root.to_path_buf(),
            known: HashSet::new(),
        };

        for section in Section::ALL {
            let dir = store.section_dir(section);
            fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;

            for stale in store.staging_dirs(section)? {
                tracing::info!("Removing unfinished entry {}", stale.display());
                fs::remove_dir_all(&stale).map_err(|e| StoreError::io(&stale, e))?;
            }
        }

        Ok(store)
    }

    /// Opens an existing archive root without modifying anything on disk
    pub fn open_existing(root: &Path) -> StoreResult<Self> {
        if !root.is_dir() {
            return Err(StoreError::RootNotFound(root.to_path_buf()));
        }

        Ok(Self {
            root: root.to_path_buf(),
            known: HashSet::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn section_dir(&self, section: Section) -> PathBuf {
        self.root.join(section.as_str())
    }

    pub fn entry_dir(&self, section: Section, id: &str) -> PathBuf {
        self.section_dir(section).join(id)
    }

    /// Reads every complete entry of a section, in directory order
    pub fn entries(&self, section: Section) -> StoreResult<Vec<ItemRecord>> {
        let dir = self.section_dir(section);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|e| StoreError::io(&dir, e))? {
            let entry = entry.map_err(|e| StoreError::io(&dir, e))?;
            let path = entry.path();

            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }

            if !path.is_dir() {
                tracing::warn!("Not an archive entry: '{}'", path.display());
                continue;
            }

            let metadata_path = path.join(METADATA_FILE);
            if !metadata_path.is_file() {
                tracing::warn!("Entry without metadata: '{}'", path.display());
                continue;
            }

            records.push(read_record(&metadata_path)?);
        }

        Ok(records)
    }

    /// Lists staging directories of a section
    pub fn staging_dirs(&self, section: Section) -> StoreResult<Vec<PathBuf>> {
        let dir = self.section_dir(section);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut staging = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|e| StoreError::io(&dir, e))? {
            let entry = entry.map_err(|e| StoreError::io(&dir, e))?;
            if entry
                .file_name()
                .to_string_lossy()
                .starts_with(STAGING_PREFIX)
            {
                staging.push(entry.path());
            }
        }
        staging.sort();

        Ok(staging)
    }

    fn is_complete(&self, section: Section, id: &str) -> bool {
        let dir = self.entry_dir(section, id);
        dir.is_dir() && dir.join(METADATA_FILE).is_file()
    }
}

impl ItemStore for ArchiveStore {
    fn has(&mut self, section: Section, id: &str) -> StoreResult<bool> {
        if self.known.contains(&(section, id.to_string())) {
            return Ok(true);
        }

        validate_id(id)?;

        let complete = self.is_complete(section, id);
        if complete {
            self.known.insert((section, id.to_string()));
        }
        Ok(complete)
    }

    fn put(&mut self, item: PendingItem) -> StoreResult<ItemRecord> {
        validate_id(&item.id)?;
        validate_extension(&item.media.extension)?;
        if let Some(thumbnail) = &item.thumbnail {
            validate_extension(&thumbnail.extension)?;
        }

        let section_dir = self.section_dir(item.section);
        let final_dir = section_dir.join(&item.id);

        if self.is_complete(item.section, &item.id) {
            tracing::debug!(
                "Entry {}/{} already exists, keeping it",
                item.section,
                item.id
            );
            self.known.insert((item.section, item.id.clone()));
            return read_record(&final_dir.join(METADATA_FILE));
        }

        // Removed on drop unless promoted below
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(&section_dir)
            .map_err(|e| StoreError::io(&section_dir, e))?;

        let files = EntryFiles {
            metadata: METADATA_FILE.to_string(),
            media: format!("media.{}", item.media.extension),
            thumbnail: item
                .thumbnail
                .as_ref()
                .map(|t| format!("thumbnail.{}", t.extension)),
        };

        write_file_synced(&staging.path().join(&files.media), &item.media.bytes)?;
        if let (Some(name), Some(thumbnail)) = (&files.thumbnail, &item.thumbnail) {
            write_file_synced(&staging.path().join(name), &thumbnail.bytes)?;
        }

        let record = ItemRecord {
            media_sha256: sha256_hex(&item.media.bytes),
            id: item.id,
            section: item.section,
            title: item.title,
            description: item.description,
            tags: item.tags,
            posted_at: item.posted_at,
            media_url: item.media_url,
            thumbnail_url: item.thumbnail_url,
            archived_at: item.archived_at,
            files,
        };

        let metadata_path = staging.path().join(METADATA_FILE);
        let json = serde_json::to_vec_pretty(&record).map_err(|e| StoreError::Metadata {
            path: metadata_path.clone(),
            source: e,
        })?;
        write_file_synced(&metadata_path, &json)?;

        set_entry_permissions(staging.path())?;

        fs::rename(staging.path(), &final_dir).map_err(|e| StoreError::io(&final_dir, e))?;
        // The staging path no longer exists; dropping the guard is a no-op now
        drop(staging);
        sync_dir(&section_dir)?;

        tracing::debug!("Archived {}/{}", record.section, record.id);
        self.known.insert((record.section, record.id.clone()));

        Ok(record)
    }
}

/// Ids become directory names, so they must be a single plain path component
fn validate_id(id: &str) -> StoreResult<()> {
    let valid = !id.is_empty()
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidItemId(id.to_string()))
    }
}

fn validate_extension(extension: &str) -> StoreResult<()> {
    if !extension.is_empty()
        && extension.len() <= 16
        && extension.chars().all(|c| c.is_ascii_alphanumeric())
    {
        Ok(())
    } else {
        Err(StoreError::InvalidExtension(extension.to_string()))
    }
}

fn read_record(path: &Path) -> StoreResult<ItemRecord> {
    let bytes = fs::read(path).map_err(|e| StoreError::io(path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| StoreError::Metadata {
        path: path.to_path_buf(),
        source: e,
    })
}

fn write_file_synced(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let mut file = File::create(path).map_err(|e| StoreError::io(path, e))?;
    file.write_all(bytes).map_err(|e| StoreError::io(path, e))?;
    file.sync_all().map_err(|e| StoreError::io(path, e))?;
    Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(unix)]
fn set_entry_permissions(dir: &Path) -> StoreResult<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(dir, fs::Permissions::from_mode(0o755)).map_err(|e| StoreError::io(dir, e))
}

#[cfg(not(unix))]
fn set_entry_permissions(_dir: &Path) -> StoreResult<()> {
    Ok(())
}

/// Flushes the rename itself to disk
#[cfg(unix)]
fn sync_dir(dir: &Path) -> StoreResult<()> {
    File::open(dir)
        .and_then(|f| f.sync_all())
        .map_err(|e| StoreError::io(dir, e))
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> StoreResult<()> {
    Ok(())
}
