//! SQLite run journal
//!
//! Lives at `<root>/archive.db` and records which artist the root belongs to,
//! every run with its per-section outcome, and every item that failed.

use crate::state::Section;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{JournalError, JournalResult};
use crate::storage::{RunRecord, RunStatus, SectionRecord};
use chrono::Utc;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::Path;

/// File name of the journal inside an archive root
pub const JOURNAL_FILE: &str = "archive.db";

const ARTIST_KEY: &str = "artist";

/// Run history of one archive root
pub struct RunJournal {
    conn: Connection,
}

impl RunJournal {
    /// Opens or creates the journal database
    pub fn open(path: &Path) -> JournalResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Opens an existing journal for reading only
    pub fn open_read_only(path: &Path) -> JournalResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    /// Creates an in-memory journal (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> JournalResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    // ===== Artist Binding =====

    /// Returns the artist this archive root belongs to, if bound
    pub fn bound_artist(&self) -> JournalResult<Option<String>> {
        let artist = self
            .conn
            .query_row(
                "SELECT value FROM state WHERE key = ?1",
                params![ARTIST_KEY],
                |row| row.get(0),
            )
            .optional()?;
        Ok(artist)
    }

    /// Binds the archive root to an artist
    pub fn bind_artist(&mut self, artist: &str) -> JournalResult<()> {
        self.conn.execute(
            "INSERT INTO state (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![ARTIST_KEY, artist],
        )?;
        Ok(())
    }

    // ===== Run Management =====

    /// Creates a new run in the `running` state
    pub fn create_run(&mut self, artist: &str, config_hash: &str) -> JournalResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (artist, started_at, config_hash, status) VALUES (?1, ?2, ?3, ?4)",
            params![artist, now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Marks runs still `running` from an earlier process as interrupted
    pub fn mark_stale_runs_interrupted(&mut self) -> JournalResult<usize> {
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1 WHERE status = ?2",
            params![
                RunStatus::Interrupted.to_db_string(),
                RunStatus::Running.to_db_string()
            ],
        )?;
        Ok(updated)
    }

    /// Sets the final status and finish timestamp of a run
    pub fn finish_run(&mut self, run_id: i64, status: RunStatus) -> JournalResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, run_id],
        )?;

        if updated == 0 {
            return Err(JournalError::RunNotFound(run_id));
        }
        Ok(())
    }

    /// Gets a run by ID
    pub fn get_run(&self, run_id: i64) -> JournalResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, artist, started_at, finished_at, config_hash, status FROM runs WHERE id = ?1",
                params![run_id],
                row_to_run,
            )
            .optional()?
            .ok_or(JournalError::RunNotFound(run_id))
    }

    /// Gets the most recent runs, newest first
    pub fn latest_runs(&self, limit: usize) -> JournalResult<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, artist, started_at, finished_at, config_hash, status
             FROM runs ORDER BY id DESC LIMIT ?1",
        )?;

        let runs = stmt
            .query_map(params![limit as i64], row_to_run)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(runs)
    }

    // ===== Section Results =====

    /// Records the outcome of one section crawl
    pub fn record_section(&mut self, record: &SectionRecord) -> JournalResult<()> {
        self.conn.execute(
            "INSERT INTO section_results
                (run_id, section, outcome, pages_fetched, archived, already_archived, failed, error_message)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(run_id, section) DO UPDATE SET
                outcome = excluded.outcome,
                pages_fetched = excluded.pages_fetched,
                archived = excluded.archived,
                already_archived = excluded.already_archived,
                failed = excluded.failed,
                error_message = excluded.error_message",
            params![
                record.run_id,
                record.section.as_str(),
                record.outcome,
                record.pages_fetched,
                record.archived,
                record.already_archived,
                record.failed,
                record.error_message,
            ],
        )?;
        Ok(())
    }

    /// Gets the section outcomes of a run in archive order
    pub fn section_records(&self, run_id: i64) -> JournalResult<Vec<SectionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT run_id, section, outcome, pages_fetched, archived, already_archived, failed, error_message
             FROM section_results WHERE run_id = ?1",
        )?;

        let mut records = stmt
            .query_map(params![run_id], |row| {
                let section: String = row.get(1)?;
                Ok((
                    section,
                    SectionRecord {
                        run_id: row.get(0)?,
                        section: Section::Gallery,
                        outcome: row.get(2)?,
                        pages_fetched: row.get(3)?,
                        archived: row.get(4)?,
                        already_archived: row.get(5)?,
                        failed: row.get(6)?,
                        error_message: row.get(7)?,
                    },
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .filter_map(|(name, mut record)| {
                record.section = Section::from_name(&name)?;
                Some(record)
            })
            .collect::<Vec<_>>();

        records.sort_by_key(|r| r.section);
        Ok(records)
    }

    // ===== Item Failures =====

    /// Records an item that failed and was skipped
    pub fn record_item_failure(
        &mut self,
        run_id: i64,
        section: Section,
        item_id: &str,
        kind: &str,
        message: &str,
    ) -> JournalResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO item_failures (run_id, section, item_id, kind, message, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![run_id, section.as_str(), item_id, kind, message, now],
        )?;
        Ok(())
    }

    /// Counts item failures of a run
    pub fn count_item_failures(&self, run_id: i64) -> JournalResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM item_failures WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

fn row_to_run(row: &rusqlite::Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        artist: row.get(1)?,
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        config_hash: row.get(4)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(5)?)
            .unwrap_or(RunStatus::Interrupted),
    })
}
