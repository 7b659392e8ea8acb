//! Database schema definitions for the run journal
//!
//! The journal records history only. Whether an item is archived is always
//! answered by the entry directories, never by these tables.

/// SQL schema for the run journal
pub const SCHEMA_SQL: &str = r#"
-- Key/value state (e.g. the artist an archive root belongs to)
CREATE TABLE IF NOT EXISTS state (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
);

-- Track archive runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    artist TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL
);

-- Outcome of every section crawl
CREATE TABLE IF NOT EXISTS section_results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    section TEXT NOT NULL,
    outcome TEXT NOT NULL,
    pages_fetched INTEGER NOT NULL DEFAULT 0,
    archived INTEGER NOT NULL DEFAULT 0,
    already_archived INTEGER NOT NULL DEFAULT 0,
    failed INTEGER NOT NULL DEFAULT 0,
    error_message TEXT,
    UNIQUE(run_id, section)
);

-- Items that failed and were skipped
CREATE TABLE IF NOT EXISTS item_failures (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    section TEXT NOT NULL,
    item_id TEXT NOT NULL,
    kind TEXT NOT NULL,
    message TEXT NOT NULL,
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_item_failures_run ON item_failures(run_id);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
