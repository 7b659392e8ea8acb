//! Statistics of an archive root
//!
//! Entry counts come from the directory tree; run history comes from the
//! run journal when one exists.

use crate::chunk::leftover_export_dirs;
use crate::state::Section;
use crate::storage::{ArchiveStore, RunJournal, RunRecord, SectionRecord, JOURNAL_FILE};
use crate::Result;
use std::collections::BTreeMap;
use std::path::Path;

/// How many runs `status` shows
pub const RECENT_RUN_LIMIT: usize = 5;

/// One journaled run with its section outcomes
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run: RunRecord,
    pub sections: Vec<SectionRecord>,
    pub item_failures: u64,
}

/// Archive statistics summary
#[derive(Debug, Clone)]
pub struct ArchiveStatistics {
    /// Artist the root is bound to, if a run ever started
    pub artist: Option<String>,

    /// Complete entries per section
    pub entries_by_section: BTreeMap<Section, usize>,

    /// Staging directories left by interrupted writes
    pub staging_dirs: usize,

    /// Directories left in the root by interrupted chunk exports
    pub unfinished_exports: usize,

    /// Most recent runs, newest first
    pub recent_runs: Vec<RunSummary>,
}

impl ArchiveStatistics {
    pub fn total_entries(&self) -> usize {
        self.entries_by_section.values().sum()
    }
}

/// Loads statistics of an archive root without modifying it
///
/// # Arguments
///
/// * `root` - The archive root directory
///
/// # Returns
///
/// * `Ok(ArchiveStatistics)` - Successfully loaded statistics
/// * `Err(ArchiveError)` - The root is missing or could not be read
pub fn load_statistics(root: &Path) -> Result<ArchiveStatistics> {
    let store = ArchiveStore::open_existing(root)?;

    let mut entries_by_section = BTreeMap::new();
    let mut staging_dirs = 0;
    for section in Section::ALL {
        entries_by_section.insert(section, store.entries(section)?.len());
        staging_dirs += store.staging_dirs(section)?.len();
    }

    let unfinished_exports = leftover_export_dirs(root)?.len();

    let journal_path = root.join(JOURNAL_FILE);
    let (artist, recent_runs) = if journal_path.is_file() {
        let journal = RunJournal::open_read_only(&journal_path)?;
        let mut recent_runs = Vec::new();
        for run in journal.latest_runs(RECENT_RUN_LIMIT)? {
            recent_runs.push(RunSummary {
                sections: journal.section_records(run.id)?,
                item_failures: journal.count_item_failures(run.id)?,
                run,
            });
        }
        (journal.bound_artist()?, recent_runs)
    } else {
        (None, Vec::new())
    };

    Ok(ArchiveStatistics {
        artist,
        entries_by_section,
        staging_dirs,
        unfinished_exports,
        recent_runs,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &ArchiveStatistics) {
    println!("=== Archive Status ===\n");

    println!(
        "Artist: {}",
        stats.artist.as_deref().unwrap_or("(no run recorded)")
    );
    println!();

    println!("Entries:");
    for (section, count) in &stats.entries_by_section {
        println!("  {}: {}", section, count);
    }
    println!("  total: {}", stats.total_entries());
    if stats.staging_dirs > 0 {
        println!(
            "  unfinished writes: {} (removed by the next archive run)",
            stats.staging_dirs
        );
    }
    if stats.unfinished_exports > 0 {
        println!(
            "  unfinished chunk exports: {} (removed by the next chunk export)",
            stats.unfinished_exports
        );
    }
    println!();

    if stats.recent_runs.is_empty() {
        println!("No runs recorded.");
        return;
    }

    println!("Recent Runs:");
    for summary in &stats.recent_runs {
        let run = &summary.run;
        println!(
            "  #{} {} started {} finished {}",
            run.id,
            run.status.to_db_string(),
            run.started_at,
            run.finished_at.as_deref().unwrap_or("-")
        );
        for section in &summary.sections {
            print!(
                "    {}: {} ({} page(s), {} new, {} present, {} failed)",
                section.section,
                section.outcome,
                section.pages_fetched,
                section.archived,
                section.already_archived,
                section.failed
            );
            match &section.error_message {
                Some(message) => println!(" - {}", message),
                None => println!(),
            }
        }
        if summary.item_failures > 0 {
            println!("    item failures: {}", summary.item_failures);
        }
    }
}
