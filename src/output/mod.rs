//! Output module for run reports and archive summaries
//!
//! This module handles:
//! - Printing the summary of a finished archive run
//! - Printing the chunks written by an export
//! - Loading and printing archive statistics for `status`

pub mod stats;

pub use stats::{load_statistics, print_statistics, ArchiveStatistics, RunSummary};

use crate::chunk::{chunk_dir_name, ChunkPlan};
use crate::crawler::{RunReport, SectionOutcome};
use std::path::Path;

/// Prints the summary of an archive run to stdout
pub fn print_run_report(report: &RunReport) {
    println!("=== Archive Run #{} ===\n", report.run_id);
    println!("Artist: {}", report.artist);
    println!("Root: {}", report.root.display());
    println!();

    for section in &report.sections {
        let outcome = match &section.outcome {
            SectionOutcome::Exhausted => "complete".to_string(),
            SectionOutcome::Aborted { reason } => format!("ABORTED ({})", reason),
        };
        println!("{}: {}", section.section, outcome);
        println!("  pages fetched: {}", section.pages_fetched);
        println!("  newly archived: {}", section.archived);
        println!("  already archived: {}", section.already_archived);
        if !section.failures.is_empty() {
            println!("  failed items: {}", section.failures.len());
            for failure in &section.failures {
                println!("    - {} [{}]: {}", failure.id, failure.error.kind(), failure.error);
            }
        }
    }
    println!();

    if report.is_complete() {
        println!(
            "Run complete: {} new item(s), {} failure(s).",
            report.total_archived(),
            report.total_failures()
        );
    } else {
        let failed: Vec<String> = report
            .failed_sections()
            .iter()
            .map(|s| s.to_string())
            .collect();
        println!(
            "Run partially complete, failed section(s): {}. Re-run to resume.",
            failed.join(", ")
        );
    }
}

/// Prints the chunks of an export to stdout
pub fn print_chunk_plan(plan: &ChunkPlan, out_dir: &Path) {
    println!(
        "Wrote {} item(s) in {} chunk(s) of up to {} to {}",
        plan.item_count(),
        plan.chunks.len(),
        plan.size_limit,
        out_dir.display()
    );
    for chunk in &plan.chunks {
        println!("  {}: {} item(s)", chunk_dir_name(chunk.index), chunk.items.len());
    }
}
