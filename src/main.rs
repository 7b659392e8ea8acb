//! Gallery Archive main entry point
//!
//! This is the command-line interface for archiving an artist's gallery,
//! splitting an archive into chunks and inspecting an archive root.

use anyhow::Context;
use clap::{Parser, Subcommand};
use gallery_archive::chunk::{default_output_dir, Chunker};
use gallery_archive::config::{
    compute_config_hash, resolve_config, ChunkConfig, Config, ConfigOverrides,
};
use gallery_archive::crawler::{mark_interrupted, ArchiveRun, SiteUrls};
use gallery_archive::output::{load_statistics, print_chunk_plan, print_run_report, print_statistics};
use gallery_archive::state::Section;
use gallery_archive::storage::ArchiveStore;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Gallery Archive: a resumable, throttled gallery archiver
///
/// Archives every gallery submission, scrap and journal of one artist into a
/// local directory. Interrupted runs resume where they stopped when invoked
/// again with the same artist and directory.
#[derive(Parser, Debug)]
#[command(name = "gallery-archive")]
#[command(version)]
#[command(about = "A resumable, throttled gallery archiver", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Archive (or resume archiving) an artist into a directory
    Archive {
        /// Path to TOML configuration file
        #[arg(short, long, value_name = "CONFIG")]
        config: Option<PathBuf>,

        /// Artist to archive (overrides the config file)
        #[arg(short, long)]
        artist: Option<String>,

        /// Archive root directory (overrides the config file)
        #[arg(short, long, value_name = "DIR")]
        root: Option<PathBuf>,

        /// Minimum milliseconds between requests (overrides the config file)
        #[arg(long, value_name = "MS")]
        min_interval_ms: Option<u64>,

        /// Validate config and show what would be archived without fetching
        #[arg(long)]
        dry_run: bool,
    },

    /// Split an archive into numbered chunks for import
    Chunk {
        /// Archive root directory
        #[arg(value_name = "ROOT")]
        root: PathBuf,

        /// Maximum number of items per chunk
        #[arg(short, long, default_value_t = ChunkConfig::default().size)]
        size: usize,

        /// Output directory (default: <ROOT>/chunk<SIZE>)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Show entry counts and recent runs of an archive
    Status {
        /// Archive root directory
        #[arg(value_name = "ROOT")]
        root: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Archive {
            config,
            artist,
            root,
            min_interval_ms,
            dry_run,
        } => {
            let overrides = ConfigOverrides {
                artist,
                root_dir: root,
                min_interval_ms,
            };
            let config = resolve_config(config.as_deref(), &overrides)
                .context("Failed to load configuration")?;

            if dry_run {
                handle_dry_run(&config)?;
                Ok(ExitCode::SUCCESS)
            } else {
                handle_archive(config).await
            }
        }
        Command::Chunk { root, size, output } => {
            handle_chunk(root, size, output)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Status { root } => {
            let stats = load_statistics(&root)
                .with_context(|| format!("Failed to read archive at {}", root.display()))?;
            print_statistics(&stats);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("gallery_archive=info,warn"),
            1 => EnvFilter::new("gallery_archive=debug,info"),
            2 => EnvFilter::new("gallery_archive=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles `archive --dry-run`: shows the effective configuration
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let site = SiteUrls::new(&config.site.base_url, &config.archive.artist)?;

    println!("=== Gallery Archive Dry Run ===\n");

    println!("Archive:");
    println!("  Artist: {}", config.archive.artist);
    println!("  Root: {}", config.archive.root_dir.display());

    println!("\nRequests:");
    println!("  Minimum interval: {}ms", config.throttle.min_interval_ms);
    println!(
        "  Retries: {} attempt(s), backoff {}ms x{} (max {}ms)",
        config.retry.max_attempts,
        config.retry.initial_backoff_ms,
        config.retry.backoff_multiplier,
        config.retry.max_backoff_ms
    );
    println!("  User agent: {}", config.user_agent.header_value());

    println!("\nFirst listing pages:");
    for section in Section::ALL {
        println!("  {}: {}", section, site.listing_url(section, 1)?);
    }

    println!("\nConfiguration hash: {}", compute_config_hash(config)?);
    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the archive run, racing it against Ctrl-C
async fn handle_archive(config: Config) -> anyhow::Result<ExitCode> {
    let root = config.archive.root_dir.clone();
    let run = ArchiveRun::from_config(&config).context("Failed to set up archive run")?;

    tracing::info!(
        "Archiving {} into {}",
        config.archive.artist,
        root.display()
    );

    tokio::select! {
        result = run.execute() => {
            let report = result.context("Archive run failed")?;
            print_run_report(&report);
            if report.is_complete() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(2))
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted; re-run the same command to resume");
            mark_interrupted(&root).context("Failed to record interruption")?;
            Ok(ExitCode::from(130))
        }
    }
}

/// Handles chunk export of an existing archive
fn handle_chunk(root: PathBuf, size: usize, output: Option<PathBuf>) -> anyhow::Result<()> {
    let store = ArchiveStore::open_existing(&root)
        .with_context(|| format!("Failed to open archive at {}", root.display()))?;
    let chunker = Chunker::new(size)?;
    let out_dir = output.unwrap_or_else(|| default_output_dir(&root, size));

    let plan = chunker
        .export(&store, &out_dir)
        .with_context(|| format!("Failed to write chunks to {}", out_dir.display()))?;
    print_chunk_plan(&plan, &out_dir);

    Ok(())
}
