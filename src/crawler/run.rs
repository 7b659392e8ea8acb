//! Archive run orchestration
//!
//! An [`ArchiveRun`] is the top-level resumable unit: it crawls gallery,
//! scraps and journals of one artist, in that order, into one archive root
//! and records the outcome in the root's run journal. Invoking it again with
//! the same artist and root continues where the previous invocation stopped.

use crate::config::{compute_config_hash, Config, ThrottleConfig};
use crate::crawler::fetcher::{HttpFetcher, PageFetcher, SessionCookies};
use crate::crawler::parser::{HtmlSiteParser, ListingParser, SubmissionParser};
use crate::crawler::retry::RetryPolicy;
use crate::crawler::section::{SectionCrawler, SectionReport};
use crate::crawler::site::SiteUrls;
use crate::crawler::throttle::Throttle;
use crate::state::Section;
use crate::storage::{ArchiveStore, RunJournal, RunStatus, JOURNAL_FILE};
use crate::{ArchiveError, ConfigError, Result};
use std::path::{Path, PathBuf};

/// Result of one archive run
#[derive(Debug)]
pub struct RunReport {
    pub run_id: i64,
    pub artist: String,
    pub root: PathBuf,
    pub sections: Vec<SectionReport>,
}

impl RunReport {
    /// True when every section was walked to its end
    pub fn is_complete(&self) -> bool {
        self.sections.iter().all(SectionReport::is_exhausted)
    }

    /// Sections that were aborted
    pub fn failed_sections(&self) -> Vec<Section> {
        self.sections
            .iter()
            .filter(|report| !report.is_exhausted())
            .map(|report| report.section)
            .collect()
    }

    pub fn status(&self) -> RunStatus {
        if self.is_complete() {
            RunStatus::Completed
        } else {
            RunStatus::Partial
        }
    }

    pub fn total_archived(&self) -> u32 {
        self.sections.iter().map(|s| s.archived).sum()
    }

    pub fn total_failures(&self) -> usize {
        self.sections.iter().map(|s| s.failures.len()).sum()
    }
}

/// Archives all sections of one artist into one root directory
pub struct ArchiveRun<F, P> {
    root: PathBuf,
    site: SiteUrls,
    fetcher: F,
    parser: P,
    throttle: Throttle,
    retry: RetryPolicy,
    config_hash: String,
}

impl ArchiveRun<HttpFetcher, HtmlSiteParser> {
    /// Builds a run over HTTP from a validated configuration
    ///
    /// Session cookies are read from the environment.
    pub fn from_config(config: &Config) -> Result<Self> {
        let site = SiteUrls::new(&config.site.base_url, &config.archive.artist)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", config.site.base_url, e)))?;
        let fetcher = HttpFetcher::new(&config.user_agent, SessionCookies::from_env())?;

        Ok(Self::new(&config.archive.root_dir, site, fetcher, HtmlSiteParser::new())
            .with_throttle(Throttle::new(config.throttle.min_interval()))
            .with_retry_policy(RetryPolicy::from(&config.retry))
            .with_config_hash(compute_config_hash(config)?))
    }
}

impl<F, P> ArchiveRun<F, P>
where
    F: PageFetcher,
    P: ListingParser + SubmissionParser,
{
    /// Creates a run with the default throttle interval and retry policy
    pub fn new(root: &Path, site: SiteUrls, fetcher: F, parser: P) -> Self {
        let throttle = Throttle::new(ThrottleConfig::default().min_interval());

        Self {
            root: root.to_path_buf(),
            site,
            fetcher,
            parser,
            throttle,
            retry: RetryPolicy::default(),
            config_hash: String::new(),
        }
    }

    pub fn with_throttle(mut self, throttle: Throttle) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_config_hash(mut self, config_hash: String) -> Self {
        self.config_hash = config_hash;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Runs all three sections and returns the summary
    ///
    /// # Returns
    ///
    /// * `Ok(RunReport)` - The run finished; sections may still have been aborted
    /// * `Err(ArchiveError)` - The root, store or journal could not be set up,
    ///   or the root belongs to another artist
    pub async fn execute(mut self) -> Result<RunReport> {
        let artist = self.site.artist().to_string();

        std::fs::create_dir_all(&self.root)?;
        let mut journal = RunJournal::open(&self.root.join(JOURNAL_FILE))?;

        match journal.bound_artist()? {
            Some(bound) if !bound.eq_ignore_ascii_case(&artist) => {
                return Err(ArchiveError::ArtistMismatch {
                    bound,
                    requested: artist,
                });
            }
            Some(_) => {}
            None => {
                tracing::info!("Binding {} to artist {}", self.root.display(), artist);
                journal.bind_artist(&artist)?;
            }
        }

        let mut store = ArchiveStore::open(&self.root)?;

        let stale = journal.mark_stale_runs_interrupted()?;
        if stale > 0 {
            tracing::warn!("Marked {} unfinished earlier run(s) as interrupted", stale);
        }

        let run_id = journal.create_run(&artist, &self.config_hash)?;
        tracing::info!(
            "Starting run {} for {} into {} (min interval {:?})",
            run_id,
            artist,
            self.root.display(),
            self.throttle.min_interval()
        );

        let mut sections = Vec::with_capacity(Section::ALL.len());
        for section in Section::ALL {
            let report = SectionCrawler::new(
                section,
                &self.site,
                &self.fetcher,
                &self.parser,
                &mut store,
                &mut self.throttle,
                &self.retry,
            )
            .crawl()
            .await;

            journal.record_section(&report.to_record(run_id))?;
            for failure in &report.failures {
                journal.record_item_failure(
                    run_id,
                    section,
                    &failure.id,
                    failure.error.kind(),
                    &failure.error.to_string(),
                )?;
            }
            sections.push(report);
        }

        let report = RunReport {
            run_id,
            artist,
            root: self.root,
            sections,
        };
        journal.finish_run(run_id, report.status())?;

        if report.is_complete() {
            tracing::info!("Run {} completed", run_id);
        } else {
            tracing::warn!(
                "Run {} partially completed, failed sections: {:?}",
                run_id,
                report.failed_sections()
            );
        }

        Ok(report)
    }
}

/// Marks runs left `running` in an archive root as interrupted
///
/// Used after the process was asked to stop in the middle of a run.
pub fn mark_interrupted(root: &Path) -> Result<usize> {
    let path = root.join(JOURNAL_FILE);
    if !path.exists() {
        return Ok(0);
    }
    let mut journal = RunJournal::open(&path)?;
    Ok(journal.mark_stale_runs_interrupted()?)
}
