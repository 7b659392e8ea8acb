//! Pagination of one section
//!
//! A [`SectionCrawler`] walks the listing pages of one section from page 1,
//! archives every item the store does not have yet, and stops once a page
//! brings nothing new or says it is the last one. Item failures are counted
//! and skipped; only an unusable listing page aborts the section.

use crate::crawler::fetcher::{FetchError, PageFetcher};
use crate::crawler::parser::{
    file_extension, ListingParser, MediaSource, ParseError, SubmissionParser,
};
use crate::crawler::retry::RetryPolicy;
use crate::crawler::site::SiteUrls;
use crate::crawler::throttle::Throttle;
use crate::state::{PageCursor, Section};
use crate::storage::{ItemStore, MediaPayload, PendingItem, SectionRecord, StoreError};
use chrono::Utc;
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

/// Why a single item could not be archived
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("{0}")]
    Fetch(#[from] FetchError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("write error: {0}")]
    Write(#[from] StoreError),
}

impl ItemError {
    /// Short failure class stored in the run journal
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch(_) => "fetch",
            Self::Parse(_) => "parse",
            Self::Write(_) => "write",
        }
    }
}

/// An item that failed and was skipped
#[derive(Debug)]
pub struct ItemFailure {
    pub id: String,
    pub error: ItemError,
}

/// How a section crawl ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionOutcome {
    /// Every listing page was walked
    Exhausted,

    /// A listing page could not be fetched or parsed
    Aborted { reason: String },
}

impl SectionOutcome {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Exhausted => "exhausted",
            Self::Aborted { .. } => "aborted",
        }
    }
}

/// Summary of one section crawl
#[derive(Debug)]
pub struct SectionReport {
    pub section: Section,
    pub outcome: SectionOutcome,
    pub pages_fetched: u32,
    pub archived: u32,
    pub already_archived: u32,
    pub failures: Vec<ItemFailure>,
}

impl SectionReport {
    fn new(section: Section) -> Self {
        Self {
            section,
            outcome: SectionOutcome::Exhausted,
            pages_fetched: 0,
            archived: 0,
            already_archived: 0,
            failures: Vec::new(),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.outcome == SectionOutcome::Exhausted
    }

    /// Converts the report into the row stored in the run journal
    pub fn to_record(&self, run_id: i64) -> SectionRecord {
        SectionRecord {
            run_id,
            section: self.section,
            outcome: self.outcome.to_db_string().to_string(),
            pages_fetched: self.pages_fetched,
            archived: self.archived,
            already_archived: self.already_archived,
            failed: self.failures.len() as u32,
            error_message: match &self.outcome {
                SectionOutcome::Exhausted => None,
                SectionOutcome::Aborted { reason } => Some(reason.clone()),
            },
        }
    }
}

enum ItemOutcome {
    Archived,
    AlreadyArchived,
}

/// Crawls one section to completion
pub struct SectionCrawler<'a, F, P, S> {
    site: &'a SiteUrls,
    fetcher: &'a F,
    parser: &'a P,
    store: &'a mut S,
    throttle: &'a mut Throttle,
    retry: &'a RetryPolicy,
    cursor: PageCursor,
}

impl<'a, F, P, S> SectionCrawler<'a, F, P, S>
where
    F: PageFetcher,
    P: ListingParser + SubmissionParser,
    S: ItemStore,
{
    pub fn new(
        section: Section,
        site: &'a SiteUrls,
        fetcher: &'a F,
        parser: &'a P,
        store: &'a mut S,
        throttle: &'a mut Throttle,
        retry: &'a RetryPolicy,
    ) -> Self {
        Self {
            site,
            fetcher,
            parser,
            store,
            throttle,
            retry,
            cursor: PageCursor::new(section),
        }
    }

    /// Walks the section from page 1 until it is exhausted or aborted
    pub async fn crawl(mut self) -> SectionReport {
        let section = self.cursor.section;
        let mut report = SectionReport::new(section);
        let mut seen: HashSet<String> = HashSet::new();

        tracing::info!("Crawling {} of {}", section, self.site.artist());

        while !self.cursor.exhausted {
            let page = self.cursor.page_number;

            let content = match self.fetch_listing(page).await {
                Ok(content) => content,
                Err(reason) => {
                    tracing::error!("Aborting {} at page {}: {}", section, page, reason);
                    report.outcome = SectionOutcome::Aborted { reason };
                    return report;
                }
            };
            report.pages_fetched += 1;

            let listing = match self.parser.parse_listing(section, &content) {
                Ok(listing) => listing,
                Err(e) => {
                    let reason = format!("listing page {} could not be parsed: {}", page, e);
                    tracing::error!("Aborting {}: {}", section, reason);
                    report.outcome = SectionOutcome::Aborted { reason };
                    return report;
                }
            };

            let fresh: Vec<String> = listing
                .item_ids
                .into_iter()
                .filter(|id| seen.insert(id.clone()))
                .collect();

            tracing::debug!(
                "{} page {}: {} new item(s), last page: {}",
                section,
                page,
                fresh.len(),
                listing.is_last_page
            );

            if fresh.is_empty() {
                self.cursor.exhaust();
                break;
            }

            for id in fresh {
                match self.archive_item(&id).await {
                    Ok(ItemOutcome::Archived) => {
                        tracing::info!("Archived {} {}", section, id);
                        report.archived += 1;
                    }
                    Ok(ItemOutcome::AlreadyArchived) => {
                        report.already_archived += 1;
                    }
                    Err(error) => {
                        tracing::warn!("Skipping {} {}: {}", section, id, error);
                        report.failures.push(ItemFailure { id, error });
                    }
                }
            }

            if listing.is_last_page {
                self.cursor.exhaust();
            } else {
                self.cursor.advance();
            }
        }

        tracing::info!(
            "Finished {}: {} page(s), {} archived, {} already present, {} failed",
            section,
            report.pages_fetched,
            report.archived,
            report.already_archived,
            report.failures.len()
        );
        report
    }

    async fn fetch_listing(&mut self, page: u32) -> Result<Vec<u8>, String> {
        let url = self
            .site
            .listing_url(self.cursor.section, page)
            .map_err(|e| e.to_string())?;
        self.fetch_with_retry(&url).await.map_err(|e| e.to_string())
    }

    async fn archive_item(&mut self, id: &str) -> Result<ItemOutcome, ItemError> {
        let section = self.cursor.section;
        if self.store.has(section, id)? {
            return Ok(ItemOutcome::AlreadyArchived);
        }

        let item_url = self.site.item_url(section, id)?;
        let page = self.fetch_with_retry(&item_url).await?;
        let parsed = self.parser.parse_submission(section, &page, &item_url)?;

        let (media, media_url) = match parsed.media {
            MediaSource::Remote(url) => {
                let bytes = self.fetch_with_retry(&url).await?;
                let payload = MediaPayload {
                    extension: file_extension(&url),
                    bytes,
                };
                (payload, Some(url.to_string()))
            }
            MediaSource::Inline { extension, bytes } => (MediaPayload { extension, bytes }, None),
        };

        let thumbnail = match &parsed.thumbnail_url {
            Some(url) => Some(MediaPayload {
                extension: file_extension(url),
                bytes: self.fetch_with_retry(url).await?,
            }),
            None => None,
        };

        self.store.put(PendingItem {
            section,
            id: id.to_string(),
            title: parsed.title,
            description: parsed.description,
            tags: parsed.tags,
            posted_at: parsed.posted_at,
            media_url,
            thumbnail_url: parsed.thumbnail_url.map(|url| url.to_string()),
            archived_at: Utc::now(),
            media,
            thumbnail,
        })?;

        Ok(ItemOutcome::Archived)
    }

    /// Fetches through the throttle, retrying transient failures with backoff
    async fn fetch_with_retry(&mut self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let mut attempt = 1;
        loop {
            self.throttle.wait_turn().await;

            match self.fetcher.fetch(url).await {
                Ok(content) => return Ok(content),
                Err(e) if e.is_transient() && attempt < self.retry.max_attempts() => {
                    let delay = self.retry.backoff_for(attempt);
                    tracing::warn!(
                        "Attempt {}/{} failed ({}), retrying in {:?}",
                        attempt,
                        self.retry.max_attempts(),
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
