//! Crawler module for archiving an artist's pages
//!
//! This module contains the core archiving logic, including:
//! - HTTP fetching and failure classification
//! - HTML parsing of listing and item pages
//! - Request pacing and retry with backoff
//! - Section pagination and run orchestration

mod fetcher;
mod parser;
mod retry;
mod run;
mod section;
mod site;
mod throttle;

pub use fetcher::{
    build_http_client, classify_status, FetchError, HttpFetcher, PageFetcher, SessionCookies,
    COOKIE_A_ENV, COOKIE_B_ENV,
};
pub use parser::{
    file_extension, parse_site_date, HtmlSiteParser, ListingPage, ListingParser, MediaSource,
    ParseError, ParsedSubmission, SubmissionParser,
};
pub use retry::RetryPolicy;
pub use run::{mark_interrupted, ArchiveRun, RunReport};
pub use section::{ItemError, ItemFailure, SectionCrawler, SectionOutcome, SectionReport};
pub use site::SiteUrls;
pub use throttle::Throttle;
