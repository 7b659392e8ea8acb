//! HTML parsers for listing pages and item pages
//!
//! The crawler only depends on the [`ListingParser`] and [`SubmissionParser`]
//! traits. [`HtmlSiteParser`] implements both for the site's markup:
//! - Listing pages: item ids and whether a next page exists
//! - Submission pages: title, description, tags, posting date, media and thumbnail
//! - Journal pages: title, posting date and the body HTML stored as the media file

use crate::state::Section;
use chrono::{DateTime, NaiveDateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeSet;
use thiserror::Error;
use url::Url;

/// Error returned when a page does not have the expected shape
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("missing {0}")]
    MissingElement(&'static str),

    #[error("invalid {field}: '{value}'")]
    InvalidValue { field: &'static str, value: String },
}

/// Item ids found on one listing page, in page order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    pub item_ids: Vec<String>,

    /// True when the page has no link to a further page
    pub is_last_page: bool,
}

/// Where the media file of an item comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// Must be downloaded separately
    Remote(Url),

    /// Already contained in the item page (journal bodies)
    Inline { extension: String, bytes: Vec<u8> },
}

/// Structured content of one item page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSubmission {
    pub title: String,
    pub description: String,
    pub tags: BTreeSet<String>,
    pub posted_at: DateTime<Utc>,
    pub media: MediaSource,
    pub thumbnail_url: Option<Url>,
}

/// Extracts the ordered item ids of a listing page
pub trait ListingParser {
    fn parse_listing(&self, section: Section, content: &[u8]) -> Result<ListingPage, ParseError>;
}

/// Extracts metadata and the media source of an item page
pub trait SubmissionParser {
    fn parse_submission(
        &self,
        section: Section,
        content: &[u8],
        page_url: &Url,
    ) -> Result<ParsedSubmission, ParseError>;
}

/// Formats accepted for posting dates, after ordinal suffixes are removed
const DATE_FORMATS: &[&str] = &["%b %d, %Y %I:%M %p", "%b %d, %Y %H:%M"];

/// Parser for the site's HTML markup
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlSiteParser;

impl HtmlSiteParser {
    pub fn new() -> Self {
        Self
    }
}

impl ListingParser for HtmlSiteParser {
    fn parse_listing(&self, section: Section, content: &[u8]) -> Result<ListingPage, ParseError> {
        let html = String::from_utf8_lossy(content);
        let document = Html::parse_document(&html);

        let (item_css, prefix) = if section.has_submissions() {
            (r#"figure[id^="sid-"]"#, "sid-")
        } else {
            (r#"section[id^="jid:"]"#, "jid:")
        };

        let mut item_ids = Vec::new();
        for element in select_all(&document, item_css) {
            let id = element
                .value()
                .id()
                .and_then(|id| id.strip_prefix(prefix))
                .unwrap_or_default()
                .trim();
            if id.is_empty() {
                return Err(ParseError::InvalidValue {
                    field: "item id",
                    value: element.value().id().unwrap_or_default().to_string(),
                });
            }
            item_ids.push(id.to_string());
        }

        let is_last_page = !has_next_page_control(&document);
        Ok(ListingPage {
            item_ids,
            is_last_page,
        })
    }
}

impl SubmissionParser for HtmlSiteParser {
    fn parse_submission(
        &self,
        section: Section,
        content: &[u8],
        page_url: &Url,
    ) -> Result<ParsedSubmission, ParseError> {
        let html = String::from_utf8_lossy(content);
        let document = Html::parse_document(&html);

        if section.has_submissions() {
            parse_submission_page(&document, page_url)
        } else {
            parse_journal_page(&document)
        }
    }
}

fn parse_submission_page(document: &Html, page_url: &Url) -> Result<ParsedSubmission, ParseError> {
    let title = first_text(document, "div.submission-title h2")
        .ok_or(ParseError::MissingElement("title"))?;

    let description = first_element(document, "div.submission-description")
        .map(|element| element.inner_html().trim().to_string())
        .unwrap_or_default();

    let tags = select_all(document, "section.tags-row a")
        .iter()
        .map(element_text)
        .filter(|tag| !tag.is_empty())
        .collect();

    let posted_at = parse_posted_at(document)?;

    let href = first_element(document, "div.download a[href]")
        .and_then(|element| element.value().attr("href"))
        .ok_or(ParseError::MissingElement("download link"))?;
    let media_url = resolve_url(page_url, href, "download link")?;

    let thumbnail_url = first_element(document, "img#submissionImg[data-preview-src]")
        .and_then(|element| element.value().attr("data-preview-src"))
        .map(|src| resolve_url(page_url, src, "thumbnail url"))
        .transpose()?;

    Ok(ParsedSubmission {
        title,
        description,
        tags,
        posted_at,
        media: MediaSource::Remote(media_url),
        thumbnail_url,
    })
}

fn parse_journal_page(document: &Html) -> Result<ParsedSubmission, ParseError> {
    let title = first_text(document, ".journal-title")
        .ok_or(ParseError::MissingElement("journal title"))?;

    let body = first_element(document, "div.journal-content")
        .map(|element| element.inner_html().trim().to_string())
        .ok_or(ParseError::MissingElement("journal content"))?;

    let posted_at = parse_posted_at(document)?;

    Ok(ParsedSubmission {
        title,
        description: String::new(),
        tags: BTreeSet::new(),
        posted_at,
        media: MediaSource::Inline {
            extension: "html".to_string(),
            bytes: body.into_bytes(),
        },
        thumbnail_url: None,
    })
}

/// Reads the posting date from the `title` attribute of `span.popup_date`,
/// falling back to its text (which one holds the absolute date depends on
/// the viewer's settings)
fn parse_posted_at(document: &Html) -> Result<DateTime<Utc>, ParseError> {
    let element = first_element(document, "span.popup_date")
        .ok_or(ParseError::MissingElement("posting date"))?;

    let candidates = [
        element.value().attr("title").map(str::to_string),
        Some(element_text(&element)),
    ];

    let mut last_value = String::new();
    for value in candidates.into_iter().flatten() {
        if let Some(date) = parse_site_date(&value) {
            return Ok(date);
        }
        last_value = value;
    }

    Err(ParseError::InvalidValue {
        field: "posting date",
        value: last_value,
    })
}

/// Parses dates like `Sep 5th, 2021 03:12 PM` as UTC
pub fn parse_site_date(value: &str) -> Option<DateTime<Utc>> {
    let cleaned = value
        .split_whitespace()
        .map(strip_ordinal_suffix)
        .collect::<Vec<_>>()
        .join(" ");

    DATE_FORMATS.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(&cleaned, format)
            .ok()
            .map(|naive| naive.and_utc())
    })
}

fn strip_ordinal_suffix(token: &str) -> String {
    let (body, comma) = match token.strip_suffix(',') {
        Some(body) => (body, ","),
        None => (token, ""),
    };

    if body.starts_with(|c: char| c.is_ascii_digit()) {
        for suffix in ["st", "nd", "rd", "th"] {
            if let Some(digits) = body.strip_suffix(suffix) {
                if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                    return format!("{}{}", digits, comma);
                }
            }
        }
    }
    token.to_string()
}

/// Gallery pages end in a "Next" form button, journal pages in an "Older" link
fn has_next_page_control(document: &Html) -> bool {
    select_all(document, "form button, a.button")
        .iter()
        .map(|element| element_text(element).to_lowercase())
        .any(|label| label.starts_with("next") || label.starts_with("older"))
}

/// Returns the lowercased extension of the last path segment, or `bin`
pub fn file_extension(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 16 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| {
            tracing::warn!("Unknown file extension in {}", url);
            "bin".to_string()
        })
}

fn resolve_url(base: &Url, href: &str, field: &'static str) -> Result<Url, ParseError> {
    base.join(href.trim()).map_err(|_| ParseError::InvalidValue {
        field,
        value: href.to_string(),
    })
}

fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

fn first_element<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    select_all(document, css).into_iter().next()
}

fn first_text(document: &Html, css: &str) -> Option<String> {
    first_element(document, css)
        .map(|element| element_text(&element))
        .filter(|text| !text.is_empty())
}

fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
