//! HTTP fetcher implementation
//!
//! This module handles every request the archiver sends, including:
//! - Building HTTP clients with proper user agent strings
//! - Attaching the site session cookies
//! - Classifying failures as transient (retried) or permanent

use crate::config::UserAgentConfig;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Environment variable holding the value of the site's `a` session cookie
pub const COOKIE_A_ENV: &str = "GALLERY_ARCHIVE_A_COOKIE";

/// Environment variable holding the value of the site's `b` session cookie
pub const COOKIE_B_ENV: &str = "GALLERY_ARCHIVE_B_COOKIE";

/// Error returned by a [`PageFetcher`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Timeouts, connection failures, 5xx-class responses; worth retrying
    #[error("transient failure fetching {url}: {reason}")]
    Transient { url: String, reason: String },

    /// Authentication, permission and not-found failures; never retried
    #[error("permanent failure fetching {url}: {reason}")]
    Permanent { url: String, reason: String },
}

impl FetchError {
    pub fn transient(url: &Url, reason: impl Into<String>) -> Self {
        Self::Transient {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    pub fn permanent(url: &Url, reason: impl Into<String>) -> Self {
        Self::Permanent {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// Retrieves raw page or media content for a URL
///
/// Implementations own every HTTP and session concern. The crawler only sees
/// bytes or a classified [`FetchError`].
pub trait PageFetcher {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<Vec<u8>, FetchError>>;
}

impl<T: PageFetcher> PageFetcher for &T {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<Vec<u8>, FetchError>> {
        (**self).fetch(url)
    }
}

/// Session cookies used to authenticate against the site
///
/// Restricted submissions are only visible to logged-in accounts, so the
/// values of the `a` and `b` cookies of a browser session can be supplied.
#[derive(Debug, Clone, Default)]
pub struct SessionCookies {
    pub a: Option<String>,
    pub b: Option<String>,
}

impl SessionCookies {
    /// Reads the cookies from `GALLERY_ARCHIVE_A_COOKIE` and `GALLERY_ARCHIVE_B_COOKIE`
    pub fn from_env() -> Self {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            a: read(COOKIE_A_ENV),
            b: read(COOKIE_B_ENV),
        }
    }

    /// Formats the `Cookie` header, or None when no cookie is set
    pub fn header_value(&self) -> Option<String> {
        let pairs: Vec<String> = [("a", &self.a), ("b", &self.b)]
            .into_iter()
            .filter_map(|(name, value)| value.as_ref().map(|v| format!("{}={}", name, v)))
            .collect();

        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use gallery_archive::config::UserAgentConfig;
/// use gallery_archive::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(Duration::from_secs(60))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`PageFetcher`] over a shared `reqwest` client
pub struct HttpFetcher {
    client: Client,
    cookie_header: Option<String>,
}

impl HttpFetcher {
    /// Creates a fetcher identifying itself with `user_agent`
    pub fn new(user_agent: &UserAgentConfig, cookies: SessionCookies) -> Result<Self, reqwest::Error> {
        let cookie_header = cookies.header_value();
        if cookie_header.is_none() {
            tracing::info!("No session cookies set, fetching as a guest");
        }

        Ok(Self {
            client: build_http_client(user_agent)?,
            cookie_header,
        })
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        tracing::debug!("GET {}", url);

        let mut request = self.client.get(url.clone());
        if let Some(cookie) = &self.cookie_header {
            request = request.header(reqwest::header::COOKIE, cookie);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_request_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(url, status));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::transient(url, format!("reading body: {}", e)))?;

        tracing::debug!("{} -> {} bytes", url, body.len());
        Ok(body.to_vec())
    }
}

/// Maps a non-success HTTP status to a fetch error
///
/// | Status | Classification |
/// |--------|----------------|
/// | 408, 429, 5xx | Transient |
/// | 401, 403, 404, other 4xx | Permanent |
pub fn classify_status(url: &Url, status: StatusCode) -> FetchError {
    let reason = format!("HTTP {}", status.as_u16());

    if status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
    {
        FetchError::transient(url, reason)
    } else {
        FetchError::permanent(url, reason)
    }
}

fn classify_request_error(url: &Url, error: &reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::transient(url, "request timeout")
    } else if error.is_connect() {
        FetchError::transient(url, "connection failed")
    } else if error.is_redirect() {
        FetchError::permanent(url, format!("redirect error: {}", error))
    } else if error.is_builder() {
        FetchError::permanent(url, error.to_string())
    } else {
        FetchError::transient(url, error.to_string())
    }
}
