use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for an archive run
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub archive: ArchiveConfig,
    pub site: SiteConfig,
    pub throttle: ThrottleConfig,
    pub retry: RetryConfig,
    pub chunk: ChunkConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
}

/// Which artist to archive and where
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Artist name as it appears in gallery URLs
    pub artist: String,

    /// Root directory of the archive for this artist
    #[serde(rename = "root-dir")]
    pub root_dir: PathBuf,
}

/// Remote site configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Base URL listing and item URLs are built from
    #[serde(rename = "base-url")]
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.furaffinity.net".to_string(),
        }
    }
}

/// Request pacing configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Minimum time between two outgoing requests (milliseconds)
    #[serde(rename = "min-interval-ms")]
    pub min_interval_ms: u64,
}

impl ThrottleConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 5000,
        }
    }
}

/// Retry behavior for transient fetch failures
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per URL, including the first one
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt (milliseconds)
    #[serde(rename = "initial-backoff-ms")]
    pub initial_backoff_ms: u64,

    /// Factor applied to the delay after every failed attempt
    #[serde(rename = "backoff-multiplier")]
    pub backoff_multiplier: u32,

    /// Upper bound for a single delay (milliseconds)
    #[serde(rename = "max-backoff-ms")]
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_backoff_ms: 2000,
            backoff_multiplier: 2,
            max_backoff_ms: 60_000,
        }
    }
}

/// Chunk export configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChunkConfig {
    /// Maximum number of items per chunk
    pub size: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self { size: 50 }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", skip_serializing_if = "Option::is_none")]
    pub contact_url: Option<String>,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email", skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        let mut contact = Vec::new();
        if let Some(url) = &self.contact_url {
            contact.push(format!("+{}", url));
        }
        if let Some(email) = &self.contact_email {
            contact.push(email.clone());
        }

        if contact.is_empty() {
            format!("{}/{}", self.crawler_name, self.crawler_version)
        } else {
            format!(
                "{}/{} ({})",
                self.crawler_name,
                self.crawler_version,
                contact.join("; ")
            )
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "gallery-archive".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
            contact_email: None,
        }
    }
}
