use crate::config::types::{
    ArchiveConfig, ChunkConfig, Config, RetryConfig, SiteConfig, ThrottleConfig, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Smallest accepted request spacing; anything faster risks a ban
pub const MIN_THROTTLE_INTERVAL_MS: u64 = 500;

/// Largest chunk size; chunk directories are numbered with five digits
pub const MAX_CHUNK_SIZE: usize = 99_999;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_archive_config(&config.archive)?;
    validate_site_config(&config.site)?;
    validate_throttle_config(&config.throttle)?;
    validate_retry_config(&config.retry)?;
    validate_chunk_config(&config.chunk)?;
    validate_user_agent_config(&config.user_agent)?;
    Ok(())
}

/// Validates the artist and root directory
fn validate_archive_config(config: &ArchiveConfig) -> Result<(), ConfigError> {
    validate_artist(&config.artist)?;

    if config.root_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "root_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates an artist name as used in listing URLs
pub fn validate_artist(artist: &str) -> Result<(), ConfigError> {
    if artist.is_empty() {
        return Err(ConfigError::Validation("artist cannot be empty".to_string()));
    }

    if !artist
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '~'))
    {
        return Err(ConfigError::Validation(format!(
            "artist must contain only alphanumeric characters and '-', '_', '.', '~', got '{}'",
            artist
        )));
    }

    Ok(())
}

fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    Ok(())
}

fn validate_throttle_config(config: &ThrottleConfig) -> Result<(), ConfigError> {
    if config.min_interval_ms < MIN_THROTTLE_INTERVAL_MS {
        return Err(ConfigError::Validation(format!(
            "min_interval_ms must be >= {}ms, got {}ms",
            MIN_THROTTLE_INTERVAL_MS, config.min_interval_ms
        )));
    }
    Ok(())
}

fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.backoff_multiplier < 1 {
        return Err(ConfigError::Validation(format!(
            "backoff_multiplier must be >= 1, got {}",
            config.backoff_multiplier
        )));
    }

    if config.max_backoff_ms < config.initial_backoff_ms {
        return Err(ConfigError::Validation(format!(
            "max_backoff_ms ({}) must be >= initial_backoff_ms ({})",
            config.max_backoff_ms, config.initial_backoff_ms
        )));
    }

    Ok(())
}

fn validate_chunk_config(config: &ChunkConfig) -> Result<(), ConfigError> {
    validate_chunk_size(config.size)
}

/// Validates a chunk size
pub fn validate_chunk_size(size: usize) -> Result<(), ConfigError> {
    if size < 1 || size > MAX_CHUNK_SIZE {
        return Err(ConfigError::Validation(format!(
            "chunk size must be between 1 and {}, got {}",
            MAX_CHUNK_SIZE, size
        )));
    }
    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    if let Some(email) = &config.contact_email {
        validate_email(email)?;
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
