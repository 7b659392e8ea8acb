//! Configuration module for Gallery Archive
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and merging command-line overrides on top of them.
//!
//! # Example
//!
//! ```no_run
//! use gallery_archive::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("archive.toml")).unwrap();
//! println!("Throttle interval: {}ms", config.throttle.min_interval_ms);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ArchiveConfig, ChunkConfig, Config, RetryConfig, SiteConfig, ThrottleConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, resolve_config, ConfigOverrides};
pub use validation::{validate_artist, validate_chunk_size, MAX_CHUNK_SIZE};
