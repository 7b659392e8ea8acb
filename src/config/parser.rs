use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Overrides supplied on the command line, applied on top of the file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub artist: Option<String>,
    pub root_dir: Option<PathBuf>,
    pub min_interval_ms: Option<u64>,
}

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use gallery_archive::config::load_config;
///
/// let config = load_config(Path::new("archive.toml")).unwrap();
/// println!("Archiving: {}", config.archive.artist);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let config = read_config(path)?;
    validate(&config)?;
    Ok(config)
}

/// Builds the effective configuration from an optional file plus overrides
///
/// Sections missing from the file fall back to their defaults, so a run can be
/// described entirely by `--artist` and `--root`.
pub fn resolve_config(
    path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => Config::default(),
    };

    if let Some(artist) = &overrides.artist {
        config.archive.artist = artist.clone();
    }
    if let Some(root_dir) = &overrides.root_dir {
        config.archive.root_dir = root_dir.clone();
    }
    if let Some(min_interval_ms) = overrides.min_interval_ms {
        config.throttle.min_interval_ms = min_interval_ms;
    }

    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the effective configuration
///
/// Stored with every run so the journal shows which settings produced it.
pub fn compute_config_hash(config: &Config) -> Result<String, ConfigError> {
    let content = toml::to_string(config)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}
