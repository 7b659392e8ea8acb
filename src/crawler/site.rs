//! URL layout of the remote site

use crate::crawler::FetchError;
use crate::state::Section;
use url::Url;

/// Builds listing and item URLs for one artist
#[derive(Debug, Clone)]
pub struct SiteUrls {
    base: Url,
    artist: String,
}

impl SiteUrls {
    /// # Arguments
    ///
    /// * `base_url` - Site root, e.g. `https://www.furaffinity.net`
    /// * `artist` - Artist name as it appears in gallery URLs
    pub fn new(base_url: &str, artist: &str) -> Result<Self, url::ParseError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            base,
            artist: artist.to_string(),
        })
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    /// `<base>/<section>/<artist>/<page>/`
    pub fn listing_url(&self, section: Section, page: u32) -> Result<Url, FetchError> {
        self.join(&format!("{}/{}/{}/", section.as_str(), self.artist, page))
    }

    /// `<base>/view/<id>/` for submissions, `<base>/journal/<id>/` for journals
    pub fn item_url(&self, section: Section, id: &str) -> Result<Url, FetchError> {
        let kind = if section.has_submissions() {
            "view"
        } else {
            "journal"
        };
        self.join(&format!("{}/{}/", kind, id))
    }

    fn join(&self, path: &str) -> Result<Url, FetchError> {
        self.base.join(path).map_err(|e| FetchError::Permanent {
            url: format!("{}{}", self.base, path),
            reason: e.to_string(),
        })
    }
}
