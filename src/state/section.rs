/// Section definitions for the three independent content streams of an artist
use serde::{Deserialize, Serialize};
use std::fmt;

/// One independent pagination stream within an artist's archive
///
/// The declaration order is the archive order: sections are crawled and
/// chunked Gallery first, then Scraps, then Journals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    /// Main gallery submissions
    Gallery,

    /// Scraps submissions
    Scraps,

    /// Journal posts
    Journals,
}

impl Section {
    /// All sections in archive order
    pub const ALL: [Section; 3] = [Section::Gallery, Section::Scraps, Section::Journals];

    /// Name used for directories, URLs and the run journal
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gallery => "gallery",
            Self::Scraps => "scraps",
            Self::Journals => "journals",
        }
    }

    /// Parses a section from its textual name
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "gallery" => Some(Self::Gallery),
            "scraps" => Some(Self::Scraps),
            "journals" => Some(Self::Journals),
            _ => None,
        }
    }

    /// Returns true for sections whose items are submissions with a media file
    pub fn has_submissions(&self) -> bool {
        matches!(self, Self::Gallery | Self::Scraps)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
