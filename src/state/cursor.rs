use crate::state::Section;

/// Pagination state of one section within one run
///
/// Cursors are never persisted: every run starts again at page 1 and relies on
/// the archive store to make revisited pages cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    pub section: Section,

    /// 1-based number of the next listing page to fetch
    pub page_number: u32,

    /// Terminal for the section once set
    pub exhausted: bool,
}

impl PageCursor {
    /// Creates a cursor positioned at the first listing page
    pub fn new(section: Section) -> Self {
        Self {
            section,
            page_number: 1,
            exhausted: false,
        }
    }

    /// Moves to the next listing page after the current one was processed
    pub fn advance(&mut self) {
        if !self.exhausted {
            self.page_number += 1;
        }
    }

    /// Marks the section as fully walked
    pub fn exhaust(&mut self) {
        self.exhausted = true;
    }
}
