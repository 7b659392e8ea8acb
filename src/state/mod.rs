//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `Section`: the three content streams of an artist (gallery, scraps, journals)
//! - `PageCursor`: per-section pagination state for one run

mod cursor;
mod section;

// Re-export main types
pub use cursor::PageCursor;
pub use section::Section;
