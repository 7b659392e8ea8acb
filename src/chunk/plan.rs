use crate::chunk::{ChunkError, ChunkResult};
use crate::state::Section;
use crate::storage::{ArchiveStore, ItemRecord};
use std::cmp::Ordering;

/// A consecutive group of items imported together
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// 0-based position in the plan
    pub index: usize,
    pub items: Vec<ItemRecord>,
}

/// Ordered partition of an archive into chunks of at most `size_limit` items
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkPlan {
    pub size_limit: usize,
    pub chunks: Vec<Chunk>,
}

impl ChunkPlan {
    pub fn item_count(&self) -> usize {
        self.chunks.iter().map(|c| c.items.len()).sum()
    }

    /// All items in plan order
    pub fn items(&self) -> impl Iterator<Item = &ItemRecord> {
        self.chunks.iter().flat_map(|c| c.items.iter())
    }
}

/// Reads every entry of the archive in its total order
///
/// Sections in archive order, then by archival time, then by id. Numeric ids
/// sort by value so that `9` comes before `10`, and before any other id.
pub fn ordered_items(store: &ArchiveStore) -> ChunkResult<Vec<ItemRecord>> {
    let mut items = Vec::new();
    for section in Section::ALL {
        items.extend(store.entries(section)?);
    }
    items.sort_by(compare_items);
    Ok(items)
}

/// Splits items, already in their total order, into consecutive chunks
///
/// Produces `ceil(N / size_limit)` chunks; every chunk but the last holds
/// exactly `size_limit` items.
pub fn plan_chunks(items: Vec<ItemRecord>, size_limit: usize) -> ChunkResult<ChunkPlan> {
    if size_limit == 0 {
        return Err(ChunkError::InvalidSize(size_limit));
    }

    let chunks = items
        .chunks(size_limit)
        .enumerate()
        .map(|(index, items)| Chunk {
            index,
            items: items.to_vec(),
        })
        .collect();

    Ok(ChunkPlan { size_limit, chunks })
}

fn compare_items(a: &ItemRecord, b: &ItemRecord) -> Ordering {
    a.section
        .cmp(&b.section)
        .then_with(|| a.archived_at.cmp(&b.archived_at))
        .then_with(|| compare_ids(&a.id, &b.id))
}

/// Numeric ids first, by value then by text; all other ids after them, by text
fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>().ok(), b.parse::<u64>().ok()) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}
