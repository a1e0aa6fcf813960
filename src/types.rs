//! Lightweight records extracted from listing pages

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of items the archive renders per listing page
pub const PAGE_SIZE: usize = 20;

/// A stand-in for a work or series that was seen in a listing.
///
/// Only the id and, when the listing shows one, the title are known.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ItemReference {
    Work { id: u64, title: Option<String> },
    Series { id: u64, title: Option<String> },
}

impl ItemReference {
    pub fn id(&self) -> u64 {
        match self {
            ItemReference::Work { id, .. } | ItemReference::Series { id, .. } => *id,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            ItemReference::Work { title, .. } | ItemReference::Series { title, .. } => {
                title.as_deref()
            }
        }
    }

    pub fn is_work(&self) -> bool {
        matches!(self, ItemReference::Work { .. })
    }

    pub(crate) fn with_title(self, new_title: Option<String>) -> Self {
        match self {
            ItemReference::Work { id, .. } => ItemReference::Work { id, title: new_title },
            ItemReference::Series { id, .. } => ItemReference::Series { id, title: new_title },
        }
    }
}

impl fmt::Display for ItemReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (kind, id, title) = match self {
            ItemReference::Work { id, title } => ("Work", id, title),
            ItemReference::Series { id, title } => ("Series", id, title),
        };
        match title {
            Some(title) => write!(f, "<{kind} [{title}]>"),
            None => write!(f, "<{kind} [{id}]>"),
        }
    }
}

/// One item of a moderation queue, addressed by its logical index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// 1-based position across all pages of the queue
    pub index: usize,
    pub item: ItemReference,
    /// Internal collection item id, the key of the moderation form fields
    pub marker: Option<u64>,
}

/// Result of enumerating a moderation queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueListing {
    /// The queue has nothing to review
    Empty,
    Items(Vec<QueueEntry>),
}

impl QueueListing {
    pub fn entries(&self) -> &[QueueEntry] {
        match self {
            QueueListing::Empty => &[],
            QueueListing::Items(entries) => entries,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// Where a logical item index lives in the paginated listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePosition {
    /// Zero-based page index
    pub page: usize,
    /// 1-based position of the item on that page
    pub offset: usize,
}

impl PagePosition {
    /// Maps a 1-based logical index onto its page. Index 0 is treated as 1.
    pub fn of(index: usize) -> Self {
        let zero_based = index.saturating_sub(1);
        PagePosition {
            page: zero_based / PAGE_SIZE,
            offset: zero_based % PAGE_SIZE + 1,
        }
    }

    /// Page number as used in `?page=N` urls
    pub fn page_number(&self) -> usize {
        self.page + 1
    }

    /// Logical index of the first item on this page
    pub fn first_index(&self) -> usize {
        self.page * PAGE_SIZE + 1
    }
}
