//! Walks listing pages and numbers their items
//!
//! Moderation listings carry no item numbers of their own. The indexer
//! visits pages in ascending order, items in document order, and that total
//! order is the logical index used to address items for moderation.

use crate::collection::filter::page_url;
use crate::collection::pagination::{fetch_listing, page_count_in};
use crate::errors::{Ao3ApiError, Result};
use crate::extraction::{extract_page_token, parse_heading, parse_item_banner};
use crate::networking::Session;
use crate::types::{ItemReference, PAGE_SIZE, PagePosition, QueueEntry, QueueListing};
use crate::utils::{arcify, make_selector, safe_static_selector, trailing_number};
use crate::{define_selector, make_static};
use log::debug;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

define_selector!(
    ITEM_LIST_SELECTOR,
    ITEM_LIST_SELECTOR_TEXT,
    r#"ul.collection.index.group"#
);
define_selector!(
    ITEM_HEADING_SELECTOR,
    ITEM_HEADING_SELECTOR_TEXT,
    r#"h4.heading"#
);
define_selector!(
    WORK_LIST_SELECTOR,
    WORK_LIST_SELECTOR_TEXT,
    r#"ol.work.index.group"#
);
define_selector!(
    BOOKMARK_LIST_SELECTOR,
    BOOKMARK_LIST_SELECTOR_TEXT,
    r#"ol.bookmark.index.group"#
);
define_selector!(
    ARTICLE_SELECTOR,
    ARTICLE_SELECTOR_TEXT,
    r#"li[role="article"]"#
);

/// Class carried by the second, admin-only heading every moderation row renders
const ADMIN_ROW_CLASS: &str = "landmark";
const ITEM_ID_PREFIX: &str = "collection_item_";

/// One addressable item on a moderation page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageItem {
    pub item: ItemReference,
    pub marker: Option<u64>,
}

/// What a single moderation page yields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    /// Authenticity token the page was rendered with
    pub token: Option<String>,
    /// `None` when the item list container is missing from the page
    pub items: Option<Vec<PageItem>>,
}

fn is_admin_row(heading: &ElementRef<'_>) -> bool {
    heading.value().classes().any(|class| class == ADMIN_ROW_CLASS)
}

/// Internal id of the collection item a heading belongs to, read off the enclosing `li`
fn marker_of(heading: &ElementRef<'_>) -> Option<u64> {
    let mut node = heading.parent();
    while let Some(current) = node {
        let marker = ElementRef::wrap(current)
            .and_then(|element| element.value().id())
            .filter(|id| id.starts_with(ITEM_ID_PREFIX))
            .and_then(trailing_number);
        if marker.is_some() {
            return marker;
        }
        node = current.parent();
    }
    None
}

impl ListingPage {
    /// Extracts token and items from a fetched moderation page.
    ///
    /// Every item renders two headings; the admin-row one is skipped so each
    /// item is counted once. Headings without a work or series link are layout
    /// placeholders and are dropped.
    pub fn parse(document: &Html) -> Result<ListingPage> {
        let token = extract_page_token(document);
        let container = safe_static_selector(ITEM_LIST_SELECTOR.clone(), ITEM_LIST_SELECTOR_TEXT)?;
        let Some(list) = document.select(&container).next() else {
            return Ok(ListingPage { token, items: None });
        };
        let headings =
            safe_static_selector(ITEM_HEADING_SELECTOR.clone(), ITEM_HEADING_SELECTOR_TEXT)?;
        let items = list
            .select(&headings)
            .filter(|heading| !is_admin_row(heading))
            .filter_map(|heading| {
                let item = parse_heading(heading)?;
                Some(PageItem {
                    item,
                    marker: marker_of(&heading),
                })
            })
            .collect();
        Ok(ListingPage {
            token,
            items: Some(items),
        })
    }
}

/// Fetch and parse the page of `listing_url` holding logical index `item_number`
pub fn scan_page(
    session: &dyn Session,
    listing_url: &str,
    item_number: usize,
) -> Result<(PagePosition, ListingPage)> {
    let position = PagePosition::of(item_number);
    let document = fetch_listing(session, &page_url(listing_url, position.page_number()))?;
    Ok((position, ListingPage::parse(&document)?))
}

/// Enumerate a moderation listing with stable 1-based indexes
///
/// Numbering starts at `(page - 1) * PAGE_SIZE` for the page holding
/// `start_index` and counts only rows linking to a work or series. Placeholder
/// rows (deleted or hidden items) on earlier pages are skipped, so later indexes
/// come out lower than the fixed page positions
/// [`apply_action`](crate::collection::moderation::apply_action) resolves.
///
/// # Arguments
/// * `session` - session used for the requests
/// * `listing_url` - listing url without a `page` parameter
/// * `start_index` - first logical index to return, values below 1 count as 1
/// * `max_items` - stop once this many entries were collected
///
/// # Returns
/// * `QueueListing::Empty` when the first page has no item list
///
/// # Errors
/// * `StructuralMismatch` when a later page lost its item list
pub fn list_items(
    session: &dyn Session,
    listing_url: &str,
    start_index: usize,
    max_items: Option<usize>,
) -> Result<QueueListing> {
    let start_index = start_index.max(1);
    let start = PagePosition::of(start_index);

    let first = fetch_listing(session, listing_url)?;
    let pages = page_count_in(&first)?;
    let first_page = ListingPage::parse(&first)?;
    if first_page.items.is_none() {
        debug!("{} has no item list, queue is empty", listing_url);
        return Ok(QueueListing::Empty);
    }

    let mut entries = Vec::new();
    if max_items == Some(0) {
        return Ok(QueueListing::Items(entries));
    }
    let mut counter = start.page * PAGE_SIZE;
    let mut first_page = Some(first_page);
    for page in start.page_number()..=pages {
        let listing = match first_page.take().filter(|_| page == 1) {
            Some(listing) => listing,
            None => ListingPage::parse(&fetch_listing(session, &page_url(listing_url, page))?)?,
        };
        let items = listing.items.ok_or_else(|| {
            Ao3ApiError::StructuralMismatch(format!("page {page} of {listing_url} has no item list"))
        })?;
        for PageItem { item, marker } in items {
            counter += 1;
            if counter < start_index {
                continue;
            }
            entries.push(QueueEntry {
                index: counter,
                item,
                marker,
            });
            if max_items.is_some_and(|max| entries.len() >= max) {
                return Ok(QueueListing::Items(entries));
            }
        }
    }
    Ok(QueueListing::Items(entries))
}

/// Public listings a collection exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicListing {
    Works,
    Bookmarks,
}

impl PublicListing {
    pub fn path(&self) -> &'static str {
        match self {
            PublicListing::Works => "works",
            PublicListing::Bookmarks => "bookmarks",
        }
    }

    fn container(&self) -> Result<Selector> {
        match self {
            PublicListing::Works => {
                safe_static_selector(WORK_LIST_SELECTOR.clone(), WORK_LIST_SELECTOR_TEXT)
            }
            PublicListing::Bookmarks => {
                safe_static_selector(BOOKMARK_LIST_SELECTOR.clone(), BOOKMARK_LIST_SELECTOR_TEXT)
            }
        }
    }
}

/// Banners of one public listing page, `None` when the list container is missing
fn parse_banners(document: &Html, listing: PublicListing) -> Result<Option<Vec<ItemReference>>> {
    let container = listing.container()?;
    let Some(list) = document.select(&container).next() else {
        return Ok(None);
    };
    let articles = safe_static_selector(ARTICLE_SELECTOR.clone(), ARTICLE_SELECTOR_TEXT)?;
    Ok(Some(list.select(&articles).filter_map(parse_item_banner).collect()))
}

fn banners_of_page(
    session: &dyn Session,
    listing_url: &str,
    listing: PublicListing,
    page: usize,
) -> Result<Vec<ItemReference>> {
    let document = fetch_listing(session, &page_url(listing_url, page))?;
    parse_banners(&document, listing)?.ok_or_else(|| {
        Ao3ApiError::StructuralMismatch(format!("page {page} of {listing_url} has no item list"))
    })
}

/// Collect every banner of a public works or bookmarks listing
///
/// # Arguments
/// * `threaded` - fetch pages 2.. on the rayon pool. Results then arrive in no
///   particular order; use the sequential path when order matters.
pub fn list_banners(
    session: &dyn Session,
    listing_url: &str,
    listing: PublicListing,
    threaded: bool,
) -> Result<Vec<ItemReference>> {
    let first = fetch_listing(session, listing_url)?;
    let pages = page_count_in(&first)?;
    let Some(mut items) = parse_banners(&first, listing)? else {
        return Ok(Vec::new());
    };

    if !threaded {
        for page in 2..=pages {
            items.extend(banners_of_page(session, listing_url, listing, page)?);
        }
        return Ok(items);
    }

    let finalvec = arcify(items);
    (2..=pages).into_par_iter().try_for_each(|page| -> Result<()> {
        let found = banners_of_page(session, listing_url, listing, page)?;
        finalvec
            .lock()
            .map_err(|_| Ao3ApiError::GenericError("result list lock poisoned".to_string()))?
            .extend(found);
        Ok(())
    })?;
    let mut guard = finalvec
        .lock()
        .map_err(|_| Ao3ApiError::GenericError("result list lock poisoned".to_string()))?;
    Ok(std::mem::take(&mut *guard))
}
