//! # collection
//!
//! Browsing and moderating an AO3 collection.
//!
//! [`Collection`] is the entry point: read accessors load the page they need
//! the first time they are called and cache the parsed value, while
//! [`Collection::enumerate_queue`] and [`Collection::moderate`] drive the
//! moderation listings.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use ao3_collections::collection::{Collection, ModerationAction, QueueFilter};
//! use ao3_collections::networking::{Ao3Session, ClientConfig};
//!
//! let session = Ao3Session::from_login_file(ClientConfig::default(), "log.txt").unwrap();
//! let mut collection = Collection::new("L_GSTest", Arc::new(session), true).unwrap();
//! println!("{} has {} works", collection.name().unwrap(), collection.work_count().unwrap());
//!
//! collection.print_management_list(QueueFilter::AwaitingApproval).unwrap();
//! collection
//!     .moderate(Some(1), Some(ModerationAction::Approve), QueueFilter::AwaitingApproval)
//!     .unwrap();
//! ```
pub(crate) mod cache;
pub mod filter;
pub mod indexer;
pub mod moderation;
pub mod pagination;

pub use filter::{QueueFilter, page_url};
pub use indexer::{ListingPage, PageItem, PublicListing, list_banners, list_items, scan_page};
pub use moderation::{ModerationAction, ModerationReceipt, apply_action};
pub use pagination::{page_count, page_count_in};

use crate::errors::{Ao3ApiError, Result};
use crate::extraction::is_not_found;
use crate::networking::Session;
use crate::types::{ItemReference, QueueListing};
use crate::utils::{
    collection_id_from_url, make_selector, parse_number_with_commas, safe_static_regex,
    safe_static_selector,
};
use crate::{define_regex, define_selector, make_static, select_raw_text_next, select_text};
use cache::{CacheKey, CachedValue, FieldCache};
use log::debug;
use pagination::fetch_listing;
use regex::Regex;
use scraper::{Html, Selector};
use std::fmt;
use std::sync::{Arc, LazyLock};

define_selector!(
    NAME_SELECTOR,
    NAME_SELECTOR_TEXT,
    r#"div.primary.header.module h2.heading"#
);
define_selector!(
    DESCRIPTION_SELECTOR,
    DESCRIPTION_SELECTOR_TEXT,
    r#"div.primary.header.module blockquote.userstuff"#
);
define_selector!(
    TYPE_SELECTOR,
    TYPE_SELECTOR_TEXT,
    r#"div.primary.header.module p.type"#
);
define_selector!(
    PARENT_SELECTOR,
    PARENT_SELECTOR_TEXT,
    r#"div.primary.header.module p.parent a[href]"#
);
define_selector!(DASHBOARD_SELECTOR, DASHBOARD_SELECTOR_TEXT, "#dashboard");
define_selector!(DASHBOARD_LINK_SELECTOR, DASHBOARD_LINK_SELECTOR_TEXT, "a[href]");
define_selector!(
    INTRO_SELECTOR,
    INTRO_SELECTOR_TEXT,
    r#"#intro blockquote.userstuff"#
);
define_selector!(
    RULES_SELECTOR,
    RULES_SELECTOR_TEXT,
    r#"#rules blockquote.userstuff"#
);
define_selector!(MAINTAINERS_SELECTOR, MAINTAINERS_SELECTOR_TEXT, "ul.mods li a");
define_selector!(
    SUBCOLLECTION_LINK_SELECTOR,
    SUBCOLLECTION_LINK_SELECTOR_TEXT,
    r#"ul.collection.index.group h4.heading a[href]"#
);
define_regex!(COUNT_REGEX, COUNT_REGEX_TEXT, r"\(([\d,]+)\)");

/// Message rendered for a queue with nothing in it
pub const EMPTY_QUEUE_MESSAGE: &str = "There are no items in this queue";

fn wrong_kind(key: CacheKey) -> Ao3ApiError {
    Ao3ApiError::GenericError(format!("cached {key:?} holds an unexpected value"))
}

fn optional_text(document: &Html, selector: Option<Selector>, text: &str) -> Result<CachedValue> {
    let selector = safe_static_selector(selector, text)?;
    Ok(CachedValue::OptionalText(
        select_raw_text_next!(document, &selector).filter(|value| !value.is_empty()),
    ))
}

/// Reads a "Works (12)" style count off the dashboard link whose target ends in `/{path}`
fn dashboard_count(document: &Html, path: &str) -> Result<usize> {
    let dashboard = safe_static_selector(DASHBOARD_SELECTOR.clone(), DASHBOARD_SELECTOR_TEXT)?;
    let Some(dashboard) = document.select(&dashboard).next() else {
        return Err(Ao3ApiError::StructuralMismatch(
            "collection page has no dashboard".to_string(),
        ));
    };
    let links = safe_static_selector(DASHBOARD_LINK_SELECTOR.clone(), DASHBOARD_LINK_SELECTOR_TEXT)?;
    let count_regex = safe_static_regex(COUNT_REGEX.clone(), COUNT_REGEX_TEXT)?;
    let suffix = format!("/{path}");
    Ok(dashboard
        .select(&links)
        .find(|link| {
            link.value()
                .attr("href")
                .is_some_and(|href| href.trim_end_matches('/').ends_with(&suffix))
        })
        .and_then(|link| {
            let text = link.text().collect::<String>();
            count_regex
                .captures(&text)
                .and_then(|cap| cap.get(1))
                .and_then(|count| parse_number_with_commas(count.as_str()))
        })
        .unwrap_or(0))
}

/// Renders an enumerated queue as `index: item` lines
pub fn render_queue(listing: &QueueListing) -> String {
    if listing.is_empty() {
        return EMPTY_QUEUE_MESSAGE.to_string();
    }
    listing
        .entries()
        .iter()
        .map(|entry| format!("{}: {}\n", entry.index, entry.item))
        .collect()
}

/// An AO3 collection.
///
/// Fields are fetched on first access and cached until [`Collection::reload`].
/// Accessors that fill the cache take `&mut self`, so an instance serves one
/// operation at a time; share the session, not the collection, to work on
/// several collections in parallel.
pub struct Collection {
    id: String,
    session: Arc<dyn Session>,
    cache: FieldCache,
}

impl Collection {
    /// Creates a new collection object
    ///
    /// # Arguments
    /// * `id` - collection name as it appears in its url
    /// * `session` - session used for every request
    /// * `load` - fetch the collection page now, failing early on unknown ids
    ///
    /// # Errors
    /// * `InvalidId` if `load` is set and the collection does not exist
    pub fn new(id: impl Into<String>, session: Arc<dyn Session>, load: bool) -> Result<Self> {
        let mut collection = Collection {
            id: id.into(),
            session,
            cache: FieldCache::default(),
        };
        if load {
            collection.reload()?;
        }
        Ok(collection)
    }

    /// Creates a collection from any of its urls
    pub fn from_url(url: &str, session: Arc<dyn Session>, load: bool) -> Result<Self> {
        let id = collection_id_from_url(url)
            .ok_or_else(|| Ao3ApiError::InvalidId(format!("collection in {url}")))?;
        Self::new(id, session, load)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn url(&self) -> String {
        format!("{}/collections/{}", self.session.base_url(), self.id)
    }

    pub fn session(&self) -> &Arc<dyn Session> {
        &self.session
    }

    /// Sets the session used to make requests for this collection
    pub fn set_session(&mut self, session: Arc<dyn Session>) {
        self.session = session;
    }

    /// True once the collection page has been fetched
    pub fn is_loaded(&self) -> bool {
        self.cache.contains(CacheKey::MainPage)
    }

    /// Drops every cached field and fetches the collection page again
    pub fn reload(&mut self) -> Result<()> {
        self.cache.clear();
        let markup = self.fetch_markup(&self.url())?;
        self.cache.insert(CacheKey::MainPage, markup);
        Ok(())
    }

    fn fetch_markup(&self, url: &str) -> Result<CachedValue> {
        let document = self.session.authenticated_get(url)?;
        if is_not_found(&document) {
            return Err(Ao3ApiError::InvalidId(format!("collection {}", self.id)));
        }
        Ok(CachedValue::Markup(document.html()))
    }

    /// Returns the cached value for `key`, computing it with `load` the first time
    fn field(
        &mut self,
        key: CacheKey,
        load: impl FnOnce(&mut Self) -> Result<CachedValue>,
    ) -> Result<&CachedValue> {
        if !self.cache.contains(key) {
            debug!("loading {:?} of collection {}", key, self.id);
            let value = load(&mut *self)?;
            return Ok(self.cache.insert(key, value));
        }
        self.cache.get(key).ok_or_else(|| wrong_kind(key))
    }

    fn document(&mut self, key: CacheKey) -> Result<Html> {
        let value = self.field(key, |collection| match key {
            CacheKey::ProfilePage => {
                let url = format!("{}/profile", collection.url());
                collection.fetch_markup(&url)
            }
            _ => collection.fetch_markup(&collection.url()),
        })?;
        let markup = value.as_markup().ok_or_else(|| wrong_kind(key))?;
        Ok(Html::parse_document(markup))
    }

    fn optional_field(
        &mut self,
        key: CacheKey,
        page: CacheKey,
        selector: Option<Selector>,
        text: &'static str,
    ) -> Result<Option<String>> {
        let value = self.field(key, |collection| {
            optional_text(&collection.document(page)?, selector, text)
        })?;
        value
            .as_optional_text()
            .map(|text| text.map(str::to_string))
            .ok_or_else(|| wrong_kind(key))
    }

    /// Display name of the collection
    pub fn name(&mut self) -> Result<String> {
        let value = self.field(CacheKey::Name, |collection| {
            let document = collection.document(CacheKey::MainPage)?;
            let selector = safe_static_selector(NAME_SELECTOR.clone(), NAME_SELECTOR_TEXT)?;
            select_raw_text_next!(document, &selector)
                .filter(|name| !name.is_empty())
                .map(CachedValue::Text)
                .ok_or_else(|| {
                    Ao3ApiError::StructuralMismatch("collection page has no title".to_string())
                })
        })?;
        value
            .as_text()
            .map(str::to_string)
            .ok_or_else(|| wrong_kind(CacheKey::Name))
    }

    /// Short description shown in the collection header
    pub fn description(&mut self) -> Result<Option<String>> {
        self.optional_field(
            CacheKey::Description,
            CacheKey::MainPage,
            DESCRIPTION_SELECTOR.clone(),
            DESCRIPTION_SELECTOR_TEXT,
        )
    }

    /// Openness and moderation policy, e.g. "Open, Moderated"
    pub fn collection_type(&mut self) -> Result<Option<String>> {
        let raw = self.optional_field(
            CacheKey::CollectionType,
            CacheKey::MainPage,
            TYPE_SELECTOR.clone(),
            TYPE_SELECTOR_TEXT,
        )?;
        Ok(raw.map(|text| {
            text.trim_start_matches('(')
                .trim_end_matches(')')
                .trim()
                .to_string()
        }))
    }

    /// Id of the parent collection, for subcollections
    pub fn parent(&mut self) -> Result<Option<String>> {
        let value = self.field(CacheKey::Parent, |collection| {
            let document = collection.document(CacheKey::MainPage)?;
            let selector = safe_static_selector(PARENT_SELECTOR.clone(), PARENT_SELECTOR_TEXT)?;
            Ok(CachedValue::OptionalText(
                document
                    .select(&selector)
                    .find_map(|link| collection_id_from_url(link.value().attr("href")?)),
            ))
        })?;
        value
            .as_optional_text()
            .map(|text| text.map(str::to_string))
            .ok_or_else(|| wrong_kind(CacheKey::Parent))
    }

    /// Intro text from the collection profile
    pub fn intro(&mut self) -> Result<Option<String>> {
        self.optional_field(
            CacheKey::Intro,
            CacheKey::ProfilePage,
            INTRO_SELECTOR.clone(),
            INTRO_SELECTOR_TEXT,
        )
    }

    /// Rules text from the collection profile
    pub fn rules(&mut self) -> Result<Option<String>> {
        self.optional_field(
            CacheKey::Rules,
            CacheKey::ProfilePage,
            RULES_SELECTOR.clone(),
            RULES_SELECTOR_TEXT,
        )
    }

    /// Names of the collection's maintainers
    pub fn maintainers(&mut self) -> Result<Vec<String>> {
        let value = self.field(CacheKey::Maintainers, |collection| {
            let document = collection.document(CacheKey::ProfilePage)?;
            let selector =
                safe_static_selector(MAINTAINERS_SELECTOR.clone(), MAINTAINERS_SELECTOR_TEXT)?;
            Ok(CachedValue::Names(select_text!(document, &selector)))
        })?;
        value
            .as_names()
            .map(<[String]>::to_vec)
            .ok_or_else(|| wrong_kind(CacheKey::Maintainers))
    }

    /// Number of works in the collection, as shown on its dashboard
    pub fn work_count(&mut self) -> Result<usize> {
        self.count(CacheKey::WorkCount, PublicListing::Works)
    }

    /// Number of bookmarked items in the collection, as shown on its dashboard
    pub fn bookmark_count(&mut self) -> Result<usize> {
        self.count(CacheKey::BookmarkCount, PublicListing::Bookmarks)
    }

    fn count(&mut self, key: CacheKey, listing: PublicListing) -> Result<usize> {
        let value = self.field(key, |collection| {
            let document = collection.document(CacheKey::MainPage)?;
            Ok(CachedValue::Count(dashboard_count(&document, listing.path())?))
        })?;
        value.as_count().ok_or_else(|| wrong_kind(key))
    }

    /// Ids of the collection's subcollections, across every page of the listing
    pub fn subcollections(&mut self) -> Result<Vec<String>> {
        let value = self.field(CacheKey::Subcollections, |collection| {
            let url = format!("{}/collections", collection.url());
            let selector = safe_static_selector(
                SUBCOLLECTION_LINK_SELECTOR.clone(),
                SUBCOLLECTION_LINK_SELECTOR_TEXT,
            )?;
            let session = collection.session.as_ref();
            let first = fetch_listing(session, &url)?;
            let pages = page_count_in(&first)?;
            let mut ids = Vec::new();
            for page in 1..=pages {
                let document = if page == 1 {
                    first.clone()
                } else {
                    fetch_listing(session, &page_url(&url, page))?
                };
                ids.extend(
                    document
                        .select(&selector)
                        .filter_map(|link| collection_id_from_url(link.value().attr("href")?))
                        .filter(|id| *id != collection.id),
                );
            }
            Ok(CachedValue::Names(ids))
        })?;
        value
            .as_names()
            .map(<[String]>::to_vec)
            .ok_or_else(|| wrong_kind(CacheKey::Subcollections))
    }

    /// Every work listed in the collection, in listing order
    pub fn work_list(&mut self) -> Result<Vec<ItemReference>> {
        let value = self.field(CacheKey::WorkList, |collection| {
            let url = format!("{}/{}", collection.url(), PublicListing::Works.path());
            Ok(CachedValue::Items(list_banners(
                collection.session.as_ref(),
                &url,
                PublicListing::Works,
                false,
            )?))
        })?;
        value
            .as_items()
            .map(<[ItemReference]>::to_vec)
            .ok_or_else(|| wrong_kind(CacheKey::WorkList))
    }

    /// Every work and series bookmarked into the collection
    ///
    /// With `threaded` the pages are fetched concurrently and the result is in
    /// no particular order. Not cached.
    pub fn bookmark_list(&self, threaded: bool) -> Result<Vec<ItemReference>> {
        let url = format!("{}/{}", self.url(), PublicListing::Bookmarks.path());
        list_banners(self.session.as_ref(), &url, PublicListing::Bookmarks, threaded)
    }

    /// Number the items of a moderation queue
    ///
    /// Indexes assume full pages of 20. A placeholder row (deleted or hidden
    /// item) on an earlier page is not numbered, so later indexes shift down by
    /// one relative to the positions [`moderate`](Self::moderate) resolves.
    ///
    /// # Arguments
    /// * `filter` - which queue to read
    /// * `max_items` - stop after this many items
    /// * `start_from` - first logical index to return (1-based)
    pub fn enumerate_queue(
        &self,
        filter: QueueFilter,
        max_items: Option<usize>,
        start_from: usize,
    ) -> Result<QueueListing> {
        let url = filter.listing_url(self.session.base_url(), &self.id);
        list_items(self.session.as_ref(), &url, start_from, max_items)
    }

    /// Apply a moderation action to the item at `item_number` of the `filter` queue
    ///
    /// See [`apply_action`] for the selection rules and errors.
    pub fn moderate(
        &self,
        item_number: Option<usize>,
        action: Option<ModerationAction>,
        filter: QueueFilter,
    ) -> Result<Option<ModerationReceipt>> {
        apply_action(self.session.as_ref(), &self.id, item_number, action, filter)
    }

    /// Prints the whole `filter` queue to stdout, one numbered item per line
    pub fn print_management_list(&self, filter: QueueFilter) -> Result<()> {
        let listing = self.enumerate_queue(filter, None, 1)?;
        print!("{}", render_queue(&listing));
        if listing.is_empty() {
            println!();
        }
        Ok(())
    }
}

impl PartialEq for Collection {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Collection {}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .cache
            .get(CacheKey::Name)
            .and_then(CachedValue::as_text)
            .unwrap_or(&self.id);
        write!(f, "<Collection [{name}]>")
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("id", &self.id)
            .field("cached_fields", &self.cache.len())
            .finish()
    }
}
