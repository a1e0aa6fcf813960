//! # extraction
//!
//! Pure HTML extraction helpers shared by the collection views.
//!
//! Listing pages on AO3 render every work, series or bookmark as a "banner"
//! whose `h4.heading` links to the item. This module turns those banners into
//! [`ItemReference`]s and pulls the page-level bits (authenticity token, 404
//! signature) out of a parsed document.
//!
//! ## Usage
//!
//! ```rust
//! use ao3_collections::extraction::classify_link;
//! use ao3_collections::ItemReference;
//! assert_eq!(
//!     classify_link("/works/123"),
//!     Some(ItemReference::Work { id: 123, title: None })
//! );
//! ```
use crate::types::ItemReference;
use crate::utils::{make_selector, safe_static_selector, trailing_number};
use crate::{define_selector, make_static};
use scraper::{ElementRef, Html, selector::Selector};
use std::sync::LazyLock;

define_selector!(
    HEADING_SELECTOR,
    HEADING_SELECTOR_TEXT,
    r#"h4.heading"#
);
define_selector!(LINK_SELECTOR, LINK_SELECTOR_TEXT, "a[href]");
define_selector!(
    CSRF_META_SELECTOR,
    CSRF_META_SELECTOR_TEXT,
    r#"meta[name="csrf-token"]"#
);
define_selector!(
    TOKEN_INPUT_SELECTOR,
    TOKEN_INPUT_SELECTOR_TEXT,
    r#"input[name="authenticity_token"]"#
);
define_selector!(
    ERROR_HEADING_SELECTOR,
    ERROR_HEADING_SELECTOR_TEXT,
    r#"h2.heading"#
);

/// Strips scheme and host from an absolute archive url
fn link_path(href: &str) -> &str {
    match href.split_once("://") {
        Some((_, rest)) => rest.find('/').map(|i| &rest[i..]).unwrap_or("/"),
        None => href,
    }
}

/// Decides whether a link target points at a work or a series.
///
/// Returns `None` for anything else (users, tags, external works...).
pub fn classify_link(href: &str) -> Option<ItemReference> {
    let path = link_path(href);
    if path.starts_with("/works/") {
        trailing_number(path).map(|id| ItemReference::Work { id, title: None })
    } else if path.starts_with("/series/") {
        trailing_number(path).map(|id| ItemReference::Series { id, title: None })
    } else {
        None
    }
}

/// Classifies a heading by its first work or series link and keeps the link text as title
pub fn parse_heading(heading: ElementRef<'_>) -> Option<ItemReference> {
    let links = safe_static_selector(LINK_SELECTOR.clone(), LINK_SELECTOR_TEXT).ok()?;
    heading.select(&links).find_map(|link| {
        let reference = classify_link(link.value().attr("href")?)?;
        let title = link.text().collect::<String>().trim().to_string();
        Some(reference.with_title((!title.is_empty()).then_some(title)))
    })
}

/// Turns a work/series/bookmark banner into a lightweight reference
///
/// # Arguments
/// * `banner` - the `li` (or any element) wrapping the banner markup
///
/// # Returns
/// * `None` when the banner has no heading or the heading links to neither a work nor a series
pub fn parse_item_banner(banner: ElementRef<'_>) -> Option<ItemReference> {
    let headings = safe_static_selector(HEADING_SELECTOR.clone(), HEADING_SELECTOR_TEXT).ok()?;
    let heading = banner.select(&headings).next()?;
    parse_heading(heading)
}

/// Reads the authenticity token a page was rendered with
pub fn extract_page_token(document: &Html) -> Option<String> {
    let meta = safe_static_selector(CSRF_META_SELECTOR.clone(), CSRF_META_SELECTOR_TEXT).ok()?;
    if let Some(token) = document
        .select(&meta)
        .find_map(|elem| elem.value().attr("content"))
        .filter(|token| !token.is_empty())
    {
        return Some(token.to_string());
    }
    let input = safe_static_selector(TOKEN_INPUT_SELECTOR.clone(), TOKEN_INPUT_SELECTOR_TEXT).ok()?;
    document
        .select(&input)
        .find_map(|elem| elem.value().attr("value"))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// True when the archive answered with its "Error 404" page
pub fn is_not_found(document: &Html) -> bool {
    let Ok(selector) =
        safe_static_selector(ERROR_HEADING_SELECTOR.clone(), ERROR_HEADING_SELECTOR_TEXT)
    else {
        return false;
    };
    document
        .select(&selector)
        .any(|elem| elem.text().collect::<String>().trim() == "Error 404")
}
