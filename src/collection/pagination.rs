//! Page counting for paginated listings

use crate::errors::{Ao3ApiError, Result};
use crate::extraction::is_not_found;
use crate::networking::Session;
use crate::utils::{make_selector, safe_static_selector};
use crate::{define_selector, make_static};
use log::debug;
use scraper::{Html, Selector};
use std::sync::LazyLock;

define_selector!(
    PAGINATION_SELECTOR,
    PAGINATION_SELECTOR_TEXT,
    r#"ol.pagination.actions"#
);
define_selector!(PAGINATION_ENTRY_SELECTOR, PAGINATION_ENTRY_SELECTOR_TEXT, "li");
define_selector!(MAIN_SELECTOR, MAIN_SELECTOR_TEXT, "#main");

/// Fetch a listing page, turning the archive's 404 page into `InvalidId`
pub(crate) fn fetch_listing(session: &dyn Session, url: &str) -> Result<Html> {
    let document = session.authenticated_get(url)?;
    if is_not_found(&document) {
        return Err(Ao3ApiError::InvalidId(url.to_string()));
    }
    Ok(document)
}

/// Reads the page count off an already fetched first page.
///
/// No pagination control means a single page. Non-numeric entries such as
/// "Next" or the ellipsis are skipped and the largest number wins.
///
/// # Errors
/// * `StructuralMismatch` if the page has no main content region at all
pub fn page_count_in(document: &Html) -> Result<usize> {
    let main = safe_static_selector(MAIN_SELECTOR.clone(), MAIN_SELECTOR_TEXT)?;
    if document.select(&main).next().is_none() {
        return Err(Ao3ApiError::StructuralMismatch(
            "listing page has no #main region".to_string(),
        ));
    }

    let pagination = safe_static_selector(PAGINATION_SELECTOR.clone(), PAGINATION_SELECTOR_TEXT)?;
    let Some(control) = document.select(&pagination).next() else {
        return Ok(1);
    };
    let entries =
        safe_static_selector(PAGINATION_ENTRY_SELECTOR.clone(), PAGINATION_ENTRY_SELECTOR_TEXT)?;
    let pages = control
        .select(&entries)
        .filter_map(|li| li.text().collect::<String>().trim().parse::<usize>().ok())
        .max()
        .unwrap_or(1);
    Ok(pages.max(1))
}

/// Determine how many pages a listing has by fetching its first page
///
/// # Arguments
/// * `session` - session used for the request
/// * `listing_url` - url of the listing, without a `page` parameter
pub fn page_count(session: &dyn Session, listing_url: &str) -> Result<usize> {
    let document = fetch_listing(session, listing_url)?;
    let pages = page_count_in(&document)?;
    debug!("{} has {} page(s)", listing_url, pages);
    Ok(pages)
}
