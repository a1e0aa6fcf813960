//! Utility functions for HTML processing and shared helpers

use crate::errors::Ao3ApiError;
use regex::Regex;
use scraper::Selector;
use std::sync::LazyLock;
use std::sync::{Arc, Mutex};

/// Creates a selector from provided string
///
/// Internal utility function for parsing CSS selectors.
#[inline(always)]
pub(crate) fn make_selector(
    selector: &str,
) -> Result<Selector, scraper::error::SelectorErrorKind<'_>> {
    Selector::parse(selector)
}

/// Wraps argument in Arc<Mutex<T>> for thread-safe shared ownership
///
/// Internal utility function for creating thread-safe shared state.
#[inline(always)]
pub(crate) fn arcify<T>(arg: T) -> Arc<Mutex<T>> {
    Arc::new(Mutex::new(arg))
}
/// Macro to create a static LazyLock

#[macro_export]
macro_rules! make_static {
    ($expr:expr) => {{ LazyLock::new(|| $expr) }};
}
/// Macro to select raw text from HTML document

#[macro_export]
macro_rules! select_raw_text {
    ($document:expr, $selector:expr) => {
        $document
            .select($selector)
            .map(|elem| elem.text().collect::<String>().trim().to_string())
    };
}
/// Macro to select raw text from HTML document, returning only the next element
#[macro_export]
macro_rules! select_raw_text_next {
    ($document:expr, $selector:expr) => {
        $document
            .select($selector)
            .next()
            .map(|elem| elem.text().collect::<String>().trim().to_string())
    };
}
/// Macro to select text from HTML document, returning a Vec of the non-empty matches
#[macro_export]
macro_rules! select_text {
    ($document:expr, $selector:expr) => {{
        $crate::select_raw_text!($document, $selector)
            .filter(|text| !text.is_empty())
            .collect::<Vec<String>>()
    }};
}
pub(crate) fn safe_static_selector(
    selector: Option<Selector>,
    backup: &str,
) -> Result<Selector, Ao3ApiError> {
    selector.map(Ok).unwrap_or_else(|| {
        make_selector(backup)
            .map_err(|_| Ao3ApiError::SelectorError(format!("Failed to create CSS selector {backup}")))
    })
}

pub(crate) fn safe_static_regex(
    regex: Option<regex::Regex>,
    backup: &str,
) -> Result<Regex, Ao3ApiError> {
    regex.map(Ok).unwrap_or_else(|| {
        Regex::new(backup)
            .map_err(|_| Ao3ApiError::RegexError(format!("Failed to compile regex {backup}")))
    })
}

#[macro_export]
macro_rules! define_selector {
    ($name:ident, $name_text:ident, $text:expr) => {
        static $name_text: &str = $text;

        static $name: LazyLock<Option<Selector>> = make_static!(make_selector($text).ok());
    };
}
#[macro_export]
macro_rules! define_regex {
    ($name:ident, $name_text:ident, $text:expr) => {
        static $name_text: &str = $text;

        static $name: LazyLock<std::option::Option<regex::Regex>> =
            make_static!({ Regex::new($text).ok() });
    };
}

define_regex!(
    COLLECTION_ID_REGEX,
    COLLECTION_ID_REGEX_TEXT,
    r"/collections/([^/?#]+)"
);
define_regex!(TRAILING_NUMBER_REGEX, TRAILING_NUMBER_REGEX_TEXT, r"(\d+)/?$");

/// Extracts the collection id from a collection url
///
/// # Example
/// ```
/// use ao3_collections::utils::collection_id_from_url;
/// let id = collection_id_from_url("http://archiveofourown.org/collections/L_GSTest/works");
/// assert_eq!(id.as_deref(), Some("L_GSTest"));
/// ```
pub fn collection_id_from_url(url: &str) -> Option<String> {
    let regex = safe_static_regex(COLLECTION_ID_REGEX.clone(), COLLECTION_ID_REGEX_TEXT).ok()?;
    regex
        .captures(url)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extracts the numeric id at the end of a path such as `/works/123` or `collection_item_42`
pub(crate) fn trailing_number(text: &str) -> Option<u64> {
    let path = text.split(['?', '#']).next().unwrap_or(text);
    let regex =
        safe_static_regex(TRAILING_NUMBER_REGEX.clone(), TRAILING_NUMBER_REGEX_TEXT).ok()?;
    regex
        .captures(path)
        .and_then(|cap| cap.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub(crate) fn parse_number_with_commas(text: &str) -> Option<usize> {
    text.trim().replace(',', "").parse::<usize>().ok()
}
