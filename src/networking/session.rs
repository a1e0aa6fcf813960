//! The capability the collection code uses to talk to the archive

use super::FormResponse;
use crate::errors::Result;
use scraper::Html;

/// A logged-in or guest connection to the archive.
///
/// Implementations must be shareable across threads: bulk listing
/// retrieval fetches pages from several workers at once.
pub trait Session: Send + Sync {
    /// Archive root, e.g. `https://archiveofourown.org`
    fn base_url(&self) -> &str;

    /// GET `url` with the session's cookies and parse the body
    fn authenticated_get(&self, url: &str) -> Result<Html>;

    /// The session-level authenticity token, fetched on first use
    fn authenticity_token(&self) -> Result<String>;

    /// Drop the cached token and fetch a fresh one
    fn refresh_auth_token(&self) -> Result<String>;

    /// POST a form-encoded body, returning the raw response without following redirects
    fn submit_form(&self, url: &str, form: &[(String, String)]) -> Result<FormResponse>;

    /// Where the archive sends requests carrying a stale authenticity token
    fn auth_error_url(&self) -> String {
        format!("{}/auth_error", self.base_url())
    }
}
