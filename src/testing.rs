//! In-memory session and page builders for unit tests

use crate::errors::Result;
use crate::networking::{FormResponse, Session};
use scraper::Html;
use std::collections::HashMap;
use std::sync::Mutex;

const BASE_URL: &str = "https://archiveofourown.org";

/// Serves canned pages and records every request
pub(crate) struct FakeSession {
    pages: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
    posts: Mutex<Vec<(String, Vec<(String, String)>)>>,
    form_response: FormResponse,
}

impl FakeSession {
    pub(crate) fn new() -> Self {
        FakeSession {
            pages: HashMap::new(),
            requests: Mutex::new(Vec::new()),
            posts: Mutex::new(Vec::new()),
            form_response: FormResponse {
                status: 302,
                location: Some(format!("{BASE_URL}/collections/test/items")),
            },
        }
    }

    pub(crate) fn with_page(mut self, url: &str, markup: &str) -> Self {
        self.pages.insert(url.to_string(), markup.to_string());
        self
    }

    pub(crate) fn with_form_response(mut self, response: FormResponse) -> Self {
        self.form_response = response;
        self
    }

    /// GET urls in request order
    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn posts(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.posts.lock().unwrap().clone()
    }
}

impl Session for FakeSession {
    fn base_url(&self) -> &str {
        BASE_URL
    }

    fn authenticated_get(&self, url: &str) -> Result<Html> {
        self.requests.lock().unwrap().push(url.to_string());
        let markup = self.pages.get(url).cloned().unwrap_or_else(not_found_page);
        Ok(Html::parse_document(&markup))
    }

    fn authenticity_token(&self) -> Result<String> {
        Ok("session-token".to_string())
    }

    fn refresh_auth_token(&self) -> Result<String> {
        Ok("fresh-session-token".to_string())
    }

    fn submit_form(&self, url: &str, form: &[(String, String)]) -> Result<FormResponse> {
        self.posts
            .lock()
            .unwrap()
            .push((url.to_string(), form.to_vec()));
        Ok(self.form_response.clone())
    }
}

/// A row of a moderation listing
pub(crate) struct ItemRow {
    marker: u64,
    href: Option<String>,
    title: String,
}

impl ItemRow {
    pub(crate) fn work(marker: u64, id: u64, title: &str) -> Self {
        ItemRow {
            marker,
            href: Some(format!("/works/{id}")),
            title: title.to_string(),
        }
    }

    pub(crate) fn series(marker: u64, id: u64, title: &str) -> Self {
        ItemRow {
            marker,
            href: Some(format!("/series/{id}")),
            title: title.to_string(),
        }
    }

    /// A row whose heading links to nothing addressable
    pub(crate) fn placeholder(marker: u64) -> Self {
        ItemRow {
            marker,
            href: None,
            title: "Deleted item".to_string(),
        }
    }
}

fn pagination(page: usize, total_pages: usize) -> String {
    if total_pages <= 1 {
        return String::new();
    }
    let mut out = String::from(r#"<ol class="pagination actions" role="navigation">"#);
    out.push_str(r#"<li class="previous"><a rel="prev">&larr; Previous</a></li>"#);
    for n in 1..=total_pages {
        if n == page {
            out.push_str(&format!(r#"<li><span class="current">{n}</span></li>"#));
        } else {
            out.push_str(&format!(r#"<li><a href="?page={n}">{n}</a></li>"#));
        }
    }
    out.push_str(r#"<li class="next"><a rel="next">Next &rarr;</a></li></ol>"#);
    out
}

/// Wraps `body` in a page with a main region
pub(crate) fn plain_page(body: &str) -> String {
    format!(r#"<html><head></head><body><div id="main">{body}</div></body></html>"#)
}

pub(crate) fn not_found_page() -> String {
    plain_page(r#"<h2 class="heading">Error 404</h2><p>The page you were looking for doesn't exist.</p>"#)
}

/// A moderation page; each row renders its heading twice like the archive's admin view
pub(crate) fn items_page(rows: &[ItemRow], page: usize, total_pages: usize) -> String {
    let mut list = String::from(r#"<ul class="collection index group">"#);
    for row in rows {
        let link = match &row.href {
            Some(href) => format!(r#"<a href="{href}">{}</a>"#, row.title),
            None => row.title.clone(),
        };
        list.push_str(&format!(
            r#"<li class="collection item blurb group" id="collection_item_{marker}">
              <div class="header module"><h4 class="heading">{link} by <a rel="author" href="/users/ana/pseuds/ana">ana</a></h4></div>
              <h4 class="landmark heading">{link}</h4>
              <ul class="actions"><li><select name="collection_items[{marker}][collection_approval_status]">
                <option value="unreviewed">Unreviewed</option><option value="approved">Approved</option><option value="rejected">Rejected</option>
              </select></li><li><input type="checkbox" name="collection_items[{marker}][remove]" value="1"></li></ul>
            </li>"#,
            marker = row.marker,
        ));
    }
    list.push_str("</ul>");
    format!(
        r#"<html><head><meta name="csrf-token" content="page-token-{page}"></head><body><div id="main">
        <h2 class="heading">Manage Items</h2>{list}{}</div></body></html>"#,
        pagination(page, total_pages)
    )
}

/// A public works or bookmarks listing page with one banner per id
pub(crate) fn banner_page(kind: &str, ids: &[u64], page: usize, total_pages: usize) -> String {
    let mut list = format!(r#"<ol class="{kind} index group">"#);
    for id in ids {
        list.push_str(&format!(
            r#"<li class="{kind} blurb group" role="article"><div class="header module">
              <h4 class="heading"><a href="/works/{id}">Work {id}</a> by <a rel="author" href="/users/bo/pseuds/bo">bo</a></h4>
            </div></li>"#
        ));
    }
    list.push_str("</ol>");
    plain_page(&format!("{list}{}", pagination(page, total_pages)))
}
