//! Approve, reject, remove or unreview collection items by queue position

use crate::collection::filter::QueueFilter;
use crate::collection::indexer::{PageItem, scan_page};
use crate::errors::{Ao3ApiError, Result};
use crate::networking::{FormResponse, Session};
use crate::types::{ItemReference, QueueEntry};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// State change applied to one collection item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationAction {
    Unreview,
    Approve,
    Reject,
    Remove,
}

impl ModerationAction {
    /// Value of the `collection_approval_status` field, `None` for removal
    pub fn approval_status(&self) -> Option<&'static str> {
        match self {
            ModerationAction::Unreview => Some("unreviewed"),
            ModerationAction::Approve => Some("approved"),
            ModerationAction::Reject => Some("rejected"),
            ModerationAction::Remove => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationAction::Unreview => "unreview",
            ModerationAction::Approve => "approve",
            ModerationAction::Reject => "reject",
            ModerationAction::Remove => "remove",
        }
    }
}

impl FromStr for ModerationAction {
    type Err = Ao3ApiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unreview" | "unreviewed" => Ok(ModerationAction::Unreview),
            "approve" | "approved" => Ok(ModerationAction::Approve),
            "reject" | "rejected" => Ok(ModerationAction::Reject),
            "remove" | "removed" => Ok(ModerationAction::Remove),
            other => Err(Ao3ApiError::GenericError(format!(
                "Unknown moderation action: {other}"
            ))),
        }
    }
}

impl fmt::Display for ModerationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What was changed by a successful moderation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModerationReceipt {
    pub entry: QueueEntry,
    pub action: ModerationAction,
    /// Where the archive redirected after accepting the change
    pub location: Option<String>,
}

/// Form fields of an `update_multiple` request touching a single item
pub fn build_payload(marker: u64, action: ModerationAction, token: &str) -> Vec<(String, String)> {
    let mut form = vec![
        ("authenticity_token".to_string(), token.to_string()),
        ("commit".to_string(), "Submit".to_string()),
        ("_method".to_string(), "patch".to_string()),
    ];
    match action.approval_status() {
        Some(status) => form.push((
            format!("collection_items[{marker}][collection_approval_status]"),
            status.to_string(),
        )),
        None => form.push((format!("collection_items[{marker}][remove]"), "1".to_string())),
    }
    form
}

fn same_location(location: &str, base_url: &str, expected: &str) -> bool {
    let absolute = if location.starts_with('/') {
        format!("{base_url}{location}")
    } else {
        location.to_string()
    };
    absolute.trim_end_matches('/') == expected.trim_end_matches('/')
}

/// Decide whether the archive accepted a moderation request
///
/// A redirect to the auth-error page means the token was refused; any other
/// redirect, or a plain success, means the change went through. A redirect
/// without a `Location` header is not trusted either way.
pub fn interpret_response(
    response: &FormResponse,
    session: &dyn Session,
    url: &str,
) -> Result<()> {
    if response.is_redirect() {
        let Some(location) = response.location.as_deref() else {
            return Err(Ao3ApiError::UnexpectedStatus {
                url: url.to_string(),
                status: response.status,
            });
        };
        if same_location(location, session.base_url(), &session.auth_error_url()) {
            warn!("{} refused the authenticity token", url);
            return Err(Ao3ApiError::AuthError);
        }
        return Ok(());
    }
    match response.status {
        200..=299 => Ok(()),
        429 => Err(Ao3ApiError::RateLimited),
        status => Err(Ao3ApiError::UnexpectedStatus {
            url: url.to_string(),
            status,
        }),
    }
}

/// Apply `action` to the item at logical position `item_number` of the `filter` queue
///
/// Positions map onto pages of [`PAGE_SIZE`](crate::types::PAGE_SIZE) rows:
/// item 21 is the first row of page 2 no matter what page 1 holds.
/// [`list_items`](crate::collection::indexer::list_items) numbers only rows that
/// link to a work or series, so a placeholder row on an earlier page makes every
/// later displayed number one lower than the position this function targets.
///
/// # Arguments
/// * `item_number` and `action` must be given together; with neither nothing is sent
///
/// # Returns
/// * `Ok(None)` when neither an item nor an action was selected
///
/// # Errors
/// * `Unselected` if only one of `item_number` / `action` is given, before any request
/// * `NoItems` if the position no longer holds an item
/// * `UnexpectedStatus` if the archive answered with a redirect lacking `Location`
/// * `AuthError` if the archive refused the authenticity token
pub fn apply_action(
    session: &dyn Session,
    collection_id: &str,
    item_number: Option<usize>,
    action: Option<ModerationAction>,
    filter: QueueFilter,
) -> Result<Option<ModerationReceipt>> {
    let (item_number, action) = match (item_number, action) {
        (Some(item_number), Some(action)) => (item_number, action),
        (None, None) => return Ok(None),
        (Some(_), None) => {
            return Err(Ao3ApiError::Unselected(
                "An item number was given without an action to apply".to_string(),
            ));
        }
        (None, Some(action)) => {
            return Err(Ao3ApiError::Unselected(format!(
                "No item selected to {action}"
            )));
        }
    };
    if item_number == 0 {
        return Err(Ao3ApiError::Unselected(
            "Item numbers start at 1".to_string(),
        ));
    }

    let listing_url = filter.listing_url(session.base_url(), collection_id);
    let (position, page) = scan_page(session, &listing_url, item_number)?;
    debug!(
        "item {} of {} is entry {} on page {}",
        item_number,
        filter,
        position.offset,
        position.page_number()
    );
    let PageItem { item, marker } = page
        .items
        .and_then(|mut items| {
            (position.offset <= items.len()).then(|| items.swap_remove(position.offset - 1))
        })
        .ok_or(Ao3ApiError::NoItems)?;
    let marker = marker.ok_or_else(|| {
        Ao3ApiError::StructuralMismatch(format!("item {item_number} has no collection item id"))
    })?;
    let token = match page.token {
        Some(token) => token,
        None => session.authenticity_token()?,
    };

    let url = format!(
        "{}/collections/{}/items/update_multiple",
        session.base_url(),
        collection_id
    );
    let response = session.submit_form(&url, &build_payload(marker, action, &token))?;
    interpret_response(&response, session, &url)?;
    info!("{} {} in {}", action, describe(&item), collection_id);

    Ok(Some(ModerationReceipt {
        entry: QueueEntry {
            index: item_number,
            item,
            marker: Some(marker),
        },
        action,
        location: response.location,
    }))
}

fn describe(item: &ItemReference) -> String {
    item.title()
        .map(str::to_string)
        .unwrap_or_else(|| item.to_string())
}
