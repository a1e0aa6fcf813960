//! Moderation queue views of a collection's items page

use crate::errors::Ao3ApiError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which slice of the collection's items a moderation listing shows.
///
/// `""`, `"awaiting_approval"` and no filter at all are the same view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueFilter {
    #[default]
    AwaitingApproval,
    Invited,
    Rejected,
    Approved,
}

impl QueueFilter {
    pub const ALL: [QueueFilter; 4] = [
        QueueFilter::AwaitingApproval,
        QueueFilter::Invited,
        QueueFilter::Rejected,
        QueueFilter::Approved,
    ];

    /// Query string selecting this view, without the leading `?`
    pub fn query(&self) -> Option<&'static str> {
        match self {
            QueueFilter::AwaitingApproval => None,
            QueueFilter::Invited => Some("invited=true"),
            QueueFilter::Rejected => Some("rejected=true"),
            QueueFilter::Approved => Some("approved=true"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueueFilter::AwaitingApproval => "awaiting_approval",
            QueueFilter::Invited => "invited",
            QueueFilter::Rejected => "rejected",
            QueueFilter::Approved => "approved",
        }
    }

    /// Listing url of this view for a collection
    pub fn listing_url(&self, base_url: &str, collection_id: &str) -> String {
        let url = format!("{base_url}/collections/{collection_id}/items");
        match self.query() {
            Some(query) => format!("{url}?{query}"),
            None => url,
        }
    }
}

impl From<Option<&str>> for QueueFilter {
    /// Unknown names fall back to the awaiting-approval view, as an absent filter does
    fn from(value: Option<&str>) -> Self {
        value
            .and_then(|name| name.parse().ok())
            .unwrap_or_default()
    }
}

impl FromStr for QueueFilter {
    type Err = Ao3ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "awaiting_approval" | "unreviewed" => Ok(QueueFilter::AwaitingApproval),
            "invited" => Ok(QueueFilter::Invited),
            "rejected" => Ok(QueueFilter::Rejected),
            "approved" => Ok(QueueFilter::Approved),
            other => Err(Ao3ApiError::GenericError(format!(
                "Unknown moderation filter: {other}"
            ))),
        }
    }
}

impl fmt::Display for QueueFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Adds `page=N` to a listing url; page 1 is the bare url
pub fn page_url(listing_url: &str, page: usize) -> String {
    if page <= 1 {
        listing_url.to_string()
    } else if listing_url.contains('?') {
        format!("{listing_url}&page={page}")
    } else {
        format!("{listing_url}?page={page}")
    }
}
