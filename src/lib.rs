//! # ao3-collections
//!
//! A blocking client for Archive of Our Own (AO3) collections.
//!
//! This crate provides:
//! - Guest and logged-in sessions over a cookie-backed `reqwest` client
//! - Cached read accessors for a collection's name, profile, counts and listings
//! - Stable numbering of the paginated moderation queues
//! - Approving, rejecting, removing and unreviewing queue items by number
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use ao3_collections::{Collection, QueueFilter};
//! use ao3_collections::networking::{Ao3Session, ClientConfig};
//!
//! let session = Ao3Session::guest(ClientConfig::default()).unwrap();
//! let collection = Collection::new("yuletide", Arc::new(session), true).unwrap();
//! for entry in collection.enumerate_queue(QueueFilter::Approved, Some(20), 1).unwrap().entries() {
//!     println!("{}: {}", entry.index, entry.item);
//! }
//! ```

pub mod collection;
pub mod errors;
pub mod extraction;
pub mod networking;
pub mod types;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use collection::{Collection, ModerationAction, ModerationReceipt, QueueFilter, render_queue};
pub use errors::{Ao3ApiError, Result};
pub use types::{ItemReference, PAGE_SIZE, PagePosition, QueueEntry, QueueListing};
