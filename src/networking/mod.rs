//! # networking
//!
//! Networking operations with Archive of Our Own (AO3).
//!
//! This module provides:
//! - HTTP client configuration with cookie support
//! - Fetching and parsing HTML pages from AO3
//! - AO3 authentication (login, token management)
//! - The [`Session`] capability the collection code is written against
//!
//! ## Usage - Blocking (default)
//!
//! ```no_run
//! use ao3_collections::networking::{Ao3Session, ClientConfig, LoginInfo, Session};
//!
//! // Login to AO3
//! let info = LoginInfo::new("username", "password");
//! let session = Ao3Session::login(ClientConfig::default(), &info)
//!     .expect("Failed to log in");
//!
//! // Fetch a page
//! let html = session
//!     .authenticated_get("https://archiveofourown.org/collections/yuletide")
//!     .expect("Failed to fetch page");
//! ```

// Module declarations
pub mod auth;
pub mod client;
pub mod session;

// Re-export commonly used items for convenience
pub use auth::blocking::{Ao3Session, get_token};
pub use auth::{LoginInfo, Token, get_login_info};
pub use client::blocking::{create_client, get_document, get_page, post_form};
pub use client::{ClientConfig, FormResponse};
pub use session::Session;

// Re-export types from dependencies for convenience
pub use reqwest::Error as NetworkError;
pub use reqwest::blocking::Client;
pub use scraper::{Html, Selector};
