//! AO3 authentication: login credentials, token dispenser, sessions
pub mod blocking;

pub use blocking::{LoginInfo, Token, get_login_info};
