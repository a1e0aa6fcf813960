//! HTTP client configuration shared by the blocking implementation
pub mod blocking;

use std::time::Duration;

/// Default archive root
pub const AO3_BASE_URL: &str = "https://archiveofourown.org";

/// Configuration for the AO3 HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Archive root, without a trailing slash
    pub base_url: String,
    pub user_agent: String,
    /// Whole-request timeout handed to reqwest
    pub timeout: Duration,
    /// Pause after every successful GET, zero disables it
    pub request_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: AO3_BASE_URL.to_string(),
            user_agent: concat!("ao3-collections/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::new(960, 0),
            request_delay: Duration::ZERO,
        }
    }
}

impl ClientConfig {
    /// Resolves a location header or href against the archive root
    pub fn absolute_url(&self, location: &str) -> String {
        if location.starts_with("http") {
            location.to_string()
        } else if location.starts_with('/') {
            format!("{}{}", self.base_url, location)
        } else {
            format!("{}/{}", self.base_url, location)
        }
    }
}

/// What the server answered to a form submission.
///
/// Redirects are not followed, so `location` is the raw `Location` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormResponse {
    pub status: u16,
    pub location: Option<String>,
}

impl FormResponse {
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_points_at_ao3() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "https://archiveofourown.org");
        assert_eq!(config.timeout, Duration::from_secs(960));
        assert_eq!(config.request_delay, Duration::ZERO);
        assert!(config.user_agent.starts_with("ao3-collections/"));
    }

    #[test]
    fn absolute_url_resolution() {
        let config = ClientConfig::default();
        assert_eq!(
            config.absolute_url("/collections/x"),
            "https://archiveofourown.org/collections/x"
        );
        assert_eq!(
            config.absolute_url("https://example.org/a"),
            "https://example.org/a"
        );
        assert_eq!(
            config.absolute_url("auth_error"),
            "https://archiveofourown.org/auth_error"
        );
    }

    #[test]
    fn redirect_detection() {
        let found = FormResponse {
            status: 302,
            location: Some("/collections/x/items".to_string()),
        };
        assert!(found.is_redirect());
        let ok = FormResponse {
            status: 200,
            location: None,
        };
        assert!(!ok.is_redirect());
    }
}
