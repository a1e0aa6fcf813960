use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Ao3ApiError>;

#[derive(Error, Debug)]
pub enum Ao3ApiError {
    /// The requested resource does not exist (the archive served its 404 page)
    #[error("Cannot find {0}")]
    InvalidId(String),
    #[error("We are being rate-limited. Try again in a while or reduce the number of requests")]
    RateLimited,
    /// An expected landmark is missing from the page, the upstream layout probably changed
    #[error("Unexpected page structure: {0}")]
    StructuralMismatch(String),
    #[error("{0}")]
    Unselected(String),
    #[error("No items in this category to be reviewed")]
    NoItems,
    #[error("Invalid authentication token. Try calling refresh_auth_token() on the session")]
    AuthError,
    #[error("Login failed: {0}")]
    LoginFailed(String),
    #[error("Unexpected status {status} from {url}")]
    UnexpectedStatus { url: String, status: u16 },
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Selector error: {0}")]
    SelectorError(String),
    #[error("regex error: {0}")]
    RegexError(String),
    #[error("serde error: {0}")]
    SerdeError(#[from] serde_json::Error),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("{0}")]
    GenericError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_carries_remediation() {
        let msg = Ao3ApiError::RateLimited.to_string();
        assert!(msg.contains("Try again in a while"));
    }

    #[test]
    fn auth_error_mentions_token_refresh() {
        let msg = Ao3ApiError::AuthError.to_string();
        assert!(msg.contains("refresh_auth_token"));
    }

    #[test]
    fn no_items_message() {
        assert_eq!(
            Ao3ApiError::NoItems.to_string(),
            "No items in this category to be reviewed"
        );
    }

    #[test]
    fn unexpected_status_display() {
        let error = Ao3ApiError::UnexpectedStatus {
            url: "https://archiveofourown.org/collections/x".to_string(),
            status: 500,
        };
        assert_eq!(
            error.to_string(),
            "Unexpected status 500 from https://archiveofourown.org/collections/x"
        );
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "login.txt");
        let error: Ao3ApiError = io.into();
        assert!(matches!(error, Ao3ApiError::IoError(_)));
    }
}
