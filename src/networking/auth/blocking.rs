//! Blocking authentication implementation for AO3
use crate::errors::{Ao3ApiError, Result};
use crate::networking::client::blocking::{create_client, get_document, get_page, post_form};
use crate::networking::{ClientConfig, FormResponse, Session};
use log::{debug, info};
use reqwest::blocking::Client;
use scraper::Html;
use serde::Deserialize;
use std::fs;
use std::sync::RwLock;

/// Login information for AO3 authentication
#[derive(Debug, Clone)]
pub struct LoginInfo {
    pub username: Box<str>,
    pub password: Box<str>,
}

impl LoginInfo {
    pub fn new(username: &str, password: &str) -> Self {
        LoginInfo {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Authentication token from AO3
#[derive(Deserialize, Debug)]
pub struct Token {
    pub token: String,
}

/// Parse login information from the contents of a login file
fn parse_login_info(contents: &str) -> Result<LoginInfo> {
    let mut lines = contents.lines().map(str::trim).filter(|line| !line.is_empty());
    let username = lines
        .next()
        .ok_or_else(|| Ao3ApiError::LoginFailed("Username not found in login file".to_string()))?;
    let password = lines
        .next()
        .ok_or_else(|| Ao3ApiError::LoginFailed("Password not found in login file".to_string()))?;
    Ok(LoginInfo::new(username, password))
}

/// Get login information from text file at provided path
///
/// # Arguments
/// * `path` - Path to login file (username on first line, password on second)
///
/// # Example
/// ```no_run
/// use ao3_collections::networking::get_login_info;
/// let info = get_login_info("log.txt").expect("unreadable login file");
/// ```
pub fn get_login_info(path: &str) -> Result<LoginInfo> {
    parse_login_info(&fs::read_to_string(path)?)
}

/// Get an auth token for the client's session
///
/// # Arguments
/// * `client` - reqwest Client being used
/// * `config` - client configuration, for the archive root
///
/// # Returns
/// * The token handed out by the archive's token dispenser
pub fn get_token(client: &Client, config: &ClientConfig) -> Result<String> {
    let url = format!("{}/token_dispenser.json", config.base_url);
    let temp = get_page(&url, client, config)?.text()?;
    let j: Token = serde_json::from_str(&temp)?;
    debug!("Token is: {}", j.token);

    Ok(j.token)
}

/// A cookie-backed session against the archive, either guest or logged in
pub struct Ao3Session {
    client: Client,
    config: ClientConfig,
    username: Option<String>,
    token: RwLock<Option<String>>,
}

impl Ao3Session {
    /// Anonymous session; moderation requests made with it will be refused
    pub fn guest(config: ClientConfig) -> Result<Self> {
        let client = create_client(&config)?;
        Ok(Ao3Session {
            client,
            config,
            username: None,
            token: RwLock::new(None),
        })
    }

    /// Login to AO3 with the provided credentials
    ///
    /// # Example
    /// ```no_run
    /// use ao3_collections::networking::{Ao3Session, ClientConfig, LoginInfo};
    /// let info = LoginInfo::new("user", "hunter2");
    /// let session = Ao3Session::login(ClientConfig::default(), &info).unwrap();
    /// assert!(session.is_authenticated());
    /// ```
    pub fn login(config: ClientConfig, info: &LoginInfo) -> Result<Self> {
        let mut session = Self::guest(config)?;
        // get the auth token
        let token = session.refresh_auth_token()?;
        let form = vec![
            ("authenticity_token".to_string(), token),
            ("user[login]".to_string(), info.username.to_string()),
            ("user[password]".to_string(), info.password.to_string()),
            ("commit".to_string(), "Log In".to_string()),
        ];
        let url = format!("{}/users/login", session.config.base_url);
        let response = post_form(&url, &form, &session.client)?;
        if !login_succeeded(&response) {
            return Err(Ao3ApiError::LoginFailed(
                "Invalid username or password".to_string(),
            ));
        }
        // the token is bound to the pre-login cookie, get one for the logged in session
        session.refresh_auth_token()?;
        session.username = Some(info.username.to_string());
        info!("logged in as {}", info.username);
        Ok(session)
    }

    /// Login with credentials read from a login file
    pub fn from_login_file(config: ClientConfig, path: &str) -> Result<Self> {
        Self::login(config, &get_login_info(path)?)
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.username.is_some()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

/// A successful login redirects away from the login form; a failed one re-renders it
fn login_succeeded(response: &FormResponse) -> bool {
    response.is_redirect()
        && response
            .location
            .as_deref()
            .is_some_and(|location| !location.contains("/users/login") && !location.contains("auth_error"))
}

impl Session for Ao3Session {
    fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn authenticated_get(&self, url: &str) -> Result<Html> {
        get_document(url, &self.client, &self.config)
    }

    fn authenticity_token(&self) -> Result<String> {
        if let Some(token) = self
            .token
            .read()
            .map_err(|_| Ao3ApiError::GenericError("token lock poisoned".to_string()))?
            .clone()
        {
            return Ok(token);
        }
        self.refresh_auth_token()
    }

    fn refresh_auth_token(&self) -> Result<String> {
        let token = get_token(&self.client, &self.config)?;
        *self
            .token
            .write()
            .map_err(|_| Ao3ApiError::GenericError("token lock poisoned".to_string()))? =
            Some(token.clone());
        Ok(token)
    }

    fn submit_form(&self, url: &str, form: &[(String, String)]) -> Result<FormResponse> {
        post_form(url, form, &self.client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_file_two_lines() {
        let info = parse_login_info("reader\nsecret\n").unwrap();
        assert_eq!(&*info.username, "reader");
        assert_eq!(&*info.password, "secret");
    }

    #[test]
    fn login_file_skips_blank_lines_and_whitespace() {
        let info = parse_login_info("\n  reader \r\n\nsecret\n").unwrap();
        assert_eq!(&*info.username, "reader");
        assert_eq!(&*info.password, "secret");
    }

    #[test]
    fn login_file_missing_password() {
        let error = parse_login_info("reader\n").unwrap_err();
        assert!(matches!(error, Ao3ApiError::LoginFailed(_)));
    }

    #[test]
    fn missing_login_file_is_io_error() {
        let error = get_login_info("/nonexistent/ao3/login.txt").unwrap_err();
        assert!(matches!(error, Ao3ApiError::IoError(_)));
    }

    #[test]
    fn token_dispenser_json() {
        let token: Token = serde_json::from_str(r#"{"token":"abc123"}"#).unwrap();
        assert_eq!(token.token, "abc123");
    }

    #[test]
    fn login_outcome_from_redirect() {
        let ok = FormResponse {
            status: 302,
            location: Some("https://archiveofourown.org/users/reader".to_string()),
        };
        assert!(login_succeeded(&ok));

        let bounced = FormResponse {
            status: 302,
            location: Some("https://archiveofourown.org/users/login".to_string()),
        };
        assert!(!login_succeeded(&bounced));

        let rerendered = FormResponse {
            status: 200,
            location: None,
        };
        assert!(!login_succeeded(&rerendered));
    }

    #[test]
    fn guest_session_is_not_authenticated() {
        let session = Ao3Session::guest(ClientConfig::default()).unwrap();
        assert!(!session.is_authenticated());
        assert_eq!(session.username(), None);
        assert_eq!(session.auth_error_url(), "https://archiveofourown.org/auth_error");
    }
}
