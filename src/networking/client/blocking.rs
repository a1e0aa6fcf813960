//! Blocking HTTP client implementation for AO3

use super::{ClientConfig, FormResponse};
use crate::errors::{Ao3ApiError, Result};
use log::{debug, warn};
use reqwest::blocking::{Client, Response};
use reqwest::{StatusCode, header, redirect};
use scraper::Html;
use std::thread::sleep;

/// Redirect hops followed by [`get_page`] before giving up
const MAX_REDIRECTS: usize = 10;

/// Create a configured HTTP client for AO3 operations
///
/// Redirects are handled by hand so form submissions can inspect them.
///
/// # Example
/// ```no_run
/// use ao3_collections::networking::{ClientConfig, create_client};
/// let client = create_client(&ClientConfig::default()).expect("Failed to create client");
/// ```
pub fn create_client(config: &ClientConfig) -> std::result::Result<Client, reqwest::Error> {
    Client::builder()
        .redirect(redirect::Policy::none())
        .cookie_store(true)
        .timeout(config.timeout)
        .user_agent(config.user_agent.as_str())
        .build()
}

fn location_of(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Get the requested URL with the provided client
///
/// # Arguments
/// * `url` - URL to fetch
/// * `client` - reqwest Client to use
/// * `config` - used to resolve relative redirects and for the politeness delay
///
/// # Returns
/// * The final response. 404 pages are returned as-is, the archive renders them with an
///   "Error 404" heading that callers check for.
///
/// # Errors
/// * `RateLimited` on HTTP 429, no retry is attempted
/// * `UnexpectedStatus` for any other non-success status or a redirect loop
pub fn get_page(url: &str, client: &Client, config: &ClientConfig) -> Result<Response> {
    let mut current = url.to_string();
    for _ in 0..=MAX_REDIRECTS {
        debug!("Did request to {}", current);
        let response = client.get(&current).send()?;
        let status = response.status();
        debug!("{} -> {}", current, status);

        match status {
            status if status.is_redirection() => {
                let Some(location) = location_of(&response) else {
                    return Err(Ao3ApiError::UnexpectedStatus {
                        url: current,
                        status: status.as_u16(),
                    });
                };
                debug!("Following redirect to {}", location);
                current = config.absolute_url(&location);
            }
            StatusCode::TOO_MANY_REQUESTS => {
                warn!("Rate limited while fetching {}", current);
                return Err(Ao3ApiError::RateLimited);
            }
            status if status.is_success() || status == StatusCode::NOT_FOUND => {
                if !config.request_delay.is_zero() {
                    sleep(config.request_delay);
                }
                return Ok(response);
            }
            status => {
                return Err(Ao3ApiError::UnexpectedStatus {
                    url: current,
                    status: status.as_u16(),
                });
            }
        }
    }
    Err(Ao3ApiError::UnexpectedStatus {
        url: url.to_string(),
        status: StatusCode::LOOP_DETECTED.as_u16(),
    })
}

/// Fetch a page and parse it into a document
pub fn get_document(url: &str, client: &Client, config: &ClientConfig) -> Result<Html> {
    let body = get_page(url, client, config)?.text()?;
    Ok(Html::parse_document(&body))
}

/// Submit a form-encoded POST without following the redirect it answers with
///
/// # Arguments
/// * `url` - form action
/// * `form` - field name / value pairs, encoded by reqwest
/// * `client` - reqwest Client to use
pub fn post_form(url: &str, form: &[(String, String)], client: &Client) -> Result<FormResponse> {
    debug!("Posting {} fields to {}", form.len(), url);
    let response = client.post(url).form(form).send()?;
    let status = response.status();
    debug!("{} -> {}", url, status);
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(Ao3ApiError::RateLimited);
    }
    Ok(FormResponse {
        status: status.as_u16(),
        location: location_of(&response),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> ClientConfig {
        ClientConfig {
            base_url: server.uri(),
            ..ClientConfig::default()
        }
    }

    // The blocking client owns its own runtime, so it must live off the async workers
    async fn fetch(server: &MockServer, route: &str) -> Result<String> {
        let config = config_for(server);
        let url = format!("{}{}", config.base_url, route);
        tokio::task::spawn_blocking(move || -> Result<String> {
            let client = create_client(&config)?;
            Ok(get_page(&url, &client, &config)?.text()?)
        })
        .await
        .unwrap()
    }

    async fn submit(
        server: &MockServer,
        route: &str,
        form: Vec<(String, String)>,
    ) -> Result<FormResponse> {
        let config = config_for(server);
        let url = format!("{}{}", config.base_url, route);
        tokio::task::spawn_blocking(move || -> Result<FormResponse> {
            let client = create_client(&config)?;
            post_form(&url, &form, &client)
        })
        .await
        .unwrap()
    }

    #[test]
    fn client_builds_from_default_config() {
        assert!(create_client(&ClientConfig::default()).is_ok());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn too_many_requests_is_rate_limited_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collections/busy"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&server)
            .await;

        let result = fetch(&server, "/collections/busy").await;
        assert!(matches!(result, Err(Ao3ApiError::RateLimited)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn redirects_are_followed_to_the_final_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collections/old"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("Location", "/collections/new"),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/collections/new"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<h2>New home</h2>"))
            .expect(1)
            .mount(&server)
            .await;

        let body = fetch(&server, "/collections/old").await.unwrap();
        assert_eq!(body, "<h2>New home</h2>");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn not_found_pages_are_returned() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collections/gone"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Error 404"))
            .mount(&server)
            .await;

        let body = fetch(&server, "/collections/gone").await.unwrap();
        assert_eq!(body, "Error 404");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn redirect_loop_gives_up_after_max_hops() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collections/loop"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("Location", "/collections/loop"),
            )
            .expect(MAX_REDIRECTS as u64 + 1)
            .mount(&server)
            .await;

        let result = fetch(&server, "/collections/loop").await;
        match result {
            Err(Ao3ApiError::UnexpectedStatus { url, status }) => {
                assert_eq!(status, 508);
                assert!(url.ends_with("/collections/loop"));
            }
            other => panic!("expected UnexpectedStatus, got {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn redirect_without_location_is_unexpected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collections/nowhere"))
            .respond_with(ResponseTemplate::new(302))
            .mount(&server)
            .await;

        let result = fetch(&server, "/collections/nowhere").await;
        assert!(matches!(
            result,
            Err(Ao3ApiError::UnexpectedStatus { status: 302, .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn server_errors_are_unexpected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collections/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = fetch(&server, "/collections/broken").await;
        assert!(matches!(
            result,
            Err(Ao3ApiError::UnexpectedStatus { status: 500, .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn form_post_returns_redirect_unfollowed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/collections/x/items/update_multiple"))
            .and(body_string_contains("authenticity_token=abc"))
            .and(body_string_contains("_method=patch"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("Location", "/collections/x/items"),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/collections/x/items"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let form = vec![
            ("authenticity_token".to_string(), "abc".to_string()),
            ("_method".to_string(), "patch".to_string()),
        ];
        let response = submit(&server, "/collections/x/items/update_multiple", form)
            .await
            .unwrap();
        assert_eq!(
            response,
            FormResponse {
                status: 302,
                location: Some("/collections/x/items".to_string()),
            }
        );
        assert!(response.is_redirect());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn form_post_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/collections/x/items/update_multiple"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&server)
            .await;

        let result = submit(&server, "/collections/x/items/update_multiple", Vec::new()).await;
        assert!(matches!(result, Err(Ao3ApiError::RateLimited)));
    }
}
