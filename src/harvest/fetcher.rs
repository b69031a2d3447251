//! HTTP fetcher implementation
//!
//! This module handles all page retrievals, including:
//! - Building HTTP clients with the identifying user agent
//! - GET requests with timeout and redirect limits
//! - Classifying failures as transient (retryable) or permanent

use crate::config::Config;
use crate::model::FetchOutcome;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Upper bound for the TCP/TLS connect phase
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A source of page bodies
///
/// The pipeline only depends on this trait, so tests and alternate
/// transports can stand in for the HTTP implementation.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Performs one retrieval of `url`
    async fn fetch(&self, url: &Url) -> FetchOutcome;
}

/// Request options applied to every fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    pub request_timeout: Duration,

    /// Value sent in the `User-Agent` header
    pub user_agent: String,

    pub max_redirects: usize,
}

impl FetchOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            request_timeout: config.scraper.request_timeout(),
            user_agent: config.user_agent.header_value(),
            max_redirects: config.scraper.max_redirects as usize,
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `options` - Timeout, user agent and redirect limit
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(options: &FetchOptions) -> Result<Client, reqwest::Error> {
    let redirect = if options.max_redirects == 0 {
        Policy::none()
    } else {
        Policy::limited(options.max_redirects)
    };

    Client::builder()
        .user_agent(options.user_agent.clone())
        .timeout(options.request_timeout)
        .connect_timeout(CONNECT_TIMEOUT.min(options.request_timeout))
        .redirect(redirect)
        .gzip(true)
        .brotli(true)
        .build()
}

/// `PageFetcher` backed by a shared `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(options: &FetchOptions) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(options)?,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> FetchOutcome {
        fetch_url(&self.client, url).await
    }
}

/// Fetches a URL and classifies the result
///
/// # Classification
///
/// | Condition | Outcome |
/// |-----------|---------|
/// | HTTP 2xx, body read | Success |
/// | HTTP 429 | TransientFailure |
/// | HTTP 5xx | TransientFailure |
/// | Timeout, connection error, body read error | TransientFailure |
/// | Other HTTP 4xx | PermanentFailure |
/// | Non-HTTP(S) URL, invalid request | PermanentFailure |
/// | Redirect chain over the limit | PermanentFailure |
pub async fn fetch_url(client: &Client, url: &Url) -> FetchOutcome {
    if url.scheme() != "http" && url.scheme() != "https" {
        return FetchOutcome::PermanentFailure(format!(
            "unsupported URL scheme '{}'",
            url.scheme()
        ));
    }

    let response = match client.get(url.as_str()).send().await {
        Ok(response) => response,
        Err(e) => return classify_error(&e),
    };

    let status = response.status();
    if let Some(failure) = classify_status(status) {
        tracing::debug!("{} answered HTTP {}", url, status.as_u16());
        return failure;
    }

    match response.text().await {
        Ok(body) => FetchOutcome::Success(body),
        Err(e) => FetchOutcome::TransientFailure(format!("failed to read body: {}", e)),
    }
}

/// Maps a response status to a failure, or `None` for 2xx
pub fn classify_status(status: StatusCode) -> Option<FetchOutcome> {
    if status.is_success() {
        return None;
    }

    let reason = format!("HTTP {}", status);
    let outcome = if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        FetchOutcome::TransientFailure(reason)
    } else {
        // 4xx and anything left unfollowed (3xx without Location, 1xx)
        FetchOutcome::PermanentFailure(reason)
    };
    Some(outcome)
}

/// Classifies a transport-level error
fn classify_error(e: &reqwest::Error) -> FetchOutcome {
    if e.is_timeout() {
        FetchOutcome::TransientFailure("request timeout".to_string())
    } else if e.is_redirect() {
        FetchOutcome::PermanentFailure(format!("redirect error: {}", e))
    } else if e.is_builder() {
        FetchOutcome::PermanentFailure(format!("invalid request: {}", e))
    } else if e.is_connect() {
        FetchOutcome::TransientFailure(format!("connection failed: {}", e))
    } else {
        FetchOutcome::TransientFailure(e.to_string())
    }
}
