//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests racing the traversal's cancellation token
//! - Transport error classification

use crate::config::UserAgentConfig;
use crate::traversal::ProcessError;
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Maximum number of redirect hops followed per request
const MAX_REDIRECTS: usize = 10;

/// Raw response for one identifier
#[derive(Debug, Clone)]
pub struct FetchedContent {
    /// Final URL after redirects
    pub final_url: String,

    /// HTTP status code
    pub status_code: u16,

    /// Content-Type header value
    pub content_type: Option<String>,

    /// Response body; empty for non-success statuses
    pub body: Vec<u8>,
}

impl FetchedContent {
    /// Returns true for a 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Returns true if the response can be searched for links
    ///
    /// A missing Content-Type is treated as HTML.
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .map_or(true, |ct| ct.to_ascii_lowercase().contains("text/html"))
    }
}

/// Fetch failures that never produced a response
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_connect() {
            FetchError::Connect(e.to_string())
        } else {
            FetchError::Request(e.to_string())
        }
    }
}

impl From<FetchError> for ProcessError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Cancelled => ProcessError::Cancelled,
            other => ProcessError::Transport {
                message: other.to_string(),
            },
        }
    }
}

/// Retrieves the content behind an identifier
///
/// Must be safe to call concurrently for independent identifiers.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(
        &self,
        identifier: &str,
        cancel: &CancellationToken,
    ) -> Result<FetchedContent, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Whole-request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use sumi_frontier::config::UserAgentConfig;
/// use sumi_frontier::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "SumiFrontier".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// `reqwest`-backed fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds the client from configuration and wraps it
    pub fn from_config(
        config: &UserAgentConfig,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config, timeout)?))
    }

    async fn get(&self, url: &str) -> Result<FetchedContent, reqwest::Error> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        // Error bodies are never parsed, so don't download them
        let body = if status.is_success() {
            response.bytes().await?.to_vec()
        } else {
            Vec::new()
        };

        Ok(FetchedContent {
            final_url,
            status_code: status.as_u16(),
            content_type,
            body,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        identifier: &str,
        cancel: &CancellationToken,
    ) -> Result<FetchedContent, FetchError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            result = self.get(identifier) => result.map_err(FetchError::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        }
    }

    fn content(status_code: u16, content_type: Option<&str>) -> FetchedContent {
        FetchedContent {
            final_url: "https://example.com".to_string(),
            status_code,
            content_type: content_type.map(str::to_string),
            body: Vec::new(),
        }
    }

    #[test]
    fn test_build_http_client() {
        let config = create_test_config();
        let client = build_http_client(&config, Duration::from_secs(5));
        assert!(client.is_ok());
    }

    #[test]
    fn test_is_html() {
        assert!(content(200, Some("text/html; charset=utf-8")).is_html());
        assert!(content(200, Some("TEXT/HTML")).is_html());
        assert!(content(200, None).is_html());
        assert!(!content(200, Some("application/pdf")).is_html());
    }

    #[test]
    fn test_is_success() {
        assert!(content(200, None).is_success());
        assert!(content(204, None).is_success());
        assert!(!content(301, None).is_success());
        assert!(!content(404, None).is_success());
    }

    #[test]
    fn test_fetch_error_into_process_error() {
        assert_eq!(
            ProcessError::from(FetchError::Cancelled),
            ProcessError::Cancelled
        );
        assert_eq!(
            ProcessError::from(FetchError::Timeout).kind(),
            "transport_error"
        );
    }

    #[tokio::test]
    async fn test_cancelled_fetch() {
        let fetcher = HttpFetcher::from_config(&create_test_config(), Duration::from_secs(5))
            .unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = fetcher.fetch("http://127.0.0.1:9/", &cancel).await;
        assert!(matches!(result, Err(FetchError::Cancelled)));
    }
}
