use async_trait::async_trait;
use futures::StreamExt;
use reqwest::redirect::Policy;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::feed::parser::parse_feed;
use crate::feed::types::{FeedSource, NewsItem};

const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Default proxy endpoint; feeds are requested as `<proxy>?url=<feed url>`.
pub const DEFAULT_PROXY_URL: &str = "https://api.allorigins.win/raw";

/// Errors that can occur while retrieving or parsing one feed.
///
/// None of these are fatal to a refresh: the aggregator logs them and the
/// failing source contributes zero items.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the per-fetch timeout
    #[error("Request timed out")]
    Timeout,
    /// Feed content could not be parsed as RSS or Atom
    #[error("Parse error: {0}")]
    Parse(String),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
    /// Response body was not valid UTF-8
    #[error("Invalid UTF-8 in response")]
    InvalidUtf8,
    /// The proxy endpoint could not be combined with the feed URL
    #[error("Invalid proxy URL: {0}")]
    InvalidProxy(String),
}

/// Retrieves the raw text behind a URL.
///
/// This is the "fetch" capability the aggregator depends on; tests swap in
/// scripted implementations to count calls or inject failures.
#[async_trait]
pub trait FeedTransport: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

/// reqwest-backed transport that optionally routes requests through a
/// CORS-style proxy.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    proxy: Option<String>,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client, proxy: Option<String>) -> Self {
        Self { client, proxy }
    }

    /// Builds the URL actually requested for a feed.
    ///
    /// With a proxy, the feed URL is percent-encoded into the `url` query
    /// parameter; without one, the feed URL is used as-is.
    pub fn request_url(&self, feed_url: &str) -> Result<String, FetchError> {
        match &self.proxy {
            Some(proxy) => Url::parse_with_params(proxy, &[("url", feed_url)])
                .map(|u| u.to_string())
                .map_err(|e| FetchError::InvalidProxy(e.to_string())),
            None => Ok(feed_url.to_string()),
        }
    }
}

/// Redirect policy for feed requests: at most 3 hops, no loops.
fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }

        let url = attempt.url();
        for prev in attempt.previous() {
            if prev.as_str() == url.as_str() {
                return attempt.error("Redirect loop detected");
            }
        }

        tracing::debug!(
            from = %attempt.previous().last().map(|u| u.as_str()).unwrap_or("initial"),
            to = %url,
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );

        attempt.follow()
    })
}

/// Builds the shared HTTP client used for feed requests.
///
/// `timeout` is the whole-request ceiling; the aggregator additionally
/// bounds each feed with its own timeout.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, FetchError> {
    let client = reqwest::Client::builder()
        .redirect(create_redirect_policy())
        .user_agent(concat!("newsquiz/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(30))
        .timeout(timeout)
        .build()?;
    Ok(client)
}

#[async_trait]
impl FeedTransport for HttpTransport {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let request_url = self.request_url(url)?;
        let response = self
            .client
            .get(&request_url)
            .send()
            .await
            .map_err(FetchError::Network)?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        let bytes = read_limited_bytes(response, MAX_FEED_SIZE).await?;
        String::from_utf8(bytes).map_err(|_| FetchError::InvalidUtf8)
    }
}

/// Fetches one feed and extracts its items.
///
/// No retries are attempted. A transport failure or unparseable body is
/// returned as an `Err`; the aggregator decides what that means for the
/// batch.
///
/// # Errors
///
/// - Any [`FetchError`] reported by the transport
/// - [`FetchError::Parse`] if the body is not an RSS/Atom document
pub async fn fetch_feed(
    transport: &dyn FeedTransport,
    source: &FeedSource,
) -> Result<Vec<NewsItem>, FetchError> {
    let text = transport.fetch_text(&source.url).await?;
    let items = parse_feed(&source.name, &text).map_err(|e| FetchError::Parse(e.to_string()))?;

    tracing::debug!(feed = %source.name, items = items.len(), "Parsed feed");
    Ok(items)
}

/// [`fetch_feed`] bounded by `timeout`; elapsed time maps to [`FetchError::Timeout`].
pub async fn fetch_feed_with_timeout(
    transport: &dyn FeedTransport,
    source: &FeedSource,
    timeout: Duration,
) -> Result<Vec<NewsItem>, FetchError> {
    tokio::time::timeout(timeout, fetch_feed(transport, source))
        .await
        .map_err(|_| FetchError::Timeout)?
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    // EDGE-005: a dropped connection can end the stream early
    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
