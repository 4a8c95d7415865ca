use std::time::Duration;

use futures::stream::{self, StreamExt};
use thiserror::Error;

use crate::storage::{Database, Subscription};

use super::parser::{parse_channel, Channel};

const MAX_RETRIES: u32 = 3;
const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors covering the lifecycle of a channel fetch: network, HTTP,
/// parsing, and cache storage.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Server returned 429 Too Many Requests after max retries
    #[error("Rate limited after {0} retries")]
    RateLimited(u32),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Feed XML could not be parsed as RSS or Atom
    #[error("Parse error: {0}")]
    Parse(String),
    /// Failed to store the fetched channel in the cache
    #[error("Cache error: {0}")]
    Cache(String),
}

/// Tunables for fetch and refresh, usually filled from [`crate::config::Config`].
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub cache_ttl_minutes: i64,
    pub concurrency: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            cache_ttl_minutes: crate::storage::DEFAULT_CHANNEL_TTL_MINUTES,
            concurrency: 10,
        }
    }
}

/// Outcome of refreshing one subscription's cached channel.
#[derive(Debug)]
pub struct RefreshOutcome {
    pub title: String,
    /// Item count on success, or the error that occurred.
    pub result: Result<usize, FetchError>,
}

/// Fetch a feed URL and parse it into a [`Channel`].
///
/// 429 and 5xx responses are retried up to three times with exponential
/// backoff (2s, 4s, 8s); other non-2xx statuses fail immediately.
/// Response bodies are capped at 10MB.
pub async fn fetch_channel(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<Channel, FetchError> {
    let mut retry = 0;

    let bytes = loop {
        let response = tokio::time::timeout(timeout, client.get(url).send())
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(FetchError::Network)?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            if retry >= MAX_RETRIES {
                return Err(if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    FetchError::RateLimited(MAX_RETRIES)
                } else {
                    FetchError::HttpStatus(status.as_u16())
                });
            }
            let delay_secs = 2u64.pow(retry);
            tracing::warn!(
                url = %url,
                status = %status,
                retry = retry,
                delay_secs = delay_secs,
                "Transient HTTP failure, backing off"
            );
            tokio::time::sleep(Duration::from_secs(delay_secs)).await;
            retry += 1;
            continue;
        }

        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        break read_limited_bytes(response, MAX_FEED_SIZE).await?;
    };

    parse_channel(&bytes).map_err(|e| FetchError::Parse(e.to_string()))
}

/// Fetch a channel and store it in the cache, returning the channel.
pub async fn fetch_and_cache(
    db: &Database,
    client: &reqwest::Client,
    url: &str,
    options: &FetchOptions,
) -> Result<Channel, FetchError> {
    let channel = fetch_channel(client, url, options.timeout).await?;
    db.cache_channel(url, &channel, options.cache_ttl_minutes)
        .await
        .map_err(|e| FetchError::Cache(e.to_string()))?;
    Ok(channel)
}

/// Refresh the cached channel for every subscription, with bounded
/// concurrency. Results come back in completion order.
pub async fn refresh_all(
    db: Database,
    client: reqwest::Client,
    subscriptions: Vec<Subscription>,
    options: FetchOptions,
) -> Vec<RefreshOutcome> {
    if subscriptions.is_empty() {
        return Vec::new();
    }

    let concurrency = options.concurrency.max(1);
    stream::iter(subscriptions)
        .map(|sub| {
            let db = db.clone();
            let client = client.clone();
            let options = options.clone();
            async move {
                let result = fetch_and_cache(&db, &client, &sub.xml_url, &options)
                    .await
                    .map(|channel| channel.items.len());
                if let Err(e) = &result {
                    tracing::warn!(title = %sub.title, url = %sub.xml_url, error = %e, "Refresh failed");
                }
                RefreshOutcome {
                    title: sub.title,
                    result,
                }
            }
        })
        .buffer_unordered(concurrency)
        .collect()
        .await
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: trust Content-Length when the server sends one
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
