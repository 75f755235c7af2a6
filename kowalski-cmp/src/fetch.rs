//! Fare-search result fetching
//!
//! Every request is isolated: a transport or HTTP failure becomes a
//! `FetchOutcome::Failure` on that result and never aborts sibling fetches.
//! There is no retry.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

/// Errors raised by a `SearchClient`
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("HTTP {status} from fare search")]
    Status { status: u16 },

    #[error("response body is not JSON: {0}")]
    Decode(String),
}

/// HTTP seam to the fare-search API
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// GET `url` and decode the JSON body, failing on non-2xx status
    async fn get_json(&self, url: &str, timeout: Duration) -> Result<(Value, u16), FetchError>;
}

/// `SearchClient` over a pooled reqwest client
#[derive(Clone)]
pub struct ReqwestSearchClient {
    http_client: Client,
}

impl ReqwestSearchClient {
    pub fn new() -> Result<Self, FetchError> {
        let http_client = Client::builder()
            .user_agent(concat!("kowalski-cmp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self::from_client(http_client))
    }

    pub fn from_client(http_client: Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl SearchClient for ReqwestSearchClient {
    async fn get_json(&self, url: &str, timeout: Duration) -> Result<(Value, u16), FetchError> {
        let response = self
            .http_client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        Ok((body, status.as_u16()))
    }
}

/// Result of one fare-search call
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Success(Value),
    Failure(String),
}

/// One fetched URL with its outcome
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    pub url: String,
    pub outcome: FetchOutcome,
}

impl FetchResult {
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, FetchOutcome::Failure(_))
    }
}

/// Fetch a single URL, capturing any failure
pub async fn fetch(client: &dyn SearchClient, url: String, timeout: Duration) -> FetchResult {
    match client.get_json(&url, timeout).await {
        Ok((body, status)) => {
            debug!(url = %url, status, "Fare search succeeded");
            FetchResult {
                url,
                outcome: FetchOutcome::Success(body),
            }
        }
        Err(e) => {
            error!(url = %url, error = %e, "Fare search failed");
            FetchResult {
                url,
                outcome: FetchOutcome::Failure(format!("Error: {}", e)),
            }
        }
    }
}

/// Fetch all URLs with at most `concurrency` requests in flight
///
/// Result order is not guaranteed to match input order.
pub async fn fetch_all(
    client: &dyn SearchClient,
    urls: Vec<String>,
    timeout: Duration,
    concurrency: usize,
) -> Vec<FetchResult> {
    stream::iter(urls)
        .map(|url| fetch(client, url, timeout))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await
}
