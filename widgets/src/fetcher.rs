use std::future::Future;
use std::pin::Pin;

use otstatus_shared::{OFFLINE, StatusPayload};
use reqwest::StatusCode;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use tracing::{debug, warn};

use crate::config::{upstream_connect_timeout, upstream_http_timeout};

pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = StatusPayload> + Send + 'a>>;

/// Anything that can produce one status payload for an endpoint.
///
/// Implementations never fail: every error is reported as [`OFFLINE`].
pub trait StatusSource: Send + Sync + 'static {
    fn fetch<'a>(&'a self, endpoint: &'a str) -> FetchFuture<'a>;
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(StatusCode),
    #[error("malformed status payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Single-shot HTTP status fetch. No retries: the poller's next tick is the retry.
#[derive(Debug, Clone)]
pub struct StatusFetcher {
    client: reqwest::Client,
}

impl StatusFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn from_config() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent("otstatus-widgets/0.1")
            .timeout(upstream_http_timeout())
            .connect_timeout(upstream_connect_timeout())
            .build()?;
        Ok(Self::new(client))
    }

    pub async fn fetch(&self, endpoint: &str) -> StatusPayload {
        match self.try_fetch(endpoint).await {
            Ok(payload) => {
                debug!(endpoint, online = payload.online, "status fetched");
                payload
            }
            Err(e) => {
                warn!(error = %e, endpoint, "status fetch failed; reporting offline");
                OFFLINE
            }
        }
    }

    async fn try_fetch(&self, endpoint: &str) -> Result<StatusPayload, FetchError> {
        let response = self
            .client
            .get(endpoint)
            .header(CACHE_CONTROL, "no-cache, no-store")
            .header(PRAGMA, "no-cache")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.bytes().await?;
        Ok(StatusPayload::from_json(&body)?)
    }
}

impl StatusSource for StatusFetcher {
    fn fetch<'a>(&'a self, endpoint: &'a str) -> FetchFuture<'a> {
        Box::pin(StatusFetcher::fetch(self, endpoint))
    }
}
