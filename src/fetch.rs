//! Upstream tile fetching.
//!
//! The orchestrator reaches providers through the [`TileFetcher`] port;
//! [`HttpTileFetcher`] is the reqwest-backed implementation. One request per
//! tile, no retries: the deadline passed by the caller covers the whole
//! exchange, connect through body, and a fired deadline cancels the
//! in-flight request.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, warn};

use crate::error::FetchError;

/// Client identifier sent on every upstream request. Tile providers require
/// a descriptive User-Agent and throttle anonymous clients.
pub const USER_AGENT: &str = concat!("tile-relay/", env!("CARGO_PKG_VERSION"));

/// A tile body as served by an upstream provider.
#[derive(Debug, Clone)]
pub struct FetchedTile {
    pub bytes: Bytes,
    /// The upstream `Content-Type`, when the response declared one. The
    /// orchestrator falls back to the source's default otherwise.
    pub content_type: Option<String>,
}

/// Port for fetching a tile from an already resolved URL.
#[async_trait]
pub trait TileFetcher: Send + Sync {
    /// GET `url`, bounded by `timeout`.
    ///
    /// Outcomes: a 2xx response yields the body bytes; any other status is
    /// [`FetchError::UpstreamStatus`]; an exceeded deadline is
    /// [`FetchError::Timeout`]; connection-level failures are
    /// [`FetchError::Transport`].
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedTile, FetchError>;
}

/// Reqwest-backed fetcher sharing one connection pool across sources.
pub struct HttpTileFetcher {
    client: Client,
}

impl HttpTileFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Transport {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl TileFetcher for HttpTileFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedTile, FetchError> {
        debug!(url, timeout_ms = timeout.as_millis() as u64, "fetching tile from upstream");

        // The per-request timeout covers the body read below as well.
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "upstream rejected tile request");
            return Err(FetchError::UpstreamStatus {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| classify_reqwest_error(e, timeout))?;

        Ok(FetchedTile {
            bytes,
            content_type,
        })
    }
}

/// Map a reqwest failure onto the upstream taxonomy. Shared with the
/// geocoding passthrough so both surfaces classify identically.
pub(crate) fn classify_reqwest_error(err: reqwest::Error, timeout: Duration) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        }
    } else {
        FetchError::Transport {
            message: err.to_string(),
        }
    }
}
