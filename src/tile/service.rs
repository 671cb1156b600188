//! Tile orchestration.
//!
//! [`TileService`] is the entry point for tile requests. For each request it:
//! 1. Validates the raw path parameters into a [`TileCoordinate`]
//! 2. Performs exactly one cache read (a cache error is logged and degraded
//!    to a miss)
//! 3. On a hit, answers immediately
//! 4. On a miss, resolves the upstream URL (rotating the subdomain token)
//!    and performs at most one fetch, bounded by the source's deadline
//! 5. On fetch success, spawns a detached cache write and answers without
//!    waiting for it; on failure, answers with the mapped error and writes
//!    nothing

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tracing::{debug, warn};

use crate::cache::TileCache;
use crate::coord::TileCoordinate;
use crate::error::TileError;
use crate::fetch::TileFetcher;
use crate::source::{SourceRegistry, SubdomainCycle};

// =============================================================================
// Tile Request / Response
// =============================================================================

/// Raw tile request parameters, exactly as they appeared in the path.
///
/// Values stay unparsed so that validation (and its 400 taxonomy) happens in
/// one place, inside the service, rather than in the router's extractors.
#[derive(Debug, Clone)]
pub struct TileRequest {
    pub source: String,
    pub zoom: String,
    pub x: String,
    pub y: String,
}

impl TileRequest {
    pub fn new(
        source: impl Into<String>,
        zoom: impl Into<String>,
        x: impl Into<String>,
        y: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            zoom: zoom.into(),
            x: x.into(),
            y: y.into(),
        }
    }
}

/// Whether a response was served from the cache or fetched upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    /// Header value for `X-Cache-Status`.
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An encoded tile ready to serve.
#[derive(Debug, Clone)]
pub struct TileImage {
    /// Encoded image bytes, exactly as the upstream served them.
    pub bytes: Bytes,
    /// Concrete content type: the upstream's when declared, the source
    /// default otherwise. Never empty.
    pub content_type: String,
}

/// Response from the tile service.
#[derive(Debug, Clone)]
pub struct TileResponse {
    pub image: TileImage,
    pub cache_status: CacheStatus,
    /// Time from entry into the service until the response was ready.
    pub elapsed: Duration,
}

// =============================================================================
// Tile Service
// =============================================================================

/// Orchestrates validation, cache lookup, upstream fetching and background
/// cache population.
///
/// # Type Parameters
///
/// * `C` - The cache store (moka-backed in production)
/// * `F` - The upstream fetcher (reqwest-backed in production)
pub struct TileService<C: TileCache, F: TileFetcher> {
    /// Immutable table of upstream providers.
    registry: SourceRegistry,

    /// Tile store; shared with the detached write tasks.
    cache: Arc<C>,

    /// Upstream client.
    fetcher: Arc<F>,

    /// Round-robin cursor for `{s}` substitution.
    subdomains: SubdomainCycle,
}

impl<C, F> TileService<C, F>
where
    C: TileCache + 'static,
    F: TileFetcher,
{
    /// Create a service owning its ports.
    pub fn new(registry: SourceRegistry, cache: C, fetcher: F) -> Self {
        Self::with_shared(registry, Arc::new(cache), Arc::new(fetcher))
    }

    /// Create a service over already shared ports.
    ///
    /// Lets callers keep their own handles to the cache and fetcher, e.g.
    /// to expose store statistics elsewhere or to observe calls in tests.
    pub fn with_shared(registry: SourceRegistry, cache: Arc<C>, fetcher: Arc<F>) -> Self {
        Self {
            registry,
            cache,
            fetcher,
            subdomains: SubdomainCycle::new(),
        }
    }

    /// The provider table this service resolves sources against.
    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Serve one tile request.
    ///
    /// # Errors
    ///
    /// * [`TileError::Invalid`] - the request failed validation (no I/O was
    ///   performed)
    /// * [`TileError::Fetch`] - the cache missed and the upstream fetch
    ///   failed (nothing was cached)
    pub async fn get_tile(&self, request: TileRequest) -> Result<TileResponse, TileError> {
        let started = Instant::now();

        // Validation owns the 400 taxonomy; nothing past this point runs
        // for a malformed request.
        let coord = match TileCoordinate::parse(&request.source, &request.zoom, &request.x, &request.y)
        {
            Ok(coord) => coord,
            Err(err) => {
                debug!(
                    source = %request.source,
                    z = %request.zoom,
                    x = %request.x,
                    y = %request.y,
                    elapsed_ms = elapsed_ms(started),
                    error = %err,
                    "rejected tile request"
                );
                return Err(err.into());
            }
        };

        // Exactly one cache read per request. An unavailable cache is a
        // miss, not a failure.
        match self.cache.get(&coord).await {
            Ok(Some(image)) => {
                debug!(
                    tile = %coord,
                    elapsed_ms = elapsed_ms(started),
                    "serving tile from cache"
                );
                return Ok(TileResponse {
                    image,
                    cache_status: CacheStatus::Hit,
                    elapsed: started.elapsed(),
                });
            }
            Ok(None) => {}
            Err(err) => {
                warn!(tile = %coord, error = %err, "cache read failed, treating as miss");
            }
        }

        let config = self.registry.get(coord.source);
        let subdomain = self.subdomains.next();
        let url = config.resolve_url(&coord, subdomain);

        let fetched = match self.fetcher.fetch(&url, config.timeout).await {
            Ok(fetched) => fetched,
            Err(err) => {
                warn!(
                    tile = %coord,
                    url = %url,
                    elapsed_ms = elapsed_ms(started),
                    error = %err,
                    "upstream fetch failed"
                );
                return Err(err.into());
            }
        };

        let image = TileImage {
            bytes: fetched.bytes,
            content_type: fetched
                .content_type
                .unwrap_or_else(|| config.content_type.to_string()),
        };

        // Populate the cache off the request path. The response does not
        // wait for the write and never learns whether it succeeded.
        self.spawn_cache_write(coord, image.clone());

        debug!(
            tile = %coord,
            bytes = image.bytes.len(),
            elapsed_ms = elapsed_ms(started),
            "serving tile from upstream"
        );

        Ok(TileResponse {
            image,
            cache_status: CacheStatus::Miss,
            elapsed: started.elapsed(),
        })
    }

    fn spawn_cache_write(&self, coord: TileCoordinate, image: TileImage) {
        let cache = Arc::clone(&self.cache);
        tokio::spawn(async move {
            if let Err(err) = cache.set(&coord, image).await {
                warn!(tile = %coord, error = %err, "cache write failed, entry dropped");
            }
        });
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

// =============================================================================
// Tests
// =============================================================================
