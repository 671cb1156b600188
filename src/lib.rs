//! # Tile Relay
//!
//! A caching reverse proxy for raster map tiles.
//!
//! This library provides the core functionality for relaying slippy-map tiles
//! from public basemap providers. Requests are validated against the tile
//! grid, served from an in-memory TTL cache when possible, and fetched from
//! the upstream provider on a miss. Fetched tiles are written back to the
//! cache without delaying the response.
//!
//! ## Features
//!
//! - **Coordinate validation**: Strict z/x/y bounds checking before any I/O
//! - **Cache-aside serving**: Byte-weighted in-memory cache with a 7-day TTL
//! - **Upstream fan-out**: Per-source URL templates with subdomain rotation
//! - **Failure isolation**: Cache errors degrade to misses, never to failures
//! - **Reverse geocoding**: Nominatim-compatible passthrough endpoint
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`coord`] - Tile coordinate parsing and grid validation
//! - [`source`] - Upstream provider registry and URL templates
//! - [`cache`] - Tile cache trait and in-memory implementation
//! - [`fetch`] - HTTP client for upstream tile providers
//! - [`tile`] - Tile service orchestrating cache and upstream
//! - [`geocode`] - Reverse-geocoding passthrough client
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use tile_relay::{
//!     create_router, HttpTileFetcher, MemoryTileCache, ReverseGeocoder, RouterConfig,
//!     SourceRegistry, TileService,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let cache = MemoryTileCache::with_defaults();
//!     let fetcher = HttpTileFetcher::new().unwrap();
//!     let service = TileService::new(SourceRegistry::builtin(), cache, fetcher);
//!     let geocoder =
//!         ReverseGeocoder::new("https://nominatim.openstreetmap.org", Duration::from_secs(5))
//!             .unwrap();
//!
//!     let router = create_router(service, geocoder, RouterConfig::new());
//!
//!     // Serve the router...
//! }
//! ```

pub mod cache;
pub mod config;
pub mod coord;
pub mod error;
pub mod fetch;
pub mod geocode;
pub mod server;
pub mod source;
pub mod tile;

// Re-export commonly used types
pub use cache::{MemoryTileCache, TileCache, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL_SECS};
pub use config::{Config, DEFAULT_HOST, DEFAULT_PORT};
pub use coord::{TileCoordinate, MAX_ZOOM};
pub use error::{CacheError, FetchError, GeocodeError, TileError, ValidationError};
pub use fetch::{FetchedTile, HttpTileFetcher, TileFetcher, USER_AGENT};
pub use geocode::{ReverseGeocoder, DEFAULT_GEOCODE_TIMEOUT_SECS, DEFAULT_GEOCODE_URL};
pub use server::{
    create_router, health_handler, sources_handler, tile_handler, AppState, ErrorResponse,
    HealthResponse, ReverseGeocodeParams, RouterConfig, SourceInfo, SourcesResponse,
    TilePathParams, CACHE_STATUS_HEADER, CACHE_TIME_HEADER, TILE_CACHE_CONTROL,
};
pub use source::{
    SourceRegistry, SubdomainCycle, TileSource, TileSourceConfig, SUBDOMAIN_TOKENS,
};
pub use tile::{CacheStatus, TileImage, TileRequest, TileResponse, TileService};
