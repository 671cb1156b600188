//! HTTP server layer for the tile relay.
//!
//! This module provides the public HTTP API in front of the tile pipeline.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                        HTTP Layer                         │
//! │              GET /tiles/{source}/{z}/{x}/{y}              │
//! │                                                           │
//! │  ┌──────────────────────┐  ┌───────────────────────────┐  │
//! │  │       handlers       │  │          routes           │  │
//! │  │ (requests, mapping)  │  │  (router, CORS, tracing)  │  │
//! │  └──────────────────────┘  └───────────────────────────┘  │
//! └───────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    health_handler, reverse_geocode_handler, sources_handler, tile_handler,
    tile_preflight_handler, AppState, ErrorResponse, HealthResponse, ReverseGeocodeParams,
    SourceInfo, SourcesResponse, TilePathParams, CACHE_STATUS_HEADER, CACHE_TIME_HEADER,
    TILE_CACHE_CONTROL,
};
pub use routes::{create_router, RouterConfig};
