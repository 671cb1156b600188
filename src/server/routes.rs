//! Router configuration for the tile relay.
//!
//! # Route Structure
//!
//! ```text
//! /health                        - Health check
//! /sources                       - List builtin tile sources
//! /tiles/{source}/{z}/{x}/{y}    - Tile endpoint (GET + OPTIONS)
//! /geocode/reverse               - Reverse-geocoding passthrough
//! ```
//!
//! Every route is public and CORS-open: the service fronts public tile
//! providers for browser map clients, so responses always carry
//! `Access-Control-Allow-Origin: *`.

use std::time::Duration;

use axum::{routing::get, Router};
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    health_handler, reverse_geocode_handler, sources_handler, tile_handler,
    tile_preflight_handler, AppState,
};
use crate::cache::TileCache;
use crate::fetch::TileFetcher;
use crate::geocode::ReverseGeocoder;
use crate::tile::TileService;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Whether to enable per-request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    pub fn new() -> Self {
        Self {
            enable_tracing: true,
        }
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// Builds the complete Axum router with the tile, source listing, geocoding
/// and health routes, the CORS layer, and optional request tracing.
pub fn create_router<C, F>(
    tile_service: TileService<C, F>,
    geocoder: ReverseGeocoder,
    config: RouterConfig,
) -> Router
where
    C: TileCache + 'static,
    F: TileFetcher + 'static,
{
    let app_state = AppState::new(tile_service, geocoder);
    let cors = build_cors_layer();

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/sources", get(sources_handler::<C, F>))
        .route(
            "/tiles/{source}/{z}/{x}/{y}",
            get(tile_handler::<C, F>).options(tile_preflight_handler),
        )
        .route("/geocode/reverse", get(reverse_geocode_handler::<C, F>))
        .with_state(app_state)
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer.
///
/// Origins are always `Any`: tile responses must be consumable from any
/// browser origin, and nothing served here is sensitive.
fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .allow_origin(Any)
        .max_age(Duration::from_secs(86400)) // 24 hours
}

// =============================================================================
// Tests
// =============================================================================
