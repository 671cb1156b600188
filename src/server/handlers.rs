//! HTTP request handlers for the tile relay API.
//!
//! # Endpoints
//!
//! - `GET /tiles/{source}/{z}/{x}/{y}` - Serve a tile (cache-aside)
//! - `OPTIONS /tiles/{source}/{z}/{x}/{y}` - CORS/preflight support
//! - `GET /sources` - List the builtin tile sources
//! - `GET /geocode/reverse` - Reverse-geocoding passthrough
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::cache::TileCache;
use crate::coord::MAX_ZOOM;
use crate::error::{FetchError, GeocodeError, TileError, ValidationError};
use crate::fetch::TileFetcher;
use crate::geocode::ReverseGeocoder;
use crate::tile::{TileRequest, TileService};

// =============================================================================
// Response Headers
// =============================================================================

/// `Cache-Control` sent with every tile. Tiles are immutable for their
/// lifetime, so clients and intermediaries may cache aggressively.
pub const TILE_CACHE_CONTROL: &str = "public, max-age=604800, immutable";

/// Header reporting whether the tile came from the cache (`HIT`/`MISS`).
pub const CACHE_STATUS_HEADER: &str = "X-Cache-Status";

/// Header reporting the service-side time to produce the tile, in ms.
pub const CACHE_TIME_HEADER: &str = "X-Cache-Time";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state, passed to handlers via Axum's State extractor.
pub struct AppState<C: TileCache, F: TileFetcher> {
    /// The tile service for processing tile requests
    pub tile_service: Arc<TileService<C, F>>,

    /// Upstream client for the reverse-geocoding passthrough
    pub geocoder: Arc<ReverseGeocoder>,
}

impl<C: TileCache, F: TileFetcher> AppState<C, F> {
    pub fn new(tile_service: TileService<C, F>, geocoder: ReverseGeocoder) -> Self {
        Self {
            tile_service: Arc::new(tile_service),
            geocoder: Arc::new(geocoder),
        }
    }
}

// Manual Clone so that C and F are not required to be Clone themselves.
impl<C: TileCache, F: TileFetcher> Clone for AppState<C, F> {
    fn clone(&self) -> Self {
        Self {
            tile_service: Arc::clone(&self.tile_service),
            geocoder: Arc::clone(&self.geocoder),
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Path parameters for tile requests, extracted from
/// `/tiles/{source}/{z}/{x}/{y}`.
///
/// Every field stays a `String`: parsing happens in the tile service so a
/// request like `/tiles/streets/3/4/banana` gets this service's 400 body
/// instead of the extractor's default rejection.
#[derive(Debug, Deserialize)]
pub struct TilePathParams {
    pub source: String,
    pub z: String,
    pub x: String,
    pub y: String,
}

/// Query parameters for the reverse-geocoding endpoint.
#[derive(Debug, Deserialize)]
pub struct ReverseGeocodeParams {
    pub lat: f64,
    pub lon: f64,
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "unknown_source", "upstream_timeout")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

/// One entry in the source listing.
#[derive(Debug, Serialize)]
pub struct SourceInfo {
    /// Source id as used in tile paths
    pub id: String,

    /// Content type served when the upstream does not declare one
    pub content_type: String,

    /// Deepest zoom level accepted for this source
    pub max_zoom: u8,

    /// Attribution required by the provider's terms
    pub attribution: String,
}

/// Response from the source listing endpoint.
#[derive(Debug, Serialize)]
pub struct SourcesResponse {
    pub sources: Vec<SourceInfo>,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Status and error-type for an upstream failure. Shared by the tile and
/// geocode surfaces so both classify identically.
fn fetch_error_parts(err: &FetchError) -> (StatusCode, &'static str) {
    match err {
        // The upstream's own verdict is forwarded as-is.
        FetchError::UpstreamStatus { status } => (
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
            "upstream_rejected",
        ),
        FetchError::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "upstream_timeout"),
        FetchError::Transport { .. } => (StatusCode::BAD_GATEWAY, "upstream_unreachable"),
    }
}

fn validation_error_type(err: &ValidationError) -> &'static str {
    match err {
        ValidationError::UnknownSource { .. } => "unknown_source",
        ValidationError::NonNumericCoordinate { .. } => "invalid_coordinate",
        ValidationError::ZoomOutOfRange { .. } => "zoom_out_of_range",
        ValidationError::CoordinateOutOfBounds { .. } => "coordinate_out_of_bounds",
    }
}

/// Log by severity and build the JSON error body.
///
/// - 5xx are logged at ERROR level (our side or the upstream's side broke)
/// - 404s at DEBUG level (missing tiles are common and expected)
/// - other 4xx at WARN level
fn error_response(status: StatusCode, error_type: &'static str, message: String) -> Response {
    if status.is_server_error() {
        error!(
            error_type = error_type,
            status = status.as_u16(),
            "Server error: {}",
            message
        );
    } else if status == StatusCode::NOT_FOUND {
        debug!(
            error_type = error_type,
            status = status.as_u16(),
            "Resource not found: {}",
            message
        );
    } else if status.is_client_error() {
        warn!(
            error_type = error_type,
            status = status.as_u16(),
            "Client error: {}",
            message
        );
    }

    let body = ErrorResponse::with_status(error_type, message, status);
    (status, Json(body)).into_response()
}

/// Convert TileError to an HTTP response.
impl IntoResponse for TileError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            // 400 Bad Request: the request never made it past validation
            TileError::Invalid(validation) => (
                StatusCode::BAD_REQUEST,
                validation_error_type(validation),
                validation.to_string(),
            ),

            TileError::Fetch(fetch) => {
                let (status, error_type) = fetch_error_parts(fetch);
                (status, error_type, fetch.to_string())
            }

            TileError::Internal { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                message.clone(),
            ),
        };

        error_response(status, error_type, message)
    }
}

/// Convert GeocodeError to an HTTP response.
impl IntoResponse for GeocodeError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            GeocodeError::LatitudeOutOfRange { .. } | GeocodeError::LongitudeOutOfRange { .. } => {
                (StatusCode::BAD_REQUEST, "invalid_coordinate", self.to_string())
            }

            GeocodeError::Fetch(fetch) => {
                let (status, error_type) = fetch_error_parts(fetch);
                (status, error_type, fetch.to_string())
            }
        };

        error_response(status, error_type, message)
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle tile requests.
///
/// # Endpoint
///
/// `GET /tiles/{source}/{z}/{x}/{y}`
///
/// # Path Parameters
///
/// - `source`: Tile source id (e.g., "streets", "satellite")
/// - `z`: Zoom level (0-22)
/// - `x`: Tile column, `0..2^z`
/// - `y`: Tile row, `0..2^z`
///
/// # Response
///
/// - `200 OK`: Encoded tile image
/// - `400 Bad Request`: Unknown source or invalid coordinates
/// - `502/504`: Upstream unreachable / timed out
/// - Other: Upstream rejection status, forwarded as-is
///
/// # Headers
///
/// - `Content-Type`: Upstream's content type, or the source default
/// - `Cache-Control: public, max-age=604800, immutable`
/// - `X-Cache-Status: HIT|MISS`
/// - `X-Cache-Time: <elapsed ms>`
pub async fn tile_handler<C, F>(
    State(state): State<AppState<C, F>>,
    Path(params): Path<TilePathParams>,
) -> Result<Response, TileError>
where
    C: TileCache + 'static,
    F: TileFetcher + 'static,
{
    let request = TileRequest::new(params.source, params.z, params.x, params.y);
    let tile = state.tile_service.get_tile(request).await?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, tile.image.content_type.as_str())
        .header(header::CACHE_CONTROL, TILE_CACHE_CONTROL)
        .header(CACHE_STATUS_HEADER, tile.cache_status.as_str())
        .header(CACHE_TIME_HEADER, tile.elapsed.as_millis().to_string())
        .body(Body::from(tile.image.bytes))
        .unwrap();

    Ok(response)
}

/// Answer plain OPTIONS on the tile route.
///
/// True CORS preflights (carrying `Access-Control-Request-Method`) are
/// handled by the CORS layer before reaching this handler; this covers
/// clients probing the route with a bare OPTIONS.
pub async fn tile_preflight_handler() -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::ALLOW, "GET, OPTIONS")
        .header(header::ACCESS_CONTROL_ALLOW_METHODS, "GET, OPTIONS")
        .body(Body::empty())
        .unwrap()
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "ok",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle source listing requests.
///
/// # Endpoint
///
/// `GET /sources`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "sources": [
///     {
///       "id": "streets",
///       "content_type": "image/png",
///       "max_zoom": 22,
///       "attribution": "(c) OpenStreetMap contributors, (c) CARTO"
///     }
///   ]
/// }
/// ```
pub async fn sources_handler<C, F>(State(state): State<AppState<C, F>>) -> Json<SourcesResponse>
where
    C: TileCache + 'static,
    F: TileFetcher + 'static,
{
    let sources = state
        .tile_service
        .registry()
        .all()
        .iter()
        .map(|config| SourceInfo {
            id: config.source.id().to_string(),
            content_type: config.content_type.to_string(),
            max_zoom: MAX_ZOOM,
            attribution: config.attribution.to_string(),
        })
        .collect();

    Json(SourcesResponse { sources })
}

/// Handle reverse-geocoding requests.
///
/// # Endpoint
///
/// `GET /geocode/reverse?lat={lat}&lon={lon}`
///
/// # Response
///
/// - `200 OK`: The upstream geocoder's JSON body, relayed verbatim
/// - `400 Bad Request`: lat/lon outside valid ranges
/// - `502/504`: Upstream unreachable / timed out
pub async fn reverse_geocode_handler<C, F>(
    State(state): State<AppState<C, F>>,
    Query(params): Query<ReverseGeocodeParams>,
) -> Result<Response, GeocodeError>
where
    C: TileCache + 'static,
    F: TileFetcher + 'static,
{
    let body = state.geocoder.reverse(params.lat, params.lon).await?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();

    Ok(response)
}

// =============================================================================
// Tests
// =============================================================================
