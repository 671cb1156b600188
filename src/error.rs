use std::fmt;

use thiserror::Error;

use crate::coord::MAX_ZOOM;

/// Reasons a tile request fails validation (all map to HTTP 400)
///
/// `Display` and `Error` are implemented by hand: thiserror infers a field
/// named `source` as the error's cause, but `UnknownSource::source` is a
/// tile-source id (`String`), not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Source id is not in the registry
    UnknownSource { source: String },

    /// z, x or y is not a decimal integer
    NonNumericCoordinate { name: &'static str, value: String },

    /// Zoom parses but lies outside the supported pyramid
    ZoomOutOfRange { zoom: i64 },

    /// x or y lies outside the 2^zoom grid for the requested zoom
    CoordinateOutOfBounds {
        name: &'static str,
        value: i64,
        zoom: u8,
        extent: u32,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::UnknownSource { source } => {
                write!(f, "Unknown tile source: {source}")
            }
            ValidationError::NonNumericCoordinate { name, value } => {
                write!(f, "Invalid {name} coordinate: {value:?} is not an integer")
            }
            ValidationError::ZoomOutOfRange { zoom } => {
                write!(f, "Zoom level {zoom} out of range (supported: 0-{MAX_ZOOM})")
            }
            ValidationError::CoordinateOutOfBounds {
                name,
                value,
                zoom,
                extent,
            } => write!(
                f,
                "Coordinate {name}={value} out of bounds at zoom {zoom} (grid is {extent}x{extent})"
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Failures while fetching a tile from an upstream provider
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Upstream answered with a non-success status (forwarded to the client as-is)
    #[error("Upstream rejected request with status {status}")]
    UpstreamStatus { status: u16 },

    /// The whole exchange (connect + headers + body) exceeded the source deadline
    #[error("Upstream request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Connection-level failure: DNS, refused connection, TLS, reset mid-body
    #[error("Upstream transport error: {message}")]
    Transport { message: String },
}

/// Failures from the tile cache backend
///
/// These never reach a client: the orchestrator logs them and degrades
/// (a failed read is a miss, a failed write is dropped).
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// Backend unreachable or refusing operations
    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),

    /// Entry exists but cannot be interpreted as a tile
    #[error("Malformed cache entry: {0}")]
    InvalidEntry(String),
}

/// Errors surfaced by the tile pipeline
#[derive(Debug, Clone, Error)]
pub enum TileError {
    /// Request rejected before any I/O
    #[error("Invalid tile request: {0}")]
    Invalid(#[from] ValidationError),

    /// Upstream fetch failed after a cache miss
    #[error("Tile fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Unclassified failure inside the service
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Errors surfaced by the reverse-geocoding passthrough
#[derive(Debug, Clone, Error)]
pub enum GeocodeError {
    /// Latitude outside [-90, 90]
    #[error("Latitude {lat} out of range (-90 to 90)")]
    LatitudeOutOfRange { lat: f64 },

    /// Longitude outside [-180, 180]
    #[error("Longitude {lon} out of range (-180 to 180)")]
    LongitudeOutOfRange { lon: f64 },

    /// Upstream geocoder failed; shares the tile fetch taxonomy
    #[error("Geocoding request failed: {0}")]
    Fetch(#[from] FetchError),
}
