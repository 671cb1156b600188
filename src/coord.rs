//! Slippy-map tile coordinates and request validation.
//!
//! Path parameters arrive as raw strings and are validated here, before any
//! cache or upstream I/O, so rejections always follow the service's own
//! taxonomy instead of the framework's default extractor errors.

use std::fmt;

use crate::error::ValidationError;
use crate::source::TileSource;

/// Highest zoom level accepted by the service.
pub const MAX_ZOOM: u8 = 22;

/// A fully validated tile address: source plus slippy-map `z/x/y`.
///
/// Construction goes through [`TileCoordinate::parse`]; a value of this type
/// is guaranteed to satisfy `zoom <= MAX_ZOOM` and `x, y < 2^zoom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoordinate {
    pub source: TileSource,
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl TileCoordinate {
    /// Validate raw path parameters into a coordinate.
    ///
    /// Checks run in order: source, zoom, x, y. The first failure wins, so a
    /// request that is wrong in several ways reports a single reason.
    pub fn parse(source: &str, z: &str, x: &str, y: &str) -> Result<Self, ValidationError> {
        let source = TileSource::from_id(source).ok_or_else(|| ValidationError::UnknownSource {
            source: source.to_string(),
        })?;

        let zoom = parse_integer("z", z)?;
        if !(0..=i64::from(MAX_ZOOM)).contains(&zoom) {
            return Err(ValidationError::ZoomOutOfRange { zoom });
        }
        let zoom = zoom as u8;

        let extent = 1u32 << zoom;
        let x = parse_axis("x", x, zoom, extent)?;
        let y = parse_axis("y", y, zoom, extent)?;

        Ok(Self { source, zoom, x, y })
    }

    /// Number of tiles along one axis at this coordinate's zoom.
    pub fn grid_extent(&self) -> u32 {
        1u32 << self.zoom
    }
}

impl fmt::Display for TileCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.source.id(),
            self.zoom,
            self.x,
            self.y
        )
    }
}

fn parse_integer(name: &'static str, value: &str) -> Result<i64, ValidationError> {
    value
        .parse::<i64>()
        .map_err(|_| ValidationError::NonNumericCoordinate {
            name,
            value: value.to_string(),
        })
}

fn parse_axis(
    name: &'static str,
    value: &str,
    zoom: u8,
    extent: u32,
) -> Result<u32, ValidationError> {
    let parsed = parse_integer(name, value)?;
    if parsed < 0 || parsed >= i64::from(extent) {
        return Err(ValidationError::CoordinateOutOfBounds {
            name,
            value: parsed,
            zoom,
            extent,
        });
    }
    Ok(parsed as u32)
}
