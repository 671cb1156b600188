//! Configuration management for the tile relay.
//!
//! Supports command-line arguments via clap, environment variables with a
//! `RELAY_` prefix, and sensible defaults for every setting.
//!
//! # Environment Variables
//!
//! - `RELAY_HOST` - Server bind address (default: 0.0.0.0)
//! - `RELAY_PORT` - Server port (default: 3000)
//! - `RELAY_CACHE_CAPACITY` - Tile cache capacity in bytes (default: 100 MiB)
//! - `RELAY_CACHE_TTL_SECS` - Tile cache entry lifetime (default: 604800)
//! - `RELAY_GEOCODE_URL` - Reverse-geocoder base URL
//! - `RELAY_GEOCODE_TIMEOUT_SECS` - Reverse-geocoder deadline (default: 5)

use std::time::Duration;

use clap::Parser;

use crate::cache::{DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL_SECS};
use crate::geocode::{DEFAULT_GEOCODE_TIMEOUT_SECS, DEFAULT_GEOCODE_URL};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

// =============================================================================
// CLI Arguments
// =============================================================================

/// tile-relay - A caching reverse proxy for raster map tiles.
///
/// Validates slippy-map tile coordinates, serves hits from an in-memory TTL
/// cache, and fetches misses from the configured upstream providers.
#[derive(Parser, Debug, Clone)]
#[command(name = "tile-relay")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "RELAY_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "RELAY_PORT")]
    pub port: u16,

    // =========================================================================
    // Cache Configuration
    // =========================================================================
    /// Tile cache capacity in bytes.
    #[arg(long, default_value_t = DEFAULT_CACHE_CAPACITY, env = "RELAY_CACHE_CAPACITY")]
    pub cache_capacity: u64,

    /// Tile cache entry lifetime in seconds.
    ///
    /// Defaults to 7 days, matching the Cache-Control max-age advertised to
    /// clients.
    #[arg(long, default_value_t = DEFAULT_CACHE_TTL_SECS, env = "RELAY_CACHE_TTL_SECS")]
    pub cache_ttl_secs: u64,

    // =========================================================================
    // Geocoding Configuration
    // =========================================================================
    /// Base URL of the reverse-geocoding upstream (Nominatim-compatible).
    #[arg(long, default_value = DEFAULT_GEOCODE_URL, env = "RELAY_GEOCODE_URL")]
    pub geocode_url: String,

    /// Deadline for reverse-geocoding requests, in seconds.
    #[arg(long, default_value_t = DEFAULT_GEOCODE_TIMEOUT_SECS, env = "RELAY_GEOCODE_TIMEOUT_SECS")]
    pub geocode_timeout_secs: u64,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("port must be greater than 0".to_string());
        }

        if self.cache_capacity == 0 {
            return Err("cache_capacity must be greater than 0".to_string());
        }
        if self.cache_ttl_secs == 0 {
            return Err("cache_ttl_secs must be greater than 0".to_string());
        }

        if self.geocode_url.is_empty() {
            return Err("geocode_url must not be empty".to_string());
        }
        if self.geocode_timeout_secs == 0 {
            return Err("geocode_timeout_secs must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Tile cache entry lifetime.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Reverse-geocoder deadline.
    pub fn geocode_timeout(&self) -> Duration {
        Duration::from_secs(self.geocode_timeout_secs)
    }
}

// =============================================================================
// Tests
// =============================================================================
