//! Reverse-geocoding passthrough.
//!
//! Map front-ends pair tile layers with a "what is at this point" lookup.
//! The service proxies a single upstream geocoder (Nominatim-compatible
//! `/reverse` API) so browsers talk to one origin. Responses are relayed
//! verbatim and never cached; the upstream terms for free geocoding
//! endpoints disallow bulk storage.

use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use crate::error::{FetchError, GeocodeError};
use crate::fetch::{classify_reqwest_error, USER_AGENT};

/// Default upstream geocoder.
pub const DEFAULT_GEOCODE_URL: &str = "https://nominatim.openstreetmap.org";

/// Default deadline for a geocoding exchange.
pub const DEFAULT_GEOCODE_TIMEOUT_SECS: u64 = 5;

/// Client for the upstream reverse-geocoding API.
pub struct ReverseGeocoder {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl ReverseGeocoder {
    /// Build a geocoder against `base_url`.
    ///
    /// Fails only on unusable startup configuration (bad URL, client build),
    /// so the error is a plain message for the launcher to print.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, String> {
        let base_url = Url::parse(base_url)
            .map_err(|e| format!("invalid geocoder base URL {:?}: {}", base_url, e))?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| format!("failed to build geocoder HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// Look up the place at `(lat, lon)` and return the upstream JSON body.
    ///
    /// Coordinates are range-checked before any I/O; upstream failures map
    /// onto the same taxonomy as tile fetches (status passthrough, 504 on
    /// timeout, 502 on transport errors).
    pub async fn reverse(&self, lat: f64, lon: f64) -> Result<Bytes, GeocodeError> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(GeocodeError::LatitudeOutOfRange { lat });
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(GeocodeError::LongitudeOutOfRange { lon });
        }

        let url = self.build_url(lat, lon)?;
        debug!(url = %url, "forwarding reverse-geocode lookup");

        let response = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "geocoder rejected lookup");
            return Err(GeocodeError::Fetch(FetchError::UpstreamStatus {
                status: status.as_u16(),
            }));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| classify_reqwest_error(e, self.timeout))?;

        Ok(body)
    }

    fn build_url(&self, lat: f64, lon: f64) -> Result<Url, GeocodeError> {
        let mut url = self
            .base_url
            .join("reverse")
            .map_err(|e| GeocodeError::Fetch(FetchError::Transport {
                message: format!("cannot build geocoder URL: {}", e),
            }))?;
        url.query_pairs_mut()
            .append_pair("format", "jsonv2")
            .append_pair("lat", &lat.to_string())
            .append_pair("lon", &lon.to_string());
        Ok(url)
    }
}
