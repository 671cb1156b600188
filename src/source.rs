//! Builtin upstream tile providers.
//!
//! The registry is a static table: sources are compiled in, looked up by id,
//! and never registered at runtime. Each entry carries the URL template, the
//! fallback content type, the fetch deadline and the attribution string for
//! that provider.
//!
//! Templates use `{s}`, `{z}`, `{x}` and `{y}` tokens. `{s}` picks a CDN
//! subdomain; requests rotate through [`SUBDOMAIN_TOKENS`] so load spreads
//! across provider edge nodes. Templates without `{s}` (single-host
//! providers) ignore the chosen token.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::coord::TileCoordinate;

/// Subdomain tokens substituted for `{s}` in URL templates.
pub const SUBDOMAIN_TOKENS: [&str; 4] = ["a", "b", "c", "d"];

/// Identifiers of the builtin tile providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileSource {
    /// Carto Voyager raster basemap
    Streets,
    /// Carto Positron (light) raster basemap
    Light,
    /// Carto Dark Matter raster basemap
    Dark,
    /// Esri World Imagery
    Satellite,
}

impl TileSource {
    /// Every builtin source, in registry order.
    pub const ALL: [TileSource; 4] = [
        TileSource::Streets,
        TileSource::Light,
        TileSource::Dark,
        TileSource::Satellite,
    ];

    /// The id used in request paths and logs.
    pub fn id(&self) -> &'static str {
        match self {
            TileSource::Streets => "streets",
            TileSource::Light => "light",
            TileSource::Dark => "dark",
            TileSource::Satellite => "satellite",
        }
    }

    /// Look up a source by its path id. Lookup is case-sensitive.
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "streets" => Some(TileSource::Streets),
            "light" => Some(TileSource::Light),
            "dark" => Some(TileSource::Dark),
            "satellite" => Some(TileSource::Satellite),
            _ => None,
        }
    }
}

impl fmt::Display for TileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Static configuration for one upstream provider.
#[derive(Debug, Clone)]
pub struct TileSourceConfig {
    pub source: TileSource,
    /// URL template with `{s}`/`{z}`/`{x}`/`{y}` tokens.
    pub url_template: &'static str,
    /// Content type served when the upstream response does not declare one.
    pub content_type: &'static str,
    /// Deadline for the whole upstream exchange, including the body.
    pub timeout: Duration,
    /// Attribution required by the provider's terms.
    pub attribution: &'static str,
}

impl TileSourceConfig {
    /// Substitute all template tokens for a concrete coordinate.
    pub fn resolve_url(&self, coord: &TileCoordinate, subdomain: &str) -> String {
        self.url_template
            .replace("{s}", subdomain)
            .replace("{z}", &coord.zoom.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string())
    }
}

const CARTO_TIMEOUT: Duration = Duration::from_secs(10);
const ESRI_TIMEOUT: Duration = Duration::from_secs(15);

const CARTO_ATTRIBUTION: &str = "(c) OpenStreetMap contributors, (c) CARTO";

// Indexed in TileSource declaration order; SourceRegistry::get relies on it.
const BUILTIN_SOURCES: [TileSourceConfig; 4] = [
    TileSourceConfig {
        source: TileSource::Streets,
        url_template: "https://{s}.basemaps.cartocdn.com/rastertiles/voyager/{z}/{x}/{y}.png",
        content_type: "image/png",
        timeout: CARTO_TIMEOUT,
        attribution: CARTO_ATTRIBUTION,
    },
    TileSourceConfig {
        source: TileSource::Light,
        url_template: "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}.png",
        content_type: "image/png",
        timeout: CARTO_TIMEOUT,
        attribution: CARTO_ATTRIBUTION,
    },
    TileSourceConfig {
        source: TileSource::Dark,
        url_template: "https://{s}.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}.png",
        content_type: "image/png",
        timeout: CARTO_TIMEOUT,
        attribution: CARTO_ATTRIBUTION,
    },
    // Esri serves row before column, hence {y} before {x}.
    TileSourceConfig {
        source: TileSource::Satellite,
        url_template:
            "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
        content_type: "image/jpeg",
        timeout: ESRI_TIMEOUT,
        attribution: "(c) Esri, Maxar, Earthstar Geographics",
    },
];

/// Immutable lookup table of the builtin providers.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    sources: &'static [TileSourceConfig],
}

impl SourceRegistry {
    /// The compiled-in provider table.
    pub fn builtin() -> Self {
        Self {
            sources: &BUILTIN_SOURCES,
        }
    }

    /// Configuration for a known source.
    pub fn get(&self, source: TileSource) -> &TileSourceConfig {
        &self.sources[source as usize]
    }

    /// Configuration by path id, if the id names a builtin source.
    pub fn resolve(&self, id: &str) -> Option<&TileSourceConfig> {
        TileSource::from_id(id).map(|source| self.get(source))
    }

    /// All configured sources, in registry order.
    pub fn all(&self) -> &[TileSourceConfig] {
        self.sources
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Round-robin cursor over [`SUBDOMAIN_TOKENS`].
///
/// Token choice only spreads load, so a relaxed counter is enough; no
/// ordering with surrounding operations is required.
#[derive(Debug, Default)]
pub struct SubdomainCycle {
    counter: AtomicUsize,
}

impl SubdomainCycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next token in rotation.
    pub fn next(&self) -> &'static str {
        let idx = self.counter.fetch_add(1, Ordering::Relaxed);
        SUBDOMAIN_TOKENS[idx % SUBDOMAIN_TOKENS.len()]
    }
}
