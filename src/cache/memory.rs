//! In-memory tile store backed by `moka::future::Cache`.
//!
//! Moka's lock-free internals make it safe to hit from many concurrent
//! request tasks without blocking the runtime. Entries are weighed by their
//! encoded size so the capacity bound is in bytes, not tile counts, and a
//! time-to-live keeps the store aligned with the freshness window the
//! service advertises to clients.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

use crate::cache::TileCache;
use crate::coord::TileCoordinate;
use crate::error::CacheError;
use crate::tile::TileImage;

/// Default capacity: 100 MiB of encoded tiles.
pub const DEFAULT_CACHE_CAPACITY: u64 = 100 * 1024 * 1024;

/// Default entry lifetime: 7 days, matching the `Cache-Control` max-age
/// advertised on tile responses.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 604_800;

/// In-process tile store with byte-weighted LRU eviction and TTL expiry.
pub struct MemoryTileCache {
    cache: Cache<TileCoordinate, TileImage>,
}

impl MemoryTileCache {
    /// Create a store bounded to `max_size_bytes` with per-entry `ttl`.
    pub fn new(max_size_bytes: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            // Weigh entries by payload size; moka weights are u32.
            .weigher(|_coord: &TileCoordinate, image: &TileImage| -> u32 {
                image.bytes.len().min(u32::MAX as usize) as u32
            })
            .max_capacity(max_size_bytes)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    pub fn with_defaults() -> Self {
        Self::new(
            DEFAULT_CACHE_CAPACITY,
            Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        )
    }

    /// Number of live entries.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Total weight of live entries, in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.cache.weighted_size()
    }
}

impl Default for MemoryTileCache {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[async_trait]
impl TileCache for MemoryTileCache {
    async fn get(&self, coord: &TileCoordinate) -> Result<Option<TileImage>, CacheError> {
        // Expired entries are filtered by moka at read time.
        Ok(self.cache.get(coord).await)
    }

    async fn set(&self, coord: &TileCoordinate, image: TileImage) -> Result<(), CacheError> {
        self.cache.insert(*coord, image).await;
        Ok(())
    }
}
