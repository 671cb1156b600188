use async_trait::async_trait;

use crate::coord::TileCoordinate;
use crate::error::CacheError;
use crate::tile::TileImage;

/// Storage port for fetched tiles.
///
/// Implementations key by the full coordinate (source included), return
/// `None` for absent or expired entries, and are free to evict at will: the
/// cache is an optimization, never the source of truth. Both operations are
/// fallible so that out-of-process backends can report outages; callers
/// treat any error as a miss.
#[async_trait]
pub trait TileCache: Send + Sync {
    /// Look up the tile stored for `coord`, if any.
    async fn get(&self, coord: &TileCoordinate) -> Result<Option<TileImage>, CacheError>;

    /// Store a freshly fetched tile under `coord`.
    async fn set(&self, coord: &TileCoordinate, image: TileImage) -> Result<(), CacheError>;
}
