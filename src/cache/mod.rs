//! Tile cache boundary.
//!
//! The orchestrator talks to the cache only through the [`TileCache`] port,
//! so the backing store is swappable. A cache failure is never fatal: the
//! service logs it and degrades (failed read = miss, failed write = dropped).
//!
//! [`MemoryTileCache`] is the default store: an in-process moka cache with
//! byte-weighted capacity and per-entry time-to-live.

mod memory;
mod store;

pub use memory::{MemoryTileCache, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL_SECS};
pub use store::TileCache;
