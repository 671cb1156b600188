//! Tile pipeline.
//!
//! The service sits between the HTTP layer and the two I/O ports:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              TileService                │
//! │   validate → cache get → fetch → serve  │
//! │              └── spawn cache set        │
//! └──────────┬───────────────────┬──────────┘
//!            │                   │
//!            ▼                   ▼
//! ┌──────────────────┐  ┌──────────────────┐
//! │    TileCache     │  │   TileFetcher    │
//! │  (moka / mock)   │  │ (reqwest / mock) │
//! └──────────────────┘  └──────────────────┘
//! ```
//!
//! Per request the service performs exactly one cache read and at most one
//! upstream fetch. Cache population happens on a detached task after the
//! response is on its way; cache failures degrade to misses.

mod service;

pub use service::{CacheStatus, TileImage, TileRequest, TileResponse, TileService};
