//! # chessgraph
//!
//! Crawl chess.com player data and build the graph of who played whom.
//!
//! Starting from one username, chessgraph fetches the player's games for a
//! period, groups them by opponent, looks each opponent up and links them with
//! an edge weighted by rating difference. Opponents are expanded in turn down
//! to a depth bound. API responses are memoized as JSON files so a second run
//! is served from disk, and HTTP 429 responses are retried with jitter.
//!
//! ## Quick Start
//!
//! ### As a CLI
//!
//! ```bash
//! USER_AGENT="my-app (me@example.com)" chessgraph graph fabianocaruana --depth 2 --save
//! chessgraph expand hikaru
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use chessgraph::prelude::*;
//!
//! # async fn run() -> chessgraph::Result<()> {
//! let client = ChessComClient::new(ClientConfig::default())?;
//! let cache = JsonCache::new(CacheConfig::default())?;
//! let builder = GraphBuilder::new(
//!     CachedSource::new(client, cache),
//!     BuildConfig { depth: 2, ..BuildConfig::default() },
//! );
//!
//! let graph = builder.initialize("fabianocaruana").await?;
//! println!("{} players, {} edges", graph.node_count(), graph.edge_count());
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Structure
//!
//! - `chessgraph-core` - Graph model, filters and the error type
//! - `chessgraph-storage` - JSON response cache and graph snapshots
//! - `chessgraph-api` - chess.com client, retry, cached source and graph builder

// Re-export core types
pub use chessgraph_core::{
    Accuracies, Country, Edge, Error, FilterSet, GameEdge, GraphData, GraphSummary, MinRating,
    PlayerDetails, PlayerFilter, PlayerGraph, PlayerNode, Result,
};

// Re-export storage
pub use chessgraph_storage::{
    CacheConfig, CacheKey, GraphSnapshot, GraphSnapshotManager, JsonCache, SnapshotDescription,
};

// Re-export API
pub use chessgraph_api::{
    BuildConfig, CachedSource, ChessComClient, ClientConfig, GraphBuilder, Period, PlayerSource,
    RetryPolicy,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        BuildConfig, CacheConfig, CachedSource, ChessComClient, ClientConfig, Error, FilterSet,
        GameEdge, GraphBuilder, GraphSnapshotManager, JsonCache, Period, PlayerGraph, PlayerNode,
        PlayerSource, Result,
    };
}
