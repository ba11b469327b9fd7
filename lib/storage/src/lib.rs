pub mod cache;
pub mod snapshot;

pub use cache::{CacheConfig, CacheKey, JsonCache, DEFAULT_CACHE_DIR};
pub use snapshot::{GraphSnapshot, GraphSnapshotManager, SnapshotDescription};
