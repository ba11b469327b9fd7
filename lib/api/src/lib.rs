//! chess.com access and graph construction for chessgraph.
//!
//! [`ChessComClient`] talks to the public API and retries on HTTP 429,
//! [`CachedSource`] memoizes any [`PlayerSource`] on disk, and
//! [`GraphBuilder`] expands an opponent graph from a root username.

pub mod builder;
pub mod client;
pub mod extraction;
pub mod models;
pub mod retry;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;

pub use builder::{BuildConfig, GraphBuilder, DEFAULT_CONCURRENCY};
pub use client::{ChessComClient, ClientConfig, DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
pub use extraction::{
    archive_months, fetch_archive_games, fetch_pgn, fetch_player, opponents_by_month,
    parse_archive_url, Period, DEFAULT_CATEGORY,
};
pub use models::{Game, GameArchives, MonthlyGames, PlayerProfile, PlayerStats};
pub use retry::{retry_on_rate_limit, RetryPolicy};
pub use source::{CachedSource, PlayerSource};
