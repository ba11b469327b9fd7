// Where player data comes from: the live API, optionally memoized on disk
use async_trait::async_trait;
use chessgraph_core::Result;
use chessgraph_storage::{CacheKey, JsonCache};

use crate::client::ChessComClient;
use crate::models::{GameArchives, MonthlyGames, PlayerProfile, PlayerStats};

/// Read-only access to chess.com player data.
#[async_trait]
pub trait PlayerSource: Send + Sync {
    async fn profile(&self, username: &str) -> Result<PlayerProfile>;

    async fn stats(&self, username: &str) -> Result<PlayerStats>;

    async fn archives(&self, username: &str) -> Result<GameArchives>;

    async fn games_by_month(&self, username: &str, year: i32, month: u32) -> Result<MonthlyGames>;

    async fn games_by_month_pgn(&self, username: &str, year: i32, month: u32) -> Result<String>;
}

#[async_trait]
impl PlayerSource for ChessComClient {
    async fn profile(&self, username: &str) -> Result<PlayerProfile> {
        self.get_player_profile(username).await
    }

    async fn stats(&self, username: &str) -> Result<PlayerStats> {
        self.get_player_stats(username).await
    }

    async fn archives(&self, username: &str) -> Result<GameArchives> {
        self.get_player_game_archives(username).await
    }

    async fn games_by_month(&self, username: &str, year: i32, month: u32) -> Result<MonthlyGames> {
        self.get_player_games_by_month(username, year, month).await
    }

    async fn games_by_month_pgn(&self, username: &str, year: i32, month: u32) -> Result<String> {
        self.get_player_games_by_month_pgn(username, year, month).await
    }
}

#[async_trait]
impl<S: PlayerSource + ?Sized> PlayerSource for Box<S> {
    async fn profile(&self, username: &str) -> Result<PlayerProfile> {
        (**self).profile(username).await
    }

    async fn stats(&self, username: &str) -> Result<PlayerStats> {
        (**self).stats(username).await
    }

    async fn archives(&self, username: &str) -> Result<GameArchives> {
        (**self).archives(username).await
    }

    async fn games_by_month(&self, username: &str, year: i32, month: u32) -> Result<MonthlyGames> {
        (**self).games_by_month(username, year, month).await
    }

    async fn games_by_month_pgn(&self, username: &str, year: i32, month: u32) -> Result<String> {
        (**self).games_by_month_pgn(username, year, month).await
    }
}

/// Memoizes every call of the inner source in a [`JsonCache`]. Keys use the
/// lowercased username so `Hikaru` and `hikaru` share an entry.
pub struct CachedSource<S> {
    inner: S,
    cache: JsonCache,
}

impl<S: PlayerSource> CachedSource<S> {
    pub fn new(inner: S, cache: JsonCache) -> Self {
        Self { inner, cache }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn cache(&self) -> &JsonCache {
        &self.cache
    }
}

#[async_trait]
impl<S: PlayerSource> PlayerSource for CachedSource<S> {
    async fn profile(&self, username: &str) -> Result<PlayerProfile> {
        let name = username.to_lowercase();
        let key = CacheKey::new("get_player_profile", &[&name]);
        self.cache
            .get_or_insert_with(&key, || self.inner.profile(username))
            .await
    }

    async fn stats(&self, username: &str) -> Result<PlayerStats> {
        let name = username.to_lowercase();
        let key = CacheKey::new("get_player_stats", &[&name]);
        self.cache
            .get_or_insert_with(&key, || self.inner.stats(username))
            .await
    }

    async fn archives(&self, username: &str) -> Result<GameArchives> {
        let name = username.to_lowercase();
        let key = CacheKey::new("get_player_game_archives", &[&name]);
        self.cache
            .get_or_insert_with(&key, || self.inner.archives(username))
            .await
    }

    async fn games_by_month(&self, username: &str, year: i32, month: u32) -> Result<MonthlyGames> {
        let name = username.to_lowercase();
        let key = CacheKey::new("get_player_games_by_month", &[&name, &year, &month]);
        self.cache
            .get_or_insert_with(&key, || self.inner.games_by_month(username, year, month))
            .await
    }

    async fn games_by_month_pgn(&self, username: &str, year: i32, month: u32) -> Result<String> {
        let name = username.to_lowercase();
        let key = CacheKey::new("get_player_games_by_month_pgn", &[&name, &year, &month]);
        self.cache
            .get_or_insert_with(&key, || self.inner.games_by_month_pgn(username, year, month))
            .await
    }
}
