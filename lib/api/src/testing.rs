// In-memory PlayerSource for unit tests
use async_trait::async_trait;
use chessgraph_core::{Error, PlayerDetails, Result};
use serde_json::json;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::models::{Game, GameArchives, MonthlyGames, PlayerProfile, PlayerStats};
use crate::source::PlayerSource;

#[derive(Default)]
pub struct FakeSource {
    profiles: HashMap<String, PlayerProfile>,
    stats: HashMap<String, PlayerStats>,
    games: BTreeMap<(i32, u32), Vec<Game>>,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A player with a `chess_rapid` rating.
    pub fn with_player(mut self, username: &str, uid: u64, country: &str, rating: u32) -> Self {
        self = self.with_profile(username, uid, country);
        self.stats.insert(
            username.to_lowercase(),
            serde_json::from_value(json!({ "chess_rapid": { "last": { "rating": rating } } }))
                .expect("valid stats"),
        );
        self
    }

    /// A player with a profile but no stats.
    pub fn with_profile(mut self, username: &str, uid: u64, country: &str) -> Self {
        self.profiles.insert(
            username.to_lowercase(),
            PlayerProfile {
                player_id: uid,
                username: username.to_lowercase(),
                name: None,
                country: format!("https://api.chess.com/pub/country/{}", country),
                title: None,
                status: None,
                url: None,
            },
        );
        self
    }

    pub fn with_game(self, year: i32, month: u32, white: &str, black: &str, winner: &str) -> Self {
        self.with_timed_game(year, month, white, black, winner, "rapid")
    }

    pub fn with_timed_game(
        mut self,
        year: i32,
        month: u32,
        white: &str,
        black: &str,
        winner: &str,
        time_class: &str,
    ) -> Self {
        let side = |username: &str| PlayerDetails {
            username: username.to_string(),
            rating: 1500,
            result: if username == winner { "win" } else { "resigned" }.to_string(),
        };
        let games = self.games.entry((year, month)).or_default();
        let game = Game {
            url: format!("https://www.chess.com/game/live/{}", games.len() + 1),
            pgn: format!("[White \"{}\"]\n[Black \"{}\"]\n\n1. e4 e5 *", white, black),
            time_class: time_class.to_string(),
            rules: "chess".to_string(),
            white: side(white),
            black: side(black),
            ..Default::default()
        };
        games.push(game);
        self
    }

    pub fn calls(&self, method: &str) -> usize {
        self.calls.lock().get(method).copied().unwrap_or(0)
    }

    fn record(&self, method: &'static str) {
        *self.calls.lock().entry(method).or_insert(0) += 1;
    }

    fn known(&self, username: &str) -> Result<()> {
        if self.profiles.contains_key(&username.to_lowercase()) {
            Ok(())
        } else {
            Err(Error::PlayerNotFound(username.to_string()))
        }
    }

    fn games_of(&self, username: &str, year: i32, month: u32) -> Vec<Game> {
        self.games
            .get(&(year, month))
            .into_iter()
            .flatten()
            .filter(|game| game.opponent_of(username).is_some())
            .cloned()
            .collect()
    }
}

#[async_trait]
impl PlayerSource for FakeSource {
    async fn profile(&self, username: &str) -> Result<PlayerProfile> {
        self.record("profile");
        self.profiles
            .get(&username.to_lowercase())
            .cloned()
            .ok_or_else(|| Error::PlayerNotFound(username.to_string()))
    }

    async fn stats(&self, username: &str) -> Result<PlayerStats> {
        self.record("stats");
        self.known(username)?;
        Ok(self.stats.get(&username.to_lowercase()).cloned().unwrap_or_default())
    }

    async fn archives(&self, username: &str) -> Result<GameArchives> {
        self.record("archives");
        self.known(username)?;
        let months: BTreeSet<(i32, u32)> = self
            .games
            .keys()
            .copied()
            .filter(|&(year, month)| !self.games_of(username, year, month).is_empty())
            .collect();
        Ok(GameArchives {
            archives: months
                .into_iter()
                .map(|(year, month)| {
                    format!(
                        "https://api.chess.com/pub/player/{}/games/{:04}/{:02}",
                        username.to_lowercase(),
                        year,
                        month
                    )
                })
                .collect(),
        })
    }

    async fn games_by_month(&self, username: &str, year: i32, month: u32) -> Result<MonthlyGames> {
        self.record("games_by_month");
        self.known(username)?;
        Ok(MonthlyGames {
            games: self.games_of(username, year, month),
        })
    }

    async fn games_by_month_pgn(&self, username: &str, year: i32, month: u32) -> Result<String> {
        self.record("games_by_month_pgn");
        self.known(username)?;
        Ok(self
            .games_of(username, year, month)
            .into_iter()
            .map(|game| game.pgn)
            .collect::<Vec<_>>()
            .join("\n\n"))
    }
}
