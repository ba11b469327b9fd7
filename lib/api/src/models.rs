// chess.com public API response bodies
use chessgraph_core::{Accuracies, GameEdge, PlayerDetails};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// `GET /player/{username}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub player_id: u64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Country resource URL, e.g. `https://api.chess.com/pub/country/US`.
    #[serde(default)]
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl PlayerProfile {
    /// ISO code taken from the last segment of the country URL.
    pub fn country_code(&self) -> &str {
        self.country.rsplit('/').next().unwrap_or_default()
    }
}

/// `GET /player/{username}/stats`. Keys are categories such as
/// `chess_rapid`; a few keys (`fide`, `tactics`) hold other shapes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    #[serde(flatten)]
    pub categories: BTreeMap<String, Value>,
}

impl PlayerStats {
    pub fn last_rating(&self, category: &str) -> Option<u32> {
        self.categories
            .get(category)?
            .pointer("/last/rating")?
            .as_u64()
            .and_then(|rating| u32::try_from(rating).ok())
    }
}

/// `GET /player/{username}/games/archives`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameArchives {
    #[serde(default)]
    pub archives: Vec<String>,
}

/// `GET /player/{username}/games/{YYYY}/{MM}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyGames {
    #[serde(default)]
    pub games: Vec<Game>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Game {
    pub url: String,
    pub pgn: String,
    pub time_control: String,
    pub time_class: String,
    pub rules: String,
    pub rated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracies: Option<Accuracies>,
    /// Opening URL on chess.com.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eco: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    pub end_time: i64,
    pub white: PlayerDetails,
    pub black: PlayerDetails,
}

impl Game {
    /// The other side of the board from `username`, or `None` when
    /// `username` did not play this game.
    pub fn opponent_of(&self, username: &str) -> Option<&PlayerDetails> {
        if self.white.username.eq_ignore_ascii_case(username) {
            Some(&self.black)
        } else if self.black.username.eq_ignore_ascii_case(username) {
            Some(&self.white)
        } else {
            None
        }
    }
}

impl From<Game> for GameEdge {
    fn from(game: Game) -> Self {
        GameEdge {
            url: game.url,
            pgn: game.pgn,
            time_control: game.time_control,
            time_class: game.time_class,
            rules: game.rules,
            accuracies: game.accuracies,
            eco_code: game.eco.unwrap_or_default(),
            white: Some(game.white),
            black: Some(game.black),
            start_time: game.start_time.unwrap_or(game.end_time),
            end_time: game.end_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_country_code() {
        let profile: PlayerProfile = serde_json::from_value(serde_json::json!({
            "player_id": 41,
            "@id": "https://api.chess.com/pub/player/fabianocaruana",
            "username": "fabianocaruana",
            "name": "Fabiano Caruana",
            "country": "https://api.chess.com/pub/country/US",
            "title": "GM",
            "followers": 1000
        }))
        .unwrap();

        assert_eq!(profile.country_code(), "US");
        assert_eq!(profile.name.as_deref(), Some("Fabiano Caruana"));
    }

    #[test]
    fn test_stats_last_rating() {
        let stats: PlayerStats = serde_json::from_value(serde_json::json!({
            "chess_rapid": { "last": { "rating": 2750, "date": 1, "rd": 60 } },
            "chess_blitz": { "best": { "rating": 3000 } },
            "fide": 2800
        }))
        .unwrap();

        assert_eq!(stats.last_rating("chess_rapid"), Some(2750));
        assert_eq!(stats.last_rating("chess_blitz"), None);
        assert_eq!(stats.last_rating("fide"), None);
        assert_eq!(stats.last_rating("chess_daily"), None);
    }

    #[test]
    fn test_game_to_edge() {
        let game: Game = serde_json::from_value(serde_json::json!({
            "url": "https://www.chess.com/game/live/1",
            "pgn": "[Event \"Live Chess\"]",
            "time_control": "600",
            "end_time": 1700000600,
            "rated": true,
            "accuracies": { "white": 91.2, "black": 84.0 },
            "time_class": "rapid",
            "rules": "chess",
            "eco": "https://www.chess.com/openings/Sicilian-Defense",
            "white": { "rating": 2010, "result": "win", "@id": "x", "username": "Alice", "uuid": "u1" },
            "black": { "rating": 1990, "result": "resigned", "@id": "y", "username": "bob", "uuid": "u2" }
        }))
        .unwrap();

        assert_eq!(game.opponent_of("alice").unwrap().username, "bob");
        assert_eq!(game.opponent_of("BOB").unwrap().username, "Alice");
        assert!(game.opponent_of("carol").is_none());

        let edge = GameEdge::from(game);
        assert_eq!(edge.time_class, "rapid");
        assert_eq!(edge.start_time, 1700000600);
        assert_eq!(edge.eco_code, "https://www.chess.com/openings/Sicilian-Defense");
        assert_eq!(edge.winner(), Some("Alice"));
        assert_eq!(edge.accuracies.map(|a| a.black), Some(84.0));
    }
}
