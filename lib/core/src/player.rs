use serde::{Deserialize, Serialize};

/// A chess.com player, keyed in the graph by `username`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerNode {
    pub uid: u64,
    #[serde(default)]
    pub name: String,
    pub username: String,
    /// ISO country code, e.g. `US`.
    #[serde(default)]
    pub country: String,
    /// Last rating in the configured time-control category.
    pub rating: u32,
}

impl PlayerNode {
    #[inline]
    #[must_use]
    pub fn new(uid: u64, username: impl Into<String>, rating: u32) -> Self {
        Self {
            uid,
            name: String::new(),
            username: username.into(),
            country: String::new(),
            rating,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    /// Absolute rating difference, used as the edge weight.
    #[inline]
    #[must_use]
    pub fn rating_difference(&self, other: &PlayerNode) -> u32 {
        self.rating.abs_diff(other.rating)
    }
}

/// One side of a game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerDetails {
    pub username: String,
    pub rating: u32,
    /// chess.com result code: `win`, `checkmated`, `resigned`, `stalemate`, ...
    pub result: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Accuracies {
    pub white: f64,
    pub black: f64,
}

/// A single game between two players. An edge carries one of these per game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameEdge {
    pub url: String,
    pub pgn: String,
    pub time_control: String,
    pub time_class: String,
    pub rules: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracies: Option<Accuracies>,
    pub eco_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub white: Option<PlayerDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub black: Option<PlayerDetails>,
    pub start_time: i64,
    pub end_time: i64,
}

impl GameEdge {
    /// Username of the winning side, if the game was decisive.
    pub fn winner(&self) -> Option<&str> {
        [&self.white, &self.black]
            .into_iter()
            .flatten()
            .find(|side| side.result == "win")
            .map(|side| side.username.as_str())
    }
}
