use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Player {0} not found. Is this a valid chess.com username?")]
    PlayerNotFound(String),

    #[error("No {category} rating for player {username}")]
    MissingStats { username: String, category: String },

    #[error("Rate limited by {url}")]
    RateLimited { url: String },

    #[error("HTTP error: {status} for {url}")]
    Http { status: u16, url: String },

    #[error("Request error: {0}")]
    Request(String),

    #[error("Invalid archive URL: {0}")]
    InvalidArchiveUrl(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// True when the player (or their rating in the requested category) does
    /// not exist. Graph expansion skips such opponents instead of failing.
    #[must_use]
    pub fn is_missing_player(&self) -> bool {
        matches!(self, Error::PlayerNotFound(_) | Error::MissingStats { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
