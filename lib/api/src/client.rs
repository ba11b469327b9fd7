// HTTP client for the chess.com public API
use chessgraph_core::{Error, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::models::{GameArchives, MonthlyGames, PlayerProfile, PlayerStats};
use crate::retry::{retry_on_rate_limit, RetryPolicy};

pub const DEFAULT_BASE_URL: &str = "https://api.chess.com/pub";
pub const DEFAULT_USER_AGENT: &str = concat!("chessgraph/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// chess.com asks for contact details in the User-Agent.
    pub user_agent: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

pub struct ChessComClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ChessComClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to configure HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    #[inline]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn send(&self, path: &str, username: &str) -> Result<reqwest::Response> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Request(e.to_string()))?;

        match status_error(response.status(), &url, username) {
            Some(err) => Err(err),
            None => Ok(response),
        }
    }

    async fn fetch_json<T: DeserializeOwned>(&self, path: &str, username: &str) -> Result<T> {
        retry_on_rate_limit(&self.config.retry, || async {
            let response = self.send(path, username).await?;
            response
                .json::<T>()
                .await
                .map_err(|e| Error::Serialization(e.to_string()))
        })
        .await
    }

    async fn fetch_text(&self, path: &str, username: &str) -> Result<String> {
        retry_on_rate_limit(&self.config.retry, || async {
            let response = self.send(path, username).await?;
            response.text().await.map_err(|e| Error::Request(e.to_string()))
        })
        .await
    }

    pub async fn get_player_profile(&self, username: &str) -> Result<PlayerProfile> {
        let path = format!("player/{}", username.to_lowercase());
        self.fetch_json(&path, username).await
    }

    pub async fn get_player_stats(&self, username: &str) -> Result<PlayerStats> {
        let path = format!("player/{}/stats", username.to_lowercase());
        self.fetch_json(&path, username).await
    }

    pub async fn get_player_game_archives(&self, username: &str) -> Result<GameArchives> {
        let path = format!("player/{}/games/archives", username.to_lowercase());
        self.fetch_json(&path, username).await
    }

    pub async fn get_player_games_by_month(
        &self,
        username: &str,
        year: i32,
        month: u32,
    ) -> Result<MonthlyGames> {
        let path = format!("player/{}/games/{:04}/{:02}", username.to_lowercase(), year, month);
        self.fetch_json(&path, username).await
    }

    pub async fn get_player_games_by_month_pgn(
        &self,
        username: &str,
        year: i32,
        month: u32,
    ) -> Result<String> {
        let path = format!("player/{}/games/{:04}/{:02}/pgn", username.to_lowercase(), year, month);
        self.fetch_text(&path, username).await
    }
}

/// Map a non-success status to an error. 404 means the player does not exist.
pub(crate) fn status_error(status: StatusCode, url: &str, username: &str) -> Option<Error> {
    if status.is_success() {
        return None;
    }
    Some(match status {
        StatusCode::NOT_FOUND => Error::PlayerNotFound(username.to_string()),
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimited { url: url.to_string() },
        other => Error::Http {
            status: other.as_u16(),
            url: url.to_string(),
        },
    })
}
