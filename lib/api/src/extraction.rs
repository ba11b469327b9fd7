// Turning raw API responses into graph nodes and edges
use chessgraph_core::{Error, GameEdge, PlayerNode, Result};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::debug;

use crate::models::Game;
use crate::source::PlayerSource;

/// Stats key used for ratings unless configured otherwise.
pub const DEFAULT_CATEGORY: &str = "chess_rapid";

/// Which monthly archives a lookup covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    /// The most recent archived month.
    #[default]
    Latest,
    /// Every archived month of one year.
    Year(i32),
    Month(i32, u32),
}

impl Period {
    /// Build a period from optional year and month inputs.
    pub fn from_parts(year: Option<i32>, month: Option<u32>) -> Result<Self> {
        if let Some(month) = month {
            if !(1..=12).contains(&month) {
                return Err(Error::InvalidConfig(format!("month must be 1-12, got {}", month)));
            }
        }
        match (year, month) {
            (Some(year), Some(month)) => Ok(Period::Month(year, month)),
            (Some(year), None) => Ok(Period::Year(year)),
            (None, Some(_)) => Err(Error::InvalidConfig("a month needs a year".to_string())),
            (None, None) => Ok(Period::Latest),
        }
    }
}

/// Parse `.../games/{YYYY}/{MM}` into `(year, month)`.
pub fn parse_archive_url(url: &str) -> Result<(i32, u32)> {
    let invalid = || Error::InvalidArchiveUrl(url.to_string());
    let mut segments = url.trim_end_matches('/').rsplit('/');
    let month = segments.next().ok_or_else(invalid)?;
    let year = segments.next().ok_or_else(invalid)?;

    let month = u32::from_str(month).map_err(|_| invalid())?;
    let year = i32::from_str(year).map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((year, month))
}

/// Fetch profile and stats and build the player's node.
pub async fn fetch_player<S: PlayerSource + ?Sized>(
    source: &S,
    username: &str,
    category: &str,
) -> Result<PlayerNode> {
    let profile = source.profile(username).await?;
    let stats = source.stats(username).await?;
    let rating = stats.last_rating(category).ok_or_else(|| Error::MissingStats {
        username: username.to_string(),
        category: category.to_string(),
    })?;

    Ok(PlayerNode {
        uid: profile.player_id,
        name: profile.name.clone().unwrap_or_default(),
        country: profile.country_code().to_string(),
        username: profile.username,
        rating,
    })
}

/// Months covered by `period` for this player, oldest first.
pub async fn archive_months<S: PlayerSource + ?Sized>(
    source: &S,
    username: &str,
    period: Period,
) -> Result<Vec<(i32, u32)>> {
    if let Period::Month(year, month) = period {
        return Ok(vec![(year, month)]);
    }

    let mut months = source
        .archives(username)
        .await?
        .archives
        .iter()
        .map(|url| parse_archive_url(url))
        .collect::<Result<Vec<_>>>()?;
    months.sort_unstable();

    Ok(match period {
        Period::Year(year) => months.into_iter().filter(|&(y, _)| y == year).collect(),
        _ => months.pop().into_iter().collect(),
    })
}

/// Every game in every archive of the player.
pub async fn fetch_archive_games<S: PlayerSource + ?Sized>(
    source: &S,
    username: &str,
) -> Result<Vec<Game>> {
    let mut games = Vec::new();
    for url in source.archives(username).await?.archives {
        let (year, month) = parse_archive_url(&url)?;
        games.extend(source.games_by_month(username, year, month).await?.games);
    }
    Ok(games)
}

/// PGN text for every month covered by `period`.
pub async fn fetch_pgn<S: PlayerSource + ?Sized>(
    source: &S,
    username: &str,
    period: Period,
) -> Result<String> {
    let mut chunks = Vec::new();
    for (year, month) in archive_months(source, username, period).await? {
        let pgn = source.games_by_month_pgn(username, year, month).await?;
        if !pgn.trim().is_empty() {
            chunks.push(pgn);
        }
    }
    Ok(chunks.join("\n\n"))
}

/// Group the player's games in `period` by lowercased opponent username, so
/// spellings that differ only in case share one entry. When `time_class` is
/// set only games of that class (`rapid`, `blitz`, ...) count.
pub async fn opponents_by_month<S: PlayerSource + ?Sized>(
    source: &S,
    username: &str,
    period: Period,
    time_class: Option<&str>,
) -> Result<BTreeMap<String, Vec<GameEdge>>> {
    let mut opponents: BTreeMap<String, Vec<GameEdge>> = BTreeMap::new();

    for (year, month) in archive_months(source, username, period).await? {
        let monthly = source.games_by_month(username, year, month).await?;
        debug!(%username, year, month, games = monthly.games.len(), "fetched month");

        for game in monthly.games {
            if time_class.is_some_and(|class| !game.time_class.eq_ignore_ascii_case(class)) {
                continue;
            }
            let Some(opponent) = game.opponent_of(username).map(|side| side.username.to_lowercase())
            else {
                continue;
            };
            if opponent.is_empty() || opponent.eq_ignore_ascii_case(username) {
                continue;
            }
            opponents.entry(opponent).or_default().push(GameEdge::from(game));
        }
    }

    Ok(opponents)
}
