// Depth-bounded opponent graph expansion
use chessgraph_core::{FilterSet, PlayerFilter, PlayerGraph, PlayerNode, Result};
use futures_util::stream::{self, StreamExt};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info, warn};

use crate::extraction::{archive_months, fetch_player, opponents_by_month, Period, DEFAULT_CATEGORY};
use crate::source::PlayerSource;

/// Opponent profile lookups in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 7;

#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Levels of opponents to add below the root; 0 builds just the root.
    pub depth: usize,
    pub period: Period,
    /// Stats key the node rating is read from.
    pub category: String,
    /// Only count games of this time class when set.
    pub time_class: Option<String>,
    pub filters: FilterSet,
    pub concurrency: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            depth: 1,
            period: Period::Latest,
            category: DEFAULT_CATEGORY.to_string(),
            time_class: None,
            filters: FilterSet::new(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

pub struct GraphBuilder<S> {
    source: S,
    config: BuildConfig,
}

impl<S: PlayerSource> GraphBuilder<S> {
    pub fn new(source: S, config: BuildConfig) -> Self {
        Self { source, config }
    }

    #[inline]
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    #[inline]
    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn fetch_player(&self, username: &str) -> Result<PlayerNode> {
        fetch_player(&self.source, username, &self.config.category).await
    }

    /// Build a fresh graph rooted at `username`. A missing root player is an
    /// error; missing opponents are skipped.
    pub async fn initialize(&self, username: &str) -> Result<PlayerGraph> {
        let player = self.fetch_player(username).await?;
        let mut graph = PlayerGraph::new();
        graph.add_node(Some(player.clone()));

        let expanded = self
            .add_opponents_with_depth(&mut graph, &player.username, Some(player.clone()))
            .await?;
        info!(
            root = %player.username,
            depth = self.config.depth,
            expanded,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "graph initialized"
        );
        Ok(graph)
    }

    /// Pin the configured period to concrete months for a crawl rooted at
    /// `username`. `Latest` becomes the root's most recent archived month so
    /// every level of the crawl reads the same month.
    pub async fn resolve_period(&self, username: &str) -> Result<Period> {
        if self.config.period != Period::Latest {
            return Ok(self.config.period);
        }
        let period = match archive_months(&self.source, username, Period::Latest).await?.pop() {
            Some((year, month)) => Period::Month(year, month),
            None => Period::Latest,
        };
        debug!(%username, ?period, "resolved latest period");
        Ok(period)
    }

    /// Add one level of opponents of `username`. `player` is the node for
    /// `username` when the caller already has it. Returns the opponents that
    /// were attached.
    pub async fn add_opponents(
        &self,
        graph: &mut PlayerGraph,
        username: &str,
        player: Option<PlayerNode>,
    ) -> Result<Vec<PlayerNode>> {
        let period = self.resolve_period(username).await?;
        self.add_opponents_in(graph, username, player, period).await
    }

    async fn add_opponents_in(
        &self,
        graph: &mut PlayerGraph,
        username: &str,
        player: Option<PlayerNode>,
        period: Period,
    ) -> Result<Vec<PlayerNode>> {
        let player = match player {
            Some(player) => player,
            None => self.fetch_player(username).await?,
        };
        if !self.config.filters.matches(&player) {
            debug!(username = %player.username, "player filtered out, not expanding");
            return Ok(Vec::new());
        }

        let opponents = opponents_by_month(
            &self.source,
            username,
            period,
            self.config.time_class.as_deref(),
        )
        .await?;

        let lookups: Vec<Result<PlayerNode>> = stream::iter(opponents.keys())
            .map(|opponent| self.fetch_player(opponent))
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut attached = Vec::new();
        for ((opponent, games), lookup) in opponents.into_iter().zip(lookups) {
            let node = match lookup {
                Ok(node) => node,
                Err(e) if e.is_missing_player() => {
                    warn!(%opponent, error = %e, "skipping opponent");
                    continue;
                }
                Err(e) => return Err(e),
            };
            if !self.config.filters.matches(&node) {
                debug!(%opponent, "opponent filtered out");
                continue;
            }
            graph.add_edge(Some(player.clone()), Some(node.clone()), games);
            attached.push(node);
        }

        debug!(username = %player.username, opponents = attached.len(), "opponents added");
        Ok(attached)
    }

    /// Expand breadth-first from `username` down to the configured depth.
    /// Each username is expanded at most once, at its shallowest level, and
    /// every level reads the months resolved for `username`. Returns the
    /// number of players expanded.
    pub async fn add_opponents_with_depth(
        &self,
        graph: &mut PlayerGraph,
        username: &str,
        player: Option<PlayerNode>,
    ) -> Result<usize> {
        if self.config.depth == 0 {
            return Ok(0);
        }
        let period = self.resolve_period(username).await?;
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue = VecDeque::from([(username.to_string(), player, 1usize)]);
        let mut expanded = 0;

        while let Some((name, player, level)) = queue.pop_front() {
            if level > self.config.depth {
                continue;
            }
            if !visited.insert(name.to_lowercase()) {
                continue;
            }

            info!(username = %name, level, "expanding player");
            let opponents = self.add_opponents_in(graph, &name, player, period).await?;
            expanded += 1;

            for node in opponents {
                if !visited.contains(&node.username.to_lowercase()) {
                    queue.push_back((node.username.clone(), Some(node), level + 1));
                }
            }
        }

        Ok(expanded)
    }

    /// Add one level of opponents below an existing node, reusing the stored
    /// node data when present.
    pub async fn expand(&self, graph: &mut PlayerGraph, username: &str) -> Result<Vec<PlayerNode>> {
        let player = match graph.find_node(username).cloned() {
            Some(player) => player,
            None => {
                let player = self.fetch_player(username).await?;
                graph.add_node(Some(player.clone()));
                player
            }
        };
        let name = player.username.clone();
        self.add_opponents(graph, &name, Some(player)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSource;
    use chessgraph_core::{Country, Error, MinRating};

    // alice -> bob, carol, dave(no stats), erin(no profile)
    // bob -> frank ; carol -> frank, alice ; frank -> gina
    fn source() -> FakeSource {
        FakeSource::new()
            .with_player("alice", 1, "US", 1800)
            .with_player("bob", 2, "US", 1500)
            .with_player("carol", 3, "NO", 2100)
            .with_profile("dave", 4, "US")
            .with_player("frank", 6, "US", 1700)
            .with_player("gina", 7, "US", 1600)
            .with_game(2024, 5, "alice", "bob", "alice")
            .with_game(2024, 5, "carol", "alice", "carol")
            .with_game(2024, 5, "carol", "alice", "alice")
            .with_game(2024, 5, "alice", "dave", "dave")
            .with_game(2024, 5, "erin", "alice", "erin")
            .with_game(2024, 5, "bob", "frank", "frank")
            .with_game(2024, 5, "carol", "frank", "carol")
            .with_game(2024, 5, "frank", "gina", "gina")
    }

    fn builder(depth: usize) -> GraphBuilder<FakeSource> {
        GraphBuilder::new(
            source(),
            BuildConfig {
                depth,
                period: Period::Month(2024, 5),
                ..BuildConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn test_depth_zero_is_root_only() {
        let graph = builder(0).initialize("alice").await.unwrap();
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
    }

    #[tokio::test]
    async fn test_depth_one_skips_missing_opponents() {
        let graph = builder(1).initialize("alice").await.unwrap();

        assert_eq!(graph.neighbors("alice"), vec!["bob", "carol"]);
        assert!(!graph.contains_node("dave"));
        assert!(!graph.contains_node("erin"));
        assert_eq!(graph.edge("alice", "carol").unwrap().games.len(), 2);
        assert_eq!(graph.edge("alice", "carol").unwrap().weight, 300);
    }

    #[tokio::test]
    async fn test_depth_two_expands_each_player_once() {
        let builder = builder(2);
        let graph = builder.initialize("alice").await.unwrap();

        assert!(graph.has_edge("bob", "frank"));
        assert!(graph.has_edge("carol", "frank"));
        assert!(!graph.contains_node("gina"));
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 4);
        // alice, bob, carol expanded once each.
        assert_eq!(builder.source().calls("games_by_month"), 3);
    }

    #[tokio::test]
    async fn test_missing_root_is_an_error() {
        let result = builder(1).initialize("nobody").await;
        assert!(matches!(result, Err(Error::PlayerNotFound(_))));

        let result = builder(1).initialize("dave").await;
        assert!(matches!(result, Err(Error::MissingStats { .. })));
    }

    #[tokio::test]
    async fn test_filters() {
        let builder = GraphBuilder::new(
            source(),
            BuildConfig {
                depth: 2,
                period: Period::Month(2024, 5),
                filters: FilterSet::new().with(Country::new("US")).with(MinRating(1550)),
                ..BuildConfig::default()
            },
        );
        let graph = builder.initialize("alice").await.unwrap();

        // bob is rated too low, carol is not from the US.
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
    }

    #[tokio::test]
    async fn test_expand_existing_node() {
        let builder = builder(1);
        let mut graph = builder.initialize("alice").await.unwrap();
        assert!(!graph.contains_node("gina"));

        let added = builder.expand(&mut graph, "Bob").await.unwrap();
        assert_eq!(
            added.iter().map(|n| n.username.as_str()).collect::<Vec<_>>(),
            vec!["alice", "frank"]
        );
        assert_eq!(graph.edge_count(), 3);
        assert!(graph.has_edge("bob", "frank"));

        builder.expand(&mut graph, "frank").await.unwrap();
        assert!(graph.has_edge("frank", "gina"));

        let mut fresh = PlayerGraph::new();
        builder.expand(&mut fresh, "gina").await.unwrap();
        assert_eq!(fresh.neighbors("gina"), vec!["frank"]);
    }

    #[tokio::test]
    async fn test_latest_month_is_taken_from_the_root() {
        let builder = GraphBuilder::new(
            FakeSource::new()
                .with_player("alice", 1, "US", 1800)
                .with_player("bob", 2, "US", 1500)
                .with_player("carol", 3, "US", 1600)
                .with_game(2024, 5, "alice", "bob", "alice")
                .with_game(2024, 6, "bob", "carol", "carol"),
            BuildConfig {
                depth: 2,
                ..BuildConfig::default()
            },
        );
        assert_eq!(builder.resolve_period("alice").await.unwrap(), Period::Month(2024, 5));
        assert_eq!(builder.resolve_period("bob").await.unwrap(), Period::Month(2024, 6));

        let graph = builder.initialize("alice").await.unwrap();
        assert!(graph.has_edge("alice", "bob"));
        assert!(!graph.contains_node("carol"));
        assert_eq!(graph.edge_count(), 1);
    }

    #[tokio::test]
    async fn test_explicit_period_is_not_resolved() {
        let builder = builder(2);
        assert_eq!(builder.resolve_period("alice").await.unwrap(), Period::Month(2024, 5));
        assert_eq!(builder.source().calls("archives"), 0);
    }

    #[tokio::test]
    async fn test_concurrency_of_one_keeps_order() {
        let builder = GraphBuilder::new(
            source(),
            BuildConfig {
                depth: 1,
                period: Period::Month(2024, 5),
                concurrency: 1,
                ..BuildConfig::default()
            },
        );
        let mut graph = PlayerGraph::new();
        let added = builder.add_opponents(&mut graph, "alice", None).await.unwrap();
        assert_eq!(
            added.iter().map(|n| n.username.as_str()).collect::<Vec<_>>(),
            vec!["bob", "carol"]
        );
        assert!(graph.contains_node("alice"));
    }
}
