// Undirected opponent graph keyed by username
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::player::{GameEdge, PlayerNode};

/// Edge between two players. `weight` is the absolute rating difference at the
/// time the edge was created; `games` holds one entry per game played.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub weight: u32,
    #[serde(default)]
    pub games: Vec<GameEdge>,
}

impl Edge {
    #[inline]
    #[must_use]
    pub fn connects(&self, username: &str) -> bool {
        self.source == username || self.target == username
    }

    /// The endpoint that is not `username`.
    pub fn other(&self, username: &str) -> Option<&str> {
        if self.source == username {
            Some(&self.target)
        } else if self.target == username {
            Some(&self.source)
        } else {
            None
        }
    }

    /// Number of decisive games won by `username` on this edge.
    pub fn wins_for(&self, username: &str) -> usize {
        self.games
            .iter()
            .filter(|game| game.winner().is_some_and(|w| w.eq_ignore_ascii_case(username)))
            .count()
    }
}

/// Serializable form of a graph: plain node and edge lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<PlayerNode>,
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GraphSummary {
    pub node_count: usize,
    pub edge_count: usize,
    pub game_count: usize,
    pub average_rating: f64,
    pub highest_rating: u32,
    pub lowest_rating: u32,
}

type EdgeKey = (String, String);

fn edge_key(a: &str, b: &str) -> EdgeKey {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Opponent graph. Nodes are added lazily on first reference and there is at
/// most one edge per unordered pair of usernames.
#[derive(Debug, Clone, Default)]
pub struct PlayerGraph {
    nodes: AHashMap<String, PlayerNode>,
    edges: AHashMap<EdgeKey, Edge>,
}

impl PlayerGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node unless its username is already present. Returns whether the
    /// graph changed.
    pub fn add_node(&mut self, node: Option<PlayerNode>) -> bool {
        let Some(node) = node else {
            return false;
        };
        if self.nodes.contains_key(&node.username) {
            return false;
        }
        self.nodes.insert(node.username.clone(), node);
        true
    }

    /// Connect two players, adding missing endpoints first. An existing edge
    /// is left untouched, games included. Returns whether a new edge was added.
    pub fn add_edge(
        &mut self,
        node1: Option<PlayerNode>,
        node2: Option<PlayerNode>,
        games: Vec<GameEdge>,
    ) -> bool {
        let (Some(node1), Some(node2)) = (node1, node2) else {
            warn!("Cannot add edge with missing nodes");
            return false;
        };
        if node1.username == node2.username {
            warn!(username = %node1.username, "Refusing to add self-loop");
            return false;
        }

        let key = edge_key(&node1.username, &node2.username);
        if self.edges.contains_key(&key) {
            self.add_node(Some(node1));
            self.add_node(Some(node2));
            return false;
        }

        // Weight comes from the stored nodes when they already exist.
        let weight = {
            let a = self.nodes.get(&node1.username).unwrap_or(&node1);
            let b = self.nodes.get(&node2.username).unwrap_or(&node2);
            a.rating_difference(b)
        };
        let edge = Edge {
            source: node1.username.clone(),
            target: node2.username.clone(),
            weight,
            games,
        };
        self.add_node(Some(node1));
        self.add_node(Some(node2));
        self.edges.insert(key, edge);
        true
    }

    #[inline]
    pub fn contains_node(&self, username: &str) -> bool {
        self.nodes.contains_key(username)
    }

    #[inline]
    pub fn has_edge(&self, a: &str, b: &str) -> bool {
        self.edges.contains_key(&edge_key(a, b))
    }

    #[inline]
    pub fn node(&self, username: &str) -> Option<&PlayerNode> {
        self.nodes.get(username)
    }

    #[inline]
    pub fn node_mut(&mut self, username: &str) -> Option<&mut PlayerNode> {
        self.nodes.get_mut(username)
    }

    /// Case-insensitive node lookup; chess.com usernames are not case sensitive.
    pub fn find_node(&self, username: &str) -> Option<&PlayerNode> {
        self.node(username).or_else(|| {
            self.nodes
                .values()
                .find(|node| node.username.eq_ignore_ascii_case(username))
        })
    }

    #[inline]
    pub fn edge(&self, a: &str, b: &str) -> Option<&Edge> {
        self.edges.get(&edge_key(a, b))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &PlayerNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Usernames connected to `username`, sorted.
    pub fn neighbors(&self, username: &str) -> Vec<&str> {
        let mut neighbors: Vec<&str> = self
            .edges
            .values()
            .filter_map(|edge| edge.other(username))
            .collect();
        neighbors.sort_unstable();
        neighbors
    }

    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn summary(&self) -> GraphSummary {
        let ratings: Vec<u32> = self.nodes.values().map(|n| n.rating).collect();
        let average_rating = if ratings.is_empty() {
            0.0
        } else {
            ratings.iter().map(|&r| f64::from(r)).sum::<f64>() / ratings.len() as f64
        };

        GraphSummary {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            game_count: self.edges.values().map(|e| e.games.len()).sum(),
            average_rating,
            highest_rating: ratings.iter().copied().max().unwrap_or(0),
            lowest_rating: ratings.iter().copied().min().unwrap_or(0),
        }
    }

    /// Export nodes and edges, sorted for stable output.
    #[must_use]
    pub fn to_data(&self) -> GraphData {
        let mut nodes: Vec<PlayerNode> = self.nodes.values().cloned().collect();
        nodes.sort_by(|a, b| a.username.cmp(&b.username));

        let mut keyed: Vec<(&EdgeKey, &Edge)> = self.edges.iter().collect();
        keyed.sort_by(|a, b| a.0.cmp(b.0));
        let edges = keyed.into_iter().map(|(_, edge)| edge.clone()).collect();

        GraphData { nodes, edges }
    }

    /// Rebuild a graph from exported data. Stored weights and games are
    /// kept. Self-loops, edges whose endpoints are not among the nodes and
    /// repeated pairs are dropped with a warning.
    #[must_use]
    pub fn from_data(data: GraphData) -> Self {
        let mut graph = Self::new();
        for node in data.nodes {
            graph.add_node(Some(node));
        }
        for edge in data.edges {
            if edge.source == edge.target {
                warn!(username = %edge.source, "Dropping self-loop from graph data");
                continue;
            }
            if !graph.contains_node(&edge.source) || !graph.contains_node(&edge.target) {
                warn!(
                    source = %edge.source,
                    target = %edge.target,
                    "Dropping edge with unknown endpoint"
                );
                continue;
            }
            let key = edge_key(&edge.source, &edge.target);
            if graph.edges.contains_key(&key) {
                warn!(source = %edge.source, target = %edge.target, "Dropping duplicate edge");
                continue;
            }
            graph.edges.insert(key, edge);
        }
        graph
    }
}

impl From<GraphData> for PlayerGraph {
    fn from(data: GraphData) -> Self {
        Self::from_data(data)
    }
}
