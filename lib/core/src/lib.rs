//! # chessgraph Core
//!
//! Core library for chessgraph.
//!
//! This crate provides the data model shared by the other crates:
//!
//! - [`PlayerNode`] - A chess.com player, the graph vertex
//! - [`GameEdge`] - One game between two players
//! - [`PlayerGraph`] - Undirected opponent graph with rating-difference weights
//! - [`FilterSet`] - Rating and country filters used during expansion
//!
//! ## Example
//!
//! ```rust
//! use chessgraph_core::{GameEdge, PlayerGraph, PlayerNode};
//!
//! let mut graph = PlayerGraph::new();
//! let a = PlayerNode::new(1, "alice", 1900);
//! let b = PlayerNode::new(2, "bob", 1750);
//!
//! graph.add_edge(Some(a), Some(b), vec![GameEdge::default()]);
//! assert_eq!(graph.node_count(), 2);
//! assert_eq!(graph.edge("bob", "alice").unwrap().weight, 150);
//! ```

pub mod error;
pub mod filter;
pub mod graph;
pub mod player;

pub use error::{Error, Result};
pub use filter::{Country, FilterSet, MinRating, PlayerFilter};
pub use graph::{Edge, GraphData, GraphSummary, PlayerGraph};
pub use player::{Accuracies, GameEdge, PlayerDetails, PlayerNode};
