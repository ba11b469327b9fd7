// Player filters applied while expanding the graph
use std::fmt::Debug;
use std::sync::Arc;

use crate::PlayerNode;

pub trait PlayerFilter: Debug + Send + Sync {
    fn matches(&self, player: &PlayerNode) -> bool;
}

/// Keeps players rated at least the given value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinRating(pub u32);

impl PlayerFilter for MinRating {
    fn matches(&self, player: &PlayerNode) -> bool {
        player.rating >= self.0
    }
}

/// Keeps players from one country (ISO code, case-insensitive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Country(String);

impl Country {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_ascii_uppercase())
    }

    pub fn code(&self) -> &str {
        &self.0
    }
}

impl PlayerFilter for Country {
    fn matches(&self, player: &PlayerNode) -> bool {
        player.country.eq_ignore_ascii_case(&self.0)
    }
}

/// Conjunction of filters. An empty set matches everyone.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    filters: Vec<Arc<dyn PlayerFilter>>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, filter: impl PlayerFilter + 'static) -> Self {
        self.push(filter);
        self
    }

    pub fn push(&mut self, filter: impl PlayerFilter + 'static) {
        self.filters.push(Arc::new(filter));
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl PlayerFilter for FilterSet {
    fn matches(&self, player: &PlayerNode) -> bool {
        self.filters.iter().all(|f| f.matches(player))
    }
}
