//! Options for the analysis procedure.

use std::fmt;

/// The strategy for choosing the next product node during exploration.
///
/// The constructed game is the same for every strategy; only arena
/// numbering and discovery order differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplorationStrategy {
    /// Explore nodes in a breadth-first search, i.e. expand the node that
    /// was discovered the earliest next.
    Bfs,
    /// Explore nodes in a depth-first search, i.e. expand the node that
    /// was discovered the latest next.
    Dfs,
}

impl Default for ExplorationStrategy {
    fn default() -> Self {
        Self::Bfs
    }
}

impl fmt::Display for ExplorationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let string = match self {
            Self::Bfs => "bfs",
            Self::Dfs => "dfs",
        };
        write!(f, "{}", string)
    }
}

/// Options for the analysis procedure.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    /// The exploration strategy for the product construction.
    pub exploration_strategy: ExplorationStrategy,
}
