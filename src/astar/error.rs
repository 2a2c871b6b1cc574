// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::RoutingError;

/// Recommended number of allowed vertex expansions in [find_path](crate::find_path)
/// and [dijkstra](crate::dijkstra) before [AStarError::StepLimitExceeded] is returned.
pub const DEFAULT_STEP_LIMIT: usize = 1_000_000;

/// Error conditions which may occur during [find_path](crate::find_path)
/// or [dijkstra](crate::dijkstra).
#[derive(Debug, Clone, PartialEq)]
pub enum AStarError {
    /// Route search has exceeded its limit of steps.
    /// Either the vertices are really far apart, or no route exists.
    ///
    /// Concluding that no route exists requires traversing the whole graph,
    /// which can result in a denial-of-service. The step limit protects
    /// against resource exhaustion.
    StepLimitExceeded,

    /// The search was cancelled through [SearchParams::cancel](crate::SearchParams::cancel).
    Cancelled,

    /// The graph failed to provide edges of a vertex.
    Graph(RoutingError),
}

impl std::fmt::Display for AStarError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StepLimitExceeded => write!(f, "step limit exceeded"),
            Self::Cancelled => write!(f, "search cancelled"),
            Self::Graph(e) => write!(f, "graph error: {}", e),
        }
    }
}

impl std::error::Error for AStarError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Graph(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RoutingError> for AStarError {
    fn from(e: RoutingError) -> Self {
        Self::Graph(e)
    }
}
