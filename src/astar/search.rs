// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{BinaryHeap, HashMap};
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{AStarError, RouteWeight, RoutingError, DEFAULT_STEP_LIMIT};

/// Maps every reached vertex to the vertex it was reached from.
pub type Parents<V> = HashMap<V, V>;

/// Weighted connection to (when listing outgoing edges) or from
/// (when listing ingoing edges) a vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge<V> {
    pub target: V,
    pub weight: RouteWeight,
}

impl<V> Edge<V> {
    #[inline]
    pub fn new(target: V, weight: RouteWeight) -> Self {
        Self { target, weight }
    }
}

/// Weighted directed graph searchable with [find_path].
pub trait AStarGraph {
    type Vertex: Copy + Eq + Hash + std::fmt::Debug;

    /// Appends all edges leaving `v` to `edges`. `parents` describes
    /// how the search reached every visited vertex, used to enforce turn restrictions.
    fn outgoing_edges(
        &mut self,
        v: Self::Vertex,
        parents: &Parents<Self::Vertex>,
        edges: &mut Vec<Edge<Self::Vertex>>,
    ) -> Result<(), RoutingError>;

    /// Appends all edges entering `v` to `edges`.
    fn ingoing_edges(
        &mut self,
        v: Self::Vertex,
        parents: &Parents<Self::Vertex>,
        edges: &mut Vec<Edge<Self::Vertex>>,
    ) -> Result<(), RoutingError>;

    /// Admissible estimate of the weight between two vertices.
    fn heuristic(
        &mut self,
        from: Self::Vertex,
        to: Self::Vertex,
    ) -> Result<RouteWeight, RoutingError>;

    /// Returns false if a partial route of the given weight is not acceptable,
    /// which stops the search from expanding it.
    fn check_length(&self, _weight: RouteWeight) -> bool {
        true
    }
}

/// Controls of a single search.
#[derive(Debug, Clone, Copy)]
pub struct SearchParams<'a> {
    /// How many vertices may be expanded before returning [AStarError::StepLimitExceeded].
    pub step_limit: usize,

    /// Polled between expansions; once set to true, the search returns [AStarError::Cancelled].
    pub cancel: Option<&'a AtomicBool>,
}

impl Default for SearchParams<'_> {
    fn default() -> Self {
        Self {
            step_limit: DEFAULT_STEP_LIMIT,
            cancel: None,
        }
    }
}

impl SearchParams<'_> {
    #[inline]
    pub(super) fn is_cancelled(&self) -> bool {
        self.cancel.map_or(false, |c| c.load(Ordering::Relaxed))
    }
}

/// Path found by [find_path] together with its total weight.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingResult<V> {
    pub path: Vec<V>,
    pub distance: RouteWeight,
}

#[derive(Debug, Clone, Copy)]
pub(super) struct QueueItem<V> {
    pub(super) at: V,
    pub(super) cost: RouteWeight,
    pub(super) score: RouteWeight,
}

impl<V> PartialEq for QueueItem<V> {
    fn eq(&self, other: &Self) -> bool {
        self.score.eq(&other.score)
    }
}

impl<V> PartialOrd for QueueItem<V> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<V> Eq for QueueItem<V> {}

impl<V> Ord for QueueItem<V> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // NOTE: We revert the order of comparison,
        // as lower scores are considered better ("higher"),
        // and Rust's BinaryHeap is a max-heap.
        other.score.cmp(&self.score)
    }
}

pub(super) fn reconstruct_path<V: Copy + Eq + Hash>(came_from: &Parents<V>, mut last: V) -> Vec<V> {
    let mut path = vec![last];

    while let Some(&v) = came_from.get(&last) {
        path.push(v);
        last = v;
    }

    path.reverse();
    return path;
}

/// Uses the [A* algorithm](https://en.wikipedia.org/wiki/A*_search_algorithm)
/// to find the lightest path between two vertices of the provided graph.
///
/// Returns `Ok(None)` if there is no path between the two vertices.
///
/// [SearchParams::step_limit] limits how many vertices may be expanded during the search
/// before returning [AStarError::StepLimitExceeded]. Concluding that no route exists requires
/// expanding all vertices accessible from the start, which is usually very time-consuming.
pub fn find_path<G: AStarGraph>(
    g: &mut G,
    from: G::Vertex,
    to: G::Vertex,
    params: &SearchParams<'_>,
) -> Result<Option<RoutingResult<G::Vertex>>, AStarError> {
    let mut queue: BinaryHeap<QueueItem<G::Vertex>> = BinaryHeap::default();
    let mut came_from: Parents<G::Vertex> = HashMap::default();
    let mut known_costs: HashMap<G::Vertex, RouteWeight> = HashMap::default();
    let mut edges: Vec<Edge<G::Vertex>> = Vec::default();
    let mut steps: usize = 0;

    queue.push(QueueItem {
        at: from,
        cost: RouteWeight::ZERO,
        score: g.heuristic(from, to)?,
    });
    known_costs.insert(from, RouteWeight::ZERO);

    while let Some(item) = queue.pop() {
        if item.at == to {
            return Ok(Some(RoutingResult {
                path: reconstruct_path(&came_from, to),
                distance: item.cost,
            }));
        }

        // Contrary to the wikipedia definition, we might keep multiple items in the queue for the same vertex.
        if item.cost > known_costs.get(&item.at).cloned().unwrap_or(RouteWeight::INFINITY) {
            continue;
        }

        steps += 1;
        if steps > params.step_limit {
            return Err(AStarError::StepLimitExceeded);
        }
        if params.is_cancelled() {
            return Err(AStarError::Cancelled);
        }

        edges.clear();
        g.outgoing_edges(item.at, &came_from, &mut edges)?;

        for edge in edges.iter() {
            let neighbor_cost = item.cost + edge.weight;
            if !g.check_length(neighbor_cost) {
                continue;
            }

            // Check if this is the cheapest way to the neighbor
            if neighbor_cost
                >= known_costs
                    .get(&edge.target)
                    .cloned()
                    .unwrap_or(RouteWeight::INFINITY)
            {
                continue;
            }

            came_from.insert(edge.target, item.at);
            known_costs.insert(edge.target, neighbor_cost);
            queue.push(QueueItem {
                at: edge.target,
                cost: neighbor_cost,
                score: neighbor_cost + g.heuristic(edge.target, to)?,
            });
        }
    }

    return Ok(None);
}
