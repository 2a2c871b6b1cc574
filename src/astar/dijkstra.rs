// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{BinaryHeap, HashMap, HashSet};

use super::search::QueueItem;
use super::{AStarGraph, Edge, Parents, SearchParams};
use crate::{AStarError, RouteWeight};

/// Computes the weights of the lightest paths from `from` using
/// [Dijkstra's algorithm](https://en.wikipedia.org/wiki/Dijkstra%27s_algorithm).
///
/// If `targets` is provided, the search stops as soon as all of them are settled,
/// otherwise all reachable vertices are settled. The returned map contains
/// every settled vertex.
pub fn dijkstra<G: AStarGraph>(
    g: &mut G,
    from: G::Vertex,
    targets: Option<&HashSet<G::Vertex>>,
    params: &SearchParams<'_>,
) -> Result<HashMap<G::Vertex, RouteWeight>, AStarError> {
    let mut queue: BinaryHeap<QueueItem<G::Vertex>> = BinaryHeap::default();
    let mut came_from: Parents<G::Vertex> = HashMap::default();
    let mut known_costs: HashMap<G::Vertex, RouteWeight> = HashMap::default();
    let mut settled: HashMap<G::Vertex, RouteWeight> = HashMap::default();
    let mut edges: Vec<Edge<G::Vertex>> = Vec::default();
    let mut remaining = targets.map_or(usize::MAX, |t| t.len());
    let mut steps: usize = 0;

    queue.push(QueueItem {
        at: from,
        cost: RouteWeight::ZERO,
        score: RouteWeight::ZERO,
    });
    known_costs.insert(from, RouteWeight::ZERO);

    while let Some(item) = queue.pop() {
        if remaining == 0 {
            break;
        }

        if settled.contains_key(&item.at) {
            continue;
        }
        settled.insert(item.at, item.cost);
        if targets.map_or(false, |t| t.contains(&item.at)) {
            remaining -= 1;
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
                score: neighbor_cost,
            });
        }
    }

    Ok(settled)
}
