// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashSet;

use super::connector::{CrossMwmConnector, CrossMwmSection, TransitionRecord, NO_ROUTE};
use crate::astar::{dijkstra, AStarGraph, Edge, Parents, SearchParams};
use crate::index_graph::IndexGraph;
use crate::{RouteWeight, RoutingError, Segment};

/// Exposes a single region to the search, without leaving it.
struct RegionGraph<'a> {
    graph: &'a mut IndexGraph,
}

impl AStarGraph for RegionGraph<'_> {
    type Vertex = Segment;

    fn outgoing_edges(
        &mut self,
        v: Segment,
        parents: &Parents<Segment>,
        edges: &mut Vec<Edge<Segment>>,
    ) -> Result<(), RoutingError> {
        self.graph.get_edge_list(v, true, false, false, parents, edges);
        Ok(())
    }

    fn ingoing_edges(
        &mut self,
        v: Segment,
        parents: &Parents<Segment>,
        edges: &mut Vec<Edge<Segment>>,
    ) -> Result<(), RoutingError> {
        self.graph.get_edge_list(v, false, false, false, parents, edges);
        Ok(())
    }

    fn heuristic(&mut self, _: Segment, _: Segment) -> Result<RouteWeight, RoutingError> {
        Ok(RouteWeight::ZERO)
    }
}

/// Creates the cross-region section of a region: its transitions and the travel times
/// from every enter to every exit, computed with one-to-many searches over `graph`.
pub fn build_section(graph: &mut IndexGraph, transitions: Vec<TransitionRecord>) -> CrossMwmSection {
    let mut section = CrossMwmSection {
        transitions,
        weights: Vec::default(),
    };
    let connector = CrossMwmConnector::from_section(graph.mwm_id(), &section);
    let enters = connector.enters().to_vec();
    let exits = connector.exits().to_vec();
    let targets: HashSet<Segment> = exits.iter().copied().collect();

    section.weights.reserve(enters.len() * exits.len());
    let mut region = RegionGraph { graph };
    let mut missing = 0;

    for &enter in &enters {
        match dijkstra(&mut region, enter, Some(&targets), &SearchParams::default()) {
            Ok(settled) => {
                for exit in &exits {
                    let w = settled.get(exit).map_or(NO_ROUTE, |w| w.weight);
                    if !w.is_finite() {
                        missing += 1;
                    }
                    section.weights.push(w);
                }
            }

            Err(e) => {
                log::warn!(
                    "region {}: weights from enter {} not computed: {}",
                    connector.mwm_id(),
                    enter,
                    e
                );
                missing += exits.len();
                section.weights.extend(std::iter::repeat(NO_ROUTE).take(exits.len()));
            }
        }
    }

    log::info!(
        "region {}: cross-region section with {} enters, {} exits, {} missing routes",
        connector.mwm_id(),
        enters.len(),
        exits.len(),
        missing
    );
    section
}
