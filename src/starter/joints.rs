// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use super::{fake_segment, Route};
use crate::distance::{distance_on_earth, Junction, LatLon};
use crate::estimator::Purpose;
use crate::fake_ending::{FakeEnding, Projection};
use crate::index_graph::{JointEdge, JointSegment};
use crate::world_graph::{WorldGraph, WorldGraphMode};
use crate::{AStarGraph, Parents, RouteWeight, RoutingError, RoutingResult, Segment};

/// Share of a segment between its back and `junction`.
fn share_to(projection: &Projection, reversed: bool) -> f64 {
    let (back, front) = if reversed {
        (projection.segment_front, projection.segment_back)
    } else {
        (projection.segment_back, projection.segment_front)
    };
    let full = distance_on_earth(back.point, front.point);
    if full > 0.0 {
        distance_on_earth(back.point, projection.junction.point) / full
    } else {
        0.5
    }
}

/// Real segments (in both directions, unless one-way) an ending can be attached to,
/// together with the share of each segment lying between its back and the projection.
fn attachments(ending: &FakeEnding) -> Vec<(Segment, Projection, f64)> {
    let mut result = Vec::default();
    for p in &ending.projections {
        result.push((p.segment, *p, share_to(p, false)));
        if !p.is_one_way {
            result.push((p.segment.reversed(), *p, share_to(p, true)));
        }
    }
    result
}

/// [AStarGraph] over [JointSegments](JointSegment) of a [WorldGraph] in one of the joints modes.
///
/// The start is connected to single-segment chains of the segments it projects onto.
/// Every chain passing through a segment the finish projects onto gets an additional
/// edge to the finish, weighed up to the projection only.
pub struct JointsStarter<'a> {
    graph: &'a mut dyn WorldGraph,
    mode: WorldGraphMode,
    start: JointSegment,
    finish: JointSegment,
    start_point: LatLon,
    finish_point: LatLon,
    start_to_finish: f64,
    start_edges: Vec<JointEdge>,

    /// Weight of getting from the back of a real segment to the finish.
    finish_weights: HashMap<Segment, RouteWeight>,

    /// Chains cut at the finish segment, keyed by the vertex they were reached from.
    finish_chains: HashMap<JointSegment, (RouteWeight, JointSegment)>,

    /// Weight and segment of a route not leaving the single segment both endings project onto.
    direct: Option<(RouteWeight, Segment)>,
}

impl<'a> JointsStarter<'a> {
    pub fn new(
        graph: &'a mut dyn WorldGraph,
        start: &FakeEnding,
        finish: &FakeEnding,
    ) -> Result<Self, RoutingError> {
        let mode = graph.mode();
        assert!(mode.is_joints(), "{:?} is not a joints mode", mode);

        let start_point = start.origin_junction.point;
        let finish_point = finish.origin_junction.point;

        let mut start_edges = Vec::default();
        let start_attachments = attachments(start);
        for &(s, p, share) in &start_attachments {
            let w = graph.calc_offroad_weight(start_point, p.junction.point, Purpose::Weight)
                + graph.calc_segment_weight(&s, Purpose::Weight)?.scaled(1.0 - share);
            start_edges.push(JointEdge::new(JointSegment::from_segment(s), w));
        }

        let mut finish_weights = HashMap::default();
        let mut direct: Option<(RouteWeight, Segment)> = None;
        for (s, p, share) in attachments(finish) {
            let segment_weight = graph.calc_segment_weight(&s, Purpose::Weight)?;
            let w = segment_weight.scaled(share)
                + graph.calc_offroad_weight(p.junction.point, finish_point, Purpose::Weight);
            finish_weights.insert(s, w);

            for &(_, start_p, start_share) in start_attachments.iter().filter(|(start_s, _, _)| *start_s == s) {
                if start_share > share {
                    continue;
                }
                let w = graph.calc_offroad_weight(start_point, start_p.junction.point, Purpose::Weight)
                    + segment_weight.scaled(share - start_share)
                    + graph.calc_offroad_weight(p.junction.point, finish_point, Purpose::Weight);
                if direct.map_or(true, |(best, _)| w < best) {
                    direct = Some((w, s));
                }
            }
        }

        Ok(Self {
            graph,
            mode,
            start: JointSegment::from_segment(fake_segment(0)),
            finish: JointSegment::from_segment(fake_segment(1)),
            start_point,
            finish_point,
            start_to_finish: distance_on_earth(start_point, finish_point),
            start_edges,
            finish_weights,
            finish_chains: HashMap::default(),
            direct,
        })
    }

    #[inline]
    pub fn start(&self) -> JointSegment {
        self.start
    }

    #[inline]
    pub fn finish(&self) -> JointSegment {
        self.finish
    }

    /// Returns the weight of leaving `chain` at the finish, if it passes through
    /// a segment the finish projects onto. `chain_weight` is the weight of the whole chain.
    fn finish_edge(
        &mut self,
        chain: &JointSegment,
        chain_weight: RouteWeight,
    ) -> Result<Option<(RouteWeight, JointSegment)>, RoutingError> {
        let segments: Vec<Segment> = chain.segments().collect();
        let mut best: Option<(RouteWeight, JointSegment)> = None;

        for (i, s) in segments.iter().enumerate() {
            let Some(&to_finish) = self.finish_weights.get(s) else {
                continue;
            };

            let mut rest = RouteWeight::ZERO;
            for after in &segments[i..] {
                rest += self.graph.calc_segment_weight(after, Purpose::Weight)?;
            }
            let w = chain_weight - rest + to_finish;
            if best.map_or(true, |(b, _)| w < b) {
                best = Some((w, chain.cut_at(*s)));
            }
        }
        Ok(best)
    }

    /// Converts a path between [JointsStarter::start] and [JointsStarter::finish] into a [Route].
    pub fn build_route(&mut self, result: &RoutingResult<JointSegment>) -> Result<Route, RoutingError> {
        let mut segments: Vec<Segment> = Vec::default();
        let mut previous: Option<JointSegment> = None;
        for v in &result.path {
            if *v == self.start {
                previous = Some(*v);
                continue;
            }

            if *v == self.finish {
                if previous == Some(self.start) {
                    if let Some((_, s)) = self.direct {
                        segments.push(s);
                    }
                } else if let Some((_, cut)) = previous.and_then(|p| self.finish_chains.get(&p)) {
                    segments.extend(cut.segments());
                }
                break;
            }

            segments.extend(v.segments());
            previous = Some(*v);
        }

        let mut junctions = vec![Junction::at(self.start_point)];
        let mut transit = Vec::with_capacity(segments.len());
        for s in &segments {
            junctions.push(self.graph.junction(s, true)?);
            transit.push(self.graph.transit_info(s)?);
        }
        junctions.push(Junction::at(self.finish_point));

        Ok(Route {
            segments,
            junctions,
            weight: result.distance,
            transit,
        })
    }

    fn vertex_point(&mut self, v: &JointSegment) -> Result<LatLon, RoutingError> {
        if *v == self.start {
            Ok(self.start_point)
        } else if *v == self.finish {
            Ok(self.finish_point)
        } else {
            self.graph.point(&v.last_segment(), true)
        }
    }
}

impl AStarGraph for JointsStarter<'_> {
    type Vertex = JointSegment;

    fn outgoing_edges(
        &mut self,
        v: JointSegment,
        parents: &Parents<JointSegment>,
        edges: &mut Vec<JointEdge>,
    ) -> Result<(), RoutingError> {
        if v == self.finish {
            return Ok(());
        }
        if v == self.start {
            edges.extend_from_slice(&self.start_edges);
            if let Some((w, _)) = self.direct {
                edges.push(JointEdge::new(self.finish, w));
            }
            return Ok(());
        }

        let from = edges.len();
        self.graph
            .get_joint_edge_list(self.mode, &v, true, true, parents, edges)?;

        let mut best: Option<(RouteWeight, JointSegment)> = None;
        for i in from..edges.len() {
            let edge = edges[i];
            if let Some((w, cut)) = self.finish_edge(&edge.target, edge.weight)? {
                if best.map_or(true, |(b, _)| w < b) {
                    best = Some((w, cut));
                }
            }
        }

        if let Some((w, cut)) = best {
            let known = self.finish_chains.get(&v).map(|&(known, _)| known);
            if known.map_or(true, |known| w < known) {
                self.finish_chains.insert(v, (w, cut));
            }
            edges.push(JointEdge::new(self.finish, w));
        }
        Ok(())
    }

    fn ingoing_edges(
        &mut self,
        v: JointSegment,
        parents: &Parents<JointSegment>,
        edges: &mut Vec<JointEdge>,
    ) -> Result<(), RoutingError> {
        if v == self.start || v == self.finish {
            return Ok(());
        }
        self.graph
            .get_joint_edge_list(self.mode, &v, false, true, parents, edges)
    }

    fn heuristic(&mut self, from: JointSegment, to: JointSegment) -> Result<RouteWeight, RoutingError> {
        let from = self.vertex_point(&from)?;
        let to = self.vertex_point(&to)?;
        Ok(self.graph.calc_heuristic(from, to))
    }

    fn check_length(&self, weight: RouteWeight) -> bool {
        self.graph.check_length(weight, self.start_to_finish)
    }
}

impl std::fmt::Debug for JointsStarter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JointsStarter")
            .field("mode", &self.mode)
            .field("start_edges", &self.start_edges.len())
            .field("finish_segments", &self.finish_weights.len())
            .finish_non_exhaustive()
    }
}
