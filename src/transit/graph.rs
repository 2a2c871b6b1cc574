// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::rc::Rc;

use super::data::{Gate, Line, LineId, StopId, TransitData, TransitEdge, TransitVersion};
use super::fake_graph::{FakeGraph, FakeVertex, FakeVertexKind};
use crate::distance::Junction;
use crate::estimator::{EdgeEstimator, Purpose};
use crate::fake_ending::{make_fake_ending, FakeEnding};
use crate::index_graph::{IndexGraph, SegmentEdge};
use crate::{FeatureId, NumMwmId, RouteWeight, Segment};

/// What a transit segment represents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitInfo {
    /// Walk between a gate and a stop.
    Gate { weight: f64 },
    /// Ride between two stops.
    Edge {
        line: LineId,
        stop1: StopId,
        stop2: StopId,
    },
    /// Walking transfer between two stops.
    Transfer { stop1: StopId, stop2: StopId },
}

type StopSegments = BTreeMap<StopId, BTreeSet<Segment>>;

/// Fake graph of the transit system of a single region, attached to its pedestrian network.
///
/// All segments of the graph use [FeatureId::Transit] feature ids. Ids of the segments
/// representing [TransitEdges](TransitEdge) follow the order of [TransitData::edges].
pub struct TransitGraph {
    mwm_id: NumMwmId,
    version: TransitVersion,
    estimator: Rc<dyn EdgeEstimator>,
    fake: FakeGraph,
    next_feature_id: u32,
    gates: HashMap<Segment, f64>,
    edges: HashMap<Segment, TransitEdge>,
    lines: HashMap<LineId, Line>,
}

impl TransitGraph {
    pub fn new(mwm_id: NumMwmId, estimator: Rc<dyn EdgeEstimator>) -> Self {
        Self {
            mwm_id,
            version: TransitVersion::default(),
            estimator,
            fake: FakeGraph::default(),
            next_feature_id: 0,
            gates: HashMap::default(),
            edges: HashMap::default(),
            lines: HashMap::default(),
        }
    }

    #[inline]
    pub fn mwm_id(&self) -> NumMwmId {
        self.mwm_id
    }

    #[inline]
    pub fn version(&self) -> TransitVersion {
        self.version
    }

    pub fn fake_segments_count(&self) -> usize {
        self.fake.len()
    }

    #[inline]
    pub fn fake_graph(&self) -> &FakeGraph {
        &self.fake
    }

    fn new_segment(&mut self) -> Segment {
        let s = Segment::new(self.mwm_id, FeatureId::Transit(self.next_feature_id), 0, true);
        self.next_feature_id += 1;
        s
    }

    /// Builds the graph out of transit data. `graph` must be the pedestrian graph of the same region.
    ///
    /// # Panics
    /// Panics on corrupted data: edges between unknown stops or with zero weight.
    pub fn fill(&mut self, data: &TransitData, graph: &mut IndexGraph) {
        assert!(self.fake.is_empty(), "transit graph of region {} filled twice", self.mwm_id);
        self.version = data.version;
        self.lines = data.lines.iter().map(|l| (l.id, *l)).collect();

        let stop_junction = |id: StopId| -> Junction {
            match data.stop(id) {
                Some(stop) => Junction::at(stop.point),
                None => panic!("transit edge references unknown stop {}", id),
            }
        };

        // Edge segments must come first, as their ids are referenced by cross-region sections.
        let mut stop_to_back = StopSegments::default();
        let mut stop_to_front = StopSegments::default();
        for edge in &data.edges {
            assert!(edge.weight > 0.0, "transit edge {:?} has non-positive weight", edge);
            let s = self.new_segment();
            let vertex = FakeVertex::new(
                self.mwm_id,
                stop_junction(edge.stop1),
                stop_junction(edge.stop2),
                FakeVertexKind::PureFake,
            );
            self.fake.add_standalone_vertex(s, vertex);
            self.edges.insert(s, *edge);
            stop_to_back.entry(edge.stop1).or_default().insert(s);
            stop_to_front.entry(edge.stop2).or_default().insert(s);
        }
        assert_eq!(self.fake.len(), data.edges.len());

        for gate in &data.gates {
            if gate.best_pedestrian_segments.is_empty() {
                continue;
            }
            let ending = self.make_ending(&gate.best_pedestrian_segments, gate, graph);
            if gate.entrance {
                self.add_gate(data, &ending, gate, true, &mut stop_to_back, &mut stop_to_front);
            }
            if gate.exit {
                self.add_gate(data, &ending, gate, false, &mut stop_to_back, &mut stop_to_front);
            }
        }

        if data.version == TransitVersion::AllPublicTransport {
            for stop in &data.stops {
                if stop.best_pedestrian_segments.is_empty() {
                    continue;
                }
                let ending = match make_fake_ending(&stop.best_pedestrian_segments, stop.point, |s| {
                    Ok(graph.road(s.feature_id.raw()))
                }) {
                    Ok(e) => e,
                    Err(_) => continue,
                };
                let stop_junction = Junction::at(stop.point);
                for is_enter in [true, false] {
                    for projection in self.add_projections(&ending, is_enter) {
                        let (from, to) = if is_enter {
                            (ending.origin_junction, stop_junction)
                        } else {
                            (stop_junction, ending.origin_junction)
                        };
                        let s = self.new_segment();
                        self.fake.add_vertex(
                            projection,
                            s,
                            FakeVertex::new(self.mwm_id, from, to, FakeVertexKind::PureFake),
                            is_enter,
                            None,
                        );

                        if is_enter {
                            stop_to_front.entry(stop.id).or_default().insert(s);
                        } else {
                            stop_to_back.entry(stop.id).or_default().insert(s);
                        }
                    }
                }
            }
        }

        // Connect everything arriving at a stop with everything leaving it
        for (stop, fronts) in &stop_to_front {
            let Some(backs) = stop_to_back.get(stop) else {
                continue;
            };
            for &f in fronts {
                for &b in backs {
                    self.fake.add_connection(f, b);
                }
            }
        }
    }

    fn make_ending(&self, segments: &[Segment], gate: &Gate, graph: &mut IndexGraph) -> FakeEnding {
        make_fake_ending(segments, gate.point, |s| Ok(graph.road(s.feature_id.raw())))
            .unwrap_or_default()
    }

    /// Adds, for every projection of `ending`, the projection segment (between the ending
    /// and the road) and part-of-real segments (between the road and the ends of the real
    /// segment). Returns the projection segments.
    fn add_projections(&mut self, ending: &FakeEnding, is_enter: bool) -> Vec<Segment> {
        let mut projections = Vec::with_capacity(ending.projections.len());

        for p in &ending.projections {
            let projection = self.new_segment();
            let (from, to) = if is_enter {
                (p.junction, ending.origin_junction)
            } else {
                (ending.origin_junction, p.junction)
            };
            self.fake.add_standalone_vertex(
                projection,
                FakeVertex::new(self.mwm_id, from, to, FakeVertexKind::PureFake),
            );

            // Entering walks along the real segment up to the projection, exiting walks away from it
            let forward = if is_enter {
                FakeVertex::new(self.mwm_id, p.segment_back, p.junction, FakeVertexKind::PartOfReal)
            } else {
                FakeVertex::new(self.mwm_id, p.junction, p.segment_front, FakeVertexKind::PartOfReal)
            };
            let s = self.new_segment();
            self.fake.add_vertex(projection, s, forward, !is_enter, Some(p.segment));

            if !p.is_one_way {
                let backward = if is_enter {
                    FakeVertex::new(self.mwm_id, p.segment_front, p.junction, FakeVertexKind::PartOfReal)
                } else {
                    FakeVertex::new(self.mwm_id, p.junction, p.segment_back, FakeVertexKind::PartOfReal)
                };
                let s = self.new_segment();
                self.fake
                    .add_vertex(projection, s, backward, !is_enter, Some(p.segment.reversed()));
            }

            projections.push(projection);
        }

        projections
    }

    fn add_gate(
        &mut self,
        data: &TransitData,
        ending: &FakeEnding,
        gate: &Gate,
        is_enter: bool,
        stop_to_back: &mut StopSegments,
        stop_to_front: &mut StopSegments,
    ) {
        for projection in self.add_projections(ending, is_enter) {
            for gate_stop in &gate.stops {
                let Some(stop) = data.stop(gate_stop.stop_id) else {
                    log::warn!(
                        "region {}: gate at {:?} references unknown stop {}",
                        self.mwm_id,
                        gate.point,
                        gate_stop.stop_id
                    );
                    continue;
                };
                let stop_junction = Junction::at(stop.point);
                let (from, to) = if is_enter {
                    (ending.origin_junction, stop_junction)
                } else {
                    (stop_junction, ending.origin_junction)
                };

                let s = self.new_segment();
                self.fake.add_vertex(
                    projection,
                    s,
                    FakeVertex::new(self.mwm_id, from, to, FakeVertexKind::PureFake),
                    is_enter,
                    None,
                );

                let weight = match self.version {
                    TransitVersion::OnlySubway => gate.weight,
                    TransitVersion::AllPublicTransport => gate_stop.weight,
                };
                self.gates.insert(s, weight);

                if is_enter {
                    stop_to_front.entry(gate_stop.stop_id).or_default().insert(s);
                } else {
                    stop_to_back.entry(gate_stop.stop_id).or_default().insert(s);
                }
            }
        }
    }

    #[inline]
    pub fn is_gate(&self, s: &Segment) -> bool {
        self.gates.contains_key(s)
    }

    #[inline]
    pub fn is_edge(&self, s: &Segment) -> bool {
        self.edges.contains_key(s)
    }

    #[inline]
    pub fn contains(&self, s: &Segment) -> bool {
        self.fake.contains(s)
    }

    pub fn transit_info(&self, s: &Segment) -> Option<TransitInfo> {
        if let Some(&weight) = self.gates.get(s) {
            return Some(TransitInfo::Gate { weight });
        }
        let edge = self.edges.get(s)?;
        if edge.transfer {
            Some(TransitInfo::Transfer {
                stop1: edge.stop1,
                stop2: edge.stop2,
            })
        } else {
            Some(TransitInfo::Edge {
                line: edge.line,
                stop1: edge.stop1,
                stop2: edge.stop2,
            })
        }
    }

    /// # Panics
    /// Panics if `s` does not belong to the graph.
    pub fn junction(&self, s: &Segment, front: bool) -> Junction {
        match self.fake.vertex(s) {
            Some(v) => v.junction(front),
            None => panic!("{} is not a segment of transit graph {}", s, self.mwm_id),
        }
    }

    /// Returns the real segment replaced by a part-of-real transit segment.
    #[inline]
    pub fn find_real(&self, s: &Segment) -> Option<Segment> {
        self.fake.find_real(s)
    }

    /// Returns the transit segments replacing parts of a real segment.
    pub fn fakes_for_real(&self, real: &Segment) -> impl Iterator<Item = Segment> + '_ {
        self.fake.fakes_for_real(real)
    }

    pub fn calc_segment_weight(&self, s: &Segment, purpose: Purpose) -> RouteWeight {
        if let Some(&weight) = self.gates.get(s) {
            return RouteWeight::from_transit_seconds(weight);
        }

        if let Some(edge) = self.edges.get(s) {
            assert!(edge.weight != 0.0, "transit edge {} has zero weight", s);
            return RouteWeight::from_transit_seconds(edge.weight);
        }

        let from = self.junction(s, false).point;
        let to = self.junction(s, true).point;
        RouteWeight::from_seconds(self.estimator.calc_offroad(from, to, purpose))
    }

    /// Expected waiting time when moving from `from` on to `to`. Charged only when boarding
    /// a line different than the line of `from`.
    pub fn transfer_penalty(&self, from: &Segment, to: &Segment) -> RouteWeight {
        let Some(to_edge) = self.edges.get(to) else {
            return RouteWeight::ZERO;
        };
        if to_edge.transfer {
            return RouteWeight::ZERO;
        }
        if let Some(from_edge) = self.edges.get(from) {
            if from_edge.line == to_edge.line {
                return RouteWeight::ZERO;
            }
        }

        let line = match self.lines.get(&to_edge.line) {
            Some(l) => l,
            None => panic!("transit edge {} uses unknown line {}", to, to_edge.line),
        };
        // Arrivals are uniformly distributed over the interval
        RouteWeight::from_transit_seconds(line.interval / 2.0)
    }

    /// Appends the transit segments adjacent to `s`.
    pub fn get_edge_list(&self, s: &Segment, is_outgoing: bool, edges: &mut Vec<SegmentEdge>) {
        for t in self.fake.edges(s, is_outgoing) {
            let weight = if is_outgoing {
                self.calc_segment_weight(&t, Purpose::Weight) + self.transfer_penalty(s, &t)
            } else {
                self.calc_segment_weight(s, Purpose::Weight) + self.transfer_penalty(&t, s)
            };
            edges.push(SegmentEdge::new(t, weight));
        }
    }

    /// Returns ids of all segments representing [TransitEdges](TransitEdge), in data order.
    pub fn edge_segments(&self) -> Vec<Segment> {
        let mut segments: Vec<Segment> = self.edges.keys().copied().collect();
        segments.sort();
        segments
    }

    pub fn gate_segments(&self) -> HashSet<Segment> {
        self.gates.keys().copied().collect()
    }
}

impl std::fmt::Debug for TransitGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitGraph")
            .field("mwm_id", &self.mwm_id)
            .field("version", &self.version)
            .field("fake_segments", &self.fake.len())
            .finish_non_exhaustive()
    }
}
