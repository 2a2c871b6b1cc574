// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::rc::Rc;

use super::{WorldGraph, WorldGraphMode};
use crate::cross_mwm::CrossMwmGraph;
use crate::distance::{Junction, LatLon};
use crate::estimator::{EdgeEstimator, Purpose};
use crate::geometry::RoadGeometry;
use crate::index_graph::{JointEdge, JointSegment, SegmentEdge};
use crate::loader::{IndexGraphLoader, RegionDataSource, TransitGraphLoader};
use crate::transit::{TransitGraph, TransitInfo};
use crate::{NumMwmId, Parents, RouteWeight, RoutingError, Segment};

/// Time (in seconds) a route may always spend outside of transit vehicles.
const NON_TRANSIT_TIME_BASE: f64 = 50.0 * 60.0;

/// Additional time (in seconds) a route may spend outside of transit vehicles,
/// per kilometer between the endings.
const NON_TRANSIT_TIME_PER_KM: f64 = 3.0 * 60.0;

/// [WorldGraph] of pedestrians using public transport.
///
/// Real road segments are expanded like in [SingleVehicleWorldGraph](super::SingleVehicleWorldGraph),
/// and stitched with the transit segments of every region with transit data.
pub struct TransitWorldGraph {
    mode: WorldGraphMode,
    cross_mwm: CrossMwmGraph,
    loader: IndexGraphLoader,
    transit_loader: TransitGraphLoader,
    estimator: Rc<dyn EdgeEstimator>,
}

impl TransitWorldGraph {
    pub fn new(source: Rc<dyn RegionDataSource>, estimator: Rc<dyn EdgeEstimator>) -> Self {
        Self {
            mode: WorldGraphMode::default(),
            cross_mwm: CrossMwmGraph::new(source.clone()),
            loader: IndexGraphLoader::new(source.clone(), estimator.clone()),
            transit_loader: TransitGraphLoader::new(source, estimator.clone()),
            estimator,
        }
    }

    /// Returns the transit graph of a transit segment's region.
    ///
    /// # Panics
    /// Panics if the region has no transit data.
    fn transit_graph_of<'a>(
        transit_loader: &'a mut TransitGraphLoader,
        loader: &mut IndexGraphLoader,
        segment: &Segment,
    ) -> Result<&'a TransitGraph, RoutingError> {
        match transit_loader.get_transit_graph(segment.mwm_id, loader)? {
            Some(g) => Ok(g),
            None => panic!("{} is a transit segment of a region without transit data", segment),
        }
    }

    /// Pushes `real_edges` to `edges`, each followed by the transit segments
    /// which start (`is_outgoing`) or end at the same junction as its target.
    fn add_real_edges(
        &mut self,
        is_outgoing: bool,
        real_edges: Vec<SegmentEdge>,
        edges: &mut Vec<SegmentEdge>,
    ) -> Result<(), RoutingError> {
        for edge in real_edges {
            edges.push(edge);

            let target = edge.target;
            let Some(transit) = self.transit_loader.get_transit_graph(target.mwm_id, &mut self.loader)? else {
                continue;
            };
            let fakes: Vec<Segment> = transit.fakes_for_real(&target).collect();
            if fakes.is_empty() {
                continue;
            }

            let real_end = self
                .loader
                .get_index_graph(target.mwm_id)?
                .junction(target, !is_outgoing);
            for fake in fakes {
                if transit.junction(&fake, !is_outgoing) != real_end {
                    continue;
                }
                let weight = if is_outgoing {
                    transit.calc_segment_weight(&fake, Purpose::Weight)
                } else {
                    edge.weight
                };
                edges.push(SegmentEdge::new(fake, weight));
            }
        }
        Ok(())
    }
}

impl WorldGraph for TransitWorldGraph {
    #[inline]
    fn mode(&self) -> WorldGraphMode {
        self.mode
    }

    fn set_mode(&mut self, mode: WorldGraphMode) {
        assert!(
            matches!(mode, WorldGraphMode::NoLeaps | WorldGraphMode::SingleMwm),
            "{:?} is not supported with transit",
            mode
        );
        self.mode = mode;
    }

    #[inline]
    fn estimator(&self) -> &Rc<dyn EdgeEstimator> {
        &self.estimator
    }

    fn get_edge_list_in_mode(
        &mut self,
        mode: WorldGraphMode,
        segment: &Segment,
        is_outgoing: bool,
        use_routing_options: bool,
        parents: &Parents<Segment>,
        edges: &mut Vec<SegmentEdge>,
    ) -> Result<(), RoutingError> {
        assert!(
            matches!(mode, WorldGraphMode::NoLeaps | WorldGraphMode::SingleMwm),
            "{:?} is not supported with transit",
            mode
        );
        let crosses_regions =
            mode == WorldGraphMode::NoLeaps && self.cross_mwm.is_transition(segment, is_outgoing)?;
        let mut twins = Vec::default();
        if crosses_regions {
            self.cross_mwm.get_twins(segment, is_outgoing, &mut self.loader, &mut twins)?;
        }

        let mut real_edges = Vec::default();
        if segment.feature_id.is_transit() {
            let transit = Self::transit_graph_of(&mut self.transit_loader, &mut self.loader, segment)?;
            transit.get_edge_list(segment, is_outgoing, edges);

            // Part-of-real transit segments continue on the real road
            // only at the end shared with the real segment.
            if let Some(real) = transit.find_real(segment) {
                let fake_end = transit.junction(segment, is_outgoing);
                let index = self.loader.get_index_graph(real.mwm_id)?;
                if index.junction(real, is_outgoing) == fake_end {
                    index.get_edge_list(real, is_outgoing, use_routing_options, true, parents, &mut real_edges);
                }
            }

            for twin in twins {
                if let Some(g) = self.transit_loader.get_transit_graph(twin.mwm_id, &mut self.loader)? {
                    g.get_edge_list(&twin, is_outgoing, edges);
                }
            }
        } else {
            self.loader.get_index_graph(segment.mwm_id)?.get_edge_list(
                *segment,
                is_outgoing,
                use_routing_options,
                true,
                parents,
                &mut real_edges,
            );

            for twin in twins {
                self.loader.get_index_graph(twin.mwm_id)?.get_edge_list(
                    twin,
                    is_outgoing,
                    use_routing_options,
                    true,
                    parents,
                    &mut real_edges,
                );
            }
        }

        self.add_real_edges(is_outgoing, real_edges, edges)
    }

    fn get_joint_edge_list(
        &mut self,
        mode: WorldGraphMode,
        _vertex: &JointSegment,
        _is_outgoing: bool,
        _use_routing_options: bool,
        _parents: &Parents<JointSegment>,
        _edges: &mut Vec<JointEdge>,
    ) -> Result<(), RoutingError> {
        unreachable!("{:?} is not supported with transit", mode)
    }

    fn junction(&mut self, segment: &Segment, front: bool) -> Result<Junction, RoutingError> {
        if segment.feature_id.is_transit() {
            let transit = Self::transit_graph_of(&mut self.transit_loader, &mut self.loader, segment)?;
            Ok(transit.junction(segment, front))
        } else {
            Ok(self.loader.get_index_graph(segment.mwm_id)?.junction(*segment, front))
        }
    }

    fn road_geometry(&mut self, segment: &Segment) -> Result<Rc<RoadGeometry>, RoutingError> {
        if !segment.feature_id.is_transit() {
            return Ok(self
                .loader
                .get_index_graph(segment.mwm_id)?
                .road(segment.feature_id.raw()));
        }

        let transit = Self::transit_graph_of(&mut self.transit_loader, &mut self.loader, segment)?;
        let from = transit.junction(segment, false);
        let to = transit.junction(segment, true);
        Ok(Rc::new(RoadGeometry {
            junctions: vec![from, to],
            ..RoadGeometry::new(true, 1.0, &[from.point, to.point])
        }))
    }

    fn calc_segment_weight(&mut self, segment: &Segment, purpose: Purpose) -> Result<RouteWeight, RoutingError> {
        if segment.feature_id.is_transit() {
            let transit = Self::transit_graph_of(&mut self.transit_loader, &mut self.loader, segment)?;
            Ok(transit.calc_segment_weight(segment, purpose))
        } else {
            Ok(self
                .loader
                .get_index_graph(segment.mwm_id)?
                .calc_segment_weight(*segment, purpose))
        }
    }

    fn is_transition(&mut self, segment: &Segment, is_outgoing: bool) -> Result<bool, RoutingError> {
        self.cross_mwm.is_transition(segment, is_outgoing)
    }

    fn get_twins(
        &mut self,
        segment: &Segment,
        is_outgoing: bool,
        twins: &mut Vec<Segment>,
    ) -> Result<(), RoutingError> {
        self.cross_mwm.get_twins(segment, is_outgoing, &mut self.loader, twins)
    }

    fn for_each_transition(
        &mut self,
        mwm_id: NumMwmId,
        is_enter: bool,
        f: &mut dyn FnMut(Segment),
    ) -> Result<(), RoutingError> {
        self.cross_mwm.for_each_transition(mwm_id, is_enter, f)
    }

    fn find_best_segments(&mut self, point: LatLon, count: usize) -> Result<Vec<Segment>, RoutingError> {
        self.loader.find_best_segments(point, count)
    }

    fn transit_info(&mut self, segment: &Segment) -> Result<Option<TransitInfo>, RoutingError> {
        if !segment.feature_id.is_transit() {
            return Ok(None);
        }
        let transit = Self::transit_graph_of(&mut self.transit_loader, &mut self.loader, segment)?;
        Ok(transit.transit_info(segment))
    }

    fn check_length(&self, weight: RouteWeight, start_to_finish: f64) -> bool {
        weight.weight - weight.transit_time
            <= NON_TRANSIT_TIME_BASE + NON_TRANSIT_TIME_PER_KM * start_to_finish / 1000.0
    }

    fn clear_cached_graphs(&mut self) {
        self.transit_loader.clear();
        self.loader.clear();
        self.cross_mwm.clear();
    }
}

impl std::fmt::Debug for TransitWorldGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitWorldGraph")
            .field("mode", &self.mode)
            .field("loader", &self.loader)
            .field("transit_loader", &self.transit_loader)
            .finish_non_exhaustive()
    }
}
