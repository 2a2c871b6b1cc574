// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::rc::Rc;

use super::{WorldGraph, WorldGraphMode};
use crate::distance::{Junction, LatLon};
use crate::estimator::{EdgeEstimator, Purpose};
use crate::geometry::RoadGeometry;
use crate::index_graph::{JointEdge, JointSegment, SegmentEdge};
use crate::{NumMwmId, Parents, RouteWeight, RoutingError, Segment};

/// [WorldGraph] which only provides weight estimates.
///
/// Used when routing over the [RegionsSparseGraph](crate::sparse::RegionsSparseGraph),
/// which supplies all edges and geometry by itself. Any other query is a logic error.
pub struct DummyWorldGraph {
    estimator: Rc<dyn EdgeEstimator>,
}

impl DummyWorldGraph {
    pub fn new(estimator: Rc<dyn EdgeEstimator>) -> Self {
        Self { estimator }
    }
}

impl WorldGraph for DummyWorldGraph {
    fn mode(&self) -> WorldGraphMode {
        WorldGraphMode::NoLeaps
    }

    fn set_mode(&mut self, _mode: WorldGraphMode) {}

    fn estimator(&self) -> &Rc<dyn EdgeEstimator> {
        &self.estimator
    }

    fn get_edge_list_in_mode(
        &mut self,
        _mode: WorldGraphMode,
        _segment: &Segment,
        _is_outgoing: bool,
        _use_routing_options: bool,
        _parents: &Parents<Segment>,
        _edges: &mut Vec<SegmentEdge>,
    ) -> Result<(), RoutingError> {
        unreachable!("DummyWorldGraph has no edges")
    }

    fn get_joint_edge_list(
        &mut self,
        _mode: WorldGraphMode,
        _vertex: &JointSegment,
        _is_outgoing: bool,
        _use_routing_options: bool,
        _parents: &Parents<JointSegment>,
        _edges: &mut Vec<JointEdge>,
    ) -> Result<(), RoutingError> {
        unreachable!("DummyWorldGraph has no edges")
    }

    fn junction(&mut self, _segment: &Segment, _front: bool) -> Result<Junction, RoutingError> {
        unreachable!("DummyWorldGraph has no geometry")
    }

    fn road_geometry(&mut self, _segment: &Segment) -> Result<Rc<RoadGeometry>, RoutingError> {
        unreachable!("DummyWorldGraph has no geometry")
    }

    fn calc_segment_weight(&mut self, _segment: &Segment, _purpose: Purpose) -> Result<RouteWeight, RoutingError> {
        unreachable!("DummyWorldGraph has no segments")
    }

    fn is_transition(&mut self, _segment: &Segment, _is_outgoing: bool) -> Result<bool, RoutingError> {
        unreachable!("DummyWorldGraph has no transitions")
    }

    fn get_twins(
        &mut self,
        _segment: &Segment,
        _is_outgoing: bool,
        _twins: &mut Vec<Segment>,
    ) -> Result<(), RoutingError> {
        unreachable!("DummyWorldGraph has no transitions")
    }

    fn for_each_transition(
        &mut self,
        _mwm_id: NumMwmId,
        _is_enter: bool,
        _f: &mut dyn FnMut(Segment),
    ) -> Result<(), RoutingError> {
        unreachable!("DummyWorldGraph has no transitions")
    }

    fn find_best_segments(&mut self, _point: LatLon, _count: usize) -> Result<Vec<Segment>, RoutingError> {
        unreachable!("DummyWorldGraph has no segments")
    }

    fn clear_cached_graphs(&mut self) {}
}

impl std::fmt::Debug for DummyWorldGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DummyWorldGraph").finish_non_exhaustive()
    }
}
