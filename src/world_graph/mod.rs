// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Graphs spanning all regions, queried by the search.

mod dummy;
mod single_vehicle;
mod transit;

use std::rc::Rc;

pub use dummy::DummyWorldGraph;
pub use single_vehicle::SingleVehicleWorldGraph;
pub use transit::TransitWorldGraph;

use crate::distance::{Junction, LatLon};
use crate::estimator::{EdgeEstimator, Purpose};
use crate::geometry::RoadGeometry;
use crate::index_graph::{JointEdge, JointSegment, SegmentEdge};
use crate::transit::TransitInfo;
use crate::{NumMwmId, Parents, RouteWeight, RoutingError, Segment};

/// How a [WorldGraph] expands segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WorldGraphMode {
    /// Expand every segment normally, crossing regions through twins of transitions.
    #[default]
    NoLeaps,

    /// Never leave the region of the expanded segment.
    SingleMwm,

    /// Move only between transitions, using precomputed enter → exit weights,
    /// without expanding the insides of regions.
    LeapsOnly,

    /// Use precomputed enter → exit weights where available, in addition to normal expansion.
    LeapsIfPossible,

    /// Like [WorldGraphMode::NoLeaps], but over [JointSegments](JointSegment).
    Joints,

    /// Like [WorldGraphMode::SingleMwm], but over [JointSegments](JointSegment).
    JointSingleMwm,
}

impl WorldGraphMode {
    #[inline]
    pub fn is_joints(self) -> bool {
        matches!(self, Self::Joints | Self::JointSingleMwm)
    }

    /// Returns the mode used for segment-level expansion within this mode.
    #[inline]
    pub fn segment_mode(self) -> Self {
        match self {
            Self::Joints => Self::NoLeaps,
            Self::JointSingleMwm => Self::SingleMwm,
            other => other,
        }
    }
}

impl std::str::FromStr for WorldGraphMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "no-leaps" => Ok(Self::NoLeaps),
            "single-mwm" => Ok(Self::SingleMwm),
            "leaps-only" => Ok(Self::LeapsOnly),
            "leaps-if-possible" => Ok(Self::LeapsIfPossible),
            "joints" => Ok(Self::Joints),
            "joint-single-mwm" => Ok(Self::JointSingleMwm),
            _ => Err(format!("unknown world graph mode: {}", s)),
        }
    }
}

/// Graph of all regions, as seen by the search.
///
/// Region data is loaded lazily when first touched. The mode is passed explicitly
/// to every expansion, [WorldGraph::mode] is only the default used by [WorldGraph::get_edge_list].
pub trait WorldGraph {
    fn mode(&self) -> WorldGraphMode;

    fn set_mode(&mut self, mode: WorldGraphMode);

    fn estimator(&self) -> &Rc<dyn EdgeEstimator>;

    /// Appends segments adjacent to `segment`: successors if `is_outgoing`, predecessors otherwise.
    fn get_edge_list_in_mode(
        &mut self,
        mode: WorldGraphMode,
        segment: &Segment,
        is_outgoing: bool,
        use_routing_options: bool,
        parents: &Parents<Segment>,
        edges: &mut Vec<SegmentEdge>,
    ) -> Result<(), RoutingError>;

    fn get_edge_list(
        &mut self,
        segment: &Segment,
        is_outgoing: bool,
        use_routing_options: bool,
        parents: &Parents<Segment>,
        edges: &mut Vec<SegmentEdge>,
    ) -> Result<(), RoutingError> {
        let mode = self.mode();
        self.get_edge_list_in_mode(mode, segment, is_outgoing, use_routing_options, parents, edges)
    }

    /// Appends joint segments adjacent to `vertex`. `mode` must be one of the joints modes.
    fn get_joint_edge_list(
        &mut self,
        mode: WorldGraphMode,
        vertex: &JointSegment,
        is_outgoing: bool,
        use_routing_options: bool,
        parents: &Parents<JointSegment>,
        edges: &mut Vec<JointEdge>,
    ) -> Result<(), RoutingError>;

    fn junction(&mut self, segment: &Segment, front: bool) -> Result<Junction, RoutingError>;

    fn point(&mut self, segment: &Segment, front: bool) -> Result<LatLon, RoutingError> {
        Ok(self.junction(segment, front)?.point)
    }

    fn road_geometry(&mut self, segment: &Segment) -> Result<Rc<RoadGeometry>, RoutingError>;

    fn calc_segment_weight(&mut self, segment: &Segment, purpose: Purpose) -> Result<RouteWeight, RoutingError>;

    fn calc_heuristic(&self, from: LatLon, to: LatLon) -> RouteWeight {
        RouteWeight::from_seconds(self.estimator().calc_heuristic(from, to))
    }

    fn calc_leap_weight(&self, from: LatLon, to: LatLon) -> RouteWeight {
        RouteWeight::from_seconds(self.estimator().calc_leap_weight(from, to))
    }

    fn calc_offroad_weight(&self, from: LatLon, to: LatLon, purpose: Purpose) -> RouteWeight {
        RouteWeight::from_seconds(self.estimator().calc_offroad(from, to, purpose))
    }

    /// Returns true if `segment` leaves its region (when `is_outgoing`) or enters it (otherwise).
    fn is_transition(&mut self, segment: &Segment, is_outgoing: bool) -> Result<bool, RoutingError>;

    /// Appends the twins of a transition segment.
    fn get_twins(
        &mut self,
        segment: &Segment,
        is_outgoing: bool,
        twins: &mut Vec<Segment>,
    ) -> Result<(), RoutingError>;

    /// Calls `f` with every enter (`is_enter`) or exit of a region.
    fn for_each_transition(
        &mut self,
        mwm_id: NumMwmId,
        is_enter: bool,
        f: &mut dyn FnMut(Segment),
    ) -> Result<(), RoutingError>;

    /// Finds up to `count` real segments closest to `point`.
    fn find_best_segments(&mut self, point: LatLon, count: usize) -> Result<Vec<Segment>, RoutingError>;

    fn transit_info(&mut self, _segment: &Segment) -> Result<Option<TransitInfo>, RoutingError> {
        Ok(None)
    }

    /// Returns false if a partial route of the given weight is unacceptable
    /// for a route between endings `start_to_finish` meters apart.
    fn check_length(&self, _weight: RouteWeight, _start_to_finish: f64) -> bool {
        true
    }

    /// Drops all lazily loaded region data.
    fn clear_cached_graphs(&mut self);
}

/// Appends the edges of the twins of a transition `segment`, each twin expanded
/// within its own region only.
pub fn get_twin_edges<G: WorldGraph + ?Sized>(
    graph: &mut G,
    segment: &Segment,
    is_outgoing: bool,
    use_routing_options: bool,
    parents: &Parents<Segment>,
    edges: &mut Vec<SegmentEdge>,
) -> Result<(), RoutingError> {
    let mut twins = Vec::default();
    graph.get_twins(segment, is_outgoing, &mut twins)?;

    for twin in twins {
        graph.get_edge_list_in_mode(
            WorldGraphMode::SingleMwm,
            &twin,
            is_outgoing,
            use_routing_options,
            parents,
            edges,
        )?;
    }
    Ok(())
}

/// Appends zero-weight edges straight to the twins of a transition `segment`.
pub fn get_twin_leaps<G: WorldGraph + ?Sized>(
    graph: &mut G,
    segment: &Segment,
    is_outgoing: bool,
    edges: &mut Vec<SegmentEdge>,
) -> Result<(), RoutingError> {
    let mut twins = Vec::default();
    graph.get_twins(segment, is_outgoing, &mut twins)?;
    edges.extend(twins.into_iter().map(|t| SegmentEdge::new(t, RouteWeight::ZERO)));
    Ok(())
}
