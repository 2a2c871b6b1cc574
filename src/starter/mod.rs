// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Attaching route endings to a [WorldGraph] and searching for routes.

mod joints;

use std::collections::BTreeSet;

pub use joints::JointsStarter;

use crate::distance::{distance_on_earth, Junction, LatLon};
use crate::estimator::Purpose;
use crate::fake_ending::{make_fake_ending, FakeEnding};
use crate::index_graph::SegmentEdge;
use crate::sparse::RegionsSparseGraph;
use crate::transit::{FakeGraph, FakeVertex, FakeVertexKind, TransitInfo};
use crate::world_graph::{DummyWorldGraph, WorldGraph, WorldGraphMode};
use crate::{
    find_path, AStarError, AStarGraph, FeatureId, NumMwmId, Parents, RouteWeight, RoutingError,
    RoutingResult, SearchParams, Segment, FAKE_NUM_MWM_ID,
};

/// How many closest road segments an ending is projected onto.
pub const MAX_ENDING_PROJECTIONS: usize = 4;

#[inline]
fn fake_segment(id: u32) -> Segment {
    Segment::new(FAKE_NUM_MWM_ID, FeatureId::Synthetic(id), 0, true)
}

#[inline]
fn is_fake(s: &Segment) -> bool {
    s.mwm_id == FAKE_NUM_MWM_ID
}

/// Route found by [find_route].
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Traversed real (or transit) segments, in order.
    pub segments: Vec<Segment>,

    /// Junctions of the route polyline, from the start to the finish.
    pub junctions: Vec<Junction>,

    pub weight: RouteWeight,

    /// Transit data of segments, matching [Route::segments].
    pub transit: Vec<Option<TransitInfo>>,
}

impl Route {
    /// Length of the route polyline, in meters.
    pub fn length(&self) -> f64 {
        self.junctions
            .windows(2)
            .map(|pair| distance_on_earth(pair[0].point, pair[1].point))
            .sum()
    }
}

/// Segment-level [AStarGraph] over a [WorldGraph], extended with fake segments
/// connecting the route endings with the road network.
///
/// Every ending becomes a standalone pure fake segment, connected through
/// pure fake projection segments to part-of-real fake segments, which replace the parts
/// of real segments between the projection and the real segment ends.
///
/// With a [RegionsSparseGraph], all real segments and their edges come from the sparse graph,
/// and the world graph (usually a [DummyWorldGraph]) only provides estimates.
pub struct Starter<'a> {
    graph: &'a mut dyn WorldGraph,
    sparse: Option<&'a RegionsSparseGraph>,
    fake: FakeGraph,
    next_fake_id: u32,
    start: Segment,
    finish: Segment,
    start_point: LatLon,
    finish_point: LatLon,
    start_mwms: BTreeSet<NumMwmId>,
    finish_mwms: BTreeSet<NumMwmId>,
    start_to_finish: f64,
}

impl<'a> Starter<'a> {
    pub fn new(
        graph: &'a mut dyn WorldGraph,
        sparse: Option<&'a RegionsSparseGraph>,
        start: &FakeEnding,
        finish: &FakeEnding,
    ) -> Self {
        let start_point = start.origin_junction.point;
        let finish_point = finish.origin_junction.point;
        let mut starter = Self {
            graph,
            sparse,
            fake: FakeGraph::default(),
            next_fake_id: 0,
            start: fake_segment(0),
            finish: fake_segment(0),
            start_point,
            finish_point,
            start_mwms: start.projections.iter().map(|p| p.segment.mwm_id).collect(),
            finish_mwms: finish.projections.iter().map(|p| p.segment.mwm_id).collect(),
            start_to_finish: distance_on_earth(start_point, finish_point),
        };

        starter.start = starter.add_ending(start, finish, true);
        starter.finish = starter.add_ending(finish, start, false);
        log::debug!("starter created {} fake segments", starter.fake.len());
        starter
    }

    /// The pure fake segment representing the route start.
    #[inline]
    pub fn start(&self) -> Segment {
        self.start
    }

    /// The pure fake segment representing the route finish.
    #[inline]
    pub fn finish(&self) -> Segment {
        self.finish
    }

    #[inline]
    pub fn fake_graph(&self) -> &FakeGraph {
        &self.fake
    }

    fn new_fake_segment(&mut self) -> Segment {
        let s = fake_segment(self.next_fake_id);
        self.next_fake_id += 1;
        s
    }

    fn add_ending(&mut self, this: &FakeEnding, other: &FakeEnding, is_start: bool) -> Segment {
        let origin = this.origin_junction;
        let ending = self.new_fake_segment();
        self.fake.add_standalone_vertex(
            ending,
            FakeVertex::new(FAKE_NUM_MWM_ID, origin, origin, FakeVertexKind::PureFake),
        );

        for projection in &this.projections {
            let mwm_id = projection.segment.mwm_id;

            let projection_segment = self.new_fake_segment();
            let (from, to) = if is_start {
                (origin, projection.junction)
            } else {
                (projection.junction, origin)
            };
            self.fake.add_vertex(
                ending,
                projection_segment,
                FakeVertex::new(mwm_id, from, to, FakeVertexKind::PureFake),
                is_start,
                None,
            );

            // Both endings on the same segment: the part-of-real segments end
            // at the projection of the other ending.
            let mut front = projection.segment_front;
            let mut back = projection.segment_back;
            if let Some(other_projection) = other
                .projections
                .iter()
                .find(|p| p.segment == projection.segment)
            {
                let other_junction = other_projection.junction;
                let to_this = distance_on_earth(back.point, projection.junction.point);
                let to_other = distance_on_earth(back.point, other_junction.point);
                if to_this < to_other {
                    front = other_junction;
                } else if to_other < to_this {
                    back = other_junction;
                } else {
                    front = other_junction;
                    back = other_junction;
                }
            }

            let (from, to) = if is_start {
                (projection.junction, front)
            } else {
                (back, projection.junction)
            };
            self.add_part_of_real(
                projection_segment,
                FakeVertex::new(mwm_id, from, to, FakeVertexKind::PartOfReal),
                is_start,
                projection.segment,
            );

            if !projection.is_one_way {
                let (from, to) = if is_start {
                    (projection.junction, back)
                } else {
                    (front, projection.junction)
                };
                self.add_part_of_real(
                    projection_segment,
                    FakeVertex::new(mwm_id, from, to, FakeVertexKind::PartOfReal),
                    is_start,
                    projection.segment.reversed(),
                );
            }
        }

        ending
    }

    fn add_part_of_real(&mut self, projection: Segment, vertex: FakeVertex, is_start: bool, real: Segment) {
        let segment = match self.fake.find_segment(&vertex) {
            Some(s) => s,
            None => self.new_fake_segment(),
        };
        self.fake.add_vertex(projection, segment, vertex, is_start, Some(real));
    }

    fn fake_vertex(&self, s: &Segment) -> &FakeVertex {
        match self.fake.vertex(s) {
            Some(v) => v,
            None => panic!("{} is not a fake segment of the starter", s),
        }
    }

    pub fn junction(&mut self, s: &Segment, front: bool) -> Result<Junction, RoutingError> {
        if is_fake(s) {
            return Ok(self.fake_vertex(s).junction(front));
        }
        match self.sparse {
            Some(sparse) => match sparse.junction(s, front) {
                Some(j) => Ok(j),
                None => panic!("{} is not a cross-border segment", s),
            },
            None => self.graph.junction(s, front),
        }
    }

    pub fn point(&mut self, s: &Segment, front: bool) -> Result<LatLon, RoutingError> {
        if is_fake(s) || self.sparse.is_some() {
            return Ok(self.junction(s, front)?.point);
        }
        self.graph.point(s, front)
    }

    fn real_segment_weight(&mut self, s: &Segment) -> Result<RouteWeight, RoutingError> {
        match self.sparse {
            Some(sparse) => Ok(sparse.calc_segment_weight(s)),
            None => self.graph.calc_segment_weight(s, Purpose::Weight),
        }
    }

    /// Weight of a segment. Part-of-real fake segments take the share of the real
    /// segment weight proportional to their length.
    pub fn calc_segment_weight(&mut self, s: &Segment) -> Result<RouteWeight, RoutingError> {
        if !is_fake(s) {
            return self.real_segment_weight(s);
        }

        let vertex = *self.fake_vertex(s);
        match self.fake.find_real(s) {
            Some(real) => {
                let full = distance_on_earth(
                    self.point(&real, false)?,
                    self.point(&real, true)?,
                );
                let part = distance_on_earth(vertex.from.point, vertex.to.point);
                let weight = self.real_segment_weight(&real)?;
                if full > 0.0 {
                    Ok(weight.scaled(part / full))
                } else {
                    Ok(weight.scaled(0.5))
                }
            }
            None => Ok(self
                .graph
                .calc_offroad_weight(vertex.from.point, vertex.to.point, Purpose::Weight)),
        }
    }

    fn add_real_edges(
        &mut self,
        real: &Segment,
        is_outgoing: bool,
        parents: &Parents<Segment>,
        edges: &mut Vec<SegmentEdge>,
    ) -> Result<(), RoutingError> {
        match self.sparse {
            Some(sparse) => {
                let front = self.point(real, true)?;
                sparse.get_edge_list(real, is_outgoing, front, edges);
                Ok(())
            }
            None => self.graph.get_edge_list(real, is_outgoing, true, parents, edges),
        }
    }

    /// Appends part-of-real fake segments adjacent to `s`, for every real segment in `edges[from..]`
    /// which they start (`is_outgoing`) or end with.
    fn add_fake_edges(
        &mut self,
        is_outgoing: bool,
        from: usize,
        edges: &mut Vec<SegmentEdge>,
    ) -> Result<(), RoutingError> {
        let real_edges: Vec<SegmentEdge> = edges[from..].to_vec();
        for edge in real_edges {
            let real = edge.target;
            if is_fake(&real) {
                continue;
            }
            let fakes: Vec<Segment> = self.fake.fakes_for_real(&real).collect();
            if fakes.is_empty() {
                continue;
            }

            let real_end = self.junction(&real, !is_outgoing)?;
            for fake in fakes {
                if self.fake_vertex(&fake).junction(!is_outgoing) != real_end {
                    continue;
                }
                let weight = if is_outgoing {
                    edge.weight - self.real_segment_weight(&real)? + self.calc_segment_weight(&fake)?
                } else {
                    edge.weight
                };
                edges.push(SegmentEdge::new(fake, weight));
            }
        }
        Ok(())
    }

    /// Leaps between the endings and the transitions of their regions.
    fn add_ending_leaps(&mut self, s: &Segment, is_outgoing: bool, edges: &mut Vec<SegmentEdge>) -> Result<(), RoutingError> {
        if *s == self.start && is_outgoing {
            let mut exits = Vec::default();
            for &mwm_id in &self.start_mwms {
                self.graph.for_each_transition(mwm_id, false, &mut |t| exits.push(t))?;
            }
            for exit in exits {
                let p = self.graph.point(&exit, true)?;
                edges.push(SegmentEdge::new(exit, self.graph.calc_leap_weight(self.start_point, p)));
            }

            if !self.start_mwms.is_disjoint(&self.finish_mwms) {
                let w = self.graph.calc_leap_weight(self.start_point, self.finish_point);
                edges.push(SegmentEdge::new(self.finish, w));
            }
        } else if *s == self.finish && !is_outgoing {
            let mut enters = Vec::default();
            for &mwm_id in &self.finish_mwms {
                self.graph.for_each_transition(mwm_id, true, &mut |t| enters.push(t))?;
            }
            for enter in enters {
                let p = self.graph.point(&enter, true)?;
                edges.push(SegmentEdge::new(enter, self.graph.calc_leap_weight(p, self.finish_point)));
            }
        } else if !is_fake(s) && is_outgoing && self.finish_mwms.contains(&s.mwm_id) {
            if self.graph.is_transition(s, false)? {
                let p = self.graph.point(s, true)?;
                edges.push(SegmentEdge::new(self.finish, self.graph.calc_leap_weight(p, self.finish_point)));
            }
        } else if !is_fake(s) && !is_outgoing && self.start_mwms.contains(&s.mwm_id) {
            if self.graph.is_transition(s, true)? {
                let p = self.graph.point(s, true)?;
                edges.push(SegmentEdge::new(self.start, self.graph.calc_leap_weight(self.start_point, p)));
            }
        }
        Ok(())
    }

    /// Appends the segments adjacent to `s`: successors if `is_outgoing`, predecessors otherwise.
    pub fn get_edge_list(
        &mut self,
        s: &Segment,
        is_outgoing: bool,
        parents: &Parents<Segment>,
        edges: &mut Vec<SegmentEdge>,
    ) -> Result<(), RoutingError> {
        let from = edges.len();

        if is_fake(s) {
            // Part-of-real segments continue on the real road network at the shared end.
            if let Some(real) = self.fake.find_real(s) {
                if self.junction(s, is_outgoing)? == self.junction(&real, is_outgoing)? {
                    self.add_real_edges(&real, is_outgoing, parents, edges)?;
                }
            }

            let adjacent: Vec<Segment> = self.fake.edges(s, is_outgoing).collect();
            for t in adjacent {
                let weight = self.calc_segment_weight(if is_outgoing { &t } else { s })?;
                edges.push(SegmentEdge::new(t, weight));
            }
        } else {
            self.add_real_edges(s, is_outgoing, parents, edges)?;
        }

        if self.sparse.is_none() && self.graph.mode() == WorldGraphMode::LeapsOnly {
            self.add_ending_leaps(s, is_outgoing, edges)?;
        }

        self.add_fake_edges(is_outgoing, from, edges)
    }

    /// Converts a path between [Starter::start] and [Starter::finish] into a [Route].
    pub fn build_route(&mut self, result: &RoutingResult<Segment>) -> Result<Route, RoutingError> {
        let mut route = Route {
            segments: Vec::default(),
            junctions: vec![Junction::at(self.start_point)],
            weight: result.distance,
            transit: Vec::default(),
        };

        for s in &result.path {
            if *s == self.start || *s == self.finish {
                continue;
            }

            let junction = self.junction(s, true)?;
            if route.junctions.last() != Some(&junction) {
                route.junctions.push(junction);
            }

            let real = if is_fake(s) { self.fake.find_real(s) } else { Some(*s) };
            if let Some(real) = real {
                if route.segments.last() != Some(&real) {
                    route.segments.push(real);
                    route.transit.push(if self.sparse.is_some() {
                        None
                    } else {
                        self.graph.transit_info(&real)?
                    });
                }
            }
        }

        let finish = Junction::at(self.finish_point);
        if route.junctions.last() != Some(&finish) {
            route.junctions.push(finish);
        }
        Ok(route)
    }
}

impl AStarGraph for Starter<'_> {
    type Vertex = Segment;

    fn outgoing_edges(
        &mut self,
        v: Segment,
        parents: &Parents<Segment>,
        edges: &mut Vec<SegmentEdge>,
    ) -> Result<(), RoutingError> {
        self.get_edge_list(&v, true, parents, edges)
    }

    fn ingoing_edges(
        &mut self,
        v: Segment,
        parents: &Parents<Segment>,
        edges: &mut Vec<SegmentEdge>,
    ) -> Result<(), RoutingError> {
        self.get_edge_list(&v, false, parents, edges)
    }

    fn heuristic(&mut self, from: Segment, to: Segment) -> Result<RouteWeight, RoutingError> {
        let from = self.point(&from, true)?;
        let to = self.point(&to, true)?;
        Ok(self.graph.calc_heuristic(from, to))
    }

    fn check_length(&self, weight: RouteWeight) -> bool {
        self.graph.check_length(weight, self.start_to_finish)
    }
}

impl std::fmt::Debug for Starter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Starter")
            .field("start", &self.start)
            .field("finish", &self.finish)
            .field("fake_segments", &self.fake.len())
            .field("sparse", &self.sparse.is_some())
            .finish_non_exhaustive()
    }
}

/// Attaches `point` to the closest road segments of `graph`.
pub fn make_ending(graph: &mut dyn WorldGraph, point: LatLon) -> Result<FakeEnding, RoutingError> {
    let segments = graph.find_best_segments(point, MAX_ENDING_PROJECTIONS)?;
    make_fake_ending(&segments, point, |s| graph.road_geometry(s))
}

/// Finds the lightest route between two points, in the current mode of `graph`.
///
/// Returns `Ok(None)` if the finish is unreachable from the start.
pub fn find_route(
    graph: &mut dyn WorldGraph,
    start: LatLon,
    finish: LatLon,
    params: &SearchParams<'_>,
) -> Result<Option<Route>, AStarError> {
    let start = make_ending(graph, start)?;
    let finish = make_ending(graph, finish)?;

    if graph.mode().is_joints() {
        let mut starter = JointsStarter::new(graph, &start, &finish)?;
        let (from, to) = (starter.start(), starter.finish());
        let Some(result) = find_path(&mut starter, from, to, params)? else {
            return Ok(None);
        };
        log::debug!("found route over {} joints", result.path.len());
        return Ok(Some(starter.build_route(&result)?));
    }

    let mut starter = Starter::new(graph, None, &start, &finish);
    let (from, to) = (starter.start(), starter.finish());
    let Some(result) = find_path(&mut starter, from, to, params)? else {
        return Ok(None);
    };
    log::debug!("found route over {} segments", result.path.len());
    Ok(Some(starter.build_route(&result)?))
}

/// Finds an approximate route between two points over cross-border segments only,
/// without loading any region graphs.
pub fn find_route_over_regions(
    sparse: &RegionsSparseGraph,
    start: LatLon,
    finish: LatLon,
    params: &SearchParams<'_>,
) -> Result<Option<Route>, AStarError> {
    let start = sparse.get_fake_ending(start)?;
    let finish = sparse.get_fake_ending(finish)?;

    let mut dummy = DummyWorldGraph::new(sparse.estimator().clone());
    let mut starter = Starter::new(&mut dummy, Some(sparse), &start, &finish);
    let (from, to) = (starter.start(), starter.finish());
    let Some(result) = find_path(&mut starter, from, to, params)? else {
        return Ok(None);
    };
    Ok(Some(starter.build_route(&result)?))
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::estimator::{EdgeEstimator, SpeedEstimator};
    use crate::loader::RegionDataSource;
    use crate::test_utils::{grid, two_regions};
    use crate::world_graph::SingleVehicleWorldGraph;

    macro_rules! assert_almost_eq {
        ($a:expr, $b:expr) => {
            assert!(
                (($a - $b).abs() < 1e-4),
                "assertion failed: {} ≈ {}",
                $a,
                $b
            )
        };
    }

    /// Road speed of [two_regions], in m/s.
    const SPEED: f64 = 100.0 / 3.6;

    fn world(mode: WorldGraphMode) -> SingleVehicleWorldGraph {
        let estimator: Rc<dyn EdgeEstimator> = Rc::new(SpeedEstimator::car());
        let regions = two_regions(100.0, Some(estimator.clone()));
        let mut g = SingleVehicleWorldGraph::new(Rc::new(regions), estimator);
        g.set_mode(mode);
        g
    }

    fn route(mode: WorldGraphMode, start: LatLon, finish: LatLon) -> Route {
        let mut g = world(mode);
        find_route(&mut g, start, finish, &SearchParams::default())
            .unwrap()
            .expect("route must exist")
    }

    #[test]
    fn route_across_border() {
        let start = grid(0.1, 0.0);
        let finish = grid(2.9, 0.0);
        let r = route(WorldGraphMode::NoLeaps, start, finish);

        assert_eq!(
            r.segments,
            vec![
                Segment::real(0, 0, 0, true),
                Segment::real(0, 1, 0, true),
                Segment::real(1, 1, 0, true),
            ],
        );
        assert_eq!(r.transit, vec![None, None, None]);
        assert_eq!(r.junctions.first().map(|j| j.point), Some(start));
        assert_eq!(r.junctions.last().map(|j| j.point), Some(finish));

        let straight = distance_on_earth(start, finish);
        assert_almost_eq!(r.length(), straight);
        assert_almost_eq!(r.weight.weight, straight / SPEED);
        assert_eq!(r.weight.num_access_changes, 0);
    }

    #[test]
    fn leaps_are_heavier_than_roads() {
        let start = grid(0.1, 0.0);
        let finish = grid(2.9, 0.0);
        let no_leaps = route(WorldGraphMode::NoLeaps, start, finish);
        let leaps = route(WorldGraphMode::LeapsOnly, start, finish);

        assert_eq!(
            leaps.segments,
            vec![Segment::real(0, 1, 0, true), Segment::real(1, 0, 0, true)],
        );
        assert!(leaps.weight > no_leaps.weight);

        // Leaps run at half of the maximum speed
        let leap_speed = SpeedEstimator::car().max_weight_speed_mps() / 2.0;
        assert_almost_eq!(leaps.weight.weight, distance_on_earth(start, finish) / leap_speed);
    }

    #[test]
    fn joints_match_segments() {
        let start = grid(0.1, 0.0);
        let finish = grid(2.9, 0.0);
        let segments = route(WorldGraphMode::NoLeaps, start, finish);
        let joints = route(WorldGraphMode::Joints, start, finish);

        assert_almost_eq!(joints.weight.weight, segments.weight.weight);
        assert!(joints.segments.contains(&Segment::real(0, 1, 0, true)));
    }

    #[test]
    fn heuristic_is_admissible() {
        let start = grid(0.1, 0.0);
        let finish = grid(2.9, 0.0);
        let r = route(WorldGraphMode::NoLeaps, start, finish);
        let g = world(WorldGraphMode::NoLeaps);
        assert!(g.calc_heuristic(start, finish) <= r.weight);
    }

    #[test]
    fn heuristic_never_exceeds_lightest_paths() {
        let mut g = world(WorldGraphMode::NoLeaps);
        let start = make_ending(&mut g, grid(0.1, 0.0)).unwrap();
        let finish = make_ending(&mut g, grid(2.9, 0.0)).unwrap();
        let mut starter = Starter::new(&mut g, None, &start, &finish);
        let from = starter.start();

        let settled = crate::dijkstra(&mut starter, from, None, &SearchParams::default()).unwrap();
        assert!(settled.len() > 4);
        for (v, weight) in settled {
            let estimate = starter.heuristic(from, v).unwrap();
            assert!(
                estimate.weight <= weight.weight + 1e-6,
                "heuristic to {} is {}, but the lightest path weighs {}",
                v,
                estimate.weight,
                weight.weight,
            );
        }
    }

    #[test]
    fn both_endings_on_one_segment() {
        let w = distance_on_earth(grid(0.0, 0.0), grid(1.0, 0.0)) / SPEED;

        let forward = route(WorldGraphMode::NoLeaps, grid(0.2, 0.0), grid(0.8, 0.0));
        assert_eq!(forward.segments, vec![Segment::real(0, 0, 0, true)]);
        assert_almost_eq!(forward.weight.weight, 0.6 * w);

        let backward = route(WorldGraphMode::NoLeaps, grid(0.8, 0.0), grid(0.2, 0.0));
        assert_eq!(backward.segments, vec![Segment::real(0, 0, 0, false)]);
        assert_almost_eq!(backward.weight.weight, 0.6 * w);
        assert_almost_eq!(backward.length(), distance_on_earth(grid(0.2, 0.0), grid(0.8, 0.0)));
    }

    #[test]
    fn starter_fake_segments() {
        let mut g = world(WorldGraphMode::NoLeaps);
        let start = make_ending(&mut g, grid(0.1, 0.0)).unwrap();
        let finish = make_ending(&mut g, grid(2.9, 0.0)).unwrap();
        assert_eq!(start.projections.len(), 1);

        let mut starter = Starter::new(&mut g, None, &start, &finish);
        // Per ending: itself, one projection and two part-of-real segments
        assert_eq!(starter.fake_graph().len(), 8);

        let s = starter.start();
        let mut edges = Vec::default();
        starter
            .get_edge_list(&s, true, &Parents::default(), &mut edges)
            .unwrap();
        assert_eq!(edges.len(), 1);
        assert!(is_fake(&edges[0].target));
        assert_eq!(
            starter.junction(&s, true).unwrap().point,
            grid(0.1, 0.0),
        );
    }

    #[test]
    fn route_over_regions() {
        let estimator: Rc<dyn EdgeEstimator> = Rc::new(SpeedEstimator::car());
        let mut regions = two_regions(100.0, None);
        regions.build_cross_border_graph(estimator.as_ref());
        let cross_border = regions.cross_border_graph().unwrap();
        assert_eq!(cross_border.len(), 2);

        let sparse = RegionsSparseGraph::new(cross_border, Rc::new(regions), estimator);
        let r = find_route_over_regions(
            &sparse,
            grid(0.1, 0.0),
            grid(2.9, 0.0),
            &SearchParams::default(),
        )
        .unwrap()
        .expect("route must exist");

        let last = r.segments.last().copied().expect("route must cross the border");
        assert_eq!(last.mwm_id, 0);
        assert!(matches!(last.feature_id, FeatureId::Synthetic(_)));
        assert_eq!(sparse.junction(&last, true).map(|j| j.point), Some(grid(2.0, 0.0)));
        assert_almost_eq!(r.length(), distance_on_earth(grid(0.1, 0.0), grid(2.9, 0.0)));
    }

    #[test]
    fn unreachable_finish() {
        let mut g = world(WorldGraphMode::NoLeaps);
        assert!(matches!(
            find_route(&mut g, grid(0.1, 0.0), grid(9.0, 9.0), &SearchParams::default()),
            Err(AStarError::Graph(RoutingError::PointNotInAnyRegion { .. })),
        ));
    }
}
