// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Routing graph of a single region: segments of road features connected at joints.

mod joint_segment;
mod restrictions;
mod road_access;
mod road_index;

use std::collections::HashMap;
use std::rc::Rc;

pub use joint_segment::{JointEdge, JointSegment};
pub use restrictions::{Restriction, RestrictionType, RestrictionUTurn, RestrictionVertex};
pub use road_access::{AccessType, ConditionalAccess, Confidence, HourWindow, RoadAccess};
pub use road_index::{build_joints, Joint, JointId, JointIndex, RoadIndex};

use restrictions::{RestrictionMap, UTurnEnding};

use crate::distance::{Junction, LatLon};
use crate::estimator::{EdgeEstimator, Purpose};
use crate::geometry::{Geometry, RoadGeometry};
use crate::{Edge, FeatureId, NumMwmId, Parents, RoadPoint, RouteWeight, RoutingOptions, Segment};

pub type SegmentEdge = Edge<Segment>;

/// Road network of one region, prepared for routing.
///
/// Vertices are directed [Segments](Segment) of real features. Two segments are
/// connected if the front point of the first one coincides with the back point
/// of the second one: either in the middle of a single feature, or at a [Joint].
pub struct IndexGraph {
    mwm_id: NumMwmId,
    geometry: Geometry,
    estimator: Rc<dyn EdgeEstimator>,
    road_index: RoadIndex,
    joint_index: JointIndex,
    restrictions_forward: RestrictionMap,
    restrictions_backward: RestrictionMap,
    no_u_turn: HashMap<u32, UTurnEnding>,
    road_access: RoadAccess,
    avoid_routing_options: RoutingOptions,
}

impl IndexGraph {
    pub fn new(mwm_id: NumMwmId, geometry: Geometry, estimator: Rc<dyn EdgeEstimator>) -> Self {
        Self {
            mwm_id,
            geometry,
            estimator,
            road_index: RoadIndex::default(),
            joint_index: JointIndex::default(),
            restrictions_forward: RestrictionMap::default(),
            restrictions_backward: RestrictionMap::default(),
            no_u_turn: HashMap::default(),
            road_access: RoadAccess::default(),
            avoid_routing_options: RoutingOptions::NONE,
        }
    }

    /// Replaces the joints of the graph.
    pub fn import(&mut self, joints: &[Joint]) {
        self.road_index = RoadIndex::default();
        self.road_index.import(joints);
        self.joint_index = JointIndex::build(joints);
    }

    /// Sets the turn restrictions of the graph. Only-restrictions are converted into
    /// No-restrictions, which requires the joints to be [imported](IndexGraph::import) first.
    pub fn set_restrictions(&mut self, restrictions: &[Restriction]) {
        let mut no = Vec::default();
        let geometry = &mut self.geometry;
        for r in restrictions {
            match r.kind {
                RestrictionType::No => no.push(r.feature_ids.clone()),
                RestrictionType::Only => no.extend(restrictions::convert_only_to_no(
                    &self.road_index,
                    &self.joint_index,
                    |feature| {
                        let road = geometry.road(feature);
                        road.valid.then(|| road.points_count())
                    },
                    &r.feature_ids,
                )),
            }
        }

        let (forward, backward) = restrictions::index_restrictions(no);
        self.restrictions_forward = forward;
        self.restrictions_backward = backward;
    }

    pub fn set_u_turn_restrictions(&mut self, restrictions: &[RestrictionUTurn]) {
        self.no_u_turn.clear();
        for r in restrictions {
            let ending = self.no_u_turn.entry(r.feature_id).or_default();
            if r.at_the_begin {
                ending.at_the_begin = true;
            } else {
                ending.at_the_end = true;
            }
        }
    }

    pub fn set_road_access(&mut self, road_access: RoadAccess) {
        self.road_access = road_access;
    }

    pub fn set_avoid_routing_options(&mut self, avoid: RoutingOptions) {
        self.avoid_routing_options = avoid;
    }

    #[inline]
    pub fn mwm_id(&self) -> NumMwmId {
        self.mwm_id
    }

    #[inline]
    pub fn geometry(&mut self) -> &mut Geometry {
        &mut self.geometry
    }

    #[inline]
    pub fn estimator(&self) -> &Rc<dyn EdgeEstimator> {
        &self.estimator
    }

    #[inline]
    pub fn road(&mut self, feature_id: u32) -> Rc<RoadGeometry> {
        self.geometry.road(feature_id)
    }

    #[inline]
    pub fn road_access(&self) -> &RoadAccess {
        &self.road_access
    }

    #[inline]
    pub fn joint_id(&self, rp: RoadPoint) -> Option<JointId> {
        self.road_index.joint_id(rp)
    }

    #[inline]
    pub fn joint_points(&self, joint_id: JointId) -> &[RoadPoint] {
        self.joint_index.points(joint_id)
    }

    #[inline]
    pub fn num_joints(&self) -> usize {
        self.joint_index.num_joints()
    }

    pub fn junction(&mut self, segment: Segment, front: bool) -> Junction {
        self.geometry.junction(segment.road_point(front))
    }

    pub fn point(&mut self, segment: Segment, front: bool) -> LatLon {
        self.geometry.point(segment.road_point(front))
    }

    /// Weight of travelling along the segment itself, without any penalties.
    pub fn calc_segment_weight(&mut self, segment: Segment, purpose: Purpose) -> RouteWeight {
        let road = self.geometry.road(segment.feature_id.raw());
        RouteWeight::from_seconds(self.estimator.calc_segment_weight(&segment, &road, purpose))
    }

    /// Appends all segments adjacent to `segment` to `edges`: successors if `is_outgoing`,
    /// predecessors otherwise. `parents` are used to evaluate multi-feature turn restrictions.
    pub fn get_edge_list(
        &mut self,
        segment: Segment,
        is_outgoing: bool,
        use_routing_options: bool,
        use_access_conditional: bool,
        parents: &Parents<Segment>,
        edges: &mut Vec<SegmentEdge>,
    ) {
        debug_assert_eq!(segment.mwm_id, self.mwm_id);
        if !segment.feature_id.is_real() {
            return;
        }

        let ctx = EdgeContext {
            is_outgoing,
            use_routing_options,
            use_access_conditional,
        };
        self.neighbors_at(segment, segment, ctx, parents, edges);
    }

    /// Appends all joint segments adjacent to `vertex` to `edges`. Every neighboring chain
    /// is prolonged until the next joint or road end, and weighted with its full traversal cost,
    /// in both directions.
    pub fn get_joint_edge_list(
        &mut self,
        vertex: JointSegment,
        is_outgoing: bool,
        use_routing_options: bool,
        use_access_conditional: bool,
        parents: &Parents<JointSegment>,
        edges: &mut Vec<JointEdge>,
    ) {
        debug_assert_eq!(vertex.mwm_id, self.mwm_id);
        if !vertex.feature_id.is_real() {
            return;
        }

        let ctx = EdgeContext {
            is_outgoing,
            use_routing_options,
            use_access_conditional,
        };
        let from = if is_outgoing {
            vertex.last_segment()
        } else {
            vertex.first_segment()
        };

        let mut hops = Vec::default();
        self.neighbors_at(from, vertex, ctx, parents, &mut hops);

        // Ingoing edges carry the weight of the matching outgoing edge,
        // which covers the whole current chain.
        let mut chain_rest = RouteWeight::ZERO;
        if !is_outgoing {
            let segments: Vec<Segment> = vertex.segments().collect();
            for pair in segments.windows(2) {
                chain_rest += self.calc_edge_weight(Purpose::Weight, true, pair[0], pair[1], ctx);
            }
        }

        for hop in hops {
            if let Some(mut edge) = self.prolong_chain(hop, ctx) {
                edge.weight += chain_rest;
                edges.push(edge);
            }
        }
    }

    /// Walks along the feature of `hop.target` (in the search direction) until a road point
    /// with a joint or a road end, accumulating weights.
    fn prolong_chain(&mut self, hop: SegmentEdge, ctx: EdgeContext) -> Option<JointEdge> {
        let first = hop.target;
        let road = self.geometry.road(first.feature_id.raw());
        let mut weight = hop.weight;
        let mut last = first;

        loop {
            let rp = last.road_point(ctx.is_outgoing);
            if road.is_end_point_id(rp.point_id) || self.road_index.joint_id(rp).is_some() {
                break;
            }
            if self.is_access_no_for_sure_at(rp, ctx.use_access_conditional) {
                return None;
            }

            let next_idx = if last.forward == ctx.is_outgoing {
                last.segment_idx + 1
            } else {
                last.segment_idx - 1
            };
            let next = Segment::new(self.mwm_id, last.feature_id, next_idx, last.forward);

            if ctx.is_outgoing {
                weight = weight + self.calc_edge_weight(Purpose::Weight, true, last, next, ctx);
            }
            last = next;
        }

        if ctx.is_outgoing {
            Some(JointEdge::new(JointSegment::new(first, last), weight))
        } else {
            Some(JointEdge::new(JointSegment::new(last, first), weight))
        }
    }

    fn neighbors_at<V: RestrictionVertex>(
        &mut self,
        from: Segment,
        parent: V,
        ctx: EdgeContext,
        parents: &Parents<V>,
        edges: &mut Vec<SegmentEdge>,
    ) {
        let rp = from.road_point(ctx.is_outgoing);
        match self.road_index.joint_id(rp) {
            Some(joint_id) => {
                let points = self.joint_index.points(joint_id).to_vec();
                for point in points {
                    self.neighboring_edges(from, parent, point, ctx, parents, edges);
                }
            }
            None => self.neighboring_edges(from, parent, rp, ctx, parents, edges),
        }
    }

    fn neighboring_edges<V: RestrictionVertex>(
        &mut self,
        from: Segment,
        parent: V,
        rp: RoadPoint,
        ctx: EdgeContext,
        parents: &Parents<V>,
        edges: &mut Vec<SegmentEdge>,
    ) {
        let road = self.geometry.road(rp.feature_id);
        if !road.valid {
            return;
        }
        if ctx.use_routing_options && !road.suitable_for_options(self.avoid_routing_options) {
            return;
        }

        let bidirectional = !road.one_way;
        if (ctx.is_outgoing || bidirectional) && rp.point_id + 1 < road.points_count() {
            let to = Segment::real(self.mwm_id, rp.feature_id, rp.point_id, ctx.is_outgoing);
            self.neighboring_edge(from, parent, to, &road, ctx, parents, edges);
        }
        if (!ctx.is_outgoing || bidirectional) && rp.point_id > 0 {
            let to = Segment::real(self.mwm_id, rp.feature_id, rp.point_id - 1, !ctx.is_outgoing);
            self.neighboring_edge(from, parent, to, &road, ctx, parents, edges);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn neighboring_edge<V: RestrictionVertex>(
        &mut self,
        from: Segment,
        parent: V,
        to: Segment,
        to_road: &RoadGeometry,
        ctx: EdgeContext,
        parents: &Parents<V>,
        edges: &mut Vec<SegmentEdge>,
    ) {
        if self.is_u_turn_and_restricted(from, to, to_road, ctx.is_outgoing) {
            return;
        }

        let restrictions = if ctx.is_outgoing {
            &self.restrictions_forward
        } else {
            &self.restrictions_backward
        };
        if restrictions::is_restricted(
            restrictions,
            parent,
            from.feature_id,
            to.feature_id,
            parents,
        ) {
            return;
        }

        if self.is_access_no_for_sure(to.feature_id, ctx.use_access_conditional) {
            return;
        }
        if self.is_access_no_for_sure_at(from.road_point(ctx.is_outgoing), ctx.use_access_conditional)
        {
            return;
        }

        let weight = self.calc_edge_weight(Purpose::Weight, ctx.is_outgoing, from, to, ctx);
        edges.push(SegmentEdge::new(to, weight));
    }

    /// Checks whether `from → to` (in the search direction) turns around on `from`'s feature
    /// where that is not possible: away from any joint in the middle of a road,
    /// or at a road end with a U-turn ban.
    fn is_u_turn_and_restricted(
        &self,
        from: Segment,
        to: Segment,
        to_road: &RoadGeometry,
        is_outgoing: bool,
    ) -> bool {
        if from.feature_id != to.feature_id || from.segment_idx != to.segment_idx {
            return false;
        }
        if from.forward == to.forward {
            return false;
        }

        let turn_point = from.point_id(is_outgoing);
        let rp = RoadPoint::new(from.feature_id.raw(), turn_point);
        if self.road_index.joint_id(rp).is_none() && !to_road.is_end_point_id(turn_point) {
            return true;
        }

        let Some(ending) = self.no_u_turn.get(&from.feature_id.raw()) else {
            return false;
        };
        let last_point = to_road.points_count().saturating_sub(1);
        (ending.at_the_begin && turn_point == 0) || (ending.at_the_end && turn_point == last_point)
    }

    fn is_access_no_for_sure(&self, feature: FeatureId, use_conditional: bool) -> bool {
        let Some(feature) = feature.as_real() else {
            return false;
        };
        let (access, confidence) = self.road_access.feature_access(feature, use_conditional);
        access == AccessType::No && confidence == Confidence::Sure
    }

    fn is_access_no_for_sure_at(&self, rp: RoadPoint, use_conditional: bool) -> bool {
        let (access, confidence) = self.road_access.point_access(rp, use_conditional);
        access == AccessType::No && confidence == Confidence::Sure
    }

    fn calc_edge_weight(
        &mut self,
        purpose: Purpose,
        is_outgoing: bool,
        from: Segment,
        to: Segment,
        ctx: EdgeContext,
    ) -> RouteWeight {
        let traversed = if is_outgoing { to } else { from };
        let weight = self.calc_segment_weight(traversed, purpose);
        if purpose == Purpose::Eta {
            return weight;
        }

        let (u, v) = if is_outgoing { (from, to) } else { (to, from) };
        weight + self.calc_penalties(u, v, purpose, ctx.use_access_conditional)
    }

    /// Penalties of moving from segment `u` directly onto segment `v`.
    pub fn calc_penalties(
        &mut self,
        u: Segment,
        v: Segment,
        purpose: Purpose,
        use_access_conditional: bool,
    ) -> RouteWeight {
        let u_road = self.geometry.road(u.feature_id.raw());
        let v_road = self.geometry.road(v.feature_id.raw());

        let mut penalties = RouteWeight::ZERO;
        if u_road.pass_through_allowed != v_road.pass_through_allowed {
            penalties.num_pass_through_changes = 1;
        }

        if u.feature_id != v.feature_id {
            let (from_access, from_confidence) = self
                .road_access
                .feature_access(u.feature_id.raw(), use_access_conditional);
            let (to_access, to_confidence) = self
                .road_access
                .feature_access(v.feature_id.raw(), use_access_conditional);

            if from_confidence == Confidence::Sure && to_confidence == Confidence::Sure {
                if (from_access == AccessType::Yes) != (to_access == AccessType::Yes) {
                    penalties.num_access_changes = 1;
                }
            } else if to_confidence == Confidence::Maybe {
                penalties.num_access_conditional_penalties = 1;
            }
        }

        let (point_access, point_confidence) = self
            .road_access
            .point_access(u.road_point(true), use_access_conditional);
        match point_confidence {
            Confidence::Sure if point_access != AccessType::Yes => penalties.num_access_changes = 1,
            Confidence::Sure => {}
            Confidence::Maybe => penalties.num_access_conditional_penalties = 1,
        }

        if u.feature_id == v.feature_id && u.segment_idx == v.segment_idx && u.forward != v.forward {
            penalties.weight += self.estimator.u_turn_penalty(purpose);
        }

        if u_road.is_ferry != v_road.is_ferry {
            penalties.weight += self.estimator.ferry_landing_penalty(purpose);
        }

        return penalties;
    }
}

impl std::fmt::Debug for IndexGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexGraph")
            .field("mwm_id", &self.mwm_id)
            .field("geometry", &self.geometry)
            .field("num_joints", &self.joint_index.num_joints())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy)]
struct EdgeContext {
    is_outgoing: bool,
    use_routing_options: bool,
    use_access_conditional: bool,
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::loader::RoadNetwork;
    use crate::test_utils::{grid, index_graph, network_of, road, WeightedEdgeEstimator};

    //       (1,2)
    //         │
    //        f1     (2,1)
    //         │      │
    //       (1,1)   f3
    //         │      │
    // (0,0)──f0────(1,0)────f0────(2,0)──f2──>(3,0)
    fn t_roads() -> Vec<RoadGeometry> {
        vec![
            road(false, 36.0, &[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]),
            road(false, 36.0, &[(1.0, 0.0), (1.0, 1.0), (1.0, 2.0)]),
            road(true, 36.0, &[(2.0, 0.0), (3.0, 0.0)]),
            road(false, 36.0, &[(2.0, 0.0), (2.0, 1.0)]),
        ]
    }

    fn t_graph_with<F: FnOnce(&mut Vec<RoadGeometry>, &mut RoadNetwork)>(f: F) -> IndexGraph {
        let mut roads = t_roads();
        let mut network = network_of(&roads);
        f(&mut roads, &mut network);
        index_graph(roads, &network, Rc::new(WeightedEdgeEstimator::with_u_turn_penalty(10.0)))
    }

    fn t_graph() -> IndexGraph {
        t_graph_with(|_, _| {})
    }

    fn s(feature_id: u32, segment_idx: u32, forward: bool) -> Segment {
        Segment::real(0, feature_id, segment_idx, forward)
    }

    fn edges_of(g: &mut IndexGraph, from: Segment, is_outgoing: bool) -> HashMap<Segment, RouteWeight> {
        let mut edges = Vec::default();
        g.get_edge_list(from, is_outgoing, true, false, &Parents::default(), &mut edges);
        edges.into_iter().map(|e| (e.target, e.weight)).collect()
    }

    #[test]
    fn outgoing_edges_at_joint() {
        let mut g = t_graph();
        let edges = edges_of(&mut g, s(0, 0, true), true);

        assert_eq!(edges.len(), 3);
        assert_eq!(edges[&s(0, 1, true)], RouteWeight::from_seconds(1.0));
        assert_eq!(edges[&s(1, 0, true)], RouteWeight::from_seconds(1.0));

        // Turning around at a joint is possible, but penalized
        assert_eq!(edges[&s(0, 0, false)], RouteWeight::from_seconds(11.0));
    }

    #[test]
    fn one_way_roads() {
        let mut g = t_graph();

        let outgoing = edges_of(&mut g, s(0, 1, true), true);
        assert!(outgoing.contains_key(&s(2, 0, true)));
        assert!(outgoing.contains_key(&s(3, 0, true)));
        assert!(outgoing.contains_key(&s(0, 1, false)));
        assert_eq!(outgoing.len(), 3);

        // f2 leaves (2,0), so nothing arrives from it
        let ingoing = edges_of(&mut g, s(0, 1, false), false);
        let mut targets: Vec<Segment> = ingoing.into_keys().collect();
        targets.sort();
        assert_eq!(targets, vec![s(0, 1, true), s(3, 0, false)]);

        assert!(edges_of(&mut g, s(2, 0, true), true).is_empty());
    }

    #[test]
    fn no_u_turn_in_the_middle_of_a_road() {
        let mut g = t_graph();
        let edges = edges_of(&mut g, s(1, 0, true), true);
        assert_eq!(edges.len(), 1);
        assert!(edges.contains_key(&s(1, 1, true)));
    }

    #[test]
    fn u_turn_restriction() {
        let mut g = t_graph();
        let edges = edges_of(&mut g, s(1, 1, true), true);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[&s(1, 1, false)], RouteWeight::from_seconds(11.0));

        let mut g = t_graph_with(|_, n| {
            n.u_turn_restrictions.push(RestrictionUTurn {
                feature_id: 1,
                at_the_begin: false,
            })
        });
        assert!(edges_of(&mut g, s(1, 1, true), true).is_empty());

        // The ban applies to the last point only
        let edges = edges_of(&mut g, s(1, 0, false), true);
        assert!(edges.contains_key(&s(1, 0, true)));
    }

    #[test]
    fn no_restriction() {
        let mut g = t_graph_with(|_, n| n.restrictions.push(Restriction::no(vec![0, 3])));

        let outgoing = edges_of(&mut g, s(0, 1, true), true);
        assert!(!outgoing.contains_key(&s(3, 0, true)));
        assert!(outgoing.contains_key(&s(2, 0, true)));

        let ingoing = edges_of(&mut g, s(3, 0, true), false);
        assert!(!ingoing.contains_key(&s(0, 1, true)));

        // The opposite direction is not restricted
        let outgoing = edges_of(&mut g, s(3, 0, false), true);
        assert!(outgoing.contains_key(&s(0, 1, false)));
    }

    #[test]
    fn only_restriction() {
        let mut g = t_graph_with(|_, n| n.restrictions.push(Restriction::only(vec![0, 2])));

        let outgoing = edges_of(&mut g, s(0, 1, true), true);
        assert!(outgoing.contains_key(&s(2, 0, true)));
        assert!(!outgoing.contains_key(&s(3, 0, true)));

        // Other features may still turn onto f0
        let outgoing = edges_of(&mut g, s(3, 0, false), true);
        assert!(outgoing.contains_key(&s(0, 1, false)));
    }

    #[test]
    fn multi_feature_restriction_uses_parents() {
        // f3 → f0 → f1 is banned, f0 → f1 alone is not
        let mut g = t_graph_with(|_, n| n.restrictions.push(Restriction::no(vec![3, 0, 1])));

        let edges = edges_of(&mut g, s(0, 1, false), true);
        assert!(edges.contains_key(&s(1, 0, true)));

        let mut parents = Parents::default();
        parents.insert(s(0, 1, false), s(3, 0, false));
        let mut edges = Vec::default();
        g.get_edge_list(s(0, 1, false), true, true, false, &parents, &mut edges);
        assert!(edges.iter().all(|e| e.target != s(1, 0, true)));
        assert!(edges.iter().any(|e| e.target == s(0, 0, false)));

        // Searching backwards, f1 ← f0 ← f3 is banned the same way
        let mut parents = Parents::default();
        parents.insert(s(0, 1, false), s(1, 0, true));
        let mut edges = Vec::default();
        g.get_edge_list(s(0, 1, false), false, true, false, &parents, &mut edges);
        assert!(edges.iter().all(|e| e.target != s(3, 0, false)));

        // Without the f1 parent, f3 is a valid predecessor
        let ingoing = edges_of(&mut g, s(0, 1, false), false);
        assert!(ingoing.contains_key(&s(3, 0, false)));
    }

    #[test]
    fn access() {
        let mut g = t_graph_with(|_, n| {
            n.access.set_feature_access(3, AccessType::No);
            n.access.set_feature_access(1, AccessType::Private);
        });

        let outgoing = edges_of(&mut g, s(0, 1, true), true);
        assert!(!outgoing.contains_key(&s(3, 0, true)));

        let outgoing = edges_of(&mut g, s(0, 0, true), true);
        let w = outgoing[&s(1, 0, true)];
        assert_eq!(w.num_access_changes, 1);
        assert_eq!(w.weight, 1.0);
        assert_eq!(outgoing[&s(0, 1, true)].num_access_changes, 0);
    }

    #[test]
    fn conditional_access() {
        let mut g = t_graph_with(|_, n| {
            n.access.add_feature_conditional(
                2,
                ConditionalAccess {
                    access: AccessType::No,
                    window: HourWindow::new(7, 9),
                },
            );
        });

        // Unknown time of day: maybe closed, penalized
        let mut edges = Vec::default();
        g.get_edge_list(s(0, 1, true), true, true, true, &Parents::default(), &mut edges);
        let to_f2 = edges.iter().find(|e| e.target == s(2, 0, true)).unwrap();
        assert_eq!(to_f2.weight.num_access_conditional_penalties, 1);

        // Closed for sure during the window
        let roads = t_roads();
        let mut network = network_of(&roads);
        network.access.add_feature_conditional(
            2,
            ConditionalAccess {
                access: AccessType::No,
                window: HourWindow::new(7, 9),
            },
        );
        let mut g = crate::loader::build_index_graph(
            0,
            Box::new(crate::loader::MemoryGeometryLoader::new(Rc::new(roads))),
            &network,
            Rc::new(WeightedEdgeEstimator::default()),
            RoutingOptions::NONE,
            Some(8),
        );
        let mut edges = Vec::default();
        g.get_edge_list(s(0, 1, true), true, true, true, &Parents::default(), &mut edges);
        assert!(edges.iter().all(|e| e.target != s(2, 0, true)));
    }

    #[test]
    fn avoided_routing_options() {
        let mut g = t_graph_with(|roads, _| roads[2].routing_options = RoutingOptions::TOLL);
        g.set_avoid_routing_options(RoutingOptions::TOLL);

        let mut edges = Vec::default();
        g.get_edge_list(s(0, 1, true), true, true, false, &Parents::default(), &mut edges);
        assert!(edges.iter().all(|e| e.target != s(2, 0, true)));

        edges.clear();
        g.get_edge_list(s(0, 1, true), true, false, false, &Parents::default(), &mut edges);
        assert!(edges.iter().any(|e| e.target == s(2, 0, true)));
    }

    #[test]
    fn joint_edges_prolong_chains() {
        let mut g = t_graph();
        let mut edges = Vec::default();
        g.get_joint_edge_list(
            JointSegment::from_segment(s(0, 0, true)),
            true,
            true,
            false,
            &Parents::default(),
            &mut edges,
        );

        let edges: HashMap<JointSegment, RouteWeight> =
            edges.into_iter().map(|e| (e.target, e.weight)).collect();
        assert_eq!(edges.len(), 3);
        assert_eq!(
            edges[&JointSegment::new(s(1, 0, true), s(1, 1, true))],
            RouteWeight::from_seconds(2.0),
        );
        assert_eq!(
            edges[&JointSegment::from_segment(s(0, 1, true))],
            RouteWeight::from_seconds(1.0),
        );
        assert_eq!(
            edges[&JointSegment::from_segment(s(0, 0, false))],
            RouteWeight::from_seconds(11.0),
        );
    }

    #[test]
    fn ingoing_joint_edges_cover_the_chain() {
        let mut g = t_graph();
        let mut edges = Vec::default();
        g.get_joint_edge_list(
            JointSegment::new(s(1, 0, true), s(1, 1, true)),
            false,
            true,
            false,
            &Parents::default(),
            &mut edges,
        );

        let to_f0 = edges
            .iter()
            .find(|e| e.target == JointSegment::from_segment(s(0, 0, true)))
            .unwrap();
        assert_eq!(to_f0.weight, RouteWeight::from_seconds(2.0));
    }

    struct RegionSearch {
        graph: IndexGraph,
    }

    impl crate::AStarGraph for RegionSearch {
        type Vertex = Segment;

        fn outgoing_edges(
            &mut self,
            v: Segment,
            parents: &Parents<Segment>,
            edges: &mut Vec<SegmentEdge>,
        ) -> Result<(), crate::RoutingError> {
            self.graph.get_edge_list(v, true, true, false, parents, edges);
            Ok(())
        }

        fn ingoing_edges(
            &mut self,
            v: Segment,
            parents: &Parents<Segment>,
            edges: &mut Vec<SegmentEdge>,
        ) -> Result<(), crate::RoutingError> {
            self.graph.get_edge_list(v, false, true, false, parents, edges);
            Ok(())
        }

        fn heuristic(&mut self, _: Segment, _: Segment) -> Result<RouteWeight, crate::RoutingError> {
            Ok(RouteWeight::ZERO)
        }
    }

    // Nine one-way single-segment features:
    //
    //            (3,3)
    //              ^
    //              f6
    //              |
    //   (1,1) ─f3─> (2,2) <─f5── (3,1)
    //     ^ ^                      ^
    //    f7  f1                    f4
    //   /      \                   |
    // (0,0) ─f0─> (2,0) ───f2───> (3,0)
    //   \                          ^
    //    └───────────f8────────────┘
    fn diamond_path(weights: &[(u32, f64)]) -> Vec<LatLon> {
        let roads = vec![
            road(true, 36.0, &[(0.0, 0.0), (2.0, 0.0)]),
            road(true, 36.0, &[(2.0, 0.0), (1.0, 1.0)]),
            road(true, 36.0, &[(2.0, 0.0), (3.0, 0.0)]),
            road(true, 36.0, &[(1.0, 1.0), (2.0, 2.0)]),
            road(true, 36.0, &[(3.0, 0.0), (3.0, 1.0)]),
            road(true, 36.0, &[(3.0, 1.0), (2.0, 2.0)]),
            road(true, 36.0, &[(2.0, 2.0), (3.0, 3.0)]),
            road(true, 36.0, &[(0.0, 0.0), (1.0, 1.0)]),
            road(true, 36.0, &[(0.0, 0.0), (3.0, 0.0)]),
        ];
        let network = network_of(&roads);
        let mut estimator = WeightedEdgeEstimator::with_u_turn_penalty(10.0);
        estimator.weights.extend(weights.iter().copied());
        let mut search = RegionSearch {
            graph: index_graph(roads, &network, Rc::new(estimator)),
        };

        // From the road ending at RoadPoint(1, 0) to the one ending at RoadPoint(6, 1)
        let r = crate::find_path(&mut search, s(0, 0, true), s(6, 0, true), &crate::SearchParams::default())
            .unwrap()
            .expect("route must exist");
        r.path
            .iter()
            .map(|&segment| search.graph.point(segment, true))
            .collect()
    }

    #[test]
    fn diamond_shortest_path() {
        assert_eq!(
            diamond_path(&[]),
            vec![grid(2.0, 0.0), grid(1.0, 1.0), grid(2.0, 2.0), grid(3.0, 3.0)],
        );
    }

    #[test]
    fn diamond_avoids_penalized_feature() {
        assert_eq!(
            diamond_path(&[(3, 100.0)]),
            vec![
                grid(2.0, 0.0),
                grid(3.0, 0.0),
                grid(3.0, 1.0),
                grid(2.0, 2.0),
                grid(3.0, 3.0),
            ],
        );
    }

    #[test]
    fn segment_geometry() {
        let mut g = t_graph();
        assert_eq!(g.point(s(1, 1, true), true), LatLon::new(0.02, 0.01));
        assert_eq!(g.point(s(1, 1, false), true), LatLon::new(0.01, 0.01));
        assert_eq!(g.junction(s(0, 0, true), false).point, LatLon::new(0.0, 0.0));
        assert_eq!(g.num_joints(), 6);
    }
}
