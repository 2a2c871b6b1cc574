// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::rc::Rc;

use super::{get_twin_edges, get_twin_leaps, WorldGraph, WorldGraphMode};
use crate::cross_mwm::CrossMwmGraph;
use crate::distance::{Junction, LatLon};
use crate::estimator::{EdgeEstimator, Purpose};
use crate::geometry::RoadGeometry;
use crate::index_graph::{JointEdge, JointSegment, SegmentEdge};
use crate::loader::{IndexGraphLoader, RegionDataSource};
use crate::{NumMwmId, Parents, RouteWeight, RoutingError, RoutingOptions, Segment};

/// [WorldGraph] of a single vehicle type moving over road regions.
pub struct SingleVehicleWorldGraph {
    mode: WorldGraphMode,
    cross_mwm: CrossMwmGraph,
    loader: IndexGraphLoader,
    estimator: Rc<dyn EdgeEstimator>,
}

impl SingleVehicleWorldGraph {
    pub fn new(source: Rc<dyn RegionDataSource>, estimator: Rc<dyn EdgeEstimator>) -> Self {
        Self {
            mode: WorldGraphMode::default(),
            cross_mwm: CrossMwmGraph::new(source.clone()),
            loader: IndexGraphLoader::new(source, estimator.clone()),
            estimator,
        }
    }

    #[inline]
    pub fn loader(&mut self) -> &mut IndexGraphLoader {
        &mut self.loader
    }

    #[inline]
    pub fn cross_mwm(&mut self) -> &mut CrossMwmGraph {
        &mut self.cross_mwm
    }

    pub fn set_avoid_routing_options(&mut self, avoid: RoutingOptions) {
        self.loader.set_avoid_routing_options(avoid);
    }

    pub fn set_current_hour(&mut self, hour: Option<u8>) {
        self.loader.set_current_hour(hour);
    }

    fn index_edges(
        &mut self,
        segment: &Segment,
        is_outgoing: bool,
        use_routing_options: bool,
        parents: &Parents<Segment>,
        edges: &mut Vec<SegmentEdge>,
    ) -> Result<(), RoutingError> {
        self.loader.get_index_graph(segment.mwm_id)?.get_edge_list(
            *segment,
            is_outgoing,
            use_routing_options,
            true,
            parents,
            edges,
        );
        Ok(())
    }
}

impl WorldGraph for SingleVehicleWorldGraph {
    #[inline]
    fn mode(&self) -> WorldGraphMode {
        self.mode
    }

    #[inline]
    fn set_mode(&mut self, mode: WorldGraphMode) {
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
        match mode {
            WorldGraphMode::SingleMwm | WorldGraphMode::JointSingleMwm => {
                self.index_edges(segment, is_outgoing, use_routing_options, parents, edges)
            }

            WorldGraphMode::NoLeaps | WorldGraphMode::Joints => {
                self.index_edges(segment, is_outgoing, use_routing_options, parents, edges)?;
                if self.cross_mwm.is_transition(segment, is_outgoing)? {
                    get_twin_edges(self, segment, is_outgoing, use_routing_options, parents, edges)?;
                }
                Ok(())
            }

            WorldGraphMode::LeapsOnly => {
                if self.cross_mwm.is_transition(segment, is_outgoing)? {
                    get_twin_leaps(self, segment, is_outgoing, edges)
                } else if self.cross_mwm.is_transition(segment, !is_outgoing)? {
                    self.cross_mwm.get_edge_list(segment, is_outgoing, edges)
                } else {
                    Ok(())
                }
            }

            WorldGraphMode::LeapsIfPossible => {
                if self.cross_mwm.is_transition(segment, is_outgoing)? {
                    return get_twin_leaps(self, segment, is_outgoing, edges);
                }
                if self.cross_mwm.is_transition(segment, !is_outgoing)? {
                    self.cross_mwm.get_edge_list(segment, is_outgoing, edges)?;
                }
                self.index_edges(segment, is_outgoing, use_routing_options, parents, edges)
            }
        }
    }

    fn get_joint_edge_list(
        &mut self,
        mode: WorldGraphMode,
        vertex: &JointSegment,
        is_outgoing: bool,
        use_routing_options: bool,
        parents: &Parents<JointSegment>,
        edges: &mut Vec<JointEdge>,
    ) -> Result<(), RoutingError> {
        assert!(mode.is_joints(), "{:?} is not a joints mode", mode);

        self.loader.get_index_graph(vertex.mwm_id)?.get_joint_edge_list(
            *vertex,
            is_outgoing,
            use_routing_options,
            true,
            parents,
            edges,
        );

        if mode == WorldGraphMode::Joints {
            let tail = if is_outgoing {
                vertex.last_segment()
            } else {
                vertex.first_segment()
            };
            if self.cross_mwm.is_transition(&tail, is_outgoing)? {
                let mut twins = Vec::default();
                self.get_twins(&tail, is_outgoing, &mut twins)?;
                edges.extend(
                    twins
                        .into_iter()
                        .map(|t| JointEdge::new(JointSegment::from_segment(t), RouteWeight::ZERO)),
                );
            }
        }
        Ok(())
    }

    fn junction(&mut self, segment: &Segment, front: bool) -> Result<Junction, RoutingError> {
        Ok(self.loader.get_index_graph(segment.mwm_id)?.junction(*segment, front))
    }

    fn point(&mut self, segment: &Segment, front: bool) -> Result<LatLon, RoutingError> {
        self.cross_mwm.point(segment, front, &mut self.loader)
    }

    fn road_geometry(&mut self, segment: &Segment) -> Result<Rc<RoadGeometry>, RoutingError> {
        Ok(self
            .loader
            .get_index_graph(segment.mwm_id)?
            .road(segment.feature_id.raw()))
    }

    fn calc_segment_weight(&mut self, segment: &Segment, purpose: Purpose) -> Result<RouteWeight, RoutingError> {
        Ok(self
            .loader
            .get_index_graph(segment.mwm_id)?
            .calc_segment_weight(*segment, purpose))
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

    fn clear_cached_graphs(&mut self) {
        self.loader.clear();
        self.cross_mwm.clear();
    }
}

impl std::fmt::Debug for SingleVehicleWorldGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleVehicleWorldGraph")
            .field("mode", &self.mode)
            .field("cross_mwm", &self.cross_mwm)
            .field("loader", &self.loader)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::SpeedEstimator;
    use crate::test_utils::two_regions;

    fn graph(mode: WorldGraphMode) -> SingleVehicleWorldGraph {
        let estimator: Rc<dyn EdgeEstimator> = Rc::new(SpeedEstimator::car());
        let regions = two_regions(100.0, Some(estimator.clone()));
        let mut g = SingleVehicleWorldGraph::new(Rc::new(regions), estimator);
        g.set_mode(mode);
        g
    }

    fn targets(g: &mut SingleVehicleWorldGraph, s: Segment, is_outgoing: bool) -> Vec<Segment> {
        let mut edges = Vec::default();
        g.get_edge_list(&s, is_outgoing, true, &Parents::default(), &mut edges)
            .unwrap();
        let mut targets: Vec<Segment> = edges.into_iter().map(|e| e.target).collect();
        targets.sort();
        targets
    }

    const WEST_EXIT: Segment = Segment::real(0, 1, 0, true);
    const EAST_ENTER: Segment = Segment::real(1, 0, 0, true);

    #[test]
    fn no_leaps_crosses_borders() {
        let mut g = graph(WorldGraphMode::NoLeaps);
        assert_eq!(
            targets(&mut g, WEST_EXIT, true),
            vec![WEST_EXIT.reversed(), EAST_ENTER.reversed(), Segment::real(1, 1, 0, true)],
        );

        // Backwards: the west exit is reached from the segments preceding its twin
        let ingoing = targets(&mut g, Segment::real(1, 1, 0, true), false);
        assert!(ingoing.contains(&EAST_ENTER));
        assert!(ingoing.iter().all(|s| s.mwm_id == 1));
        let ingoing = targets(&mut g, EAST_ENTER, false);
        assert!(ingoing.contains(&Segment::real(0, 0, 0, true)));
    }

    #[test]
    fn single_mwm_stays_in_region() {
        let mut g = graph(WorldGraphMode::SingleMwm);
        assert_eq!(targets(&mut g, WEST_EXIT, true), vec![WEST_EXIT.reversed()]);
    }

    #[test]
    fn leaps_only() {
        let mut g = graph(WorldGraphMode::LeapsOnly);

        let mut edges = Vec::default();
        g.get_edge_list(&WEST_EXIT, true, true, &Parents::default(), &mut edges)
            .unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target, EAST_ENTER);
        assert_eq!(edges[0].weight, RouteWeight::ZERO);

        // Enters lead to exits of the same region, over precomputed weights
        assert_eq!(targets(&mut g, EAST_ENTER, true), vec![EAST_ENTER.reversed()]);

        // Insides of regions are not expanded at all
        assert!(targets(&mut g, Segment::real(0, 0, 0, true), true).is_empty());
        assert!(!g.loader().is_loaded(0));
    }

    #[test]
    fn leaps_if_possible() {
        let mut g = graph(WorldGraphMode::LeapsIfPossible);
        let west_enter = WEST_EXIT.reversed();

        let t = targets(&mut g, west_enter, true);
        assert!(t.contains(&WEST_EXIT));
        assert!(t.contains(&Segment::real(0, 0, 0, false)));

        let t = targets(&mut g, WEST_EXIT, true);
        assert_eq!(t, vec![EAST_ENTER]);
    }

    #[test]
    fn twins_and_transitions() {
        let mut g = graph(WorldGraphMode::NoLeaps);
        assert!(g.is_transition(&WEST_EXIT, true).unwrap());
        assert!(g.is_transition(&EAST_ENTER, false).unwrap());

        let mut twins = Vec::default();
        g.get_twins(&EAST_ENTER, false, &mut twins).unwrap();
        assert_eq!(twins, vec![WEST_EXIT]);

        let mut exits = Vec::default();
        g.for_each_transition(1, false, &mut |s| exits.push(s)).unwrap();
        assert_eq!(exits, vec![EAST_ENTER.reversed()]);
    }

    #[test]
    fn lazy_loading() {
        let mut g = graph(WorldGraphMode::NoLeaps);
        assert_eq!(g.loader().loaded_count(), 0);

        let p = g.point(&Segment::real(0, 0, 0, true), true).unwrap();
        assert_eq!(p, LatLon::new(0.0, 0.01));
        assert_eq!(g.loader().loaded_count(), 1);

        g.clear_cached_graphs();
        assert_eq!(g.loader().loaded_count(), 0);
    }

    #[test]
    fn best_segments() {
        let mut g = graph(WorldGraphMode::NoLeaps);
        let segments = g.find_best_segments(LatLon::new(0.0001, 0.029), 4).unwrap();
        assert_eq!(segments, vec![Segment::real(1, 1, 0, true)]);

        assert!(matches!(
            g.find_best_segments(LatLon::new(1.0, 1.0), 4),
            Err(RoutingError::PointNotInAnyRegion { .. }),
        ));
    }

    #[test]
    fn parse_modes() {
        assert_eq!("joints".parse(), Ok(WorldGraphMode::Joints));
        assert_eq!("leaps-only".parse(), Ok(WorldGraphMode::LeapsOnly));
        assert!("leaps".parse::<WorldGraphMode>().is_err());
    }
}
