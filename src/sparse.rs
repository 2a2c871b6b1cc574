// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::cross_mwm::{CrossMwmId, TransitionRecord};
use crate::distance::{Junction, LatLon};
use crate::estimator::{EdgeEstimator, Purpose};
use crate::fake_ending::{FakeEnding, Projection};
use crate::index_graph::SegmentEdge;
use crate::loader::{RegionData, RegionDataSource};
use crate::{FeatureId, NumMwmId, RouteWeight, RoutingError, Segment};

/// End of a [CrossBorderSegment].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossBorderEnding {
    pub mwm_id: NumMwmId,
    pub point: LatLon,
}

/// Directed segment crossing from one region into another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossBorderSegment {
    pub start: CrossBorderEnding,
    pub end: CrossBorderEnding,

    /// Travel time, in seconds.
    pub weight: f64,
}

/// All border-crossing segments, indexed by the regions they touch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossBorderGraph {
    segments: BTreeMap<u32, CrossBorderSegment>,
    mwms: BTreeMap<NumMwmId, Vec<u32>>,
}

impl CrossBorderGraph {
    pub fn add_segment(&mut self, id: u32, segment: CrossBorderSegment) {
        debug_assert_ne!(segment.start.mwm_id, segment.end.mwm_id);
        if self.segments.insert(id, segment).is_some() {
            log::warn!("cross-border segment {} added twice", id);
            return;
        }
        self.mwms.entry(segment.start.mwm_id).or_default().push(id);
        self.mwms.entry(segment.end.mwm_id).or_default().push(id);
    }

    #[inline]
    pub fn segment(&self, id: u32) -> Option<&CrossBorderSegment> {
        self.segments.get(&id)
    }

    /// Returns the ids of segments starting or ending in a region.
    pub fn segments_of(&self, mwm_id: NumMwmId) -> &[u32] {
        self.mwms.get(&mwm_id).map_or(&[], |ids| ids.as_slice())
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Creates the graph out of the transitions of regions. Every allowed direction of
    /// a transition becomes one segment; transitions shared by two regions are added once.
    pub fn from_transitions<'a, I, F>(regions: I, mut region_at: F, estimator: &dyn EdgeEstimator) -> Self
    where
        I: IntoIterator<Item = (NumMwmId, &'a RegionData)>,
        F: FnMut(LatLon) -> Option<NumMwmId>,
    {
        let mut unique: BTreeMap<(CrossMwmId, bool), CrossBorderSegment> = BTreeMap::default();

        for (_, region) in regions {
            for t in &region.transitions {
                let directions: &[bool] = if t.one_way { &[true] } else { &[true, false] };
                for &forward in directions {
                    if unique.contains_key(&(t.cross_id, forward)) {
                        continue;
                    }
                    if let Some(segment) = make_cross_border_segment(region, t, forward, &mut region_at, estimator)
                    {
                        unique.insert((t.cross_id, forward), segment);
                    }
                }
            }
        }

        let mut graph = Self::default();
        for (id, segment) in unique.into_values().enumerate() {
            graph.add_segment(id as u32, segment);
        }
        log::info!("cross-border graph with {} segments", graph.len());
        graph
    }
}

fn make_cross_border_segment<F>(
    region: &RegionData,
    t: &TransitionRecord,
    forward: bool,
    region_at: &mut F,
    estimator: &dyn EdgeEstimator,
) -> Option<CrossBorderSegment>
where
    F: FnMut(LatLon) -> Option<NumMwmId>,
{
    let (from, to) = if forward {
        (t.back_point, t.front_point)
    } else {
        (t.front_point, t.back_point)
    };
    let start = region_at(from)?;
    let end = region_at(to)?;
    if start == end {
        return None;
    }

    let road = region.roads.get(t.feature_id.raw() as usize)?;
    let segment = Segment::new(0, t.feature_id, t.segment_idx, forward);
    let weight = if road.valid {
        estimator.calc_segment_weight(&segment, road, Purpose::Weight)
    } else {
        estimator.calc_leap_weight(from, to)
    };

    Some(CrossBorderSegment {
        start: CrossBorderEnding { mwm_id: start, point: from },
        end: CrossBorderEnding { mwm_id: end, point: to },
        weight,
    })
}

/// Coarse world graph over the [CrossBorderGraph], used for long routes without
/// loading any region graphs.
pub struct RegionsSparseGraph {
    graph: Rc<CrossBorderGraph>,
    source: Rc<dyn RegionDataSource>,
    estimator: Rc<dyn EdgeEstimator>,
}

impl RegionsSparseGraph {
    pub fn new(
        graph: Rc<CrossBorderGraph>,
        source: Rc<dyn RegionDataSource>,
        estimator: Rc<dyn EdgeEstimator>,
    ) -> Self {
        Self {
            graph,
            source,
            estimator,
        }
    }

    #[inline]
    pub fn estimator(&self) -> &Rc<dyn EdgeEstimator> {
        &self.estimator
    }

    #[inline]
    fn make_segment(&self, id: u32, segment: &CrossBorderSegment) -> Segment {
        Segment::new(segment.start.mwm_id, FeatureId::Synthetic(id), 0, true)
    }

    fn cross_border_segment(&self, s: &Segment) -> Option<&CrossBorderSegment> {
        match s.feature_id {
            FeatureId::Synthetic(id) => self.graph.segment(id),
            _ => None,
        }
    }

    /// Attaches `point` to every cross-border segment touching its region.
    pub fn get_fake_ending(&self, point: LatLon) -> Result<FakeEnding, RoutingError> {
        let mwm_id = self
            .source
            .region_at(point)
            .ok_or(RoutingError::PointNotInAnyRegion {
                lat: point.lat,
                lon: point.lon,
            })?;

        let mut ending = FakeEnding {
            origin_junction: Junction::at(point),
            projections: Vec::default(),
        };

        for &id in self.graph.segments_of(mwm_id) {
            let Some(cbs) = self.graph.segment(id) else {
                continue;
            };
            let back = Junction::at(cbs.start.point);
            let front = Junction::at(cbs.end.point);
            let junction = if cbs.start.mwm_id == mwm_id { back } else { front };
            ending.projections.push(Projection {
                segment: self.make_segment(id, cbs),
                is_one_way: true,
                segment_front: front,
                segment_back: back,
                junction,
            });
        }

        Ok(ending)
    }

    /// Appends the segments adjacent to `s`. For outgoing edges, those are segments leaving the
    /// region `s` ends in, weighted by their own weight plus the estimated time of getting
    /// from `prev_seg_front` to their start. For ingoing edges, segments entering the region
    /// `s` starts from, weighted by the estimated time between their end and the start of `s`.
    pub fn get_edge_list(
        &self,
        s: &Segment,
        is_outgoing: bool,
        prev_seg_front: LatLon,
        edges: &mut Vec<SegmentEdge>,
    ) {
        let Some(current) = self.cross_border_segment(s) else {
            return;
        };
        let current_id = s.feature_id.raw();

        let region = if is_outgoing {
            current.end.mwm_id
        } else {
            current.start.mwm_id
        };

        for &id in self.graph.segments_of(region) {
            if id == current_id {
                continue;
            }
            let Some(other) = self.graph.segment(id) else {
                continue;
            };

            if is_outgoing {
                if other.start.mwm_id != region {
                    continue;
                }
                let w = other.weight + self.estimator.calc_heuristic(prev_seg_front, other.start.point);
                edges.push(SegmentEdge::new(self.make_segment(id, other), RouteWeight::from_seconds(w)));
            } else {
                if other.end.mwm_id != region {
                    continue;
                }
                let w = self.estimator.calc_heuristic(other.end.point, current.start.point);
                edges.push(SegmentEdge::new(self.make_segment(id, other), RouteWeight::from_seconds(w)));
            }
        }
    }

    pub fn junction(&self, s: &Segment, front: bool) -> Option<Junction> {
        let cbs = self.cross_border_segment(s)?;
        Some(Junction::at(if front { cbs.end.point } else { cbs.start.point }))
    }

    pub fn calc_segment_weight(&self, s: &Segment) -> RouteWeight {
        self.cross_border_segment(s)
            .map_or(RouteWeight::INFINITY, |cbs| RouteWeight::from_seconds(cbs.weight))
    }
}

impl std::fmt::Debug for RegionsSparseGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionsSparseGraph")
            .field("segments", &self.graph.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::SpeedEstimator;
    use crate::test_utils::{grid, two_regions};

    fn sparse() -> RegionsSparseGraph {
        let estimator: Rc<dyn EdgeEstimator> = Rc::new(SpeedEstimator::car());
        let mut regions = two_regions(100.0, None);
        regions.build_cross_border_graph(estimator.as_ref());
        let graph = regions.cross_border_graph().unwrap();
        RegionsSparseGraph::new(graph, Rc::new(regions), estimator)
    }

    #[test]
    fn shared_transitions_are_added_once() {
        let regions = two_regions(100.0, None);
        let graph = CrossBorderGraph::from_transitions(
            regions.ids().filter_map(|id| Some((id, regions.get(id)?))),
            |p| regions.region_at(p),
            &SpeedEstimator::car(),
        );

        // Both directions of the border road, listed by both regions
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.segments_of(0), &[0, 1]);
        assert_eq!(graph.segments_of(1), &[0, 1]);
        assert!(graph.segments_of(2).is_empty());

        let east_to_west = graph.segment(0).unwrap();
        assert_eq!(east_to_west.start.mwm_id, 1);
        assert_eq!(east_to_west.end.mwm_id, 0);
        assert_eq!(east_to_west.start.point, grid(2.0, 0.0));

        let west_to_east = graph.segment(1).unwrap();
        assert_eq!(west_to_east.start.mwm_id, 0);
        assert_eq!(west_to_east.end.point, grid(2.0, 0.0));
        assert!((west_to_east.weight - east_to_west.weight).abs() < 1e-6);
    }

    #[test]
    fn one_way_transitions() {
        let mut regions = two_regions(100.0, None);
        for id in [0, 1] {
            if let Some(region) = regions.get_mut(id) {
                region.transitions[0].one_way = true;
            }
        }
        let graph = CrossBorderGraph::from_transitions(
            regions.ids().filter_map(|id| Some((id, regions.get(id)?))),
            |p| regions.region_at(p),
            &SpeedEstimator::car(),
        );
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.segment(0).map(|s| s.start.mwm_id), Some(0));
    }

    #[test]
    fn fake_ending() {
        let g = sparse();
        let ending = g.get_fake_ending(grid(0.5, 0.0)).unwrap();
        assert_eq!(ending.origin_junction.point, grid(0.5, 0.0));
        assert_eq!(ending.projections.len(), 2);
        assert!(ending.projections.iter().all(|p| p.is_one_way));
        // Both segments touch the west region at the border road start
        assert!(ending
            .projections
            .iter()
            .all(|p| p.junction.point == grid(1.0, 0.0)));

        assert!(matches!(
            g.get_fake_ending(grid(5.0, 0.0)),
            Err(RoutingError::PointNotInAnyRegion { .. }),
        ));
    }

    #[test]
    fn edges_continue_in_the_next_region() {
        let g = sparse();
        let west_to_east = Segment::new(0, FeatureId::Synthetic(1), 0, true);
        let east_to_west = Segment::new(1, FeatureId::Synthetic(0), 0, true);

        let mut edges = Vec::default();
        g.get_edge_list(&west_to_east, true, grid(2.0, 0.0), &mut edges);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target, east_to_west);
        assert_eq!(edges[0].weight, g.calc_segment_weight(&east_to_west));

        let mut edges = Vec::default();
        g.get_edge_list(&west_to_east, false, grid(1.0, 0.0), &mut edges);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target, east_to_west);
        assert_eq!(edges[0].weight, RouteWeight::ZERO);

        assert_eq!(g.junction(&west_to_east, false).map(|j| j.point), Some(grid(1.0, 0.0)));
        assert_eq!(g.junction(&Segment::real(0, 0, 0, true), true), None);
        assert_eq!(g.calc_segment_weight(&Segment::real(0, 0, 0, true)), RouteWeight::INFINITY);
    }
}
