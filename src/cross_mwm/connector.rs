// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use crate::distance::LatLon;
use crate::index_graph::SegmentEdge;
use crate::{FeatureId, NumMwmId, RouteWeight, Segment};

/// Identifier of a transition segment shared by all regions storing that segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CrossMwmId {
    /// OSM way crossing a region border, with the index of the crossing segment
    /// within the original (unsplit) way.
    Osm { way_id: i64, segment_idx: u32 },

    /// Transit edge between two stops of a line.
    Transit { stop1: u64, stop2: u64, line: u32 },
}

/// Weight stored in [CrossMwmSection::weights] between an enter and an exit without a route.
pub const NO_ROUTE: f64 = f64::INFINITY;

/// Description of a single transition segment of a region.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionRecord {
    pub cross_id: CrossMwmId,
    pub feature_id: FeatureId,
    pub segment_idx: u32,
    pub one_way: bool,

    /// true if travelling the segment forward enters the region.
    pub forward_is_enter: bool,

    /// Position of the point `segment_idx` of the feature.
    pub back_point: LatLon,

    /// Position of the point `segment_idx + 1` of the feature.
    pub front_point: LatLon,
}

/// Precomputed cross-region data of one region: its transition segments
/// together with shortest travel times from every enter to every exit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossMwmSection {
    pub transitions: Vec<TransitionRecord>,

    /// Row-major `enters × exits` matrix of travel times, in seconds.
    /// Enters and exits are numbered in the order of `transitions`.
    /// May be empty if weights were not computed.
    pub weights: Vec<f64>,
}

#[derive(Debug, Clone)]
struct Transition {
    cross_id: CrossMwmId,
    enter_idx: Option<u32>,
    exit_idx: Option<u32>,
    one_way: bool,
    forward_is_enter: bool,
    back_point: LatLon,
    front_point: LatLon,
}

/// Index over the transition segments of a region.
#[derive(Debug, Clone)]
pub struct CrossMwmConnector {
    mwm_id: NumMwmId,
    transitions: HashMap<(FeatureId, u32), Transition>,
    by_cross_id: HashMap<CrossMwmId, (FeatureId, u32)>,
    enters: Vec<Segment>,
    exits: Vec<Segment>,
    weights: Vec<f64>,
}

impl CrossMwmConnector {
    pub fn new(mwm_id: NumMwmId) -> Self {
        Self {
            mwm_id,
            transitions: HashMap::default(),
            by_cross_id: HashMap::default(),
            enters: Vec::default(),
            exits: Vec::default(),
            weights: Vec::default(),
        }
    }

    pub fn from_section(mwm_id: NumMwmId, section: &CrossMwmSection) -> Self {
        let mut c = Self::new(mwm_id);
        for t in &section.transitions {
            c.add_transition(t);
        }
        if !section.weights.is_empty() {
            c.set_weights(section.weights.clone());
        }
        c
    }

    pub fn add_transition(&mut self, record: &TransitionRecord) {
        let key = (record.feature_id, record.segment_idx);
        let forward = Segment::new(self.mwm_id, record.feature_id, record.segment_idx, true);

        let mut t = Transition {
            cross_id: record.cross_id,
            enter_idx: None,
            exit_idx: None,
            one_way: record.one_way,
            forward_is_enter: record.forward_is_enter,
            back_point: record.back_point,
            front_point: record.front_point,
        };

        if record.forward_is_enter {
            t.enter_idx = Some(self.enters.len() as u32);
            self.enters.push(forward);
        } else {
            t.exit_idx = Some(self.exits.len() as u32);
            self.exits.push(forward);
        }

        if !record.one_way {
            let backward = forward.reversed();
            if record.forward_is_enter {
                t.exit_idx = Some(self.exits.len() as u32);
                self.exits.push(backward);
            } else {
                t.enter_idx = Some(self.enters.len() as u32);
                self.enters.push(backward);
            }
        }

        if self.transitions.insert(key, t).is_some() {
            log::warn!(
                "region {}: duplicate transition at feature {} segment {}",
                self.mwm_id,
                record.feature_id,
                record.segment_idx
            );
        }
        self.by_cross_id.insert(record.cross_id, key);
    }

    /// Sets the enters × exits weight matrix.
    pub fn set_weights(&mut self, weights: Vec<f64>) {
        assert_eq!(
            weights.len(),
            self.enters.len() * self.exits.len(),
            "region {}: weight matrix does not match the transitions",
            self.mwm_id
        );
        self.weights = weights;
    }

    #[inline]
    pub fn mwm_id(&self) -> NumMwmId {
        self.mwm_id
    }

    #[inline]
    pub fn enters(&self) -> &[Segment] {
        &self.enters
    }

    #[inline]
    pub fn exits(&self) -> &[Segment] {
        &self.exits
    }

    #[inline]
    pub fn has_weights(&self) -> bool {
        !self.weights.is_empty() || self.enters.is_empty() || self.exits.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    fn transition(&self, s: &Segment) -> Option<&Transition> {
        if s.mwm_id != self.mwm_id {
            return None;
        }
        self.transitions.get(&(s.feature_id, s.segment_idx))
    }

    /// Returns true if `s` leaves the region (when `is_outgoing`) or enters it (otherwise).
    pub fn is_transition(&self, s: &Segment, is_outgoing: bool) -> bool {
        let Some(t) = self.transition(s) else {
            return false;
        };
        if t.one_way && !s.forward {
            return false;
        }

        // An exit is a transition in the outgoing direction, an enter in the ingoing one.
        let is_enter = s.forward == t.forward_is_enter;
        is_enter != is_outgoing
    }

    /// Returns the enter (`is_enter`) or exit segment of the transition with the given id.
    pub fn get_transition(&self, cross_id: CrossMwmId, is_enter: bool) -> Option<Segment> {
        let &(feature_id, segment_idx) = self.by_cross_id.get(&cross_id)?;
        let t = self.transitions.get(&(feature_id, segment_idx))?;
        let forward = t.forward_is_enter == is_enter;
        if t.one_way && !forward {
            return None;
        }
        Some(Segment::new(self.mwm_id, feature_id, segment_idx, forward))
    }

    pub fn cross_id(&self, s: &Segment) -> Option<CrossMwmId> {
        self.transition(s).map(|t| t.cross_id)
    }

    /// Returns the back or front point of a transition segment, respecting its direction.
    pub fn point(&self, s: &Segment, front: bool) -> Option<LatLon> {
        let t = self.transition(s)?;
        if s.forward == front {
            Some(t.front_point)
        } else {
            Some(t.back_point)
        }
    }

    pub fn weight(&self, enter_idx: u32, exit_idx: u32) -> Option<RouteWeight> {
        let i = enter_idx as usize * self.exits.len() + exit_idx as usize;
        let w = *self.weights.get(i)?;
        w.is_finite().then(|| RouteWeight::from_seconds(w))
    }

    /// For an enter: appends edges to all reachable exits (`is_outgoing`).
    /// For an exit: appends edges from all enters it is reachable from (`!is_outgoing`).
    pub fn get_edge_list(&self, s: &Segment, is_outgoing: bool, edges: &mut Vec<SegmentEdge>) {
        let Some(t) = self.transition(s) else {
            return;
        };
        let is_enter = s.forward == t.forward_is_enter;

        if is_outgoing {
            let Some(enter_idx) = t.enter_idx.filter(|_| is_enter) else {
                return;
            };
            for (exit_idx, &exit) in self.exits.iter().enumerate() {
                if let Some(w) = self.weight(enter_idx, exit_idx as u32) {
                    edges.push(SegmentEdge::new(exit, w));
                }
            }
        } else {
            let Some(exit_idx) = t.exit_idx.filter(|_| !is_enter) else {
                return;
            };
            for (enter_idx, &enter) in self.enters.iter().enumerate() {
                if let Some(w) = self.weight(enter_idx as u32, exit_idx) {
                    edges.push(SegmentEdge::new(enter, w));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(way_id: i64, feature_id: u32, one_way: bool, forward_is_enter: bool) -> TransitionRecord {
        TransitionRecord {
            cross_id: CrossMwmId::Osm {
                way_id,
                segment_idx: 0,
            },
            feature_id: FeatureId::Real(feature_id),
            segment_idx: 0,
            one_way,
            forward_is_enter,
            back_point: LatLon::new(0.0, 0.0),
            front_point: LatLon::new(0.0, 0.001),
        }
    }

    #[test]
    fn one_way_transitions() {
        let mut c = CrossMwmConnector::new(1);
        c.add_transition(&record(10, 0, true, true));
        c.add_transition(&record(11, 1, true, false));

        let enter = Segment::real(1, 0, 0, true);
        let exit = Segment::real(1, 1, 0, true);

        assert!(c.is_transition(&enter, false));
        assert!(!c.is_transition(&enter, true));
        assert!(c.is_transition(&exit, true));
        assert!(!c.is_transition(&exit, false));
        assert!(!c.is_transition(&enter.reversed(), false));
        assert!(!c.is_transition(&enter.reversed(), true));

        assert_eq!(c.enters(), &[enter]);
        assert_eq!(c.exits(), &[exit]);

        let id = c.cross_id(&exit).unwrap();
        assert_eq!(c.get_transition(id, false), Some(exit));
        assert_eq!(c.get_transition(id, true), None);
    }

    #[test]
    fn two_way_transition() {
        let mut c = CrossMwmConnector::new(2);
        c.add_transition(&record(20, 5, false, true));

        let forward = Segment::real(2, 5, 0, true);
        assert!(c.is_transition(&forward, false));
        assert!(c.is_transition(&forward.reversed(), true));
        assert_eq!(c.enters(), &[forward]);
        assert_eq!(c.exits(), &[forward.reversed()]);

        assert_eq!(c.point(&forward, true), Some(LatLon::new(0.0, 0.001)));
        assert_eq!(c.point(&forward.reversed(), true), Some(LatLon::new(0.0, 0.0)));
    }

    #[test]
    fn aggregate_edges() {
        let mut c = CrossMwmConnector::new(0);
        c.add_transition(&record(1, 0, true, true));
        c.add_transition(&record(2, 1, true, true));
        c.add_transition(&record(3, 2, true, false));
        c.add_transition(&record(4, 3, true, false));
        c.set_weights(vec![10.0, NO_ROUTE, 30.0, 40.0]);

        let mut edges = Vec::default();
        c.get_edge_list(&Segment::real(0, 0, 0, true), true, &mut edges);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target, Segment::real(0, 2, 0, true));
        assert_eq!(edges[0].weight, RouteWeight::from_seconds(10.0));

        edges.clear();
        c.get_edge_list(&Segment::real(0, 3, 0, true), false, &mut edges);
        let targets: Vec<_> = edges.iter().map(|e| e.target.feature_id.raw()).collect();
        assert_eq!(targets, vec![1]);

        // Exits have no outgoing aggregate edges
        edges.clear();
        c.get_edge_list(&Segment::real(0, 2, 0, true), true, &mut edges);
        assert!(edges.is_empty());
    }
}
