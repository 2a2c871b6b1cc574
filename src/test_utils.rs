// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::rc::Rc;

use crate::cross_mwm::{CrossMwmId, TransitionRecord};
use crate::distance::{LatLon, Rect};
use crate::estimator::{EdgeEstimator, Purpose};
use crate::geometry::RoadGeometry;
use crate::index_graph::{build_joints, IndexGraph};
use crate::loader::{build_index_graph, MemoryGeometryLoader, RegionData, RegionSet, RoadNetwork};
use crate::{FeatureId, RoadPoint, RoutingOptions, Segment};

/// Position on a test grid, with cells of 0.01°.
#[inline]
pub(crate) fn grid(x: f64, y: f64) -> LatLon {
    LatLon::new(y * 0.01, x * 0.01)
}

/// Creates a road through the given grid positions.
pub(crate) fn road(one_way: bool, speed: f64, points: &[(f64, f64)]) -> RoadGeometry {
    let points: Vec<LatLon> = points.iter().map(|&(x, y)| grid(x, y)).collect();
    RoadGeometry::new(one_way, speed, &points)
}

/// Creates a network in which roads are only connected where their points coincide.
pub(crate) fn network_of(roads: &[RoadGeometry]) -> RoadNetwork {
    let points = roads.iter().enumerate().flat_map(|(feature_id, road)| {
        let last = road.points_count().saturating_sub(1);
        road.junctions.iter().enumerate().map(move |(point_id, j)| {
            let point_id = point_id as u32;
            (
                RoadPoint::new(feature_id as u32, point_id),
                j.point,
                point_id == 0 || point_id == last,
            )
        })
    });

    RoadNetwork {
        joints: build_joints(points),
        ..RoadNetwork::default()
    }
}

pub(crate) fn index_graph(
    roads: Vec<RoadGeometry>,
    network: &RoadNetwork,
    estimator: Rc<dyn EdgeEstimator>,
) -> IndexGraph {
    build_index_graph(
        0,
        Box::new(MemoryGeometryLoader::new(Rc::new(roads))),
        network,
        estimator,
        RoutingOptions::NONE,
        None,
    )
}

/// Estimator charging a fixed weight for every segment of a feature, with zero estimates.
#[derive(Debug, Clone, Default)]
pub(crate) struct WeightedEdgeEstimator {
    pub(crate) weights: HashMap<u32, f64>,
    pub(crate) u_turn_penalty: f64,
}

impl WeightedEdgeEstimator {
    pub(crate) fn with_u_turn_penalty(u_turn_penalty: f64) -> Self {
        Self {
            weights: HashMap::default(),
            u_turn_penalty,
        }
    }
}

impl EdgeEstimator for WeightedEdgeEstimator {
    fn calc_segment_weight(&self, segment: &Segment, _: &RoadGeometry, _: Purpose) -> f64 {
        self.weights
            .get(&segment.feature_id.raw())
            .copied()
            .unwrap_or(1.0)
    }

    fn calc_heuristic(&self, _: LatLon, _: LatLon) -> f64 {
        0.0
    }

    fn calc_leap_weight(&self, _: LatLon, _: LatLon) -> f64 {
        0.0
    }

    fn calc_offroad(&self, _: LatLon, _: LatLon, _: Purpose) -> f64 {
        0.0
    }

    fn u_turn_penalty(&self, _: Purpose) -> f64 {
        self.u_turn_penalty
    }

    fn ferry_landing_penalty(&self, _: Purpose) -> f64 {
        0.0
    }

    fn max_weight_speed_mps(&self) -> f64 {
        f64::INFINITY
    }
}

pub(crate) const WEST_BBOX: [f64; 4] = [-0.005, -0.005, 0.015, 0.005];
pub(crate) const EAST_BBOX: [f64; 4] = [0.015, -0.005, 0.035, 0.005];

/// Way crossing the border between [two_regions].
pub(crate) const BORDER_WAY: CrossMwmId = CrossMwmId::Osm {
    way_id: 1,
    segment_idx: 0,
};

fn border_transition(feature_id: u32, forward_is_enter: bool) -> TransitionRecord {
    TransitionRecord {
        cross_id: BORDER_WAY,
        feature_id: FeatureId::Real(feature_id),
        segment_idx: 0,
        one_way: false,
        forward_is_enter,
        back_point: grid(1.0, 0.0),
        front_point: grid(2.0, 0.0),
    }
}

/// Two regions split at lon 0.015, connected by a single two-way road:
///
/// ```text
///   west              │  east
///   f0 ─────── f1 ────┼───── (f0 in east) ─────── f1
/// (0,0)      (1,0)    │    (2,0)                 (3,0)
/// ```
///
/// The border segment (1,0)-(2,0) is feature 1 in the west and feature 0 in the east.
/// Road cross-region sections of both regions are built if `estimator` is given.
pub(crate) fn two_regions(
    speed: f64,
    estimator: Option<Rc<dyn EdgeEstimator>>,
) -> RegionSet {
    let west_roads = vec![
        road(false, speed, &[(0.0, 0.0), (1.0, 0.0)]),
        road(false, speed, &[(1.0, 0.0), (2.0, 0.0)]),
    ];
    let mut west = RegionData::new(
        "west".to_string(),
        Rect::from_bbox(WEST_BBOX),
        west_roads.clone(),
        network_of(&west_roads),
    );
    west.transitions.push(border_transition(1, false));

    let east_roads = vec![
        road(false, speed, &[(1.0, 0.0), (2.0, 0.0)]),
        road(false, speed, &[(2.0, 0.0), (3.0, 0.0)]),
    ];
    let mut east = RegionData::new(
        "east".to_string(),
        Rect::from_bbox(EAST_BBOX),
        east_roads.clone(),
        network_of(&east_roads),
    );
    east.transitions.push(border_transition(0, true));

    let mut regions = RegionSet::default();
    regions.add(west);
    regions.add(east);
    if let Some(estimator) = estimator {
        regions.build_cross_mwm_sections(estimator);
    }
    regions
}
