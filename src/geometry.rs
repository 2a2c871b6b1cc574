// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::rc::Rc;

use crate::distance::{Junction, LatLon};
use crate::{RoadPoint, RoutingOptions};

/// Travel speed along a road, in kilometers per hour.
///
/// `weight` is used for route optimization, `eta` for arrival time estimation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedKMpH {
    pub weight: f64,
    pub eta: f64,
}

impl SpeedKMpH {
    #[inline]
    pub const fn uniform(speed: f64) -> Self {
        Self {
            weight: speed,
            eta: speed,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.weight > 0.0 && self.eta > 0.0 && self.weight.is_finite() && self.eta.is_finite()
    }
}

/// Immutable routing attributes of a single road feature.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadGeometry {
    pub junctions: Vec<Junction>,
    pub forward_speed: SpeedKMpH,
    pub backward_speed: SpeedKMpH,
    pub one_way: bool,
    pub valid: bool,
    pub pass_through_allowed: bool,
    pub routing_options: RoutingOptions,
    pub is_ferry: bool,
}

impl RoadGeometry {
    /// Creates a valid road with the same speed in both directions and no special attributes.
    pub fn new(one_way: bool, speed: f64, points: &[LatLon]) -> Self {
        Self {
            junctions: points.iter().map(|&p| Junction::at(p)).collect(),
            forward_speed: SpeedKMpH::uniform(speed),
            backward_speed: SpeedKMpH::uniform(speed),
            one_way,
            valid: points.len() >= 2 && speed > 0.0,
            pass_through_allowed: true,
            routing_options: RoutingOptions::NONE,
            is_ferry: false,
        }
    }

    /// Road which must never be used for routing.
    pub fn invalid() -> Self {
        Self {
            junctions: Vec::default(),
            forward_speed: SpeedKMpH::uniform(0.0),
            backward_speed: SpeedKMpH::uniform(0.0),
            one_way: false,
            valid: false,
            pass_through_allowed: true,
            routing_options: RoutingOptions::NONE,
            is_ferry: false,
        }
    }

    #[inline]
    pub fn points_count(&self) -> u32 {
        self.junctions.len() as u32
    }

    #[inline]
    pub fn point(&self, point_id: u32) -> LatLon {
        self.junctions[point_id as usize].point
    }

    #[inline]
    pub fn junction(&self, point_id: u32) -> Junction {
        self.junctions[point_id as usize]
    }

    #[inline]
    pub fn speed(&self, forward: bool) -> SpeedKMpH {
        if forward {
            self.forward_speed
        } else {
            self.backward_speed
        }
    }

    #[inline]
    pub fn is_end_point_id(&self, point_id: u32) -> bool {
        point_id == 0 || point_id + 1 == self.points_count()
    }

    /// Checks whether the road avoids everything in `avoid`.
    #[inline]
    pub fn suitable_for_options(&self, avoid: RoutingOptions) -> bool {
        !self.routing_options.intersects(avoid)
    }
}

/// Source of [RoadGeometry] for the features of a single region.
pub trait GeometryLoader {
    /// Loads the geometry of a feature. Unknown features are reported as
    /// [invalid](RoadGeometry::invalid).
    fn load(&mut self, feature_id: u32) -> RoadGeometry;
}

/// Lazily populated cache of [RoadGeometry] of one region.
pub struct Geometry {
    loader: Box<dyn GeometryLoader>,
    roads: HashMap<u32, Rc<RoadGeometry>>,
}

impl Geometry {
    pub fn new(loader: Box<dyn GeometryLoader>) -> Self {
        Self {
            loader,
            roads: HashMap::default(),
        }
    }

    /// Returns the geometry of a feature, loading it on first access.
    pub fn road(&mut self, feature_id: u32) -> Rc<RoadGeometry> {
        let loader = &mut self.loader;
        self.roads
            .entry(feature_id)
            .or_insert_with(|| Rc::new(loader.load(feature_id)))
            .clone()
    }

    #[inline]
    pub fn point(&mut self, rp: RoadPoint) -> LatLon {
        self.road(rp.feature_id).point(rp.point_id)
    }

    #[inline]
    pub fn junction(&mut self, rp: RoadPoint) -> Junction {
        self.road(rp.feature_id).junction(rp.point_id)
    }

    pub fn cached_roads(&self) -> usize {
        self.roads.len()
    }

    pub fn clear(&mut self) {
        self.roads.clear();
    }
}

impl std::fmt::Debug for Geometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Geometry")
            .field("cached_roads", &self.roads.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingLoader(Rc<Cell<usize>>);

    impl GeometryLoader for CountingLoader {
        fn load(&mut self, feature_id: u32) -> RoadGeometry {
            self.0.set(self.0.get() + 1);
            let x = feature_id as f64;
            RoadGeometry::new(false, 50.0, &[LatLon::new(0.0, x), LatLon::new(0.0, x + 0.01)])
        }
    }

    #[test]
    fn geometry_is_loaded_once() {
        let loads = Rc::new(Cell::new(0));
        let mut g = Geometry::new(Box::new(CountingLoader(loads.clone())));

        assert_eq!(g.road(3).points_count(), 2);
        assert_eq!(g.point(RoadPoint::new(3, 1)), LatLon::new(0.0, 3.01));
        assert_eq!(loads.get(), 1);

        g.road(4);
        assert_eq!(loads.get(), 2);
        assert_eq!(g.cached_roads(), 2);

        g.clear();
        g.road(3);
        assert_eq!(loads.get(), 3);
    }

    #[test]
    fn end_points() {
        let road = RoadGeometry::new(
            true,
            30.0,
            &[LatLon::new(0.0, 0.0), LatLon::new(0.0, 0.01), LatLon::new(0.0, 0.02)],
        );
        assert!(road.is_end_point_id(0));
        assert!(!road.is_end_point_id(1));
        assert!(road.is_end_point_id(2));
        assert!(road.valid);
        assert!(!RoadGeometry::invalid().valid);
    }
}
