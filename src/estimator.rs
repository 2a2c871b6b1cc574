// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::distance::{distance_on_earth, LatLon};
use crate::geometry::RoadGeometry;
use crate::Segment;

/// What a weight is computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
    /// Route optimization.
    Weight,
    /// Arrival time estimation.
    Eta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VehicleType {
    Pedestrian,
    Bicycle,
    Car,
    Transit,
}

/// Computes traversal times (in seconds) of road segments and straight-line estimates.
///
/// [EdgeEstimator::calc_heuristic] must never exceed the weight of any path between
/// the two points, or A* loses optimality.
pub trait EdgeEstimator {
    fn calc_segment_weight(&self, segment: &Segment, road: &RoadGeometry, purpose: Purpose) -> f64;

    /// Admissible lower bound of the time needed to get from `from` to `to`.
    fn calc_heuristic(&self, from: LatLon, to: LatLon) -> f64;

    /// Time used for leap edges. Deliberately pessimistic.
    fn calc_leap_weight(&self, from: LatLon, to: LatLon) -> f64;

    /// Time of moving between two points outside of the road network.
    fn calc_offroad(&self, from: LatLon, to: LatLon, purpose: Purpose) -> f64;

    fn u_turn_penalty(&self, purpose: Purpose) -> f64;

    fn ferry_landing_penalty(&self, purpose: Purpose) -> f64;

    /// Maximum speed used by [EdgeEstimator::calc_heuristic], in meters per second.
    fn max_weight_speed_mps(&self) -> f64;
}

#[inline]
fn kmph_to_mps(speed: f64) -> f64 {
    speed / 3.6
}

#[inline]
fn time_between_sec(from: LatLon, to: LatLon, speed_mps: f64) -> f64 {
    debug_assert!(speed_mps > 0.0);
    distance_on_earth(from, to) / speed_mps
}

/// [EdgeEstimator] deriving segment weights from segment lengths and road speeds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedEstimator {
    pub vehicle: VehicleType,

    /// Maximum speed of any road, in km/h. Road speeds are capped to it.
    pub max_weight_speed: f64,

    /// Speed of moving outside of the road network, in km/h.
    pub offroad_speed: f64,

    /// Penalty for turning around within a road, in seconds.
    pub u_turn_penalty: f64,

    /// Penalty for boarding or leaving a ferry, in seconds.
    pub ferry_landing_penalty: f64,
}

impl SpeedEstimator {
    pub const fn car() -> Self {
        Self {
            vehicle: VehicleType::Car,
            max_weight_speed: 130.0,
            offroad_speed: 20.0,
            u_turn_penalty: 60.0,
            ferry_landing_penalty: 20.0 * 60.0,
        }
    }

    pub const fn bicycle() -> Self {
        Self {
            vehicle: VehicleType::Bicycle,
            max_weight_speed: 30.0,
            offroad_speed: 3.0,
            u_turn_penalty: 20.0,
            ferry_landing_penalty: 8.0 * 60.0,
        }
    }

    pub const fn pedestrian() -> Self {
        Self {
            vehicle: VehicleType::Pedestrian,
            max_weight_speed: 5.0,
            offroad_speed: 3.0,
            u_turn_penalty: 0.0,
            ferry_landing_penalty: 8.0 * 60.0,
        }
    }

    /// Pedestrian walking combined with public transport rides.
    /// The heuristic must stay below the speed of the fastest transit vehicle.
    pub const fn transit() -> Self {
        Self {
            vehicle: VehicleType::Transit,
            max_weight_speed: 120.0,
            offroad_speed: 3.0,
            u_turn_penalty: 0.0,
            ferry_landing_penalty: 8.0 * 60.0,
        }
    }

    pub const fn for_vehicle(vehicle: VehicleType) -> Self {
        match vehicle {
            VehicleType::Pedestrian => Self::pedestrian(),
            VehicleType::Bicycle => Self::bicycle(),
            VehicleType::Car => Self::car(),
            VehicleType::Transit => Self::transit(),
        }
    }
}

impl EdgeEstimator for SpeedEstimator {
    fn calc_segment_weight(&self, segment: &Segment, road: &RoadGeometry, purpose: Purpose) -> f64 {
        let from = road.point(segment.min_point_id());
        let to = road.point(segment.max_point_id());
        let speed = road.speed(segment.forward);
        let kmph = match purpose {
            Purpose::Weight => speed.weight,
            Purpose::Eta => speed.eta,
        };
        if kmph <= 0.0 {
            return f64::INFINITY;
        }
        time_between_sec(from, to, kmph_to_mps(kmph.min(self.max_weight_speed)))
    }

    fn calc_heuristic(&self, from: LatLon, to: LatLon) -> f64 {
        time_between_sec(from, to, self.max_weight_speed_mps())
    }

    fn calc_leap_weight(&self, from: LatLon, to: LatLon) -> f64 {
        // Leaps pretend the road network allows half of the maximum speed
        time_between_sec(from, to, self.max_weight_speed_mps() / 2.0)
    }

    fn calc_offroad(&self, from: LatLon, to: LatLon, _purpose: Purpose) -> f64 {
        time_between_sec(from, to, kmph_to_mps(self.offroad_speed))
    }

    fn u_turn_penalty(&self, purpose: Purpose) -> f64 {
        match purpose {
            Purpose::Weight => self.u_turn_penalty,
            Purpose::Eta => self.u_turn_penalty / 2.0,
        }
    }

    fn ferry_landing_penalty(&self, _purpose: Purpose) -> f64 {
        self.ferry_landing_penalty
    }

    fn max_weight_speed_mps(&self) -> f64 {
        kmph_to_mps(self.max_weight_speed)
    }
}
