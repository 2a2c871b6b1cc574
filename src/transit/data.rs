// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::distance::LatLon;
use crate::Segment;

pub type StopId = u64;
pub type LineId = u32;

/// Flavor of transit data of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransitVersion {
    /// Subway only: stops are reachable through gates only.
    #[default]
    OnlySubway,

    /// All kinds of public transport: stops are also reachable directly from the pedestrian network.
    AllPublicTransport,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub id: StopId,
    pub point: LatLon,

    /// Closest pedestrian segments, used to attach the stop (in [TransitVersion::AllPublicTransport] only).
    pub best_pedestrian_segments: Vec<Segment>,
}

/// Time needed to walk between a gate and one of its stops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateStop {
    pub stop_id: StopId,
    pub weight: f64,
}

/// Entrance to or exit from the transit system.
#[derive(Debug, Clone, PartialEq)]
pub struct Gate {
    pub point: LatLon,
    pub entrance: bool,
    pub exit: bool,

    /// Walking time between the gate and any of its stops, used in [TransitVersion::OnlySubway].
    pub weight: f64,
    pub stops: Vec<GateStop>,
    pub best_pedestrian_segments: Vec<Segment>,
}

/// Scheduled connection between two stops on one line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitEdge {
    pub stop1: StopId,
    pub stop2: StopId,
    pub line: LineId,

    /// Travel time, in seconds.
    pub weight: f64,

    /// Walking transfer between stops.
    pub transfer: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub id: LineId,

    /// Average time between two consecutive vehicles, in seconds.
    pub interval: f64,
}

/// Transit section of a region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitData {
    pub version: TransitVersion,
    pub stops: Vec<Stop>,
    pub gates: Vec<Gate>,

    /// Order of edges defines the ids of their transit features.
    pub edges: Vec<TransitEdge>,
    pub lines: Vec<Line>,
}

impl TransitData {
    pub fn stop(&self, id: StopId) -> Option<&Stop> {
        self.stops.iter().find(|s| s.id == id)
    }
}
