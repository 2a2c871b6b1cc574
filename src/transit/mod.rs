// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Transit overlay: fake segments of gates, stops and scheduled edges, attached
//! to the pedestrian network of a region.

mod data;
mod fake_graph;
mod graph;

pub use data::{Gate, GateStop, Line, LineId, Stop, StopId, TransitData, TransitEdge, TransitVersion};
pub use fake_graph::{FakeGraph, FakeVertex, FakeVertexKind};
pub use graph::{TransitGraph, TransitInfo};
