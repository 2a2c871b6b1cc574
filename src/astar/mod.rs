// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

mod dijkstra;
mod error;
mod search;

pub use dijkstra::dijkstra;
pub use error::{AStarError, DEFAULT_STEP_LIMIT};
pub use search::{find_path, AStarGraph, Edge, Parents, RoutingResult, SearchParams};
