// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Connections between the transition segments of neighboring regions.

mod builder;
mod connector;
mod graph;

pub use builder::build_section;
pub use connector::{CrossMwmConnector, CrossMwmId, CrossMwmSection, TransitionRecord, NO_ROUTE};
pub use graph::{CrossMwmGraph, MwmStatus, EXACT_TWIN_DISTANCE, TWIN_SEARCH_RADIUS};
