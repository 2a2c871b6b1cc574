// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::NumMwmId;

/// Unexpected conditions crossing the routing graph boundary.
///
/// Everyday filtering (turn restrictions, access, missing twins) never produces
/// a [RoutingError] - those cases simply yield empty edge lists.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RoutingError {
    /// The region is not registered with the data source, and can't be loaded.
    #[error("region {0} is not loaded")]
    RegionNotLoaded(NumMwmId),

    /// The region is registered, but does not carry any road data.
    #[error("region {0} has no road data")]
    NoRoadData(NumMwmId),

    /// A point does not belong to any registered region.
    #[error("point {lat}, {lon} is outside of all regions")]
    PointNotInAnyRegion { lat: f64, lon: f64 },

    /// No road segment could be found near an ending point.
    #[error("no road near {lat}, {lon}")]
    NoProjection { lat: f64, lon: f64 },
}
