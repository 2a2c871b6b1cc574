// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Routing over a map split into independently loaded regions.
//!
//! Every region carries its own road graph ([IndexGraph](index_graph::IndexGraph)),
//! which only knows about features of that region. Roads crossing region borders are
//! represented in both regions by transition segments, and the
//! [CrossMwmGraph](cross_mwm::CrossMwmGraph) resolves transitions to their counterparts
//! (twins) in neighboring regions. A [WorldGraph](world_graph::WorldGraph) presents all of it
//! as a single graph to the A* search, optionally jumping directly between region
//! transitions (leaps) with precomputed weights. Optionally, a public transport overlay
//! can be grafted on top of the road graph, see [transit].
//!
//! Regions are usually produced from OpenStreetMap data with [osm].
//!
//! # Example
//!
//! ```no_run
//! use std::rc::Rc;
//! use regionroute::distance::LatLon;
//! use regionroute::estimator::{EdgeEstimator, SpeedEstimator};
//!
//! let estimator: Rc<dyn EdgeEstimator> = Rc::new(SpeedEstimator::car());
//! let mut regions = regionroute::loader::RegionSet::default();
//! for (name, bbox) in [("west", [7.40, 43.72, 7.42, 43.76]), ("east", [7.42, 43.72, 7.44, 43.76])] {
//!     let options = regionroute::osm::Options {
//!         profile: &regionroute::osm::CAR_PROFILE,
//!         file_format: regionroute::osm::FileFormat::Xml,
//!         bbox,
//!     };
//!     let region = regionroute::osm::load_region_from_file(name, &options, "path/to/monaco.osm")
//!         .expect("failed to load monaco.osm");
//!     regions.add(region);
//! }
//! regions.build_cross_mwm_sections(estimator.clone());
//!
//! let mut graph = regionroute::world_graph::SingleVehicleWorldGraph::new(Rc::new(regions), estimator);
//! let route = regionroute::find_route(
//!     &mut graph,
//!     LatLon::new(43.7384, 7.4246),
//!     LatLon::new(43.7478, 7.4323),
//!     &regionroute::SearchParams::default(),
//! )
//! .expect("failed to find route");
//!
//! println!("Route: {:?}", route);
//! ```

mod astar;
pub mod cross_mwm;
pub mod distance;
mod error;
pub mod estimator;
pub mod fake_ending;
pub mod geometry;
pub mod index_graph;
mod kd;
pub mod loader;
mod options;
pub mod osm;
mod segment;
pub mod sparse;
pub mod starter;
pub mod transit;
mod weight;
pub mod world_graph;

#[cfg(test)]
mod test_utils;

pub use astar::{
    dijkstra, find_path, AStarError, AStarGraph, Edge, Parents, RoutingResult, SearchParams,
    DEFAULT_STEP_LIMIT,
};
pub use error::RoutingError;
pub use kd::KDTree;
pub use options::RoutingOptions;
pub use segment::{FeatureId, NumMwmId, RoadPoint, Segment, FAKE_NUM_MWM_ID};
pub use starter::{find_route, find_route_over_regions, Route};
pub use weight::RouteWeight;
