// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::rc::Rc;

use crate::distance::{project_to_segment, Junction, LatLon};
use crate::geometry::RoadGeometry;
use crate::{RoutingError, Segment};

/// Projection of an ending point onto a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub segment: Segment,
    pub is_one_way: bool,
    pub segment_front: Junction,
    pub segment_back: Junction,

    /// Point of the segment closest to the ending.
    pub junction: Junction,
}

/// Start or finish of a route, attached to the road network with [Projections](Projection).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FakeEnding {
    pub origin_junction: Junction,
    pub projections: Vec<Projection>,
}

impl FakeEnding {
    pub fn is_empty(&self) -> bool {
        self.projections.is_empty()
    }
}

/// Projects `point` onto every segment in `segments`.
///
/// `road` must return the geometry of the segment's feature.
pub fn make_fake_ending<F>(segments: &[Segment], point: LatLon, mut road: F) -> Result<FakeEnding, RoutingError>
where
    F: FnMut(&Segment) -> Result<Rc<RoadGeometry>, RoutingError>,
{
    let mut ending = FakeEnding {
        origin_junction: Junction::at(point),
        projections: Vec::with_capacity(segments.len()),
    };

    for segment in segments {
        let road = road(segment)?;
        let back = road.junction(segment.point_id(false));
        let front = road.junction(segment.point_id(true));
        let (projected, t) = project_to_segment(back.point, front.point, point);
        let altitude = back.altitude as f64 + (front.altitude as f64 - back.altitude as f64) * t;

        ending.projections.push(Projection {
            segment: *segment,
            is_one_way: road.one_way,
            segment_front: front,
            segment_back: back,
            junction: Junction::new(projected, altitude.round() as i16),
        });
    }

    Ok(ending)
}
