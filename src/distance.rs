// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Mean radius of Earth, in meters.
/// Source: https://en.wikipedia.org/wiki/Earth_radius#Arithmetic_mean_radius
const EARTH_RADIUS: f64 = 6_371_008.8;

/// Mean diameter of Earth, in meters.
/// Source: https://en.wikipedia.org/wiki/Earth_radius#Arithmetic_mean_radius
const EARTH_DIAMETER: f64 = EARTH_RADIUS + EARTH_RADIUS;

/// Geographic position, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    #[inline]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A road point position together with its altitude (in meters).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Junction {
    pub point: LatLon,
    pub altitude: i16,
}

impl Junction {
    #[inline]
    pub const fn new(point: LatLon, altitude: i16) -> Self {
        Self { point, altitude }
    }

    #[inline]
    pub const fn at(point: LatLon) -> Self {
        Self { point, altitude: 0 }
    }
}

/// Axis-aligned geographic rectangle. The minimum edges are inclusive,
/// the maximum edges are exclusive, so that adjacent rectangles never share a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl Rect {
    /// Creates a rectangle from a `[min_lon, min_lat, max_lon, max_lat]` bounding box.
    pub fn from_bbox(bbox: [f64; 4]) -> Self {
        let [min_lon, min_lat, max_lon, max_lat] = bbox;
        Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }

    #[inline]
    pub fn contains(&self, p: LatLon) -> bool {
        p.lat >= self.min_lat && p.lat < self.max_lat && p.lon >= self.min_lon && p.lon < self.max_lon
    }

    /// Checks whether the closed versions of both rectangles overlap or touch.
    #[inline]
    pub fn touches(&self, other: &Rect) -> bool {
        self.min_lat <= other.max_lat
            && other.min_lat <= self.max_lat
            && self.min_lon <= other.max_lon
            && other.min_lon <= self.max_lon
    }

    /// Returns a rectangle extended by `degrees` in every direction.
    pub fn inflated(&self, degrees: f64) -> Self {
        Self {
            min_lat: self.min_lat - degrees,
            min_lon: self.min_lon - degrees,
            max_lat: self.max_lat + degrees,
            max_lon: self.max_lon + degrees,
        }
    }

    pub fn is_valid(&self) -> bool {
        [self.min_lat, self.min_lon, self.max_lat, self.max_lon]
            .iter()
            .all(|x| x.is_finite())
            && self.min_lat < self.max_lat
            && self.min_lon < self.max_lon
    }
}

/// Calculates the great-circle distance between two lat-lon positions
/// on Earth using the `haversine formula <https://en.wikipedia.org/wiki/Haversine_formula>`_.
/// Returns the result in meters.
pub fn distance_on_earth(a: LatLon, b: LatLon) -> f64 {
    let lat1 = a.lat.to_radians();
    let lon1 = a.lon.to_radians();
    let lat2 = b.lat.to_radians();
    let lon2 = b.lon.to_radians();

    let sin_dlat_half = ((lat2 - lat1) * 0.5).sin();
    let sin_dlon_half = ((lon2 - lon1) * 0.5).sin();

    let h = sin_dlat_half * sin_dlat_half + lat1.cos() * lat2.cos() * sin_dlon_half * sin_dlon_half;

    EARTH_DIAMETER * h.sqrt().min(1.0).asin()
}

/// Projects `p` onto the segment `a`-`b`. Returns the projected point
/// and its relative position along the segment, in the range `[0, 1]`.
///
/// Uses a local equirectangular approximation, which is precise enough
/// for segments of road geometry.
pub fn project_to_segment(a: LatLon, b: LatLon, p: LatLon) -> (LatLon, f64) {
    let k = ((a.lat + b.lat) * 0.5).to_radians().cos();
    let (ax, ay) = (a.lon * k, a.lat);
    let (bx, by) = (b.lon * k, b.lat);
    let (px, py) = (p.lon * k, p.lat);

    let (dx, dy) = (bx - ax, by - ay);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return (a, 0.0);
    }

    let t = (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0);
    (interpolate(a, b, t), t)
}

/// Returns the point at the relative position `t` along the segment `a`-`b`.
#[inline]
pub fn interpolate(a: LatLon, b: LatLon, t: f64) -> LatLon {
    LatLon::new(a.lat + (b.lat - a.lat) * t, a.lon + (b.lon - a.lon) * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! assert_almost_eq {
        ($a:expr, $b:expr, $eps:expr) => {
            assert!(
                (($a - $b).abs() < $eps),
                "assertion failed: {} ≈ {}",
                $a,
                $b
            )
        };
    }

    #[test]
    fn distance() {
        // One degree of latitude
        assert_almost_eq!(
            distance_on_earth(LatLon::new(0.0, 0.0), LatLon::new(1.0, 0.0)),
            111_195.08,
            0.1
        );
        assert_eq!(distance_on_earth(LatLon::new(52.1, 21.0), LatLon::new(52.1, 21.0)), 0.0);
    }

    #[test]
    fn projection() {
        let a = LatLon::new(0.0, 0.0);
        let b = LatLon::new(0.0, 0.02);

        let (p, t) = project_to_segment(a, b, LatLon::new(0.001, 0.005));
        assert_almost_eq!(t, 0.25, 1e-9);
        assert_almost_eq!(p.lon, 0.005, 1e-9);
        assert_almost_eq!(p.lat, 0.0, 1e-9);

        // Clamped to the segment
        let (p, t) = project_to_segment(a, b, LatLon::new(0.0, -1.0));
        assert_eq!(t, 0.0);
        assert_eq!(p, a);
    }

    #[test]
    fn rect() {
        let r = Rect::from_bbox([0.0, 0.0, 1.0, 1.0]);
        assert!(r.contains(LatLon::new(0.0, 0.0)));
        assert!(!r.contains(LatLon::new(1.0, 0.5)));
        assert!(r.touches(&Rect::from_bbox([1.0, 0.0, 2.0, 1.0])));
        assert!(!r.touches(&Rect::from_bbox([1.5, 0.0, 2.0, 1.0])));
        assert!(r.is_valid());
    }
}
