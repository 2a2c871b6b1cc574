// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::distance::{distance_on_earth, LatLon};

/// KDTree implements the [k-d tree data structure](https://en.wikipedia.org/wiki/K-d_tree)
/// over positioned items, used to find road points near ending positions and
/// to match transition segments geometrically across regions.
///
/// This implementation assumes euclidean geometry, even though the distance function
/// used is [distance_on_earth]. This results in undefined behavior when points
/// are close to the ante meridian (180°/-180° longitude) or poles (90°/-90° latitude),
/// or when the data spans multiple continents.
#[derive(Debug, Clone)]
pub struct KDTree<T: Copy> {
    pivot: (LatLon, T),
    left: Option<Box<KDTree<T>>>,
    right: Option<Box<KDTree<T>>>,
}

impl<T: Copy> KDTree<T> {
    /// Finds the closest item to the given position, returning it with its distance in meters.
    pub fn find_nearest(&self, p: LatLon) -> (T, f64) {
        let (best, dist) = self.find_nearest_impl(p, false);
        (best.1, dist)
    }

    fn find_nearest_impl(&self, p: LatLon, lon_divides: bool) -> ((LatLon, T), f64) {
        // Start by assuming that pivot is the closest
        let mut best = self.pivot;
        let mut best_dist = distance_on_earth(p, best.0);

        let (first, second) = self.branches(p, lon_divides);

        if let Some(ref branch) = first {
            let (alt, alt_dist) = branch.find_nearest_impl(p, !lon_divides);
            if alt_dist < best_dist {
                best = alt;
                best_dist = alt_dist;
            }
        }

        if let Some(ref branch) = second {
            // A closer item is possible in the second branch if and only if
            // the splitting axis is closer than the current best candidate.
            if self.distance_to_axis(p, lon_divides) < best_dist {
                let (alt, alt_dist) = branch.find_nearest_impl(p, !lon_divides);
                if alt_dist < best_dist {
                    best = alt;
                    best_dist = alt_dist;
                }
            }
        }

        return (best, best_dist);
    }

    /// Appends all items within `radius` meters from `p` to `out`, together with their distances.
    pub fn find_within(&self, p: LatLon, radius: f64, out: &mut Vec<(T, f64)>) {
        self.find_within_impl(p, radius, false, out);
    }

    fn find_within_impl(&self, p: LatLon, radius: f64, lon_divides: bool, out: &mut Vec<(T, f64)>) {
        let dist = distance_on_earth(p, self.pivot.0);
        if dist <= radius {
            out.push((self.pivot.1, dist));
        }

        let (first, second) = self.branches(p, lon_divides);

        if let Some(ref branch) = first {
            branch.find_within_impl(p, radius, !lon_divides, out);
        }

        if let Some(ref branch) = second {
            if self.distance_to_axis(p, lon_divides) <= radius {
                branch.find_within_impl(p, radius, !lon_divides, out);
            }
        }
    }

    /// Selects which branch to recurse into first.
    #[inline]
    fn branches(
        &self,
        p: LatLon,
        lon_divides: bool,
    ) -> (&Option<Box<KDTree<T>>>, &Option<Box<KDTree<T>>>) {
        let first_left = if lon_divides {
            p.lon < self.pivot.0.lon
        } else {
            p.lat < self.pivot.0.lat
        };
        if first_left {
            (&self.left, &self.right)
        } else {
            (&self.right, &self.left)
        }
    }

    #[inline]
    fn distance_to_axis(&self, p: LatLon, lon_divides: bool) -> f64 {
        let axis = if lon_divides {
            LatLon::new(p.lat, self.pivot.0.lon)
        } else {
            LatLon::new(self.pivot.0.lat, p.lon)
        };
        distance_on_earth(p, axis)
    }

    /// Builds a k-d tree from an iterable of positioned items.
    pub fn from_iter<I: IntoIterator<Item = (LatLon, T)>>(items: I) -> Option<Self> {
        let mut items = items.into_iter().collect::<Vec<_>>();
        Self::build(items.as_mut_slice())
    }

    /// Builds a k-d tree from a mutable slice of positioned items. Items will be reordered
    /// in the slice to facilitate building the tree.
    pub fn build(items: &mut [(LatLon, T)]) -> Option<Self> {
        Self::build_impl(items, false)
    }

    fn build_impl(items: &mut [(LatLon, T)], lon_divides: bool) -> Option<Self> {
        match items.len() {
            0 => None,
            1 => Some(Self {
                pivot: items[0],
                left: None,
                right: None,
            }),
            _ => {
                if lon_divides {
                    items.sort_by(|a, b| a.0.lon.total_cmp(&b.0.lon));
                } else {
                    items.sort_by(|a, b| a.0.lat.total_cmp(&b.0.lat));
                }
                let median = items.len() / 2;
                let pivot = items[median];
                let (left, right_and_pivot) = items.split_at_mut(median);
                let right = &mut right_and_pivot[1..];
                Some(Self {
                    pivot,
                    left: box_option(Self::build_impl(left, !lon_divides)),
                    right: box_option(Self::build_impl(right, !lon_divides)),
                })
            }
        }
    }
}

#[inline]
fn box_option<T>(o: Option<T>) -> Option<Box<T>> {
    o.map(|thing| Box::new(thing))
}
