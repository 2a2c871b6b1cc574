// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::cmp::Ordering;
use std::ops::{Add, AddAssign, Sub};

/// Composite cost of a route or an edge.
///
/// Weights are ordered lexicographically: number of pass-through boundary crossings,
/// then number of access boundary crossings, then number of access-conditional penalties,
/// then the traversal time (`weight`, in seconds), and finally the time spent in
/// public transport. Thus a route crossing one restricted-area boundary less is always
/// preferred over a faster one.
///
/// Addition and subtraction are componentwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteWeight {
    pub weight: f64,
    pub num_pass_through_changes: i32,
    pub num_access_changes: i32,
    pub num_access_conditional_penalties: i32,
    pub transit_time: f64,
}

impl RouteWeight {
    pub const ZERO: Self = Self {
        weight: 0.0,
        num_pass_through_changes: 0,
        num_access_changes: 0,
        num_access_conditional_penalties: 0,
        transit_time: 0.0,
    };

    /// Weight used when there is no route at all. Greater than any achievable weight.
    pub const INFINITY: Self = Self {
        weight: f64::INFINITY,
        num_pass_through_changes: i32::MAX,
        num_access_changes: i32::MAX,
        num_access_conditional_penalties: i32::MAX,
        transit_time: 0.0,
    };

    /// Creates a weight consisting only of traversal time.
    #[inline]
    pub const fn from_seconds(weight: f64) -> Self {
        Self {
            weight,
            num_pass_through_changes: 0,
            num_access_changes: 0,
            num_access_conditional_penalties: 0,
            transit_time: 0.0,
        }
    }

    /// Creates a weight of time spent in public transport vehicles or stations.
    #[inline]
    pub const fn from_transit_seconds(weight: f64) -> Self {
        Self {
            weight,
            num_pass_through_changes: 0,
            num_access_changes: 0,
            num_access_conditional_penalties: 0,
            transit_time: weight,
        }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.weight.is_finite()
    }

    /// Returns true if all penalty counters are equal and the
    /// time components differ by no more than 1e-6 seconds.
    pub fn is_almost_equal(&self, other: &Self) -> bool {
        const EPS: f64 = 1e-6;
        self.num_pass_through_changes == other.num_pass_through_changes
            && self.num_access_changes == other.num_access_changes
            && self.num_access_conditional_penalties == other.num_access_conditional_penalties
            && (self.weight - other.weight).abs() < EPS
            && (self.transit_time - other.transit_time).abs() < EPS
    }

    /// Multiplies the time components by `factor`, keeping penalties untouched.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            weight: self.weight * factor,
            transit_time: self.transit_time * factor,
            ..*self
        }
    }
}

impl PartialEq for RouteWeight {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RouteWeight {}

impl PartialOrd for RouteWeight {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RouteWeight {
    fn cmp(&self, other: &Self) -> Ordering {
        self.num_pass_through_changes
            .cmp(&other.num_pass_through_changes)
            .then(self.num_access_changes.cmp(&other.num_access_changes))
            .then(
                self.num_access_conditional_penalties
                    .cmp(&other.num_access_conditional_penalties),
            )
            .then(self.weight.total_cmp(&other.weight))
            .then(self.transit_time.total_cmp(&other.transit_time))
    }
}

impl Add for RouteWeight {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            weight: self.weight + rhs.weight,
            num_pass_through_changes: self
                .num_pass_through_changes
                .saturating_add(rhs.num_pass_through_changes),
            num_access_changes: self.num_access_changes.saturating_add(rhs.num_access_changes),
            num_access_conditional_penalties: self
                .num_access_conditional_penalties
                .saturating_add(rhs.num_access_conditional_penalties),
            transit_time: self.transit_time + rhs.transit_time,
        }
    }
}

impl AddAssign for RouteWeight {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for RouteWeight {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            weight: self.weight - rhs.weight,
            num_pass_through_changes: self
                .num_pass_through_changes
                .saturating_sub(rhs.num_pass_through_changes),
            num_access_changes: self.num_access_changes.saturating_sub(rhs.num_access_changes),
            num_access_conditional_penalties: self
                .num_access_conditional_penalties
                .saturating_sub(rhs.num_access_conditional_penalties),
            transit_time: self.transit_time - rhs.transit_time,
        }
    }
}

impl std::fmt::Display for RouteWeight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.3}s (pass-through: {}, access: {}, conditional: {}, transit: {:.3}s)",
            self.weight,
            self.num_pass_through_changes,
            self.num_access_changes,
            self.num_access_conditional_penalties,
            self.transit_time
        )
    }
}
