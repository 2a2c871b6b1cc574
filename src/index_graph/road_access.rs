// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use crate::RoadPoint;

/// Legal access level to a feature or a road point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AccessType {
    No,
    Private,
    Destination,
    #[default]
    Yes,
}

/// How certain an access value is. Time-conditional access evaluated
/// without knowing the current time is only [Confidence::Maybe].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Confidence {
    Sure,
    Maybe,
}

/// Hours of the day (`start` inclusive, `end` exclusive) in which a conditional access applies.
/// Windows with `start > end` wrap around midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HourWindow {
    pub start: u8,
    pub end: u8,
}

impl HourWindow {
    pub const fn new(start: u8, end: u8) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, hour: u8) -> bool {
        if self.start <= self.end {
            hour >= self.start && hour < self.end
        } else {
            hour >= self.start || hour < self.end
        }
    }
}

/// Access level which applies only within a time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConditionalAccess {
    pub access: AccessType,
    pub window: HourWindow,
}

/// Access restrictions of features and road points of one region.
/// Anything without an entry has [AccessType::Yes] access.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoadAccess {
    feature_access: HashMap<u32, AccessType>,
    point_access: HashMap<RoadPoint, AccessType>,
    feature_conditional: HashMap<u32, Vec<ConditionalAccess>>,
    point_conditional: HashMap<RoadPoint, Vec<ConditionalAccess>>,

    /// Current hour of the day, if known.
    current_hour: Option<u8>,
}

impl RoadAccess {
    pub fn set_feature_access(&mut self, feature_id: u32, access: AccessType) {
        self.feature_access.insert(feature_id, access);
    }

    pub fn set_point_access(&mut self, rp: RoadPoint, access: AccessType) {
        self.point_access.insert(rp, access);
    }

    pub fn add_feature_conditional(&mut self, feature_id: u32, conditional: ConditionalAccess) {
        self.feature_conditional.entry(feature_id).or_default().push(conditional);
    }

    pub fn add_point_conditional(&mut self, rp: RoadPoint, conditional: ConditionalAccess) {
        self.point_conditional.entry(rp).or_default().push(conditional);
    }

    pub fn set_current_hour(&mut self, hour: Option<u8>) {
        self.current_hour = hour;
    }

    pub fn current_hour(&self) -> Option<u8> {
        self.current_hour
    }

    pub fn is_empty(&self) -> bool {
        self.feature_access.is_empty()
            && self.point_access.is_empty()
            && self.feature_conditional.is_empty()
            && self.point_conditional.is_empty()
    }

    pub fn feature_access(&self, feature_id: u32, use_conditional: bool) -> (AccessType, Confidence) {
        let unconditional = self.feature_access.get(&feature_id).copied().unwrap_or_default();
        if !use_conditional {
            return (unconditional, Confidence::Sure);
        }
        self.resolve(unconditional, self.feature_conditional.get(&feature_id))
    }

    pub fn point_access(&self, rp: RoadPoint, use_conditional: bool) -> (AccessType, Confidence) {
        let unconditional = self.point_access.get(&rp).copied().unwrap_or_default();
        if !use_conditional {
            return (unconditional, Confidence::Sure);
        }
        self.resolve(unconditional, self.point_conditional.get(&rp))
    }

    fn resolve(
        &self,
        unconditional: AccessType,
        conditional: Option<&Vec<ConditionalAccess>>,
    ) -> (AccessType, Confidence) {
        let Some(conditional) = conditional.filter(|c| !c.is_empty()) else {
            return (unconditional, Confidence::Sure);
        };

        match self.current_hour {
            None => (conditional[0].access, Confidence::Maybe),
            Some(hour) => conditional
                .iter()
                .find(|c| c.window.contains(hour))
                .map(|c| (c.access, Confidence::Sure))
                .unwrap_or((unconditional, Confidence::Sure)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_access_is_yes() {
        let a = RoadAccess::default();
        assert_eq!(a.feature_access(7, true), (AccessType::Yes, Confidence::Sure));
        assert_eq!(
            a.point_access(RoadPoint::new(7, 1), true),
            (AccessType::Yes, Confidence::Sure)
        );
    }

    #[test]
    fn hour_window_wraps_midnight() {
        let w = HourWindow::new(22, 6);
        assert!(w.contains(23));
        assert!(w.contains(0));
        assert!(w.contains(5));
        assert!(!w.contains(6));
        assert!(!w.contains(12));
    }

    #[test]
    fn conditional_access() {
        let mut a = RoadAccess::default();
        a.set_feature_access(1, AccessType::Yes);
        a.add_feature_conditional(
            1,
            ConditionalAccess {
                access: AccessType::No,
                window: HourWindow::new(7, 9),
            },
        );

        // Without the time the conditional value is uncertain
        assert_eq!(a.feature_access(1, true), (AccessType::No, Confidence::Maybe));
        assert_eq!(a.feature_access(1, false), (AccessType::Yes, Confidence::Sure));

        a.set_current_hour(Some(8));
        assert_eq!(a.feature_access(1, true), (AccessType::No, Confidence::Sure));

        a.set_current_hour(Some(12));
        assert_eq!(a.feature_access(1, true), (AccessType::Yes, Confidence::Sure));
    }
}
