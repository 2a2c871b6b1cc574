// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{BTreeMap, HashMap};

use crate::distance::LatLon;
use crate::RoadPoint;

/// Dense identifier of a [Joint] within a region.
pub type JointId = u32;

/// Set of geometrically coincident [RoadPoints](RoadPoint).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Joint {
    points: Vec<RoadPoint>,
}

impl Joint {
    pub fn new(points: Vec<RoadPoint>) -> Self {
        Self { points }
    }

    #[inline]
    pub fn points(&self) -> &[RoadPoint] {
        &self.points
    }

    #[inline]
    pub fn add_point(&mut self, rp: RoadPoint) {
        self.points.push(rp);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Joint ids of the points of a single road. Points without a joint map to [None].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoadJointIds {
    ids: Vec<Option<JointId>>,
}

impl RoadJointIds {
    fn add_joint(&mut self, point_id: u32, joint_id: JointId) {
        let idx = point_id as usize;
        if self.ids.len() <= idx {
            self.ids.resize(idx + 1, None);
        }
        debug_assert!(
            self.ids[idx].is_none(),
            "road point {} assigned to two joints",
            point_id
        );
        self.ids[idx] = Some(joint_id);
    }

    #[inline]
    pub fn joint_id(&self, point_id: u32) -> Option<JointId> {
        self.ids.get(point_id as usize).cloned().flatten()
    }

    /// Walks from `point_id` (exclusive) towards higher (`forward`) or lower point ids,
    /// returning the first point which has a joint.
    pub fn next_joint(&self, point_id: u32, forward: bool) -> Option<(u32, JointId)> {
        if forward {
            let start = point_id as usize + 1;
            self.ids
                .iter()
                .enumerate()
                .skip(start)
                .find_map(|(i, id)| id.map(|id| (i as u32, id)))
        } else {
            self.ids
                .iter()
                .enumerate()
                .take(point_id as usize)
                .rev()
                .find_map(|(i, id)| id.map(|id| (i as u32, id)))
        }
    }
}

/// Maps [RoadPoints](RoadPoint) to the [Joints](Joint) they belong to.
#[derive(Debug, Clone, Default)]
pub struct RoadIndex {
    roads: HashMap<u32, RoadJointIds>,
}

impl RoadIndex {
    pub fn import(&mut self, joints: &[Joint]) {
        for (joint_id, joint) in joints.iter().enumerate() {
            for rp in joint.points() {
                self.roads
                    .entry(rp.feature_id)
                    .or_default()
                    .add_joint(rp.point_id, joint_id as JointId);
            }
        }
    }

    #[inline]
    pub fn joint_id(&self, rp: RoadPoint) -> Option<JointId> {
        self.roads.get(&rp.feature_id)?.joint_id(rp.point_id)
    }

    #[inline]
    pub fn road(&self, feature_id: u32) -> Option<&RoadJointIds> {
        self.roads.get(&feature_id)
    }

    pub fn roads_count(&self) -> usize {
        self.roads.len()
    }
}

/// Maps [JointIds](JointId) to the [RoadPoints](RoadPoint) they consist of.
/// All points are kept in a single flat array.
#[derive(Debug, Clone, Default)]
pub struct JointIndex {
    offsets: Vec<usize>,
    points: Vec<RoadPoint>,
}

impl JointIndex {
    pub fn build(joints: &[Joint]) -> Self {
        let mut offsets = Vec::with_capacity(joints.len() + 1);
        let mut points = Vec::with_capacity(joints.iter().map(|j| j.len()).sum());
        offsets.push(0);
        for joint in joints {
            points.extend_from_slice(joint.points());
            offsets.push(points.len());
        }
        Self { offsets, points }
    }

    #[inline]
    pub fn points(&self, joint_id: JointId) -> &[RoadPoint] {
        let i = joint_id as usize;
        &self.points[self.offsets[i]..self.offsets[i + 1]]
    }

    #[inline]
    pub fn num_joints(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }
}

/// Groups road points by exact position into [Joints](Joint).
///
/// A joint is created for each position shared by at least two road points,
/// and for each position of a road end (`is_end`), even if not shared.
/// Joints are returned ordered by position.
pub fn build_joints<I>(points: I) -> Vec<Joint>
where
    I: IntoIterator<Item = (RoadPoint, LatLon, bool)>,
{
    let mut by_position: BTreeMap<(u64, u64), (Joint, bool)> = BTreeMap::default();
    for (rp, position, is_end) in points {
        let key = (position.lat.to_bits(), position.lon.to_bits());
        let entry = by_position.entry(key).or_default();
        entry.0.add_point(rp);
        entry.1 |= is_end;
    }

    by_position
        .into_values()
        .filter(|(joint, has_end)| joint.len() >= 2 || *has_end)
        .map(|(joint, _)| joint)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joint_coverage() {
        // Roads 0: A-B-C, 1: D-B-E, 2: C-F; B and C are shared
        let a = LatLon::new(0.0, 0.0);
        let b = LatLon::new(0.0, 0.01);
        let c = LatLon::new(0.0, 0.02);
        let d = LatLon::new(0.01, 0.01);
        let e = LatLon::new(-0.01, 0.01);
        let f = LatLon::new(0.0, 0.03);

        let joints = build_joints([
            (RoadPoint::new(0, 0), a, true),
            (RoadPoint::new(0, 1), b, false),
            (RoadPoint::new(0, 2), c, true),
            (RoadPoint::new(1, 0), d, true),
            (RoadPoint::new(1, 1), b, false),
            (RoadPoint::new(1, 2), e, true),
            (RoadPoint::new(2, 0), c, true),
            (RoadPoint::new(2, 1), f, true),
        ]);

        let mut road_index = RoadIndex::default();
        road_index.import(&joints);
        let joint_index = JointIndex::build(&joints);

        // A, B, C, D, E, F all get a joint
        assert_eq!(joint_index.num_joints(), 6);
        assert_eq!(road_index.roads_count(), 3);

        let jb = road_index.joint_id(RoadPoint::new(0, 1)).unwrap();
        assert_eq!(road_index.joint_id(RoadPoint::new(1, 1)), Some(jb));
        let mut points = joint_index.points(jb).to_vec();
        points.sort();
        assert_eq!(points, vec![RoadPoint::new(0, 1), RoadPoint::new(1, 1)]);

        let jc = road_index.joint_id(RoadPoint::new(2, 0)).unwrap();
        assert_eq!(road_index.joint_id(RoadPoint::new(0, 2)), Some(jc));
        assert_eq!(joint_index.points(jc).len(), 2);

        // Every joint point maps back to its joint
        for id in 0..joint_index.num_joints() as JointId {
            for &rp in joint_index.points(id) {
                assert_eq!(road_index.joint_id(rp), Some(id));
            }
        }
    }

    #[test]
    fn interior_points_without_joint() {
        let joints = build_joints([
            (RoadPoint::new(0, 0), LatLon::new(0.0, 0.0), true),
            (RoadPoint::new(0, 1), LatLon::new(0.0, 0.01), false),
            (RoadPoint::new(0, 2), LatLon::new(0.0, 0.02), false),
            (RoadPoint::new(0, 3), LatLon::new(0.0, 0.03), true),
        ]);
        let mut road_index = RoadIndex::default();
        road_index.import(&joints);

        assert_eq!(road_index.joint_id(RoadPoint::new(0, 1)), None);
        let road = road_index.road(0).unwrap();
        assert_eq!(road.next_joint(0, true).map(|(p, _)| p), Some(3));
        assert_eq!(road.next_joint(3, false).map(|(p, _)| p), Some(0));
        assert_eq!(road.next_joint(3, true), None);
    }
}
