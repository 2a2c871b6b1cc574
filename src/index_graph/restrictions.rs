// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::hash::Hash;

use super::road_index::{JointIndex, RoadIndex};
use crate::{FeatureId, Parents, RoadPoint, Segment};

/// Kind of a turn restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RestrictionType {
    /// The sequence of features must not be traversed.
    No,
    /// When entering the sequence, it must be followed to its end.
    Only,
}

/// Turn restriction over a sequence of (at least two) connected features of one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restriction {
    pub kind: RestrictionType,
    pub feature_ids: Vec<u32>,
}

impl Restriction {
    pub fn new(kind: RestrictionType, feature_ids: Vec<u32>) -> Self {
        Self { kind, feature_ids }
    }

    pub fn no(feature_ids: Vec<u32>) -> Self {
        Self::new(RestrictionType::No, feature_ids)
    }

    pub fn only(feature_ids: Vec<u32>) -> Self {
        Self::new(RestrictionType::Only, feature_ids)
    }
}

/// Ban on turning around at one of the end points of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RestrictionUTurn {
    pub feature_id: u32,
    /// true for a ban at the first point, false for a ban at the last point.
    pub at_the_begin: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct UTurnEnding {
    pub at_the_begin: bool,
    pub at_the_end: bool,
}

/// No-restrictions indexed by the feature at which the search arrives at the sequence.
/// Every entry holds the rest of the sequence, ordered from the feature adjacent to the key.
pub(super) type RestrictionMap = HashMap<u32, Vec<Vec<u32>>>;

/// Vertex of a search over which turn restrictions are checked.
pub trait RestrictionVertex: Copy + Eq + Hash {
    fn feature(&self) -> FeatureId;
}

impl RestrictionVertex for Segment {
    #[inline]
    fn feature(&self) -> FeatureId {
        self.feature_id
    }
}

/// Converts an Only-restriction `(x1, …, xn)` into equivalent No-restrictions:
/// for every other feature `c` leaving the joint between `x(n-1)` and `xn`,
/// travelling `(x1, …, x(n-1), c)` is forbidden.
///
/// `points_count` must return the number of points of a feature, or [None] for unknown features.
/// Restrictions over features without a common end joint are ignored.
pub fn convert_only_to_no<F>(
    road_index: &RoadIndex,
    joint_index: &JointIndex,
    mut points_count: F,
    restriction: &[u32],
) -> Vec<Vec<u32>>
where
    F: FnMut(u32) -> Option<u32>,
{
    let mut converted = Vec::default();
    if restriction.len() < 2 {
        return converted;
    }

    let last = restriction[restriction.len() - 1];
    let prev = restriction[restriction.len() - 2];
    let Some(joint) = common_end_joint(road_index, &mut points_count, prev, last) else {
        log::warn!(
            "only-restriction {:?}: features {} and {} have no common end joint",
            restriction,
            prev,
            last
        );
        return converted;
    };

    let mut seen = Vec::default();
    for rp in joint_index.points(joint) {
        if rp.feature_id == last || rp.feature_id == prev || seen.contains(&rp.feature_id) {
            continue;
        }
        seen.push(rp.feature_id);

        let mut banned = restriction[..restriction.len() - 1].to_vec();
        banned.push(rp.feature_id);
        converted.push(banned);
    }

    return converted;
}

fn common_end_joint<F>(road_index: &RoadIndex, points_count: &mut F, a: u32, b: u32) -> Option<u32>
where
    F: FnMut(u32) -> Option<u32>,
{
    let end_joints = |feature: u32, points_count: &mut F| -> [Option<u32>; 2] {
        match points_count(feature) {
            Some(n) if n >= 2 => [
                road_index.joint_id(RoadPoint::new(feature, 0)),
                road_index.joint_id(RoadPoint::new(feature, n - 1)),
            ],
            _ => [None, None],
        }
    };

    let a_joints = end_joints(a, points_count);
    let b_joints = end_joints(b, points_count);
    a_joints
        .into_iter()
        .flatten()
        .find(|j| b_joints.contains(&Some(*j)))
}

/// Indexes No-restrictions for both search directions.
/// Returns (forward, backward) maps: the forward map is keyed by the last feature
/// and holds reversed prefixes, the backward map is keyed by the first feature and holds suffixes.
pub(super) fn index_restrictions(no: Vec<Vec<u32>>) -> (RestrictionMap, RestrictionMap) {
    let mut forward = RestrictionMap::default();
    let mut backward = RestrictionMap::default();

    for r in no {
        debug_assert!(r.len() >= 2, "no-restriction with less than 2 features: {:?}", r);
        if r.len() < 2 {
            log::warn!("ignoring no-restriction with less than 2 features: {:?}", r);
            continue;
        }

        let mut prefix = r[..r.len() - 1].to_vec();
        prefix.reverse();
        forward.entry(r[r.len() - 1]).or_default().push(prefix);
        backward.entry(r[0]).or_default().push(r[1..].to_vec());
    }

    (forward, backward)
}

/// Returns the closest vertex before `v` on the search tree which lies on a different feature.
fn next_parent<V: RestrictionVertex>(v: V, parents: &Parents<V>) -> Option<V> {
    let feature = v.feature();
    let mut current = v;
    loop {
        let parent = *parents.get(&current)?;
        if parent.feature() != feature {
            return Some(parent);
        }
        if parent == current {
            return None;
        }
        current = parent;
    }
}

/// Checks whether moving from `parent` (on `parent_feature`) onto `current_feature` would
/// complete any of the restricted sequences. Earlier features of the sequences are
/// matched against the chain of `parents`.
pub(super) fn is_restricted<V: RestrictionVertex>(
    restrictions: &RestrictionMap,
    parent: V,
    parent_feature: FeatureId,
    current_feature: FeatureId,
    parents: &Parents<V>,
) -> bool {
    if parent_feature == current_feature {
        return false;
    }
    let (Some(current), Some(parent_id)) = (current_feature.as_real(), parent_feature.as_real())
    else {
        return false;
    };
    let Some(candidates) = restrictions.get(&current) else {
        return false;
    };

    // Lazily computed chain of previous features, parents_chain[i] precedes parents_chain[i-1]
    let mut parents_chain: Vec<V> = Vec::default();

    for restriction in candidates {
        if restriction[0] != parent_id {
            continue;
        }
        if restriction.len() == 1 {
            return true;
        }

        for i in 1..restriction.len() {
            if parents_chain.len() < i {
                let from = parents_chain.last().copied().unwrap_or(parent);
                match next_parent(from, parents) {
                    Some(p) => parents_chain.push(p),
                    None => break,
                }
            }

            if parents_chain[i - 1].feature() != FeatureId::Real(restriction[i]) {
                break;
            }
            if i + 1 == restriction.len() {
                return true;
            }
        }
    }

    false
}
