// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use super::restrictions::RestrictionVertex;
use crate::{Edge, FeatureId, NumMwmId, Segment};

/// A maximal run of consecutive segments of one feature, travelled in one direction,
/// between two road points with joints (or road ends). Vertex of the joint-level graph.
///
/// For forward chains `start_segment_id <= end_segment_id`, for backward chains
/// `start_segment_id >= end_segment_id`. `start` is always the first segment in travel order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JointSegment {
    pub mwm_id: NumMwmId,
    pub feature_id: FeatureId,
    pub start_segment_id: u32,
    pub end_segment_id: u32,
    pub forward: bool,
}

pub type JointEdge = Edge<JointSegment>;

impl JointSegment {
    /// Creates a chain from its first to its last segment (in travel order).
    pub fn new(first: Segment, last: Segment) -> Self {
        debug_assert_eq!(first.mwm_id, last.mwm_id);
        debug_assert_eq!(first.feature_id, last.feature_id);
        debug_assert_eq!(first.forward, last.forward);
        debug_assert!(if first.forward {
            first.segment_idx <= last.segment_idx
        } else {
            first.segment_idx >= last.segment_idx
        });

        Self {
            mwm_id: first.mwm_id,
            feature_id: first.feature_id,
            start_segment_id: first.segment_idx,
            end_segment_id: last.segment_idx,
            forward: first.forward,
        }
    }

    #[inline]
    pub fn from_segment(s: Segment) -> Self {
        Self::new(s, s)
    }

    #[inline]
    pub fn first_segment(&self) -> Segment {
        Segment::new(self.mwm_id, self.feature_id, self.start_segment_id, self.forward)
    }

    #[inline]
    pub fn last_segment(&self) -> Segment {
        Segment::new(self.mwm_id, self.feature_id, self.end_segment_id, self.forward)
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.start_segment_id.abs_diff(self.end_segment_id) + 1
    }

    #[inline]
    pub fn is_single_segment(&self) -> bool {
        self.start_segment_id == self.end_segment_id
    }

    /// Iterates over the segments of the chain, in travel order.
    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        let (lo, hi) = if self.forward {
            (self.start_segment_id, self.end_segment_id)
        } else {
            (self.end_segment_id, self.start_segment_id)
        };
        let forward = self.forward;
        let ids: Box<dyn Iterator<Item = u32>> = if forward {
            Box::new(lo..=hi)
        } else {
            Box::new((lo..=hi).rev())
        };
        ids.map(move |i| Segment::new(self.mwm_id, self.feature_id, i, forward))
    }

    pub fn contains(&self, s: Segment) -> bool {
        if s.mwm_id != self.mwm_id || s.feature_id != self.feature_id || s.forward != self.forward {
            return false;
        }
        let lo = self.start_segment_id.min(self.end_segment_id);
        let hi = self.start_segment_id.max(self.end_segment_id);
        (lo..=hi).contains(&s.segment_idx)
    }

    /// Returns the prefix of the chain, ending at `s` (which must be contained in the chain).
    pub fn cut_at(&self, s: Segment) -> Self {
        debug_assert!(self.contains(s));
        Self::new(self.first_segment(), s)
    }
}

impl RestrictionVertex for JointSegment {
    #[inline]
    fn feature(&self) -> FeatureId {
        self.feature_id
    }
}

impl std::fmt::Display for JointSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "JointSegment({}, {}, {}..{}, {})",
            self.mwm_id,
            self.feature_id,
            self.start_segment_id,
            self.end_segment_id,
            if self.forward { "fwd" } else { "bwd" }
        )
    }
}
