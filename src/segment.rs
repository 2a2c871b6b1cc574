// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Dense identifier of a loaded region ("mwm").
pub type NumMwmId = u16;

/// Region identifier used by synthetic start/finish segments, never assigned to a real region.
pub const FAKE_NUM_MWM_ID: NumMwmId = NumMwmId::MAX;

/// Identifier of a feature within a region, tagged with the id space it comes from.
///
/// Real road features, transit overlay features and other synthetic features
/// (start/finish attachments, coarse cross-border segments) live in separate
/// id spaces, so they can never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FeatureId {
    Real(u32),
    Transit(u32),
    Synthetic(u32),
}

impl FeatureId {
    /// Returns the untagged numeric identifier.
    #[inline]
    pub fn raw(self) -> u32 {
        match self {
            Self::Real(id) | Self::Transit(id) | Self::Synthetic(id) => id,
        }
    }

    #[inline]
    pub fn is_real(self) -> bool {
        matches!(self, Self::Real(_))
    }

    #[inline]
    pub fn is_transit(self) -> bool {
        matches!(self, Self::Transit(_))
    }

    /// Returns the numeric identifier of a real road feature, or [None] for synthetic ones.
    #[inline]
    pub fn as_real(self) -> Option<u32> {
        match self {
            Self::Real(id) => Some(id),
            _ => None,
        }
    }
}

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Real(id) => write!(f, "{}", id),
            Self::Transit(id) => write!(f, "transit:{}", id),
            Self::Synthetic(id) => write!(f, "synthetic:{}", id),
        }
    }
}

/// A directed edge between two consecutive points of a feature's polyline.
///
/// A forward segment `i` goes from point `i` to point `i + 1`,
/// a backward segment `i` goes from point `i + 1` to point `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Segment {
    pub mwm_id: NumMwmId,
    pub feature_id: FeatureId,
    pub segment_idx: u32,
    pub forward: bool,
}

impl Segment {
    #[inline]
    pub const fn new(mwm_id: NumMwmId, feature_id: FeatureId, segment_idx: u32, forward: bool) -> Self {
        Self {
            mwm_id,
            feature_id,
            segment_idx,
            forward,
        }
    }

    /// Shorthand for a segment of a real road feature.
    #[inline]
    pub const fn real(mwm_id: NumMwmId, feature_id: u32, segment_idx: u32, forward: bool) -> Self {
        Self::new(mwm_id, FeatureId::Real(feature_id), segment_idx, forward)
    }

    #[inline]
    pub fn min_point_id(&self) -> u32 {
        self.segment_idx
    }

    #[inline]
    pub fn max_point_id(&self) -> u32 {
        self.segment_idx + 1
    }

    /// Returns the id of the point at the front (end, when `front` is true)
    /// or at the back (start) of the segment, respecting its direction.
    #[inline]
    pub fn point_id(&self, front: bool) -> u32 {
        if self.forward == front {
            self.segment_idx + 1
        } else {
            self.segment_idx
        }
    }

    #[inline]
    pub fn road_point(&self, front: bool) -> RoadPoint {
        RoadPoint::new(self.feature_id.raw(), self.point_id(front))
    }

    /// Returns the same segment traversed in the opposite direction.
    #[inline]
    pub fn reversed(&self) -> Self {
        Self {
            forward: !self.forward,
            ..*self
        }
    }

    /// Returns true if the segment belongs to a real road feature of a real region.
    #[inline]
    pub fn is_real(&self) -> bool {
        self.mwm_id != FAKE_NUM_MWM_ID && self.feature_id.is_real()
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Segment({}, {}, {}, {})",
            self.mwm_id,
            self.feature_id,
            self.segment_idx,
            if self.forward { "fwd" } else { "bwd" }
        )
    }
}

/// A point along a road feature, identified by the feature and the index of the point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoadPoint {
    pub feature_id: u32,
    pub point_id: u32,
}

impl RoadPoint {
    #[inline]
    pub const fn new(feature_id: u32, point_id: u32) -> Self {
        Self {
            feature_id,
            point_id,
        }
    }
}
