// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{BTreeMap, BTreeSet};

use crate::distance::Junction;
use crate::{NumMwmId, Segment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FakeVertexKind {
    /// Doesn't correspond to any real road.
    PureFake,
    /// Replaces a part of a real segment.
    PartOfReal,
}

/// Geometry of a fake segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FakeVertex {
    pub mwm_id: NumMwmId,
    pub from: Junction,
    pub to: Junction,
    pub kind: FakeVertexKind,
}

impl FakeVertex {
    pub fn new(mwm_id: NumMwmId, from: Junction, to: Junction, kind: FakeVertexKind) -> Self {
        Self {
            mwm_id,
            from,
            to,
            kind,
        }
    }

    #[inline]
    pub fn junction(&self, front: bool) -> Junction {
        if front {
            self.to
        } else {
            self.from
        }
    }
}

/// Adjacency of synthetic segments, together with the mapping
/// between real segments and the fake segments replacing their parts.
#[derive(Debug, Clone, Default)]
pub struct FakeGraph {
    vertices: BTreeMap<Segment, FakeVertex>,
    outgoing: BTreeMap<Segment, BTreeSet<Segment>>,
    ingoing: BTreeMap<Segment, BTreeSet<Segment>>,
    fake_to_real: BTreeMap<Segment, Segment>,
    real_to_fake: BTreeMap<Segment, BTreeSet<Segment>>,
}

impl FakeGraph {
    /// Adds a vertex without any connections. Re-adding a segment is only allowed
    /// with the same geometry.
    pub fn add_standalone_vertex(&mut self, segment: Segment, vertex: FakeVertex) {
        if let Some(previous) = self.vertices.insert(segment, vertex) {
            assert_eq!(previous, vertex, "fake segment {} added twice", segment);
        }
    }

    /// Adds `new_segment`, connected from `existing` (if `is_outgoing`) or to `existing`.
    /// If `real` is provided, `new_segment` is recorded as replacing a part of it.
    pub fn add_vertex(
        &mut self,
        existing: Segment,
        new_segment: Segment,
        vertex: FakeVertex,
        is_outgoing: bool,
        real: Option<Segment>,
    ) {
        self.add_standalone_vertex(new_segment, vertex);
        if is_outgoing {
            self.add_connection(existing, new_segment);
        } else {
            self.add_connection(new_segment, existing);
        }

        if let Some(real) = real {
            self.fake_to_real.insert(new_segment, real);
            self.real_to_fake.entry(real).or_default().insert(new_segment);
        }
    }

    pub fn add_connection(&mut self, from: Segment, to: Segment) {
        debug_assert!(self.vertices.contains_key(&from), "unknown fake segment {}", from);
        debug_assert!(self.vertices.contains_key(&to), "unknown fake segment {}", to);
        self.outgoing.entry(from).or_default().insert(to);
        self.ingoing.entry(to).or_default().insert(from);
    }

    #[inline]
    pub fn vertex(&self, segment: &Segment) -> Option<&FakeVertex> {
        self.vertices.get(segment)
    }

    #[inline]
    pub fn contains(&self, segment: &Segment) -> bool {
        self.vertices.contains_key(segment)
    }

    /// Returns the successors (`is_outgoing`) or predecessors of a fake segment.
    pub fn edges(&self, segment: &Segment, is_outgoing: bool) -> impl Iterator<Item = Segment> + '_ {
        let adjacency = if is_outgoing {
            &self.outgoing
        } else {
            &self.ingoing
        };
        adjacency.get(segment).into_iter().flatten().copied()
    }

    #[inline]
    pub fn find_real(&self, fake: &Segment) -> Option<Segment> {
        self.fake_to_real.get(fake).copied()
    }

    /// Returns the fake segments replacing parts of the given real segment.
    pub fn fakes_for_real(&self, real: &Segment) -> impl Iterator<Item = Segment> + '_ {
        self.real_to_fake.get(real).into_iter().flatten().copied()
    }

    /// Finds a segment with exactly the given geometry.
    pub fn find_segment(&self, vertex: &FakeVertex) -> Option<Segment> {
        self.vertices
            .iter()
            .find(|(_, v)| *v == vertex)
            .map(|(&s, _)| s)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn segments(&self) -> impl Iterator<Item = (&Segment, &FakeVertex)> {
        self.vertices.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::LatLon;
    use crate::{FeatureId, FAKE_NUM_MWM_ID};

    fn fake(i: u32) -> Segment {
        Segment::new(FAKE_NUM_MWM_ID, FeatureId::Synthetic(i), 0, true)
    }

    fn vertex(a: f64, b: f64, kind: FakeVertexKind) -> FakeVertex {
        FakeVertex::new(
            0,
            Junction::at(LatLon::new(0.0, a)),
            Junction::at(LatLon::new(0.0, b)),
            kind,
        )
    }

    #[test]
    fn connections_and_real_mapping() {
        let real = Segment::real(0, 3, 0, true);
        let mut g = FakeGraph::default();
        g.add_standalone_vertex(fake(0), vertex(0.0, 0.1, FakeVertexKind::PureFake));
        g.add_vertex(fake(0), fake(1), vertex(0.1, 0.2, FakeVertexKind::PartOfReal), true, Some(real));
        g.add_vertex(fake(0), fake(2), vertex(-0.1, 0.0, FakeVertexKind::PureFake), false, None);

        assert_eq!(g.len(), 3);
        assert_eq!(g.edges(&fake(0), true).collect::<Vec<_>>(), vec![fake(1)]);
        assert_eq!(g.edges(&fake(0), false).collect::<Vec<_>>(), vec![fake(2)]);
        assert_eq!(g.edges(&fake(1), false).collect::<Vec<_>>(), vec![fake(0)]);
        assert_eq!(g.find_real(&fake(1)), Some(real));
        assert_eq!(g.find_real(&fake(0)), None);
        assert_eq!(g.fakes_for_real(&real).collect::<Vec<_>>(), vec![fake(1)]);
        assert_eq!(
            g.find_segment(&vertex(0.1, 0.2, FakeVertexKind::PartOfReal)),
            Some(fake(1))
        );
        assert_eq!(g.find_segment(&vertex(0.1, 0.2, FakeVertexKind::PureFake)), None);
    }
}
