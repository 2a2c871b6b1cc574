// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::rc::Rc;

use super::connector::CrossMwmConnector;
use crate::distance::{distance_on_earth, LatLon};
use crate::index_graph::SegmentEdge;
use crate::loader::{IndexGraphLoader, RegionDataSource, SectionKind};
use crate::{FeatureId, NumMwmId, RoutingError, Segment};

/// Radius of geometric twin search, in meters.
pub const TWIN_SEARCH_RADIUS: f64 = 20.0;

/// Twin candidates closer than this (in meters) are considered exact matches.
pub const EXACT_TWIN_DISTANCE: f64 = 2.0;

/// Availability of cross-region data of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MwmStatus {
    NotLoaded,
    SectionExists,
    NoSection,
}

/// Stitches the [IndexGraphs](crate::index_graph::IndexGraph) of all regions together,
/// by resolving transition segments to their twins in neighboring regions.
///
/// Connectors are loaded on first use and kept until [CrossMwmGraph::clear].
pub struct CrossMwmGraph {
    source: Rc<dyn RegionDataSource>,
    connectors: HashMap<(NumMwmId, SectionKind), Option<CrossMwmConnector>>,
    neighbors: HashMap<NumMwmId, Vec<NumMwmId>>,
}

impl CrossMwmGraph {
    pub fn new(source: Rc<dyn RegionDataSource>) -> Self {
        Self {
            source,
            connectors: HashMap::default(),
            neighbors: HashMap::default(),
        }
    }

    /// Returns the status of the road cross-region section of a region.
    pub fn status(&mut self, mwm_id: NumMwmId) -> MwmStatus {
        self.status_of(mwm_id, SectionKind::Road)
    }

    fn status_of(&mut self, mwm_id: NumMwmId, kind: SectionKind) -> MwmStatus {
        match self.connector(mwm_id, kind) {
            Ok(Some(_)) => MwmStatus::SectionExists,
            Ok(None) => MwmStatus::NoSection,
            Err(_) => MwmStatus::NotLoaded,
        }
    }

    /// Checks whether a region has a road cross-region section.
    /// Fails for regions not known to the data source.
    pub fn cross_mwm_section_exists(&mut self, mwm_id: NumMwmId) -> Result<bool, RoutingError> {
        match self.status(mwm_id) {
            MwmStatus::NotLoaded => Err(RoutingError::RegionNotLoaded(mwm_id)),
            MwmStatus::SectionExists => Ok(true),
            MwmStatus::NoSection => Ok(false),
        }
    }

    fn connector(
        &mut self,
        mwm_id: NumMwmId,
        kind: SectionKind,
    ) -> Result<Option<&CrossMwmConnector>, RoutingError> {
        if !self.connectors.contains_key(&(mwm_id, kind)) {
            if !self.source.is_registered(mwm_id) {
                return Err(RoutingError::RegionNotLoaded(mwm_id));
            }

            let connector = self
                .source
                .cross_mwm_section(mwm_id, kind)?
                .map(|section| CrossMwmConnector::from_section(mwm_id, &section));
            match connector {
                Some(ref c) => log::debug!(
                    "loaded {:?} connector of region {}: {} enters, {} exits",
                    kind,
                    mwm_id,
                    c.enters().len(),
                    c.exits().len()
                ),
                None => log::debug!("region {} has no {:?} cross-region section", mwm_id, kind),
            }
            self.connectors.insert((mwm_id, kind), connector);
        }

        Ok(self.connectors.get(&(mwm_id, kind)).and_then(|c| c.as_ref()))
    }

    fn connector_for(&mut self, s: &Segment) -> Result<Option<&CrossMwmConnector>, RoutingError> {
        match s.feature_id {
            FeatureId::Real(_) => self.connector(s.mwm_id, SectionKind::Road),
            FeatureId::Transit(_) => self.connector(s.mwm_id, SectionKind::Transit),
            FeatureId::Synthetic(_) => Ok(None),
        }
    }

    fn neighbors(&mut self, mwm_id: NumMwmId) -> Result<Vec<NumMwmId>, RoutingError> {
        if let Some(n) = self.neighbors.get(&mwm_id) {
            return Ok(n.clone());
        }
        let n = self.source.neighbors(mwm_id)?;
        self.neighbors.insert(mwm_id, n.clone());
        Ok(n)
    }

    /// Returns true if `s` is an exit (when `is_outgoing`) or an enter (otherwise) of its region.
    pub fn is_transition(&mut self, s: &Segment, is_outgoing: bool) -> Result<bool, RoutingError> {
        Ok(self
            .connector_for(s)?
            .map_or(false, |c| c.is_transition(s, is_outgoing)))
    }

    /// Appends the twins of a transition segment to `twins`: the representations of the
    /// same real-world segment in neighboring regions.
    ///
    /// # Panics
    /// Panics if `s` is not a transition in the given direction.
    pub fn get_twins(
        &mut self,
        s: &Segment,
        is_outgoing: bool,
        loader: &mut IndexGraphLoader,
        twins: &mut Vec<Segment>,
    ) -> Result<(), RoutingError> {
        assert!(
            self.is_transition(s, is_outgoing)?,
            "{} is not a transition (outgoing: {})",
            s,
            is_outgoing
        );

        let neighbors = self.neighbors(s.mwm_id)?;
        let start = twins.len();

        if s.feature_id.is_transit() {
            self.twins_by_cross_id(s, is_outgoing, &neighbors, SectionKind::Transit, twins)?;
        } else {
            let mut all_have_sections = true;
            for &n in &neighbors {
                if self.status_of(n, SectionKind::Road) != MwmStatus::SectionExists {
                    all_have_sections = false;
                    break;
                }
            }

            if all_have_sections {
                self.twins_by_cross_id(s, is_outgoing, &neighbors, SectionKind::Road, twins)?;
            } else {
                self.twins_by_geometry(s, &neighbors, loader, twins)?;
            }
        }

        for t in &twins[start..] {
            debug_assert_ne!(t.mwm_id, s.mwm_id, "twin {} lies in the region of {}", t, s);
        }
        Ok(())
    }

    fn twins_by_cross_id(
        &mut self,
        s: &Segment,
        is_outgoing: bool,
        neighbors: &[NumMwmId],
        kind: SectionKind,
        twins: &mut Vec<Segment>,
    ) -> Result<(), RoutingError> {
        let Some(cross_id) = self.connector(s.mwm_id, kind)?.and_then(|c| c.cross_id(s)) else {
            return Ok(());
        };

        for &n in neighbors {
            // Exits of one region are enters of its neighbor
            if let Some(twin) = self.connector(n, kind)?.and_then(|c| c.get_transition(cross_id, is_outgoing)) {
                twins.push(twin);
            }
        }
        Ok(())
    }

    /// Geometric twin matching: finds segments of neighboring regions with the same
    /// end points (and direction) as `s`.
    fn twins_by_geometry(
        &mut self,
        s: &Segment,
        neighbors: &[NumMwmId],
        loader: &mut IndexGraphLoader,
        twins: &mut Vec<Segment>,
    ) -> Result<(), RoutingError> {
        let back = self.point(s, false, loader)?;
        let front = self.point(s, true, loader)?;

        for &n in neighbors {
            let candidates = self.source.road_points_within(n, back, TWIN_SEARCH_RADIUS)?;
            let geometry = loader.get_geometry(n)?;
            let mut exact: Option<Segment> = None;
            let mut closest: Option<(f64, Segment)> = None;

            for (rp, _) in candidates {
                let road = geometry.road(rp.feature_id);
                if !road.valid {
                    continue;
                }

                let mut consider = |candidate: Segment| {
                    let c_back = road.point(candidate.point_id(false));
                    let c_front = road.point(candidate.point_id(true));
                    let d = distance_on_earth(back, c_back).max(distance_on_earth(front, c_front));
                    if d <= EXACT_TWIN_DISTANCE {
                        exact.get_or_insert(candidate);
                    } else if d <= TWIN_SEARCH_RADIUS && closest.map_or(true, |(best, _)| d < best) {
                        closest = Some((d, candidate));
                    }
                };

                if rp.point_id + 1 < road.points_count() {
                    consider(Segment::real(n, rp.feature_id, rp.point_id, true));
                }
                if !road.one_way && rp.point_id > 0 {
                    consider(Segment::real(n, rp.feature_id, rp.point_id - 1, false));
                }

                // The first exact match wins
                if exact.is_some() {
                    break;
                }
            }

            if let Some(twin) = exact {
                twins.push(twin);
            } else if let Some((d, twin)) = closest {
                log::trace!("inexact twin {} of {} ({:.1} m apart)", twin, s, d);
                twins.push(twin);
            }
        }
        Ok(())
    }

    /// Appends the precomputed edges between an enter and the exits of its region
    /// (`is_outgoing`), or between an exit and the enters of its region.
    ///
    /// # Panics
    /// Panics if `s` is not a transition in the opposite direction.
    pub fn get_edge_list(
        &mut self,
        s: &Segment,
        is_outgoing: bool,
        edges: &mut Vec<SegmentEdge>,
    ) -> Result<(), RoutingError> {
        assert!(
            self.is_transition(s, !is_outgoing)?,
            "{} is not a transition (outgoing: {})",
            s,
            !is_outgoing
        );
        if let Some(c) = self.connector_for(s)? {
            c.get_edge_list(s, is_outgoing, edges);
        }
        Ok(())
    }

    /// Calls `f` with every enter (`is_enter`) or exit of a region's road section.
    pub fn for_each_transition<F: FnMut(Segment)>(
        &mut self,
        mwm_id: NumMwmId,
        is_enter: bool,
        mut f: F,
    ) -> Result<(), RoutingError> {
        if let Some(c) = self.connector(mwm_id, SectionKind::Road)? {
            let transitions = if is_enter { c.enters() } else { c.exits() };
            transitions.iter().copied().for_each(&mut f);
        }
        Ok(())
    }

    /// Returns the back or the front point of a transition segment. Points of transitions
    /// are taken from the connector, so that region geometry doesn't need to be loaded.
    pub fn point(
        &mut self,
        s: &Segment,
        front: bool,
        loader: &mut IndexGraphLoader,
    ) -> Result<LatLon, RoutingError> {
        if let Some(p) = self.connector_for(s)?.and_then(|c| c.point(s, front)) {
            return Ok(p);
        }
        Ok(loader.get_index_graph(s.mwm_id)?.point(*s, front))
    }

    /// Drops all cached connectors.
    pub fn clear(&mut self) {
        self.connectors.clear();
        self.neighbors.clear();
    }
}

impl std::fmt::Debug for CrossMwmGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrossMwmGraph")
            .field("connectors", &self.connectors.len())
            .finish_non_exhaustive()
    }
}
