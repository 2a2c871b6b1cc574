// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use crate::cross_mwm::{self, CrossMwmSection, TransitionRecord};
use crate::distance::{distance_on_earth, project_to_segment, LatLon, Rect};
use crate::estimator::EdgeEstimator;
use crate::geometry::{Geometry, GeometryLoader, RoadGeometry};
use crate::index_graph::{IndexGraph, Joint, Restriction, RestrictionUTurn, RoadAccess};
use crate::kd::KDTree;
use crate::sparse::CrossBorderGraph;
use crate::transit::{TransitData, TransitGraph};
use crate::{NumMwmId, RoadPoint, RoutingError, RoutingOptions, Segment};

/// Kind of cross-region connector section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Road,
    Transit,
}

/// Everything needed to build the [IndexGraph] of a region, apart from its geometry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoadNetwork {
    pub joints: Vec<Joint>,
    pub restrictions: Vec<Restriction>,
    pub u_turn_restrictions: Vec<RestrictionUTurn>,
    pub access: RoadAccess,
}

/// Synchronous provider of per-region data.
///
/// Missing optional data (sections, transit) is reported as [None];
/// asking about unregistered regions fails with [RoutingError::RegionNotLoaded].
pub trait RegionDataSource {
    fn is_registered(&self, mwm_id: NumMwmId) -> bool;

    fn region_rect(&self, mwm_id: NumMwmId) -> Result<Rect, RoutingError>;

    /// Returns the region containing the given point.
    fn region_at(&self, point: LatLon) -> Option<NumMwmId>;

    /// Returns the regions whose rectangles touch the rectangle of `mwm_id`.
    fn neighbors(&self, mwm_id: NumMwmId) -> Result<Vec<NumMwmId>, RoutingError>;

    fn geometry_loader(&self, mwm_id: NumMwmId) -> Result<Box<dyn GeometryLoader>, RoutingError>;

    fn road_network(&self, mwm_id: NumMwmId) -> Result<Rc<RoadNetwork>, RoutingError>;

    fn cross_mwm_section(
        &self,
        mwm_id: NumMwmId,
        kind: SectionKind,
    ) -> Result<Option<Rc<CrossMwmSection>>, RoutingError>;

    fn transit_data(&self, mwm_id: NumMwmId) -> Result<Option<Rc<TransitData>>, RoutingError>;

    /// Returns road points of the region within `radius` meters from `point`,
    /// together with their distances.
    fn road_points_within(
        &self,
        mwm_id: NumMwmId,
        point: LatLon,
        radius: f64,
    ) -> Result<Vec<(RoadPoint, f64)>, RoutingError>;

    fn cross_border_graph(&self) -> Option<Rc<CrossBorderGraph>>;
}

/// [GeometryLoader] over roads kept in memory, indexed by feature id.
#[derive(Debug, Clone)]
pub struct MemoryGeometryLoader {
    roads: Rc<Vec<RoadGeometry>>,
}

impl MemoryGeometryLoader {
    pub fn new(roads: Rc<Vec<RoadGeometry>>) -> Self {
        Self { roads }
    }
}

impl GeometryLoader for MemoryGeometryLoader {
    fn load(&mut self, feature_id: u32) -> RoadGeometry {
        self.roads
            .get(feature_id as usize)
            .cloned()
            .unwrap_or_else(RoadGeometry::invalid)
    }
}

/// In-memory data of a single region.
#[derive(Debug, Clone)]
pub struct RegionData {
    pub name: String,
    pub rect: Rect,
    pub roads: Rc<Vec<RoadGeometry>>,
    pub network: Rc<RoadNetwork>,

    /// Transition segments, from which [RegionData::cross_mwm] can be built.
    pub transitions: Vec<TransitionRecord>,
    pub cross_mwm: Option<Rc<CrossMwmSection>>,
    pub transit_cross_mwm: Option<Rc<CrossMwmSection>>,
    pub transit: Option<Rc<TransitData>>,

    points: Option<KDTree<RoadPoint>>,
}

impl RegionData {
    pub fn new(name: String, rect: Rect, roads: Vec<RoadGeometry>, network: RoadNetwork) -> Self {
        let points = KDTree::from_iter(roads.iter().enumerate().filter(|(_, r)| r.valid).flat_map(
            |(feature_id, road)| {
                road.junctions.iter().enumerate().map(move |(point_id, j)| {
                    (j.point, RoadPoint::new(feature_id as u32, point_id as u32))
                })
            },
        ));

        Self {
            name,
            rect,
            roads: Rc::new(roads),
            network: Rc::new(network),
            transitions: Vec::default(),
            cross_mwm: None,
            transit_cross_mwm: None,
            transit: None,
            points,
        }
    }

    pub fn road_points_within(&self, point: LatLon, radius: f64) -> Vec<(RoadPoint, f64)> {
        let mut found = Vec::default();
        if let Some(ref tree) = self.points {
            tree.find_within(point, radius, &mut found);
        }
        found.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        found
    }
}

/// Registry of in-memory regions, keyed by their [NumMwmId].
#[derive(Debug, Default)]
pub struct RegionSet {
    regions: BTreeMap<NumMwmId, RegionData>,
    cross_border: Option<Rc<CrossBorderGraph>>,
}

impl RegionSet {
    /// Registers a region under the next free id and returns that id.
    pub fn add(&mut self, region: RegionData) -> NumMwmId {
        let id = self.regions.keys().next_back().map_or(0, |&id| id + 1);
        assert!(id < crate::FAKE_NUM_MWM_ID, "too many regions");
        log::debug!("registered region {} ({}) with {} roads", id, region.name, region.roads.len());
        self.regions.insert(id, region);
        id
    }

    pub fn get(&self, mwm_id: NumMwmId) -> Option<&RegionData> {
        self.regions.get(&mwm_id)
    }

    pub fn get_mut(&mut self, mwm_id: NumMwmId) -> Option<&mut RegionData> {
        self.regions.get_mut(&mwm_id)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NumMwmId> + '_ {
        self.regions.keys().copied()
    }

    fn region(&self, mwm_id: NumMwmId) -> Result<&RegionData, RoutingError> {
        self.regions
            .get(&mwm_id)
            .ok_or(RoutingError::RegionNotLoaded(mwm_id))
    }

    /// Builds road cross-region sections of all regions from their transitions,
    /// precomputing enter → exit weights with the given estimator.
    pub fn build_cross_mwm_sections(&mut self, estimator: Rc<dyn EdgeEstimator>) {
        for (&mwm_id, region) in self.regions.iter_mut() {
            let mut graph = build_index_graph(
                mwm_id,
                Box::new(MemoryGeometryLoader::new(region.roads.clone())),
                &region.network,
                estimator.clone(),
                RoutingOptions::NONE,
                None,
            );
            let section = cross_mwm::build_section(&mut graph, region.transitions.clone());
            region.cross_mwm = Some(Rc::new(section));
        }
    }

    /// Builds the coarse graph of border-crossing segments out of the transitions of all regions.
    pub fn build_cross_border_graph(&mut self, estimator: &dyn EdgeEstimator) {
        let graph = CrossBorderGraph::from_transitions(
            self.regions.iter().map(|(&id, r)| (id, r)),
            |p| self.region_at(p),
            estimator,
        );
        self.cross_border = Some(Rc::new(graph));
    }

    pub fn set_cross_border_graph(&mut self, graph: CrossBorderGraph) {
        self.cross_border = Some(Rc::new(graph));
    }
}

impl RegionDataSource for RegionSet {
    fn is_registered(&self, mwm_id: NumMwmId) -> bool {
        self.regions.contains_key(&mwm_id)
    }

    fn region_rect(&self, mwm_id: NumMwmId) -> Result<Rect, RoutingError> {
        Ok(self.region(mwm_id)?.rect)
    }

    fn region_at(&self, point: LatLon) -> Option<NumMwmId> {
        self.regions
            .iter()
            .find(|(_, r)| r.rect.contains(point))
            .map(|(&id, _)| id)
    }

    fn neighbors(&self, mwm_id: NumMwmId) -> Result<Vec<NumMwmId>, RoutingError> {
        let rect = self.region(mwm_id)?.rect;
        Ok(self
            .regions
            .iter()
            .filter(|(&id, r)| id != mwm_id && r.rect.touches(&rect))
            .map(|(&id, _)| id)
            .collect())
    }

    fn geometry_loader(&self, mwm_id: NumMwmId) -> Result<Box<dyn GeometryLoader>, RoutingError> {
        let region = self.region(mwm_id)?;
        if region.roads.is_empty() {
            return Err(RoutingError::NoRoadData(mwm_id));
        }
        Ok(Box::new(MemoryGeometryLoader::new(region.roads.clone())))
    }

    fn road_network(&self, mwm_id: NumMwmId) -> Result<Rc<RoadNetwork>, RoutingError> {
        Ok(self.region(mwm_id)?.network.clone())
    }

    fn cross_mwm_section(
        &self,
        mwm_id: NumMwmId,
        kind: SectionKind,
    ) -> Result<Option<Rc<CrossMwmSection>>, RoutingError> {
        let region = self.region(mwm_id)?;
        Ok(match kind {
            SectionKind::Road => region.cross_mwm.clone(),
            SectionKind::Transit => region.transit_cross_mwm.clone(),
        })
    }

    fn transit_data(&self, mwm_id: NumMwmId) -> Result<Option<Rc<TransitData>>, RoutingError> {
        Ok(self.region(mwm_id)?.transit.clone())
    }

    fn road_points_within(
        &self,
        mwm_id: NumMwmId,
        point: LatLon,
        radius: f64,
    ) -> Result<Vec<(RoadPoint, f64)>, RoutingError> {
        Ok(self.region(mwm_id)?.road_points_within(point, radius))
    }

    fn cross_border_graph(&self) -> Option<Rc<CrossBorderGraph>> {
        self.cross_border.clone()
    }
}

/// Creates a fully initialized [IndexGraph] of a region.
pub fn build_index_graph(
    mwm_id: NumMwmId,
    geometry_loader: Box<dyn GeometryLoader>,
    network: &RoadNetwork,
    estimator: Rc<dyn EdgeEstimator>,
    avoid: RoutingOptions,
    current_hour: Option<u8>,
) -> IndexGraph {
    let mut graph = IndexGraph::new(mwm_id, Geometry::new(geometry_loader), estimator);
    graph.import(&network.joints);
    graph.set_restrictions(&network.restrictions);
    graph.set_u_turn_restrictions(&network.u_turn_restrictions);

    let mut access = network.access.clone();
    access.set_current_hour(current_hour);
    graph.set_road_access(access);
    graph.set_avoid_routing_options(avoid);
    graph
}

/// Radii (in meters) used, in order, when looking for roads near ending points.
const ENDING_SEARCH_RADII: [f64; 3] = [200.0, 1_000.0, 5_000.0];

/// Lazily creates and caches the [IndexGraphs](IndexGraph) of regions.
pub struct IndexGraphLoader {
    source: Rc<dyn RegionDataSource>,
    estimator: Rc<dyn EdgeEstimator>,
    graphs: HashMap<NumMwmId, IndexGraph>,
    avoid: RoutingOptions,
    current_hour: Option<u8>,
}

impl IndexGraphLoader {
    pub fn new(source: Rc<dyn RegionDataSource>, estimator: Rc<dyn EdgeEstimator>) -> Self {
        Self {
            source,
            estimator,
            graphs: HashMap::default(),
            avoid: RoutingOptions::NONE,
            current_hour: None,
        }
    }

    /// Sets the options to avoid. Drops all cached graphs.
    pub fn set_avoid_routing_options(&mut self, avoid: RoutingOptions) {
        self.avoid = avoid;
        self.graphs.clear();
    }

    /// Sets the hour of the day used to evaluate conditional access. Drops all cached graphs.
    pub fn set_current_hour(&mut self, hour: Option<u8>) {
        self.current_hour = hour;
        self.graphs.clear();
    }

    #[inline]
    pub fn source(&self) -> &Rc<dyn RegionDataSource> {
        &self.source
    }

    #[inline]
    pub fn estimator(&self) -> &Rc<dyn EdgeEstimator> {
        &self.estimator
    }

    pub fn get_index_graph(&mut self, mwm_id: NumMwmId) -> Result<&mut IndexGraph, RoutingError> {
        match self.graphs.entry(mwm_id) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => {
                let network = self.source.road_network(mwm_id)?;
                let geometry_loader = self.source.geometry_loader(mwm_id)?;
                let graph = build_index_graph(
                    mwm_id,
                    geometry_loader,
                    &network,
                    self.estimator.clone(),
                    self.avoid,
                    self.current_hour,
                );
                log::debug!(
                    "loaded index graph of region {} with {} joints",
                    mwm_id,
                    graph.num_joints()
                );
                Ok(e.insert(graph))
            }
        }
    }

    pub fn get_geometry(&mut self, mwm_id: NumMwmId) -> Result<&mut Geometry, RoutingError> {
        Ok(self.get_index_graph(mwm_id)?.geometry())
    }

    pub fn is_loaded(&self, mwm_id: NumMwmId) -> bool {
        self.graphs.contains_key(&mwm_id)
    }

    pub fn loaded_count(&self) -> usize {
        self.graphs.len()
    }

    pub fn clear(&mut self) {
        self.graphs.clear();
    }

    /// Finds up to `count` real segments closest to `point`, ordered by distance.
    pub fn find_best_segments(
        &mut self,
        point: LatLon,
        count: usize,
    ) -> Result<Vec<Segment>, RoutingError> {
        let mwm_id = self
            .source
            .region_at(point)
            .ok_or(RoutingError::PointNotInAnyRegion {
                lat: point.lat,
                lon: point.lon,
            })?;

        for radius in ENDING_SEARCH_RADII {
            let candidates = self.source.road_points_within(mwm_id, point, radius)?;
            if candidates.is_empty() {
                continue;
            }

            let geometry = self.get_geometry(mwm_id)?;
            let mut segments: Vec<(f64, Segment)> = Vec::default();
            for (rp, _) in candidates {
                let road = geometry.road(rp.feature_id);
                if !road.valid {
                    continue;
                }

                let mut consider = |segment_idx: u32| {
                    let s = Segment::real(mwm_id, rp.feature_id, segment_idx, true);
                    if segments.iter().any(|(_, known)| *known == s) {
                        return;
                    }
                    let a = road.point(segment_idx);
                    let b = road.point(segment_idx + 1);
                    let (projected, _) = project_to_segment(a, b, point);
                    segments.push((distance_on_earth(point, projected), s));
                };

                if rp.point_id > 0 {
                    consider(rp.point_id - 1);
                }
                if rp.point_id + 1 < road.points_count() {
                    consider(rp.point_id);
                }
            }

            if !segments.is_empty() {
                segments.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
                return Ok(segments.into_iter().take(count).map(|(_, s)| s).collect());
            }
        }

        Err(RoutingError::NoProjection {
            lat: point.lat,
            lon: point.lon,
        })
    }
}

impl std::fmt::Debug for IndexGraphLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexGraphLoader")
            .field("loaded", &self.graphs.len())
            .field("avoid", &self.avoid)
            .finish_non_exhaustive()
    }
}

/// Lazily creates and caches the [TransitGraphs](TransitGraph) of regions.
/// Regions without transit data are cached as [None].
pub struct TransitGraphLoader {
    source: Rc<dyn RegionDataSource>,
    estimator: Rc<dyn EdgeEstimator>,
    graphs: HashMap<NumMwmId, Option<TransitGraph>>,
}

impl TransitGraphLoader {
    pub fn new(source: Rc<dyn RegionDataSource>, estimator: Rc<dyn EdgeEstimator>) -> Self {
        Self {
            source,
            estimator,
            graphs: HashMap::default(),
        }
    }

    pub fn get_transit_graph(
        &mut self,
        mwm_id: NumMwmId,
        index_loader: &mut IndexGraphLoader,
    ) -> Result<Option<&TransitGraph>, RoutingError> {
        let graph = match self.graphs.entry(mwm_id) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                let graph = match self.source.transit_data(mwm_id)? {
                    Some(data) => {
                        let index_graph = index_loader.get_index_graph(mwm_id)?;
                        let mut graph = TransitGraph::new(mwm_id, self.estimator.clone());
                        graph.fill(&data, index_graph);
                        log::debug!(
                            "built transit graph of region {} with {} fake segments",
                            mwm_id,
                            graph.fake_segments_count()
                        );
                        Some(graph)
                    }
                    None => None,
                };
                e.insert(graph)
            }
        };
        Ok(graph.as_ref())
    }

    pub fn clear(&mut self) {
        self.graphs.clear();
    }
}

impl std::fmt::Debug for TransitGraphLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitGraphLoader")
            .field("loaded", &self.graphs.len())
            .finish_non_exhaustive()
    }
}
