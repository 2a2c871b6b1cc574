// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use super::model::{self, FeatureType};
use super::Options;
use crate::cross_mwm::{CrossMwmId, TransitionRecord};
use crate::distance::{Junction, LatLon, Rect};
use crate::geometry::{RoadGeometry, SpeedKMpH};
use crate::index_graph::{
    build_joints, AccessType, ConditionalAccess, Restriction, RestrictionUTurn, RoadAccess,
};
use crate::loader::{RegionData, RoadNetwork};
use crate::osm::profile::{is_ferry, TurnRestriction};
use crate::{FeatureId, RoadPoint};

/// Helper object used for storing state related to converting [OSM features](super::model::Feature)
/// into the [RegionData] of a single region.
///
/// Ways are cut down to the segments with at least one end inside the region, so that
/// segments crossing the region border are kept (as transitions) in both adjacent regions.
/// Every run of consecutive kept segments becomes a separate road feature.
pub(super) struct RegionBuilder<'a> {
    name: String,
    options: &'a Options<'a>,

    /// Region boundary, or [None] if the whole input data forms the region.
    rect: Option<Rect>,

    /// Positions of all nodes, including those outside of the region.
    nodes: HashMap<i64, LatLon>,
    node_access: HashMap<i64, AccessType>,

    roads: Vec<RoadGeometry>,
    feature_nodes: Vec<Vec<i64>>,

    /// Resolved (and possibly reversed) nodes of all routable ways.
    way_nodes: HashMap<i64, Vec<i64>>,

    /// Maps node pairs (in both directions) to the features containing them.
    segment_features: HashMap<(i64, i64), u32>,

    transitions: Vec<TransitionRecord>,
    access: RoadAccess,
    restrictions: Vec<Restriction>,
    u_turn_restrictions: Vec<RestrictionUTurn>,
}

impl<'a> RegionBuilder<'a> {
    /// Create a new, empty region builder.
    pub(super) fn new(name: &str, options: &'a Options<'a>) -> Self {
        let ignore_bbox =
            options.bbox.iter().all(|&x| x == 0.0) || options.bbox.iter().any(|x| !x.is_finite());

        let rect = if ignore_bbox {
            None
        } else {
            let rect = Rect::from_bbox(options.bbox);
            if rect.is_valid() {
                Some(rect)
            } else {
                log::warn!("region {}: ignoring invalid bounding box {:?}", name, options.bbox);
                None
            }
        };

        Self {
            name: name.to_string(),
            options,
            rect,
            nodes: HashMap::default(),
            node_access: HashMap::default(),
            roads: Vec::default(),
            feature_nodes: Vec::default(),
            way_nodes: HashMap::default(),
            segment_features: HashMap::default(),
            transitions: Vec::default(),
            access: RoadAccess::default(),
            restrictions: Vec::default(),
            u_turn_restrictions: Vec::default(),
        }
    }

    /// Add all features from the provided stream and assemble the region.
    ///
    /// Features are expected in the usual OSM order: nodes, then ways, then relations.
    pub(super) fn add_features<I, E>(mut self, features: I) -> Result<RegionData, E>
    where
        I: IntoIterator<Item = Result<model::Feature, E>>,
    {
        for f in features {
            self.add_feature(f?);
        }
        Ok(self.finish())
    }

    fn add_feature(&mut self, f: model::Feature) {
        match f {
            model::Feature::Node(n) => self.add_node(n),
            model::Feature::Way(w) => self.add_way(w),
            model::Feature::Relation(r) => self.add_relation(r),
        }
    }

    fn add_node(&mut self, n: model::Node) {
        if !n.tags.is_empty() {
            let access = self.options.profile.access_type(&n.tags);
            if access != AccessType::Yes {
                self.node_access.insert(n.id, access);
            }
        }
        self.nodes.insert(n.id, n.position);
    }

    fn is_inside(&self, p: LatLon) -> bool {
        self.rect.map_or(true, |r| r.contains(p))
    }

    fn add_way(&mut self, w: model::Way) {
        let profile = self.options.profile;
        let Some(speed) = profile.way_speed(&w.tags) else {
            return;
        };

        let access = profile.access_type(&w.tags);
        if access == AccessType::No {
            log::trace!("way {} is not accessible", w.id);
            return;
        }

        let (forward, backward) = profile.way_direction(&w.tags);
        if !forward && !backward {
            log::debug!("way {} is not traversable in any direction", w.id);
            return;
        }

        let mut nodes = self.get_way_nodes(&w);
        if nodes.len() < 2 {
            log::warn!("way {} has less than 2 known nodes", w.id);
            return;
        }

        // Roads are always stored in the allowed direction of one-way ways
        if !forward {
            nodes.reverse();
        }

        let template = RoadGeometry {
            junctions: Vec::default(),
            forward_speed: SpeedKMpH::uniform(speed),
            backward_speed: SpeedKMpH::uniform(speed),
            one_way: !(forward && backward),
            valid: true,
            pass_through_allowed: profile.is_pass_through_allowed(&w.tags),
            routing_options: profile.routing_options(&w.tags),
            is_ferry: is_ferry(&w.tags),
        };
        let conditional = profile.conditional_access(&w.tags);

        let mut run_start: Option<usize> = None;
        for i in 0..nodes.len() - 1 {
            let kept = self.is_inside(nodes[i].1) || self.is_inside(nodes[i + 1].1);
            match (kept, run_start) {
                (true, None) => run_start = Some(i),
                (false, Some(start)) => {
                    self.add_road(w.id, &nodes, start, i, &template, access, &conditional);
                    run_start = None;
                }
                _ => {}
            }
        }
        if let Some(start) = run_start {
            self.add_road(w.id, &nodes, start, nodes.len() - 1, &template, access, &conditional);
        }

        self.way_nodes
            .insert(w.id, nodes.into_iter().map(|(id, _)| id).collect());
    }

    /// Returns the known nodes of a way with their positions,
    /// skipping unknown nodes and consecutive duplicates.
    fn get_way_nodes(&self, w: &model::Way) -> Vec<(i64, LatLon)> {
        let mut nodes: Vec<(i64, LatLon)> = Vec::with_capacity(w.nodes.len());
        for node_id in &w.nodes {
            match self.nodes.get(node_id) {
                Some(&position) => {
                    if nodes.last().map(|&(id, _)| id) != Some(*node_id) {
                        nodes.push((*node_id, position));
                    }
                }
                None => log::trace!("way {} references unknown node {}", w.id, node_id),
            }
        }
        nodes
    }

    /// Adds a road feature made of segments `first_segment..end_point` of a way.
    #[allow(clippy::too_many_arguments)]
    fn add_road(
        &mut self,
        way_id: i64,
        nodes: &[(i64, LatLon)],
        first_segment: usize,
        end_point: usize,
        template: &RoadGeometry,
        access: AccessType,
        conditional: &[ConditionalAccess],
    ) {
        let feature_id = self.roads.len() as u32;
        let run = &nodes[first_segment..=end_point];

        for (idx, pair) in run.windows(2).enumerate() {
            let (back_id, back) = pair[0];
            let (front_id, front) = pair[1];
            self.segment_features.insert((back_id, front_id), feature_id);
            self.segment_features.insert((front_id, back_id), feature_id);

            let front_inside = self.is_inside(front);
            if self.is_inside(back) != front_inside {
                self.transitions.push(TransitionRecord {
                    cross_id: CrossMwmId::Osm {
                        way_id,
                        segment_idx: (first_segment + idx) as u32,
                    },
                    feature_id: FeatureId::Real(feature_id),
                    segment_idx: idx as u32,
                    one_way: template.one_way,
                    forward_is_enter: front_inside,
                    back_point: back,
                    front_point: front,
                });
            }
        }

        if access != AccessType::Yes {
            self.access.set_feature_access(feature_id, access);
        }
        for &c in conditional {
            self.access.add_feature_conditional(feature_id, c);
        }
        for (point_id, (node_id, _)) in run.iter().enumerate() {
            if let Some(&a) = self.node_access.get(node_id) {
                self.access
                    .set_point_access(RoadPoint::new(feature_id, point_id as u32), a);
            }
        }

        self.roads.push(RoadGeometry {
            junctions: run.iter().map(|&(_, p)| Junction::at(p)).collect(),
            ..template.clone()
        });
        self.feature_nodes.push(run.iter().map(|&(id, _)| id).collect());
    }

    fn add_relation(&mut self, r: model::Relation) {
        let profile = self.options.profile;
        let kind = profile.restriction_kind(&r.tags);
        if kind == TurnRestriction::Inapplicable {
            return;
        }

        let nodes = match self.get_restriction_nodes(&r) {
            Ok(nodes) => nodes,
            Err(e) => {
                log::warn!("skipping turn restriction {}: {}", r.id, e);
                return;
            }
        };

        match self.store_restriction(&nodes, kind, profile.is_u_turn_restriction(&r.tags)) {
            Ok(()) => {}
            Err(InvalidRestriction::OutsideRegion) => {
                log::trace!("turn restriction {} is outside of region {}", r.id, self.name)
            }
            Err(e) => log::warn!("skipping turn restriction {}: {}", r.id, e),
        }
    }

    /// Returns the sequence of nodes representing a turn restriction.
    /// Only the last 2 nodes of the `from` and the first 2 nodes of the `to` members
    /// are taken into account.
    fn get_restriction_nodes(&self, r: &model::Relation) -> Result<Vec<i64>, InvalidRestriction> {
        let members = Self::get_ordered_restriction_members(r)?;
        let mut member_nodes = members
            .iter()
            .map(|&m| self.get_relation_member_nodes(m))
            .collect::<Result<Vec<_>, _>>()?;
        flatten_member_nodes(&mut member_nodes)
    }

    /// Returns a list of turn restriction members in the order of from-via-...-via-to.
    /// Ensures there is exactly one `from` and `to`, and at least one `via` member.
    fn get_ordered_restriction_members(
        r: &model::Relation,
    ) -> Result<Vec<&model::RelationMember>, InvalidRestriction> {
        let mut from: Option<&model::RelationMember> = None;
        let mut to: Option<&model::RelationMember> = None;
        let mut order: Vec<&model::RelationMember> = vec![];

        for m in &r.members {
            match m.role.as_str() {
                "from" if from.is_some() => return Err(InvalidRestriction::MultipleFromMembers),
                "from" => from = Some(m),
                "via" => order.push(m),
                "to" if to.is_some() => return Err(InvalidRestriction::MultipleToMembers),
                "to" => to = Some(m),
                _ => {}
            }
        }

        if order.is_empty() {
            return Err(InvalidRestriction::MissingViaMember);
        }

        match (from, to) {
            (Some(from), Some(to)) => {
                order.insert(0, from);
                order.push(to);
                Ok(order)
            }
            (None, _) => Err(InvalidRestriction::MissingFromMember),
            (_, None) => Err(InvalidRestriction::MissingToMember),
        }
    }

    /// Returns a list of nodes corresponding to the given restriction member.
    ///
    /// [FeatureType::Node] references are only permitted for `via` members,
    /// [FeatureType::Way] references are permitted for all members, and
    /// [FeatureType::Relation] references are not permitted.
    fn get_relation_member_nodes(
        &self,
        m: &model::RelationMember,
    ) -> Result<Vec<i64>, InvalidRestriction> {
        match (m.type_, m.role.as_str()) {
            (FeatureType::Node, "via") => {
                if self.nodes.contains_key(&m.ref_) {
                    Ok(vec![m.ref_])
                } else {
                    Err(InvalidRestriction::ReferenceToUnknownNode(m.ref_))
                }
            }

            (FeatureType::Way, _) => self
                .way_nodes
                .get(&m.ref_)
                .cloned()
                .ok_or(InvalidRestriction::ReferenceToUnknownWay(m.ref_)),

            (_, _) => Err(InvalidRestriction::InvalidMemberType(m.role.clone(), m.type_)),
        }
    }

    /// Converts the node sequence of a restriction into a sequence of road features.
    /// Restrictions starting and ending on the same feature are only stored as bans of
    /// turning around at the end of that feature.
    fn store_restriction(
        &mut self,
        nodes: &[i64],
        kind: TurnRestriction,
        is_u_turn: bool,
    ) -> Result<(), InvalidRestriction> {
        let mut features: Vec<u32> = Vec::with_capacity(nodes.len() - 1);
        for pair in nodes.windows(2) {
            let &feature_id = self
                .segment_features
                .get(&(pair[0], pair[1]))
                .ok_or(InvalidRestriction::OutsideRegion)?;
            if features.last() != Some(&feature_id) {
                features.push(feature_id);
            }
        }

        if features.len() == 1 {
            if !is_u_turn || kind != TurnRestriction::Prohibitory {
                return Err(InvalidRestriction::SingleFeature);
            }

            let via = nodes[nodes.len() - 2];
            let feature_nodes = &self.feature_nodes[features[0] as usize];
            let at_the_begin = if feature_nodes.first() == Some(&via) {
                true
            } else if feature_nodes.last() == Some(&via) {
                false
            } else {
                return Err(InvalidRestriction::UTurnInsideFeature);
            };

            self.u_turn_restrictions.push(RestrictionUTurn {
                feature_id: features[0],
                at_the_begin,
            });
            return Ok(());
        }

        match kind {
            TurnRestriction::Prohibitory => self.restrictions.push(Restriction::no(features)),
            TurnRestriction::Mandatory => self.restrictions.push(Restriction::only(features)),
            TurnRestriction::Inapplicable => {
                unreachable!("RegionBuilder::store_restriction called with TurnRestriction::Inapplicable")
            }
        }
        Ok(())
    }

    fn finish(self) -> RegionData {
        let joints = build_joints(self.roads.iter().enumerate().flat_map(|(feature_id, road)| {
            let last = road.junctions.len() - 1;
            road.junctions.iter().enumerate().map(move |(point_id, j)| {
                (
                    RoadPoint::new(feature_id as u32, point_id as u32),
                    j.point,
                    point_id == 0 || point_id == last,
                )
            })
        }));

        let rect = self.rect.unwrap_or_else(|| bounding_rect(&self.roads));

        log::info!(
            "region {}: {} roads, {} joints, {} transitions, {} restrictions",
            self.name,
            self.roads.len(),
            joints.len(),
            self.transitions.len(),
            self.restrictions.len() + self.u_turn_restrictions.len(),
        );

        let network = RoadNetwork {
            joints,
            restrictions: self.restrictions,
            u_turn_restrictions: self.u_turn_restrictions,
            access: self.access,
        };
        let mut region = RegionData::new(self.name, rect, self.roads, network);
        region.transitions = self.transitions;
        region
    }
}

/// Turns a list of turn restriction members' nodes into a list of nodes of the restriction
/// itself. Only the last two nodes of the first member, and the first two nodes of the
/// last are considered.
fn flatten_member_nodes(members: &mut [Vec<i64>]) -> Result<Vec<i64>, InvalidRestriction> {
    assert!(members.len() >= 3);
    let mut nodes = vec![];

    for idx in 0..members.len() {
        let is_first = idx == 0;
        let is_last = idx == members.len() - 1;

        if (is_first || is_last) && members[idx].len() < 2 {
            return Err(InvalidRestriction::Disjoint);
        }

        if is_first {
            // (B-A, B-C) or (B-A, C-B): the first member must end where the second one touches it
            if members[idx].first() == members[1].first() || members[idx].first() == members[1].last()
            {
                members[idx].reverse();
            }
        } else if nodes.last() == members[idx].last() {
            members[idx].reverse();
        }

        if !is_first && nodes.last() != members[idx].first() {
            return Err(InvalidRestriction::Disjoint);
        }

        if is_first {
            // A-B-C-D → C-D
            nodes.extend_from_slice(&members[idx][members[idx].len() - 2..]);
        } else if is_last {
            // A-B-C-D → B, as A was appended with the previous member
            nodes.push(members[idx][1]);
        } else {
            nodes.extend_from_slice(&members[idx][1..]);
        }
    }

    Ok(nodes)
}

/// Returns the smallest [Rect] containing all road points.
fn bounding_rect(roads: &[RoadGeometry]) -> Rect {
    let mut bbox = [f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY];
    for j in roads.iter().flat_map(|r| r.junctions.iter()) {
        bbox[0] = bbox[0].min(j.point.lon);
        bbox[1] = bbox[1].min(j.point.lat);
        bbox[2] = bbox[2].max(j.point.lon);
        bbox[3] = bbox[3].max(j.point.lat);
    }

    // Maximum edges are exclusive
    Rect::from_bbox(bbox).inflated(1e-7)
}

#[derive(Debug, thiserror::Error)]
enum InvalidRestriction {
    #[error("disjoint turn restriction")]
    Disjoint,
    #[error("multiple 'from' members")]
    MultipleFromMembers,
    #[error("multiple 'to' members")]
    MultipleToMembers,
    #[error("missing 'from' member")]
    MissingFromMember,
    #[error("missing 'via' member")]
    MissingViaMember,
    #[error("missing 'to' member")]
    MissingToMember,
    #[error("reference to unknown node {0}")]
    ReferenceToUnknownNode(i64),
    #[error("reference to unknown way {0}")]
    ReferenceToUnknownWay(i64),
    #[error("member with role {0} can't be of type {1}")]
    InvalidMemberType(String, FeatureType),
    #[error("restriction leaves the region")]
    OutsideRegion,
    #[error("restriction starts and ends on the same road")]
    SingleFeature,
    #[error("u-turn restriction in the middle of a road")]
    UTurnInsideFeature,
}
