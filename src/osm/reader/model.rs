// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use crate::distance::LatLon;

pub type Tags = HashMap<String, String>;

/// [OSM node](https://wiki.openstreetmap.org/wiki/Node). Only nodes with tags
/// influence routing beyond their position (barriers, access restrictions).
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: i64,
    pub position: LatLon,
    pub tags: Tags,
}

/// [OSM way](https://wiki.openstreetmap.org/wiki/Way), a candidate road.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Way {
    pub id: i64,
    pub nodes: Vec<i64>,
    pub tags: Tags,
}

/// Kind of an [OSM element](https://wiki.openstreetmap.org/wiki/Elements),
/// as referenced by relation members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureType {
    Node,
    Way,
    Relation,
}

impl FeatureType {
    pub fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"node" => Some(Self::Node),
            b"way" => Some(Self::Way),
            b"relation" => Some(Self::Relation),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
        }
    }
}

impl std::fmt::Display for FeatureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationMember {
    pub type_: FeatureType,
    pub ref_: i64,
    pub role: String,
}

/// [OSM relation](https://wiki.openstreetmap.org/wiki/Relation). Only turn restrictions
/// are of interest when building regions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub id: i64,
    pub members: Vec<RelationMember>,
    pub tags: Tags,
}

/// Any element read from an OSM file.
#[derive(Debug, Clone)]
pub enum Feature {
    Node(Node),
    Way(Way),
    Relation(Relation),
}

impl Feature {
    pub fn tags_mut(&mut self) -> &mut Tags {
        match self {
            Self::Node(n) => &mut n.tags,
            Self::Way(w) => &mut w.tags,
            Self::Relation(r) => &mut r.tags,
        }
    }

    /// Node references of a way, [None] for other features.
    pub fn nodes_mut(&mut self) -> Option<&mut Vec<i64>> {
        match self {
            Self::Way(w) => Some(&mut w.nodes),
            _ => None,
        }
    }

    /// Members of a relation, [None] for other features.
    pub fn members_mut(&mut self) -> Option<&mut Vec<RelationMember>> {
        match self {
            Self::Relation(r) => Some(&mut r.members),
            _ => None,
        }
    }
}
