// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::io;
use std::str::{from_utf8, FromStr};

use quick_xml::events::{BytesStart, Event};

use super::model;
use crate::distance::LatLon;

/// Streams OSM features from buffered XML data.
pub(super) fn features_from_io<R: io::BufRead>(
    reader: R,
) -> impl Iterator<Item = Result<model::Feature, quick_xml::Error>> {
    Reader::from_io(reader)
}

/// Streams OSM features from in-memory XML data.
pub(super) fn features_from_buffer(
    b: &[u8],
) -> impl Iterator<Item = Result<model::Feature, quick_xml::Error>> + '_ {
    Reader::from_buffer(b)
}

/// Parser is a trait for objects which can parse XML.
///
/// This trait only exists to fix the mismatch of
/// [quick_xml::Reader::read_event] when working on buffered data
/// and [quick_xml::Reader::read_event_into] when working on IO.
trait Parser {
    fn read_event<'a>(&'a mut self) -> quick_xml::Result<Event<'a>>;
}

/// IoParser implements [Parser] over an [std::io::BufRead].
struct IoParser<R: io::BufRead>(quick_xml::Reader<R>, Vec<u8>);

impl<R: io::BufRead> IoParser<R> {
    #[inline]
    fn new(reader: R) -> Self {
        Self(quick_xml::Reader::from_reader(reader), Vec::default())
    }
}

impl<R: io::BufRead> Parser for IoParser<R> {
    #[inline]
    fn read_event<'a>(&'a mut self) -> quick_xml::Result<Event<'a>> {
        self.0.read_event_into(&mut self.1)
    }
}

/// BufParser implements [Parser] over a slice of bytes (`&[u8]`).
struct BufParser<'a>(quick_xml::Reader<&'a [u8]>);

impl<'a> BufParser<'a> {
    #[inline]
    fn new(data: &'a [u8]) -> Self {
        Self(quick_xml::Reader::from_reader(data))
    }
}

impl<'a> Parser for BufParser<'a> {
    #[inline]
    fn read_event<'b>(&'b mut self) -> quick_xml::Result<Event<'b>> {
        self.0.read_event()
    }
}

/// Streams [Features](model::Feature) out of OSM XML. Child elements
/// (`<tag>`, `<nd>`, `<member>`) are collected into the currently open feature.
struct Reader<P: Parser> {
    parser: P,
    eof: bool,
}

impl<P: Parser> Reader<P> {
    #[inline]
    fn new(parser: P) -> Self {
        Self { parser, eof: false }
    }
}

impl<P: Parser> Iterator for Reader<P> {
    type Item = Result<model::Feature, quick_xml::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut open: Option<model::Feature> = None;

        while !self.eof {
            let event = match self.parser.read_event() {
                Ok(e) => e,
                Err(e) => return Some(Err(e)),
            };

            match event {
                Event::Empty(e) => match e.local_name().as_ref() {
                    // Self-closing nodes carry no tags. Ways and relations are never self-closing.
                    b"node" => {
                        if let Some(f) = parse_feature(model::FeatureType::Node, &e) {
                            return Some(Ok(f));
                        }
                    }
                    b"tag" => {
                        if let (Some(f), Some((k, v))) = (open.as_mut(), parse_tag(&e)) {
                            f.tags_mut().insert(k, v);
                        }
                    }
                    b"nd" => {
                        if let (Some(nodes), Some(ref_)) =
                            (open.as_mut().and_then(|f| f.nodes_mut()), attribute(&e, b"ref"))
                        {
                            nodes.push(ref_);
                        }
                    }
                    b"member" => {
                        if let (Some(members), Some(m)) =
                            (open.as_mut().and_then(|f| f.members_mut()), parse_member(&e))
                        {
                            members.push(m);
                        }
                    }
                    _ => {}
                },

                Event::Start(e) => {
                    if let Some(type_) = model::FeatureType::from_name(e.local_name().as_ref()) {
                        open = parse_feature(type_, &e);
                    }
                }

                Event::End(e) => {
                    if model::FeatureType::from_name(e.local_name().as_ref()).is_some() {
                        if let Some(f) = open.take() {
                            return Some(Ok(f));
                        }
                    }
                }

                Event::Eof => self.eof = true,

                _ => {}
            }
        }

        open.map(Ok)
    }
}

impl<'a> Reader<BufParser<'a>> {
    #[inline]
    fn from_buffer(data: &'a [u8]) -> Self {
        Self::new(BufParser::new(data))
    }
}

impl<R: io::BufRead> Reader<IoParser<R>> {
    #[inline]
    fn from_io(reader: R) -> Self {
        Self::new(IoParser::new(reader))
    }
}

/// Parses the value of the `key` attribute of an element.
fn attribute<T: FromStr>(e: &BytesStart<'_>, key: &[u8]) -> Option<T> {
    let attr = e.try_get_attribute(key).ok()??;
    from_utf8(&attr.value).ok()?.parse().ok()
}

/// Parses the opening `<node>`, `<way>` or `<relation>` element.
/// Features without a non-zero id (or nodes without a position) are logged and skipped.
fn parse_feature(type_: model::FeatureType, e: &BytesStart<'_>) -> Option<model::Feature> {
    let f = parse_feature_attributes(type_, e);
    if f.is_none() {
        log::warn!("skipping malformed <{}> element", type_);
    }
    f
}

fn parse_feature_attributes(type_: model::FeatureType, e: &BytesStart<'_>) -> Option<model::Feature> {
    let id: i64 = attribute(e, b"id").filter(|&id| id != 0)?;

    match type_ {
        model::FeatureType::Node => {
            let lat: f64 = attribute(e, b"lat").filter(|v: &f64| v.is_finite())?;
            let lon: f64 = attribute(e, b"lon").filter(|v: &f64| v.is_finite())?;
            Some(model::Feature::Node(model::Node {
                id,
                position: LatLon::new(lat, lon),
                tags: HashMap::default(),
            }))
        }

        model::FeatureType::Way => Some(model::Feature::Way(model::Way {
            id,
            nodes: Vec::default(),
            tags: HashMap::default(),
        })),

        model::FeatureType::Relation => Some(model::Feature::Relation(model::Relation {
            id,
            members: Vec::default(),
            tags: HashMap::default(),
        })),
    }
}

fn parse_tag(e: &BytesStart<'_>) -> Option<(String, String)> {
    let k: String = attribute(e, b"k")?;
    let v: String = attribute(e, b"v").unwrap_or_default();
    Some((k, v))
}

fn parse_member(e: &BytesStart<'_>) -> Option<model::RelationMember> {
    let ref_: i64 = attribute(e, b"ref").filter(|&r| r != 0)?;
    let type_ = model::FeatureType::from_name(&e.try_get_attribute(b"type").ok()??.value)?;
    let role: String = attribute(e, b"role")?;
    Some(model::RelationMember { type_, ref_, role })
}

#[cfg(test)]
mod tests {
    use super::model::{Feature, FeatureType, Node, Relation, RelationMember, Way};
    use super::*;

    macro_rules! tags {
        {} => { HashMap::default() };
        {$( $k:literal : $v:literal ),+} => {
            HashMap::from_iter([ $( ($k.to_string(), $v.to_string()) ),+ ])
        };
    }

    const TWO_REGIONS_XML: &[u8] = include_bytes!("test_fixtures/two_regions.osm");

    fn node(id: i64, lat: f64, lon: f64) -> Node {
        Node {
            id,
            position: LatLon::new(lat, lon),
            tags: HashMap::default(),
        }
    }

    fn member(type_: FeatureType, ref_: i64, role: &str) -> RelationMember {
        RelationMember {
            type_,
            ref_,
            role: role.to_string(),
        }
    }

    fn get_expected_nodes() -> Vec<Node> {
        vec![
            node(-1, 0.0, 0.0),
            node(-2, 0.0, 0.01),
            node(-3, 0.0, 0.03),
            node(-4, 0.0, 0.04),
            node(-5, 0.01, 0.01),
            node(-6, 0.01, 0.03),
            Node {
                tags: tags! {"access": "private", "barrier": "gate"},
                ..node(-7, -0.01, 0.01)
            },
        ]
    }

    fn get_expected_ways() -> Vec<Way> {
        vec![
            Way {
                id: -100,
                nodes: vec![-1, -2],
                tags: tags! {"highway": "primary"},
            },
            Way {
                id: -101,
                nodes: vec![-2, -3, -4],
                tags: tags! {"highway": "primary", "toll": "yes"},
            },
            Way {
                id: -102,
                nodes: vec![-5, -6],
                tags: tags! {"highway": "secondary", "oneway": "yes"},
            },
            Way {
                id: -103,
                nodes: vec![-2, -5],
                tags: tags! {"highway": "residential"},
            },
            Way {
                id: -104,
                nodes: vec![-3, -6],
                tags: tags! {"highway": "residential"},
            },
            Way {
                id: -105,
                nodes: vec![-7, -2],
                tags: tags! {"highway": "unclassified"},
            },
            Way {
                id: -106,
                nodes: vec![-1, -7],
                tags: tags! {"highway": "residential", "motor_vehicle": "no"},
            },
        ]
    }

    fn get_expected_relations() -> Vec<Relation> {
        vec![
            Relation {
                id: -200,
                members: vec![
                    member(FeatureType::Way, -103, "from"),
                    member(FeatureType::Node, -2, "via"),
                    member(FeatureType::Way, -100, "to"),
                ],
                tags: tags! {"restriction": "no_left_turn", "type": "restriction"},
            },
            Relation {
                id: -201,
                members: vec![
                    member(FeatureType::Way, -100, "from"),
                    member(FeatureType::Node, -2, "via"),
                    member(FeatureType::Way, -101, "to"),
                ],
                tags: tags! {"restriction": "only_straight_on", "type": "restriction"},
            },
            Relation {
                id: -202,
                members: vec![
                    member(FeatureType::Way, -104, "from"),
                    member(FeatureType::Node, -3, "via"),
                    member(FeatureType::Way, -104, "to"),
                ],
                tags: tags! {"restriction": "no_u_turn", "type": "restriction"},
            },
            Relation {
                id: -203,
                members: vec![
                    member(FeatureType::Way, -105, "from"),
                    member(FeatureType::Node, -2, "via"),
                    member(FeatureType::Way, -103, "to"),
                ],
                tags: tags! {"except": "motorcar", "restriction": "no_right_turn", "type": "restriction"},
            },
        ]
    }

    fn collect_all<I, E>(features: I) -> Result<(Vec<Node>, Vec<Way>, Vec<Relation>), E>
    where
        I: Iterator<Item = Result<Feature, E>>,
    {
        let mut nodes = Vec::default();
        let mut ways = Vec::default();
        let mut relations = Vec::default();

        for f in features {
            match f? {
                Feature::Node(n) => nodes.push(n),
                Feature::Way(w) => ways.push(w),
                Feature::Relation(r) => relations.push(r),
            }
        }

        Ok((nodes, ways, relations))
    }

    fn check_against_expected<I, E>(features: I) -> Result<(), E>
    where
        I: Iterator<Item = Result<Feature, E>>,
    {
        let (nodes, ways, relations) = collect_all(features)?;
        assert_eq!(nodes, get_expected_nodes());
        assert_eq!(ways, get_expected_ways());
        assert_eq!(relations, get_expected_relations());
        Ok(())
    }

    #[test]
    fn parse_from_buf() -> Result<(), quick_xml::Error> {
        check_against_expected(features_from_buffer(TWO_REGIONS_XML))
    }

    #[test]
    fn parse_from_io() -> Result<(), quick_xml::Error> {
        check_against_expected(features_from_io(io::Cursor::new(TWO_REGIONS_XML)))
    }

    #[test]
    fn skips_malformed_elements() -> Result<(), quick_xml::Error> {
        const DATA: &[u8] = b"<osm>\
            <node id='1' lat='foo' lon='0.0' />\
            <node id='2' lat='0.5' lon='0.5' />\
            <way id='0'><nd ref='2' /></way>\
            </osm>";
        let (nodes, ways, relations) = collect_all(features_from_buffer(DATA))?;
        assert_eq!(nodes, vec![node(2, 0.5, 0.5)]);
        assert!(ways.is_empty());
        assert!(relations.is_empty());
        Ok(())
    }
}
