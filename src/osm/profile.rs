// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use crate::index_graph::{AccessType, ConditionalAccess, HourWindow};
use crate::RoutingOptions;

/// Describes how to convert OSM ways and relations into region roads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Profile<'a> {
    /// Human readable name of the routing profile,
    /// customary the most specific [access tag](https://wiki.openstreetmap.org/wiki/Key:access).
    ///
    /// When set to "foot", `oneway` tags are ignored (only `oneway:foot` is considered),
    /// except on footways, paths, steps and platforms, and only `restriction:foot`
    /// turn restrictions are considered.
    pub name: &'a str,

    /// Speeds of ways, by exact key and value match. The first matching rule wins.
    /// Ways without any matching rule are not used for routing.
    pub speeds: &'a [SpeedRule<'a>],

    /// OSM [access tags](https://wiki.openstreetmap.org/wiki/Key:access#Land-based_transportation)
    /// (in order from least to most specific) to consider when checking for road access,
    /// one-way and turn restrictions.
    pub access: &'a [&'a str],

    /// Force no routing over [motorroad=yes](https://wiki.openstreetmap.org/wiki/Key:motorroad) ways.
    pub disallow_motorroad: bool,

    /// Force ignoring of [turn restrictions](https://wiki.openstreetmap.org/wiki/Turn_restriction).
    pub disable_restrictions: bool,
}

/// Speed of OSM ways with a specific key and value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedRule<'a> {
    /// Key of an OSM way for which this rule applies, e.g. "highway" or "route".
    pub key: &'a str,

    /// Value under [SpeedRule::key], e.g. "motorway" or "ferry".
    pub value: &'a str,

    /// Speed in km/h. Must be positive and finite.
    pub speed: f64,
}

/// Turn restriction kind indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRestriction {
    /// Not a turn restriction, or a turn restriction which does not apply for the current [Profile].
    Inapplicable,

    /// The sequence of ways indicated by this restriction is prohibited.
    Prohibitory,

    /// The sequence of ways must be followed after entering the first one.
    Mandatory,
}

impl<'a> Profile<'a> {
    /// Returns the speed of a way with given tags in km/h, or [None] if the way
    /// can't be used for routing at all.
    pub fn way_speed(&self, tags: &HashMap<String, String>) -> Option<f64> {
        if self.disallow_motorroad && tags.get("motorroad").map(|v| v.as_str()) == Some("yes") {
            return None;
        }

        let speed = self.speeds.iter().find_map(|r| {
            if tags.get(r.key).map(|v| v.as_str()) == Some(r.value) {
                Some(r.speed)
            } else {
                None
            }
        })?;

        if speed.is_finite() && speed > 0.0 {
            Some(speed)
        } else {
            None
        }
    }

    /// Returns the most specific access value of a way, as per [Profile::access].
    pub fn access_type(&self, tags: &HashMap<String, String>) -> AccessType {
        self.access
            .iter()
            .rev()
            .find_map(|&mode| tags.get(mode))
            .map_or(AccessType::Yes, |v| parse_access(v))
    }

    /// Returns access values of a way applying only at some hours of the day,
    /// from the most specific `MODE:conditional` tag.
    ///
    /// Only the `VALUE @ (HH:MM-HH:MM)` form is understood, possibly with multiple
    /// conditions separated by semicolons. Other conditions are ignored.
    pub fn conditional_access(&self, tags: &HashMap<String, String>) -> Vec<ConditionalAccess> {
        let Some(value) = self
            .access
            .iter()
            .rev()
            .find_map(|&mode| tags.get(&format!("{}:conditional", mode)))
        else {
            return Vec::default();
        };

        value
            .split(';')
            .filter_map(|condition| {
                let (access, window) = condition.split_once('@')?;
                let window = window.trim().trim_start_matches('(').trim_end_matches(')');
                let (start, end) = window.split_once('-')?;
                Some(ConditionalAccess {
                    access: parse_access(access.trim()),
                    window: HourWindow::new(parse_hour(start)?, parse_hour(end)?),
                })
            })
            .collect()
    }

    /// Returns the [RoutingOptions] a way with given tags falls under.
    pub fn routing_options(&self, tags: &HashMap<String, String>) -> RoutingOptions {
        let mut options = RoutingOptions::NONE;
        if tags.get("toll").map(|v| v.as_str()) == Some("yes") {
            options.add(RoutingOptions::TOLL);
        }
        if let Some("motorway" | "motorway_link") = tags.get("highway").map(|v| v.as_str()) {
            options.add(RoutingOptions::MOTORWAY);
        }
        if is_ferry(tags) {
            options.add(RoutingOptions::FERRY);
        }
        if let Some("unpaved" | "dirt" | "ground" | "gravel" | "sand" | "mud" | "grass") =
            tags.get("surface").map(|v| v.as_str())
        {
            options.add(RoutingOptions::DIRT);
        }
        return options;
    }

    /// Returns false for ways which should only be used at the beginning or the end of a route.
    pub fn is_pass_through_allowed(&self, tags: &HashMap<String, String>) -> bool {
        if self.access_type(tags) == AccessType::Destination {
            return false;
        }
        !matches!(tags.get("highway").map(|v| v.as_str()), Some("living_street" | "service"))
    }

    /// Checks if a way is traversable forward (first return value) and
    /// backwards (second return value) by investigating mode-specific and generic one-way tags.
    ///
    /// Some ways (highway=motorway, highway=motorway_link, junction=roundabout and
    /// junction=circular) default to being one-way, except if overridden by specific tags.
    pub fn way_direction(&self, tags: &HashMap<String, String>) -> (bool, bool) {
        let mut forward = true;
        let mut backward = true;

        if !self.apply_foot_exceptions() {
            if let Some("motorway" | "motorway_link") = tags.get("highway").map(|s| s.as_str()) {
                backward = false;
            }
            if let Some("roundabout" | "circular") = tags.get("junction").map(|s| s.as_str()) {
                backward = false;
            }
        }

        match self.active_oneway_value(tags) {
            "yes" | "true" | "1" => {
                forward = true;
                backward = false;
            }

            "-1" | "reverse" => {
                forward = false;
                backward = true;
            }

            "no" => {
                forward = true;
                backward = true;
            }

            _ => {}
        }

        return (forward, backward);
    }

    /// Returns the value of the most specific "oneway:MODE" tag, falling back to "oneway".
    fn active_oneway_value<'t>(&self, tags: &'t HashMap<String, String>) -> &'t str {
        if self.apply_foot_exceptions() {
            if let Some(oneway_foot) = tags.get("oneway:foot") {
                return oneway_foot.as_str();
            }
            if generic_oneway_applies_on_foot(tags) {
                if let Some(oneway) = tags.get("oneway") {
                    return oneway.as_str();
                }
            }
            return "";
        }

        self.access
            .iter()
            .rev()
            .filter(|&&mode| mode != "access")
            .find_map(|&mode| tags.get(&format!("oneway:{}", mode)))
            .or_else(|| tags.get("oneway"))
            .map_or("", |v| v.as_str())
    }

    /// Figures out what kind of [TurnRestriction] a relation with given tags represents.
    pub fn restriction_kind(&self, tags: &HashMap<String, String>) -> TurnRestriction {
        if self.disable_restrictions
            || tags.get("type").map(|v| v.as_str()) != Some("restriction")
            || self.is_exempted(tags)
        {
            return TurnRestriction::Inapplicable;
        }

        let (kind, description) = self
            .active_restriction_tag(tags)
            .split_once('_')
            .unwrap_or(("", ""));

        match description {
            "right_turn" | "left_turn" | "u_turn" | "straight_on" => {}
            _ => return TurnRestriction::Inapplicable,
        }

        match kind {
            "no" => TurnRestriction::Prohibitory,
            "only" => TurnRestriction::Mandatory,
            _ => TurnRestriction::Inapplicable,
        }
    }

    /// Returns true if the relation is a prohibition of turning around.
    pub fn is_u_turn_restriction(&self, tags: &HashMap<String, String>) -> bool {
        self.active_restriction_tag(tags) == "no_u_turn"
    }

    /// Returns true if [Profile::access] intersects with any mode present in the `except` tag.
    pub fn is_exempted(&self, tags: &HashMap<String, String>) -> bool {
        tags.get("except")
            .map_or("", |v| v.as_str())
            .split(';')
            .any(|exempted_type| self.access.contains(&exempted_type))
    }

    fn active_restriction_tag<'t>(&self, tags: &'t HashMap<String, String>) -> &'t str {
        if self.apply_foot_exceptions() {
            return tags.get("restriction:foot").map_or("", |v| v.as_str());
        }

        self.access
            .iter()
            .rev()
            .filter(|&&mode| mode != "access")
            .find_map(|&mode| tags.get(&format!("restriction:{}", mode)))
            .or_else(|| tags.get("restriction"))
            .map_or("", |v| v.as_str())
    }

    fn apply_foot_exceptions(&self) -> bool {
        self.name == "foot"
    }
}

pub(super) fn is_ferry(tags: &HashMap<String, String>) -> bool {
    tags.get("route").map(|v| v.as_str()) == Some("ferry")
}

fn parse_access(value: &str) -> AccessType {
    match value {
        "no" => AccessType::No,
        "private" => AccessType::Private,
        "destination" | "delivery" => AccessType::Destination,
        _ => AccessType::Yes,
    }
}

/// Parses "HH:MM" into an hour, rounding minutes down.
fn parse_hour(s: &str) -> Option<u8> {
    let (hour, _) = s.trim().split_once(':')?;
    let hour: u8 = hour.parse().ok()?;
    if hour <= 24 {
        Some(hour % 24)
    } else {
        None
    }
}

/// On foot, the generic "oneway" tag only applies to footways, paths, steps and platforms.
fn generic_oneway_applies_on_foot(tags: &HashMap<String, String>) -> bool {
    if let Some("footway" | "path" | "steps" | "platform") = tags.get("highway").map(|v| v.as_str()) {
        return true;
    }
    tags.get("public_transport").map(|v| v.as_str()) == Some("platform")
        || tags.get("railway").map(|v| v.as_str()) == Some("platform")
}

macro_rules! speed_rules {
    ($( $k:literal = $v:literal : $s:expr ),+ $(,)?) => {
        &[ $( SpeedRule { key: $k, value: $v, speed: $s } ),+ ]
    };
}

/// Example routing [Profile] for cars with typical road speeds
/// and with appropriate [access tags](https://wiki.openstreetmap.org/wiki/Key:access).
pub const CAR_PROFILE: Profile = Profile {
    name: "motorcar",
    speeds: speed_rules![
        "highway" = "motorway": 115.0,
        "highway" = "motorway_link": 60.0,
        "highway" = "trunk": 90.0,
        "highway" = "trunk_link": 50.0,
        "highway" = "primary": 65.0,
        "highway" = "primary_link": 40.0,
        "highway" = "secondary": 55.0,
        "highway" = "secondary_link": 35.0,
        "highway" = "tertiary": 45.0,
        "highway" = "tertiary_link": 30.0,
        "highway" = "unclassified": 35.0,
        "highway" = "minor": 35.0,
        "highway" = "residential": 25.0,
        "highway" = "living_street": 10.0,
        "highway" = "track": 10.0,
        "highway" = "service": 15.0,
        "route" = "ferry": 25.0,
    ],
    access: &["access", "vehicle", "motor_vehicle", "motorcar"],
    disallow_motorroad: false,
    disable_restrictions: false,
};

/// Example routing [Profile] for bicycles, avoiding motor roads.
pub const BICYCLE_PROFILE: Profile = Profile {
    name: "bicycle",
    speeds: speed_rules![
        "highway" = "cycleway": 20.0,
        "highway" = "trunk": 15.0,
        "highway" = "trunk_link": 15.0,
        "highway" = "primary": 17.0,
        "highway" = "primary_link": 17.0,
        "highway" = "secondary": 18.0,
        "highway" = "secondary_link": 18.0,
        "highway" = "tertiary": 18.0,
        "highway" = "tertiary_link": 18.0,
        "highway" = "unclassified": 18.0,
        "highway" = "minor": 18.0,
        "highway" = "residential": 18.0,
        "highway" = "living_street": 12.0,
        "highway" = "track": 12.0,
        "highway" = "service": 15.0,
        "highway" = "path": 12.0,
        "highway" = "bridleway": 10.0,
        "highway" = "footway": 6.0,
        "highway" = "pedestrian": 6.0,
        "route" = "ferry": 15.0,
    ],
    access: &["access", "vehicle", "bicycle"],
    disallow_motorroad: true,
    disable_restrictions: false,
};

/// Example routing [Profile] for walking
/// with appropriate [access tags](https://wiki.openstreetmap.org/wiki/Key:access).
pub const FOOT_PROFILE: Profile = Profile {
    name: "foot",
    speeds: speed_rules![
        "highway" = "trunk": 3.5,
        "highway" = "trunk_link": 3.5,
        "highway" = "primary": 4.0,
        "highway" = "primary_link": 4.0,
        "highway" = "secondary": 4.5,
        "highway" = "secondary_link": 4.5,
        "highway" = "tertiary": 4.5,
        "highway" = "tertiary_link": 4.5,
        "highway" = "unclassified": 4.5,
        "highway" = "minor": 4.5,
        "highway" = "residential": 4.5,
        "highway" = "living_street": 5.0,
        "highway" = "track": 4.5,
        "highway" = "service": 4.5,
        "highway" = "bridleway": 4.5,
        "highway" = "footway": 5.0,
        "highway" = "path": 4.5,
        "highway" = "steps": 3.0,
        "highway" = "pedestrian": 5.0,
        "highway" = "platform": 4.5,
        "railway" = "platform": 4.5,
        "public_transport" = "platform": 4.5,
        "route" = "ferry": 10.0,
    ],
    access: &["access", "foot"],
    disallow_motorroad: true,
    disable_restrictions: false,
};

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_PROFILE: Profile = Profile {
        name: "cat",
        speeds: speed_rules![
            "highway" = "footway": 10.0,
            "highway" = "path": 5.0,
        ],
        access: &["access", "cat"],
        disallow_motorroad: false,
        disable_restrictions: false,
    };

    const TEST_PROFILE_WITHOUT_MOTORROAD: Profile = Profile {
        disallow_motorroad: true,
        ..TEST_PROFILE
    };

    const TEST_PROFILE_WITHOUT_RESTRICTIONS: Profile = Profile {
        disable_restrictions: true,
        ..TEST_PROFILE
    };

    macro_rules! tags {
        {} => { HashMap::default() };
        {$( $k:literal : $v:literal ),+} => {
            HashMap::from_iter([ $( ($k.to_string(), $v.to_string()) ),+ ])
        };
    }

    #[test]
    fn way_speed() {
        assert_eq!(TEST_PROFILE.way_speed(&tags! {"highway": "footway"}), Some(10.0));
        assert_eq!(TEST_PROFILE.way_speed(&tags! {"highway": "path"}), Some(5.0));
        assert_eq!(TEST_PROFILE.way_speed(&tags! {"highway": "motorway"}), None);
        assert_eq!(TEST_PROFILE.way_speed(&tags! {}), None);
        assert_eq!(
            TEST_PROFILE.way_speed(&tags! {"highway": "path", "access": "no"}),
            Some(5.0),
        );
        assert_eq!(
            TEST_PROFILE.way_speed(&tags! {"highway": "path", "motorroad": "yes"}),
            Some(5.0),
        );
        assert_eq!(
            TEST_PROFILE_WITHOUT_MOTORROAD.way_speed(&tags! {"highway": "path", "motorroad": "yes"}),
            None,
        );
    }

    #[test]
    fn access_type() {
        assert_eq!(TEST_PROFILE.access_type(&tags! {"highway": "footway"}), AccessType::Yes);
        assert_eq!(
            TEST_PROFILE.access_type(&tags! {"highway": "footway", "access": "no"}),
            AccessType::No,
        );
        assert_eq!(
            TEST_PROFILE.access_type(&tags! {"highway": "footway", "access": "private"}),
            AccessType::Private,
        );
        assert_eq!(
            TEST_PROFILE.access_type(&tags! {"highway": "footway", "access": "destination"}),
            AccessType::Destination,
        );
        assert_eq!(
            TEST_PROFILE.access_type(&tags! {"highway": "footway", "access": "no", "cat": "yes"}),
            AccessType::Yes,
        );
    }

    #[test]
    fn conditional_access() {
        assert_eq!(
            TEST_PROFILE.conditional_access(&tags! {"cat:conditional": "no @ (22:00-06:00)"}),
            vec![ConditionalAccess {
                access: AccessType::No,
                window: HourWindow::new(22, 6),
            }],
        );
        assert_eq!(
            TEST_PROFILE.conditional_access(
                &tags! {"access:conditional": "private @ (07:30-09:00); no @ (weekend)"}
            ),
            vec![ConditionalAccess {
                access: AccessType::Private,
                window: HourWindow::new(7, 9),
            }],
        );
        assert!(TEST_PROFILE.conditional_access(&tags! {"highway": "path"}).is_empty());
    }

    #[test]
    fn routing_options() {
        assert_eq!(TEST_PROFILE.routing_options(&tags! {"highway": "path"}), RoutingOptions::NONE);
        assert_eq!(
            TEST_PROFILE.routing_options(&tags! {"highway": "motorway", "toll": "yes"}),
            RoutingOptions::MOTORWAY | RoutingOptions::TOLL,
        );
        assert_eq!(
            TEST_PROFILE.routing_options(&tags! {"route": "ferry", "surface": "gravel"}),
            RoutingOptions::FERRY | RoutingOptions::DIRT,
        );
    }

    #[test]
    fn way_direction() {
        assert_eq!(TEST_PROFILE.way_direction(&tags! {"highway": "path"}), (true, true));
        assert_eq!(
            TEST_PROFILE.way_direction(&tags! {"highway": "path", "oneway": "yes"}),
            (true, false),
        );
        assert_eq!(
            TEST_PROFILE.way_direction(&tags! {"highway": "path", "oneway": "-1"}),
            (false, true),
        );
        assert_eq!(
            TEST_PROFILE.way_direction(&tags! {"highway": "motorway_link"}),
            (true, false),
        );
        assert_eq!(
            TEST_PROFILE.way_direction(&tags! {"highway": "path", "junction": "roundabout"}),
            (true, false),
        );
        assert_eq!(
            TEST_PROFILE.way_direction(&tags! {"highway": "motorway_link", "oneway": "no"}),
            (true, true),
        );
        assert_eq!(
            TEST_PROFILE.way_direction(&tags! {"junction": "circular", "oneway": "-1"}),
            (false, true),
        );
    }

    #[test]
    fn way_direction_foot() {
        assert_eq!(FOOT_PROFILE.way_direction(&tags! {"highway": "residential"}), (true, true));
        assert_eq!(
            FOOT_PROFILE.way_direction(&tags! {"highway": "residential", "oneway": "yes"}),
            (true, true),
        );
        assert_eq!(
            FOOT_PROFILE.way_direction(&tags! {"highway": "residential", "oneway:foot": "yes"}),
            (true, false),
        );
        assert_eq!(
            FOOT_PROFILE.way_direction(&tags! {"highway": "path", "oneway": "yes"}),
            (true, false),
        );
    }

    #[test]
    fn restriction_kind() {
        assert_eq!(
            TEST_PROFILE.restriction_kind(&tags! {"type": "multipolygon"}),
            TurnRestriction::Inapplicable,
        );
        assert_eq!(
            TEST_PROFILE.restriction_kind(&tags! {"type": "restriction", "restriction": "no_u_turn"}),
            TurnRestriction::Prohibitory,
        );
        assert_eq!(
            TEST_PROFILE
                .restriction_kind(&tags! {"type": "restriction", "restriction": "only_left_turn"}),
            TurnRestriction::Mandatory,
        );
        assert_eq!(
            TEST_PROFILE.restriction_kind(
                &tags! {"type": "restriction", "restriction": "only_left_turn", "except": "psv;cat"}
            ),
            TurnRestriction::Inapplicable,
        );
        assert_eq!(
            TEST_PROFILE_WITHOUT_RESTRICTIONS
                .restriction_kind(&tags! {"type": "restriction", "restriction": "no_u_turn"}),
            TurnRestriction::Inapplicable,
        );
        assert_eq!(
            TEST_PROFILE
                .restriction_kind(&tags! {"type": "restriction", "restriction:cat": "no_u_turn"}),
            TurnRestriction::Prohibitory,
        );
        assert!(TEST_PROFILE
            .is_u_turn_restriction(&tags! {"type": "restriction", "restriction:cat": "no_u_turn"}));
        assert!(!TEST_PROFILE
            .is_u_turn_restriction(&tags! {"type": "restriction", "restriction": "no_left_turn"}));
    }

    #[test]
    fn restriction_kind_foot() {
        assert_eq!(
            FOOT_PROFILE.restriction_kind(&tags! {"type": "restriction", "restriction": "no_u_turn"}),
            TurnRestriction::Inapplicable,
        );
        assert_eq!(
            FOOT_PROFILE
                .restriction_kind(&tags! {"type": "restriction", "restriction:foot": "no_u_turn"}),
            TurnRestriction::Prohibitory,
        );
    }

    #[test]
    fn is_exempted() {
        assert!(!TEST_PROFILE.is_exempted(&tags! {}));
        assert!(!TEST_PROFILE.is_exempted(&tags! {"except": "car"}));
        assert!(TEST_PROFILE.is_exempted(&tags! {"except": "cat"}));
        assert!(TEST_PROFILE.is_exempted(&tags! {"except": "psv;cat"}));
    }
}
