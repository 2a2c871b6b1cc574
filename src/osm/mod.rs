// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Loading of regions from [OpenStreetMap](https://www.openstreetmap.org/) data.

mod profile;
mod reader;

pub use profile::{
    Profile, SpeedRule, TurnRestriction, BICYCLE_PROFILE, CAR_PROFILE, FOOT_PROFILE,
};
pub use reader::{
    load_region_from_buffer, load_region_from_file, load_region_from_io, Error, FileFormat,
    Options,
};

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::cross_mwm::CrossMwmId;
    use crate::distance::LatLon;
    use crate::estimator::{EdgeEstimator, SpeedEstimator};
    use crate::index_graph::{AccessType, Confidence, Restriction, RestrictionUTurn};
    use crate::loader::{RegionData, RegionSet};
    use crate::world_graph::{SingleVehicleWorldGraph, WorldGraph, WorldGraphMode};
    use crate::{find_route, FeatureId, RoadPoint, RoutingOptions, SearchParams};

    const DATA: &[u8] = include_bytes!("reader/test_fixtures/two_regions.osm");
    const DATA_GZ: &[u8] = include_bytes!("reader/test_fixtures/two_regions.osm.gz");
    const DATA_BZ2: &[u8] = include_bytes!("reader/test_fixtures/two_regions.osm.bz2");

    const WEST_BBOX: [f64; 4] = [-0.005, -0.015, 0.02, 0.015];
    const EAST_BBOX: [f64; 4] = [0.02, -0.015, 0.045, 0.015];

    macro_rules! assert_almost_eq {
        ($a:expr, $b:expr) => {
            assert!(
                (($a - $b).abs() < 1e-4),
                "assertion failed: {} ≈ {}",
                $a,
                $b
            )
        };
    }

    fn load(data: &[u8], file_format: FileFormat, bbox: [f64; 4]) -> RegionData {
        let options = Options {
            profile: &CAR_PROFILE,
            file_format,
            bbox,
        };
        load_region_from_buffer("test", &options, data).unwrap()
    }

    //   5 ──102──> 6
    //   │          │
    //  103  ┊     104
    //   │   ┊      │
    //   1─100─2─────101─────3──101──4
    //         │ ┊
    //        105┊ (106 is motor_vehicle=no)
    //         │ ┊
    //         7 ┊ (private gate)
    //           ┊ region border at lon 0.02

    fn check_west(r: &RegionData) {
        assert_eq!(r.roads.len(), 5);
        assert!(r.roads[1].routing_options.has(RoutingOptions::TOLL));
        assert!(r.roads[2].one_way);
        assert!(!r.roads[0].one_way);
        assert_almost_eq!(r.roads[0].forward_speed.weight, 65.0);

        // way -101 is cut at its first segment, which crosses the border
        assert_eq!(r.roads[1].points_count(), 2);
        assert_almost_eq!(r.roads[1].point(1).lon, 0.03);

        assert_eq!(r.transitions.len(), 2);
        assert_eq!(
            r.transitions[0].cross_id,
            CrossMwmId::Osm {
                way_id: -101,
                segment_idx: 0
            }
        );
        assert_eq!(r.transitions[0].feature_id, FeatureId::Real(1));
        assert!(!r.transitions[0].forward_is_enter);
        assert!(r.transitions[1].one_way);

        assert_eq!(
            r.network.restrictions,
            vec![Restriction::no(vec![3, 0]), Restriction::only(vec![0, 1])],
        );
        assert!(r.network.u_turn_restrictions.is_empty());
        assert_eq!(
            r.network.access.point_access(RoadPoint::new(4, 0), false),
            (AccessType::Private, Confidence::Sure),
        );
    }

    fn check_east(r: &RegionData) {
        assert_eq!(r.roads.len(), 3);
        assert_eq!(r.roads[0].points_count(), 3);

        assert_eq!(r.transitions.len(), 2);
        assert_eq!(
            r.transitions[0].cross_id,
            CrossMwmId::Osm {
                way_id: -101,
                segment_idx: 0
            }
        );
        assert_eq!(r.transitions[0].segment_idx, 0);
        assert!(r.transitions[0].forward_is_enter);

        assert!(r.network.restrictions.is_empty());
        assert_eq!(
            r.network.u_turn_restrictions,
            vec![RestrictionUTurn {
                feature_id: 2,
                at_the_begin: true
            }],
        );
    }

    #[test]
    fn load_regions_xml() {
        check_west(&load(DATA, FileFormat::Xml, WEST_BBOX));
        check_east(&load(DATA, FileFormat::Xml, EAST_BBOX));
    }

    #[test]
    fn load_regions_gz() {
        check_west(&load(DATA_GZ, FileFormat::XmlGz, WEST_BBOX));
        check_east(&load(DATA_GZ, FileFormat::Unknown, EAST_BBOX));
    }

    #[test]
    fn load_regions_bz2() {
        check_west(&load(DATA_BZ2, FileFormat::Unknown, WEST_BBOX));
        check_east(&load(DATA_BZ2, FileFormat::XmlBz2, EAST_BBOX));
    }

    #[test]
    fn load_region_from_io_detects_format() {
        let options = Options {
            profile: &CAR_PROFILE,
            file_format: FileFormat::Unknown,
            bbox: WEST_BBOX,
        };
        let r = load_region_from_io("west", &options, std::io::Cursor::new(DATA_GZ)).unwrap();
        check_west(&r);

        assert!(matches!(
            load_region_from_io("west", &options, std::io::Cursor::new(b"PBF\0")),
            Err(Error::UnsupportedFormat),
        ));
    }

    #[test]
    fn load_without_bbox() {
        let r = load(DATA, FileFormat::Xml, [0.0; 4]);
        assert_eq!(r.roads.len(), 7 - 1); // way -106 is not accessible by car
        assert!(r.transitions.is_empty());
        assert!(r.rect.contains(LatLon::new(0.0, 0.04)));
        assert!(r.rect.contains(LatLon::new(-0.01, 0.01)));
    }

    #[test]
    fn foot_profile_uses_more_ways() {
        let options = Options {
            profile: &FOOT_PROFILE,
            file_format: FileFormat::Xml,
            bbox: WEST_BBOX,
        };
        let r = load_region_from_buffer("west", &options, DATA).unwrap();
        assert_eq!(r.roads.len(), 6);
        assert!(r.roads.iter().all(|road| !road.one_way));
        assert!(r.network.restrictions.is_empty());
    }

    #[test]
    fn route_across_regions() {
        let estimator: Rc<dyn EdgeEstimator> = Rc::new(SpeedEstimator::car());
        let mut regions = RegionSet::default();
        let west = regions.add(load(DATA, FileFormat::Xml, WEST_BBOX));
        let east = regions.add(load(DATA, FileFormat::Xml, EAST_BBOX));
        regions.build_cross_mwm_sections(estimator.clone());

        let mut graph = SingleVehicleWorldGraph::new(Rc::new(regions), estimator);
        let start = LatLon::new(0.0, 0.0005);
        let finish = LatLon::new(0.0, 0.0395);

        let route = find_route(&mut graph, start, finish, &SearchParams::default())
            .unwrap()
            .expect("route must exist");
        assert!(route.segments.iter().any(|s| s.mwm_id == west));
        assert!(route.segments.iter().any(|s| s.mwm_id == east));
        assert!(route.length() > 4000.0 && route.length() < 4600.0);

        graph.set_mode(WorldGraphMode::LeapsOnly);
        let leaps = find_route(&mut graph, start, finish, &SearchParams::default())
            .unwrap()
            .expect("route must exist");
        assert!(leaps.weight.weight >= route.weight.weight - 1e-3);
    }
}
