// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::error::Error;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use clap::Parser;
use regionroute::distance::LatLon;
use regionroute::estimator::{EdgeEstimator, SpeedEstimator};
use regionroute::loader::{RegionDataSource, RegionSet};
use regionroute::sparse::RegionsSparseGraph;
use regionroute::world_graph::{SingleVehicleWorldGraph, WorldGraph, WorldGraphMode};

#[derive(Debug, thiserror::Error)]
#[error("{0}: {1}")]
struct RegionLoadError(PathBuf, #[source] regionroute::osm::Error);

#[derive(Debug, thiserror::Error)]
#[error("no route found")]
struct NoRouteError;

/// A single region: an OSM file cut to a bounding box.
#[derive(Debug, Clone)]
struct RegionArg {
    path: PathBuf,
    bbox: [f64; 4],
}

fn parse_region(s: &str) -> Result<RegionArg, String> {
    let Some((path, bbox)) = s.rsplit_once('@') else {
        return Ok(RegionArg {
            path: PathBuf::from(s),
            bbox: [0.0; 4],
        });
    };

    let values = bbox
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|e| format!("invalid bbox {}: {}", bbox, e)))
        .collect::<Result<Vec<_>, _>>()?;
    let bbox: [f64; 4] = values
        .try_into()
        .map_err(|_| format!("bbox must have 4 values: {}", bbox))?;

    Ok(RegionArg {
        path: PathBuf::from(path),
        bbox,
    })
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ProfileArg {
    Car,
    Bicycle,
    Foot,
}

#[derive(Parser)]
struct Cli {
    /// Region to load, as PATH@MIN_LON,MIN_LAT,MAX_LON,MAX_LAT (or just PATH without a boundary).
    /// May be repeated, the same file may be used for multiple regions.
    #[arg(short, long = "region", required = true, value_parser = parse_region)]
    regions: Vec<RegionArg>,

    /// Routing profile
    #[arg(short, long, value_enum, default_value = "car")]
    profile: ProfileArg,

    /// How to cross region borders: no-leaps, leaps-only, leaps-if-possible, joints
    #[arg(short, long, default_value = "no-leaps")]
    mode: WorldGraphMode,

    /// Only route over the coarse graph of border crossings
    #[arg(long)]
    sparse: bool,

    /// Latitude of the start point
    start_lat: f64,

    /// Longitude of the start point
    start_lon: f64,

    /// Latitude of the end point
    end_lat: f64,

    /// Longitude of the end point
    end_lon: f64,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    colog::init();
    let cli = Cli::parse();

    let profile = match cli.profile {
        ProfileArg::Car => &regionroute::osm::CAR_PROFILE,
        ProfileArg::Bicycle => &regionroute::osm::BICYCLE_PROFILE,
        ProfileArg::Foot => &regionroute::osm::FOOT_PROFILE,
    };
    let estimator: Rc<dyn EdgeEstimator> = Rc::new(match cli.profile {
        ProfileArg::Car => SpeedEstimator::car(),
        ProfileArg::Bicycle => SpeedEstimator::bicycle(),
        ProfileArg::Foot => SpeedEstimator::pedestrian(),
    });

    let mut regions = RegionSet::default();
    for region in &cli.regions {
        let options = regionroute::osm::Options {
            profile,
            file_format: regionroute::osm::FileFormat::Unknown,
            bbox: region.bbox,
        };
        regions.add(load_region(&region.path, &options)?);
    }
    regions.build_cross_mwm_sections(estimator.clone());

    let start = LatLon::new(cli.start_lat, cli.start_lon);
    let finish = LatLon::new(cli.end_lat, cli.end_lon);
    let params = regionroute::SearchParams::default();

    let route = if cli.sparse {
        regions.build_cross_border_graph(estimator.as_ref());
        let Some(cross_border) = regions.cross_border_graph() else {
            return Err(NoRouteError.into());
        };
        let sparse = RegionsSparseGraph::new(cross_border, Rc::new(regions), estimator);
        regionroute::find_route_over_regions(&sparse, start, finish, &params)?
    } else {
        let mut graph = SingleVehicleWorldGraph::new(Rc::new(regions), estimator);
        graph.set_mode(cli.mode);
        regionroute::find_route(&mut graph, start, finish, &params)?
    };
    let route = route.ok_or(NoRouteError)?;

    println!("{{");
    println!("  \"type\": \"FeatureCollection\",");
    println!("  \"features\": [");
    println!("    {{");
    println!("      \"type\": \"Feature\",");
    println!(
        "      \"properties\": {{\"weight\": {:.1}, \"length\": {:.1}}},",
        route.weight.weight,
        route.length()
    );

    println!("      \"geometry\": {{");
    println!("        \"type\": \"LineString\",");
    println!("        \"coordinates\": [");

    let mut junctions = route.junctions.iter().peekable();
    while let Some(j) = junctions.next() {
        let suffix = if junctions.peek().is_some() { "," } else { "" };
        println!("          [{}, {}]{}", j.point.lon, j.point.lat, suffix);
    }

    println!("        ]");
    println!("      }}");
    println!("    }}");
    println!("  ]");
    println!("}}");

    Ok(())
}

fn load_region<P: AsRef<Path>>(
    path: P,
    options: &regionroute::osm::Options<'_>,
) -> Result<regionroute::loader::RegionData, RegionLoadError> {
    let name = path
        .as_ref()
        .file_stem()
        .map_or_else(String::default, |s| s.to_string_lossy().into_owned());
    regionroute::osm::load_region_from_file(&name, options, path.as_ref())
        .map_err(|e| RegionLoadError(PathBuf::from(path.as_ref()), e))
}
