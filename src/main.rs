// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::{info, warn, LevelFilter};
use routemesh::filter::Expression;
use routemesh::mesh::{build_mesh, CostModel, MeshOptions, RESTRICTED_ROAD_PROFILE, ROAD_PROFILE};
use routemesh::osm::{extract_from_file, FileFormat, KindFilter, Options};
use routemesh::route::{solve_all, Waypoint};
use routemesh::tags::Vocabulary;
use routemesh::Diagnostics;

#[derive(Debug, thiserror::Error)]
#[error("{0}: {1}")]
struct ExtractError(PathBuf, #[source] routemesh::Error);

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Auto,
    Xml,
    XmlGz,
    XmlBz2,
    Pbf,
}

impl From<Format> for FileFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Auto => FileFormat::Unknown,
            Format::Xml => FileFormat::Xml,
            Format::XmlGz => FileFormat::XmlGz,
            Format::XmlBz2 => FileFormat::XmlBz2,
            Format::Pbf => FileFormat::Pbf,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Cost {
    Duration,
    Distance,
}

impl From<Cost> for CostModel {
    fn from(c: Cost) -> Self {
        match c {
            Cost::Duration => CostModel::Duration,
            Cost::Distance => CostModel::Distance,
        }
    }
}

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The path to the OSM file
    osm_file: PathBuf,

    /// Filter expression or preset name, e.g. "highway_*" or "moto-scenic"
    #[arg(short, long, default_value = "highway_*")]
    filter: String,

    /// Route point as "lat,lon"; may be repeated
    #[arg(short, long = "waypoint", allow_hyphen_values = true)]
    waypoints: Vec<Waypoint>,

    /// Where to write the GPX file, defaults to standard output
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Format of the OSM file
    #[arg(long, value_enum, default_value_t = Format::Auto)]
    format: Format,

    /// Only extract features within "min_lon,min_lat,max_lon,max_lat"
    #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
    bbox: Option<[f32; 4]>,

    /// Don't select nodes by their own tags
    #[arg(long)]
    no_nodes: bool,

    /// Don't select relations
    #[arg(long)]
    no_relations: bool,

    /// Property minimized by the router
    #[arg(long, value_enum, default_value_t = Cost::Duration)]
    cost: Cost,

    /// Drop ways closed by access tags and motorroads
    #[arg(long)]
    restricted: bool,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_bbox(s: &str) -> Result<[f32; 4], String> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<f32>().map_err(|e| format!("{v:?}: {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    values
        .try_into()
        .map_err(|_| "expected 4 comma-separated numbers".to_string())
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    colog::default_builder().filter_level(level).init();

    let vocabulary = Vocabulary::builtin();
    let filter = Expression::compile(&cli.filter, vocabulary)?;
    let options = Options {
        filter: &filter,
        keep: KindFilter {
            nodes: !cli.no_nodes,
            ways: true,
            relations: !cli.no_relations,
        },
        file_format: cli.format.into(),
        bbox: cli.bbox.unwrap_or([0.0; 4]),
    };

    let extract = extract_from_file(&cli.osm_file, vocabulary, &options)
        .map_err(|e| ExtractError(cli.osm_file.clone(), e))?;

    let mut diagnostics = Diagnostics::default();
    let mesh_options = MeshOptions {
        profile: if cli.restricted {
            &RESTRICTED_ROAD_PROFILE
        } else {
            &ROAD_PROFILE
        },
        cost: cli.cost.into(),
    };
    let mesh = build_mesh(&extract, vocabulary, &mesh_options, &mut diagnostics)?;

    if cli.waypoints.len() < 2 {
        warn!("less than 2 waypoints given, no routes will be searched");
    }
    let solutions = solve_all(&mesh, &cli.waypoints, &mut diagnostics)?;

    match &cli.output {
        Some(path) => {
            let mut w = BufWriter::new(File::create(path)?);
            routemesh::gpx::write_gpx(&mut w, &mesh, &cli.waypoints, &solutions)?;
            w.flush()?;
            info!("wrote {} routes to {}", solutions.len(), path.display());
        }
        None => {
            let mut w = BufWriter::new(io::stdout().lock());
            routemesh::gpx::write_gpx(&mut w, &mesh, &cli.waypoints, &solutions)?;
            w.flush()?;
        }
    }

    if !diagnostics.is_clean() {
        info!(
            "{} ways dropped, {} missing nodes, {} unsnapped waypoints, {} unreachable pairs",
            diagnostics.dropped_ways.len(),
            diagnostics.missing_nodes.len(),
            diagnostics.unsnapped.len(),
            diagnostics.unreachable.len(),
        );
    }

    Ok(())
}
