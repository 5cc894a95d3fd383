use std::error::Error;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use roadtrace::{osm, poi, route, Bounds, MapIndex, Position};

#[derive(Debug, thiserror::Error)]
#[error("{0}: {1}")]
struct MapLoadError(PathBuf, #[source] osm::Error);

#[derive(Debug, thiserror::Error)]
#[error("{0}: {1}")]
struct ImageDirError(PathBuf, #[source] io::Error);

#[derive(Parser)]
#[command(about, version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List buildings inside a bounding box
    Buildings(BoundsArgs),

    /// List names of roads inside a bounding box
    Roads {
        #[command(flatten)]
        bounds: BoundsArgs,

        /// Check actual road geometry instead of road bounding boxes
        #[arg(long)]
        precise: bool,
    },

    /// Print the waypoints of a road as GeoJSON
    Route {
        /// The path to the OSM file
        osm_file: PathBuf,

        /// Name of the road, e.g. "Lawrence Street"
        #[arg(long, conflicts_with = "ref_", required_unless_present = "ref_")]
        name: Option<String>,

        /// Reference of the road, e.g. "A64"
        #[arg(long = "ref", id = "ref_")]
        ref_: Option<String>,

        /// Fail if the road references nodes missing from the OSM file
        #[arg(long)]
        strict: bool,
    },

    /// Generate random points of interest
    Poi {
        /// The path to the OSM file
        osm_file: PathBuf,

        /// Probability of generating a POI, within (0, 1]
        poi_chance: f64,

        /// Upper left corner of the bounding box, as "lat,lon"
        #[arg(value_parser = parse_lat_lon, allow_hyphen_values = true)]
        upper_left: Position,

        /// Bottom right corner of the bounding box, as "lat,lon"
        #[arg(value_parser = parse_lat_lon, allow_hyphen_values = true)]
        bottom_right: Position,

        /// Directory with false positive images
        false_positive_imgs: PathBuf,

        /// Directory with stranded person images
        stranded_imgs: PathBuf,

        /// Directory with building occupancy images
        occupancy_imgs: PathBuf,

        /// Where to write the POI XML file
        output_file: PathBuf,
    },
}

#[derive(Args)]
struct BoundsArgs {
    /// The path to the OSM file
    osm_file: PathBuf,

    /// Upper left corner of the bounding box, as "lat,lon"
    #[arg(value_parser = parse_lat_lon, allow_hyphen_values = true)]
    upper_left: Position,

    /// Bottom right corner of the bounding box, as "lat,lon"
    #[arg(value_parser = parse_lat_lon, allow_hyphen_values = true)]
    bottom_right: Position,
}

impl BoundsArgs {
    fn bounds(&self) -> Bounds {
        Bounds::new(self.upper_left, self.bottom_right)
    }
}

fn parse_lat_lon(s: &str) -> Result<Position, String> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lon\", got {:?}", s))?;
    let lat: f64 = lat.trim().parse().map_err(|e| format!("lat: {}", e))?;
    let lon: f64 = lon.trim().parse().map_err(|e| format!("lon: {}", e))?;

    let p = Position::new(lat, lon);
    if p.is_valid() {
        Ok(p)
    } else {
        Err("bad bounds given, check your angles".to_string())
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    colog::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Buildings(args) => {
            let index = load_index(&args.osm_file)?;
            let buildings = index.buildings_in_bounds(&args.bounds());
            log::info!("{} buildings found", buildings.len());
            print_points(&buildings)?;
        }

        Command::Roads { bounds, precise } => {
            let index = load_index(&bounds.osm_file)?;
            let names = if precise {
                index.roads_crossing_bounds(&bounds.bounds())
            } else {
                index.roads_in_bounds(&bounds.bounds())
            };
            for name in names {
                println!("{}", name);
            }
        }

        Command::Route {
            osm_file,
            name,
            ref_,
            strict,
        } => {
            let index = load_index(&osm_file)?;
            let options = route::RouteOptions {
                resolution: if strict {
                    roadtrace::Resolution::Strict
                } else {
                    roadtrace::Resolution::Lenient
                },
                ..route::RouteOptions::default()
            };

            let waypoints = match (name, ref_) {
                (Some(name), _) => route::road_waypoints_by_name(&index, &name, &options)?,
                (None, Some(ref_)) => route::road_waypoints_by_ref(&index, &ref_, &options)?,
                (None, None) => unreachable!("clap requires --name or --ref"),
            };

            if waypoints.is_empty() {
                log::warn!("no matching road found");
            }
            print_line_string(&waypoints)?;
        }

        Command::Poi {
            osm_file,
            poi_chance,
            upper_left,
            bottom_right,
            false_positive_imgs,
            stranded_imgs,
            occupancy_imgs,
            output_file,
        } => {
            let images = poi::ImageSets {
                false_positive: list_images(&false_positive_imgs)?,
                stranded: list_images(&stranded_imgs)?,
                occupancy: list_images(&occupancy_imgs)?,
            };

            let index = load_index(&osm_file)?;
            let bounds = Bounds::new(upper_left, bottom_right);
            let pois = poi::generate(&index, &bounds, poi_chance, &images, &mut rand::rng())?;
            log::info!("generated {} points of interest", pois.len());

            let f = File::create(&output_file)?;
            let mut w = BufWriter::new(f);
            poi::write_xml(&pois, &mut w)?;
            w.flush()?;
        }
    }

    Ok(())
}

fn load_index<P: AsRef<Path>>(path: P) -> Result<MapIndex, MapLoadError> {
    log::info!("loading map data from {}", path.as_ref().display());
    match osm::load_from_file(&osm::Options::default(), path.as_ref()) {
        Ok(index) => Ok(index),
        Err(e) => Err(MapLoadError(PathBuf::from(path.as_ref()), e)),
    }
}

/// Lists names of all files in a directory, in sorted order.
fn list_images(dir: &Path) -> Result<Vec<String>, ImageDirError> {
    let wrap = |e| ImageDirError(dir.to_path_buf(), e);

    let mut names = Vec::default();
    for entry in fs::read_dir(dir).map_err(wrap)? {
        let entry = entry.map_err(wrap)?;
        if entry.file_type().map_err(wrap)?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }

    if names.is_empty() {
        return Err(wrap(io::Error::new(
            io::ErrorKind::NotFound,
            "no image files in directory",
        )));
    }

    names.sort();
    Ok(names)
}

fn print_points(points: &[Position]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{{")?;
    writeln!(out, "  \"type\": \"FeatureCollection\",")?;
    writeln!(out, "  \"features\": [")?;

    let mut points = points.iter().peekable();
    while let Some(p) = points.next() {
        let suffix = if points.peek().is_some() { "," } else { "" };
        writeln!(out, "    {{")?;
        writeln!(out, "      \"type\": \"Feature\",")?;
        writeln!(out, "      \"properties\": {{}},")?;
        writeln!(
            out,
            "      \"geometry\": {{\"type\": \"Point\", \"coordinates\": [{}, {}]}}",
            p.lon, p.lat
        )?;
        writeln!(out, "    }}{}", suffix)?;
    }

    writeln!(out, "  ]")?;
    writeln!(out, "}}")?;
    Ok(())
}

fn print_line_string(points: &[Position]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{{")?;
    writeln!(out, "  \"type\": \"FeatureCollection\",")?;
    writeln!(out, "  \"features\": [")?;
    writeln!(out, "    {{")?;
    writeln!(out, "      \"type\": \"Feature\",")?;
    writeln!(out, "      \"properties\": {{}},")?;

    writeln!(out, "      \"geometry\": {{")?;
    writeln!(out, "        \"type\": \"LineString\",")?;
    writeln!(out, "        \"coordinates\": [")?;

    let mut points = points.iter().peekable();
    while let Some(p) = points.next() {
        let suffix = if points.peek().is_some() { "," } else { "" };
        writeln!(out, "          [{}, {}]{}", p.lon, p.lat, suffix)?;
    }

    writeln!(out, "        ]")?;
    writeln!(out, "      }}")?;
    writeln!(out, "    }}")?;
    writeln!(out, "  ]")?;
    writeln!(out, "}}")?;
    Ok(())
}
