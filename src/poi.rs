// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Generation of randomized points of interest for search-and-rescue simulations.
//!
//! Buildings become candidate occupancy sites, and random points along roads become
//! candidate stranded-person sites. Every emitted POI is associated with an image,
//! which is either a genuine sighting (1 in 3 chance) or a false positive.

use std::io;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use rand::seq::IndexedRandom;
use rand::Rng;

use crate::route::{road_waypoints_by_name, RouteOptions};
use crate::{Bounds, MapIndex, Position};

/// Type of a [Poi]. The numeric values are used in the XML output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PoiKind {
    /// A person stranded on a road.
    Stranded = 1,

    /// An occupied building.
    Occupancy = 2,
}

/// A single point of interest.
#[derive(Debug, Clone, PartialEq)]
pub struct Poi {
    pub id: u32,
    pub kind: PoiKind,
    pub position: Position,

    /// Name of the image file associated with this point.
    pub data: String,
}

/// Names of image files to pick from when generating [Pois](Poi).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImageSets {
    pub false_positive: Vec<String>,
    pub stranded: Vec<String>,
    pub occupancy: Vec<String>,
}

/// Error which can occur when generating or writing [Pois](Poi).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("POI chance must be within (0, 1], got {0}")]
    InvalidChance(f64),

    #[error("no {0} images available")]
    NoImages(&'static str),

    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("xml: {0}")]
    Xml(#[from] quick_xml::Error),
}

impl ImageSets {
    fn validate(&self) -> Result<(), Error> {
        if self.false_positive.is_empty() {
            Err(Error::NoImages("false positive"))
        } else if self.stranded.is_empty() {
            Err(Error::NoImages("stranded"))
        } else if self.occupancy.is_empty() {
            Err(Error::NoImages("occupancy"))
        } else {
            Ok(())
        }
    }

    fn pick<R: Rng>(&self, kind: PoiKind, rng: &mut R) -> String {
        let genuine = match kind {
            PoiKind::Stranded => &self.stranded,
            PoiKind::Occupancy => &self.occupancy,
        };
        let set = if rng.random_ratio(1, 3) {
            genuine
        } else {
            &self.false_positive
        };

        // Sets are validated to be non-empty before generation starts
        set.choose(rng).cloned().unwrap_or_default()
    }
}

/// Generates randomized [Pois](Poi) within the provided [Bounds].
///
/// Every building in the bounds becomes an [PoiKind::Occupancy] POI with the
/// provided `chance`. Then, every named road in the bounds (as per
/// [MapIndex::roads_in_bounds]) becomes a [PoiKind::Stranded] POI with the
/// provided `chance`, placed at a random waypoint of the road.
/// POI ids are assigned sequentially, starting from 1.
pub fn generate<R: Rng>(
    index: &MapIndex,
    bounds: &Bounds,
    chance: f64,
    images: &ImageSets,
    rng: &mut R,
) -> Result<Vec<Poi>, Error> {
    if !(chance > 0.0 && chance <= 1.0) {
        return Err(Error::InvalidChance(chance));
    }
    images.validate()?;

    let mut pois = Vec::default();
    let mut next_id: u32 = 1;
    let mut emit = |kind: PoiKind, position: Position, rng: &mut R| {
        pois.push(Poi {
            id: next_id,
            kind,
            position,
            data: images.pick(kind, rng),
        });
        next_id += 1;
    };

    let buildings = index.buildings_in_bounds(bounds);
    log::debug!("{} buildings in bounds", buildings.len());
    for position in buildings {
        if rng.random_bool(chance) {
            emit(PoiKind::Occupancy, position, &mut *rng);
        }
    }

    let route_options = RouteOptions::default();
    for name in index.roads_in_bounds(bounds) {
        if name.is_empty() {
            log::debug!("skipping a road without a name");
            continue;
        }

        let waypoints = match road_waypoints_by_name(index, &name, &route_options) {
            Ok(waypoints) => waypoints,
            Err(e) => {
                log::warn!("{}: {} - skipping", name, e);
                continue;
            }
        };

        if rng.random_bool(chance) {
            if let Some(&position) = waypoints.choose(rng) {
                emit(PoiKind::Stranded, position, &mut *rng);
            }
        }
    }

    Ok(pois)
}

/// Writes [Pois](Poi) as an XML document with a `POIs` root element.
pub fn write_xml<W: io::Write>(pois: &[Poi], writer: W) -> Result<(), Error> {
    let mut w = quick_xml::Writer::new_with_indent(writer, b'\t', 1);

    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    w.write_event(Event::Start(BytesStart::new("POIs")))?;

    for poi in pois {
        let id = poi.id.to_string();
        let kind = (poi.kind as u8).to_string();
        let lat = poi.position.lat.to_string();
        let lon = poi.position.lon.to_string();
        let ele = poi.position.ele.to_string();

        let mut e = BytesStart::new("POI");
        e.push_attribute(("id", id.as_str()));
        e.push_attribute(("type", kind.as_str()));
        e.push_attribute(("lat", lat.as_str()));
        e.push_attribute(("lon", lon.as_str()));
        e.push_attribute(("elevation", ele.as_str()));
        e.push_attribute(("data", poi.data.as_str()));
        w.write_event(Event::Empty(e))?;
    }

    w.write_event(Event::End(BytesEnd::new("POIs")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::osm::{load_from_buffer, Options};

    const SIMPLE_XML: &[u8] = include_bytes!("osm/reader/test_fixtures/simple.osm");

    fn images() -> ImageSets {
        ImageSets {
            false_positive: vec!["fp1.png".to_string(), "fp2.png".to_string()],
            stranded: vec!["s1.png".to_string()],
            occupancy: vec!["o1.png".to_string(), "o2.png".to_string()],
        }
    }

    fn bounds() -> Bounds {
        Bounds::new(Position::new(53.96, -1.08), Position::new(53.94, -1.00))
    }

    #[test]
    fn generate_everything() {
        let index = load_from_buffer(&Options::default(), SIMPLE_XML).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let pois = generate(&index, &bounds(), 1.0, &images(), &mut rng).unwrap();

        // 2 buildings (30, 31), then 3 named roads (the A64 has no name)
        let kinds: Vec<PoiKind> = pois.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                PoiKind::Occupancy,
                PoiKind::Occupancy,
                PoiKind::Stranded,
                PoiKind::Stranded,
                PoiKind::Stranded,
            ],
        );

        let ids: Vec<u32> = pois.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);

        assert_eq!(pois[0].position, index.node_by_id(30).position);
        assert_eq!(pois[1].position, index.node_by_id(31).position);

        let lawrence = [1, 2, 3, 4].map(|id| index.node_by_id(id).position);
        assert!(lawrence.contains(&pois[2].position));

        let sets = images();
        for poi in &pois {
            let genuine = match poi.kind {
                PoiKind::Stranded => &sets.stranded,
                PoiKind::Occupancy => &sets.occupancy,
            };
            assert!(genuine.contains(&poi.data) || sets.false_positive.contains(&poi.data));
        }
    }

    #[test]
    fn generate_is_deterministic_with_seed() {
        let index = load_from_buffer(&Options::default(), SIMPLE_XML).unwrap();
        let a = generate(&index, &bounds(), 0.5, &images(), &mut StdRng::seed_from_u64(7)).unwrap();
        let b = generate(&index, &bounds(), 0.5, &images(), &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(a, b);
        assert!(a.len() <= 5);
    }

    #[test]
    fn generate_invalid_chance() {
        let index = MapIndex::default();
        let mut rng = StdRng::seed_from_u64(1);
        for chance in [0.0, -0.5, 1.5, f64::NAN] {
            assert!(matches!(
                generate(&index, &bounds(), chance, &images(), &mut rng),
                Err(Error::InvalidChance(_))
            ));
        }
    }

    #[test]
    fn generate_missing_images() {
        let index = MapIndex::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut sets = images();
        sets.stranded.clear();
        assert!(matches!(
            generate(&index, &bounds(), 1.0, &sets, &mut rng),
            Err(Error::NoImages("stranded"))
        ));
    }

    #[test]
    fn write() {
        let pois = vec![
            Poi {
                id: 1,
                kind: PoiKind::Occupancy,
                position: Position::new(53.9555, -1.0705),
                data: "o1.png".to_string(),
            },
            Poi {
                id: 2,
                kind: PoiKind::Stranded,
                position: Position::new(53.95, -1.07),
                data: "a&b.png".to_string(),
            },
        ];

        let mut buf = Vec::default();
        write_xml(&pois, &mut buf).unwrap();
        let xml = String::from_utf8(buf).unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains(
            r#"<POI id="1" type="2" lat="53.9555" lon="-1.0705" elevation="0" data="o1.png"/>"#
        ));
        assert!(xml.contains(
            r#"<POI id="2" type="1" lat="53.95" lon="-1.07" elevation="0" data="a&amp;b.png"/>"#
        ));
        assert!(xml.trim_end().ends_with("</POIs>"));
    }

    #[test]
    fn write_empty() {
        let mut buf = Vec::default();
        write_xml(&[], &mut buf).unwrap();
        let xml = String::from_utf8(buf).unwrap();
        assert!(xml.contains("<POIs>"));
        assert!(xml.trim_end().ends_with("</POIs>"));
    }
}
