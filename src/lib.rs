// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Building lookup and road waypoint reconstruction over
//! [OpenStreetMap](https://www.openstreetmap.org/) data.
//!
//! An OSM XML document is loaded once into a read-only [MapIndex]. The index answers
//! bounding-box queries ([MapIndex::buildings_in_bounds], [MapIndex::roads_in_bounds])
//! and serves as the source for [route reconstruction](crate::route), which orders
//! the nodes of a named or referenced road into a single chain of waypoints using
//! [ECEF](crate::ecef) distances.
//!
//! # Example
//!
//! ```no_run
//! let options = roadtrace::osm::Options::default();
//! let index = roadtrace::osm::load_from_file(&options, "path/to/york.osm")
//!     .expect("failed to load york.osm");
//!
//! let waypoints = roadtrace::route::road_waypoints_by_name(
//!     &index,
//!     "Lawrence Street",
//!     &roadtrace::route::RouteOptions::default(),
//! )
//! .expect("failed to reconstruct the road");
//!
//! println!("Waypoints: {:?}", waypoints);
//! ```

pub mod ecef;
mod index;
pub mod osm;
pub mod poi;
mod query;
pub mod route;

pub use index::{MapIndex, Resolution, UnknownNode};
pub use query::Bounds;

/// Geodetic position: latitude and longitude in decimal degrees,
/// elevation in meters above the WGS-84 ellipsoid.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
    pub ele: f64,
}

impl Position {
    pub const ZERO: Self = Self {
        lat: 0.0,
        lon: 0.0,
        ele: 0.0,
    };

    /// Creates a position at zero elevation.
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon, ele: 0.0 }
    }

    /// Returns true if the latitude lies within [-90, 90]
    /// and the longitude lies within [-180, 180].
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Represents a single [OSM node](https://wiki.openstreetmap.org/wiki/Node).
///
/// Two nodes are considered equal if they have the same `id`,
/// regardless of their position.
#[derive(Debug, Default, Clone, Copy)]
pub struct Node {
    pub id: u64,
    pub position: Position,

    /// Set if the node carries any `building=*` tag.
    pub building: bool,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

/// Represents a named or referenced [OSM way](https://wiki.openstreetmap.org/wiki/Way),
/// modelling a road (or a segment of one).
///
/// Empty `ref_` or `name` mean that the corresponding tag was absent.
/// The order of `nodes` follows the source document, and is not assumed
/// to be geographically meaningful.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Way {
    pub id: u64,
    pub ref_: String,
    pub name: String,
    pub nodes: Vec<u64>,
}
