// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashSet;

use geo::{Coord, Intersects, LineString, Rect};

use crate::{MapIndex, Position, Way};

/// Axis-aligned lat-lon rectangle.
///
/// `top_left` must have the larger latitude and the smaller longitude;
/// this is not checked nor normalized.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub top_left: Position,
    pub bottom_right: Position,
}

impl Bounds {
    pub const fn new(top_left: Position, bottom_right: Position) -> Self {
        Self {
            top_left,
            bottom_right,
        }
    }

    /// Checks if a position lies strictly inside the rectangle.
    /// Positions on the edges are considered outside.
    pub fn contains(&self, p: Position) -> bool {
        p.lat > self.bottom_right.lat
            && p.lat < self.top_left.lat
            && p.lon > self.top_left.lon
            && p.lon < self.bottom_right.lon
    }

    fn lat_inside(&self, lat: f64) -> bool {
        lat > self.bottom_right.lat && lat < self.top_left.lat
    }

    fn lon_inside(&self, lon: f64) -> bool {
        lon > self.top_left.lon && lon < self.bottom_right.lon
    }

    fn to_rect(self) -> Rect<f64> {
        Rect::new(
            Coord {
                x: self.top_left.lon,
                y: self.bottom_right.lat,
            },
            Coord {
                x: self.bottom_right.lon,
                y: self.top_left.lat,
            },
        )
    }
}

impl MapIndex {
    /// Returns positions of all building nodes strictly inside the provided [Bounds],
    /// in ascending order of node ids.
    pub fn buildings_in_bounds(&self, bounds: &Bounds) -> Vec<Position> {
        self.nodes()
            .filter(|n| n.building && bounds.contains(n.position))
            .map(|n| n.position)
            .collect()
    }

    /// Returns deduplicated names of all [Ways](Way) whose bounding box has a corner
    /// coordinate inside the provided [Bounds], in the order of first appearance.
    ///
    /// A way matches if its western or eastern edge longitude, and its southern or northern
    /// edge latitude, lie strictly inside the rectangle. This is a coarse approximation:
    /// ways crossing the rectangle without any bounding box edge inside it are missed, while
    /// ways with a bounding box poking into the rectangle are included even if the
    /// polyline itself does not. See [MapIndex::roads_crossing_bounds] for an exact test.
    ///
    /// Ways without a name (referenced only by `ref`) match like any other way and are
    /// reported under an empty name.
    pub fn roads_in_bounds(&self, bounds: &Bounds) -> Vec<String> {
        collect_names(self.ways().iter().filter(|&w| match self.way_bounds(w) {
            Some((lower_left, upper_right)) => {
                let lon_inside =
                    bounds.lon_inside(lower_left.lon) || bounds.lon_inside(upper_right.lon);
                let lat_inside =
                    bounds.lat_inside(upper_right.lat) || bounds.lat_inside(lower_left.lat);
                lon_inside && lat_inside
            }
            None => false,
        }))
    }

    /// Returns deduplicated names of all [Ways](Way) whose polyline intersects the
    /// provided [Bounds] (edges included), in the order of first appearance.
    ///
    /// Unlike [MapIndex::roads_in_bounds], this checks every segment of every way
    /// against the rectangle, and is thus considerably slower.
    pub fn roads_crossing_bounds(&self, bounds: &Bounds) -> Vec<String> {
        let rect = bounds.to_rect();
        collect_names(self.ways().iter().filter(|&w| {
            let line: LineString<f64> = w
                .nodes
                .iter()
                .map(|&id| {
                    let p = self.node_by_id(id).position;
                    Coord { x: p.lon, y: p.lat }
                })
                .collect();
            line.intersects(&rect)
        }))
    }

    /// Computes the bounding box of a [Way] as a (lower left, upper right) pair
    /// of positions. Returns `None` for ways without any nodes.
    ///
    /// Unknown nodes resolve to [Position::ZERO], as per [MapIndex::node_by_id].
    pub fn way_bounds(&self, way: &Way) -> Option<(Position, Position)> {
        let mut positions = way.nodes.iter().map(|&id| self.node_by_id(id).position);
        let first = positions.next()?;

        Some(positions.fold((first, first), |(mut lower_left, mut upper_right), p| {
            lower_left.lat = lower_left.lat.min(p.lat);
            lower_left.lon = lower_left.lon.min(p.lon);
            upper_right.lat = upper_right.lat.max(p.lat);
            upper_right.lon = upper_right.lon.max(p.lon);
            (lower_left, upper_right)
        }))
    }
}

fn collect_names<'a, I: Iterator<Item = &'a Way>>(ways: I) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::default();
    let mut names = Vec::default();
    for way in ways {
        if seen.insert(way.name.as_str()) {
            names.push(way.name.clone());
        }
    }
    names
}
