// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Reconstruction of road geometry from unordered way nodes.
//!
//! OSM ways are not guaranteed to list their nodes in travel order, and a single road
//! is commonly split into multiple ways. Reconstruction gathers the nodes of all ways
//! matching a name or a reference, picks one end of the road and then greedily walks
//! to the closest not-yet-visited node, until all nodes are used.
//!
//! The walk needs O(n²) [distance](crate::ecef::distance) evaluations for a road with
//! n nodes, which is fine for streets but not for whole highways.
//! [RouteOptions::step_limit] guards against pathological inputs.

use std::collections::HashSet;

use crate::ecef::{geodetic_to_ecef, Ecef};
use crate::{MapIndex, Node, Position, Resolution, UnknownNode, Way};

/// Recommended number of allowed distance evaluations in a single reconstruction
/// before [RouteError::StepLimitExceeded] is returned. Allows for roads
/// with roughly 10 000 nodes.
pub const DEFAULT_STEP_LIMIT: usize = 50_000_000;

/// Additional controls for route reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteOptions {
    /// How to treat node ids which are missing from the [MapIndex].
    pub resolution: Resolution,

    /// Limits how many distance evaluations may be performed before
    /// returning [RouteError::StepLimitExceeded].
    pub step_limit: usize,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            resolution: Resolution::Lenient,
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }
}

/// Error conditions which may occur during route reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteError {
    /// A way references a node which doesn't exist in the [MapIndex].
    /// Only returned with [Resolution::Strict].
    UnknownNode(u64),

    /// Reconstruction has exceeded its limit of distance evaluations.
    StepLimitExceeded,
}

impl std::fmt::Display for RouteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownNode(node_id) => write!(f, "unknown node: {}", node_id),
            Self::StepLimitExceeded => write!(f, "step limit exceeded"),
        }
    }
}

impl std::error::Error for RouteError {}

impl From<UnknownNode> for RouteError {
    fn from(e: UnknownNode) -> Self {
        Self::UnknownNode(e.0)
    }
}

/// Reconstructs the waypoints of a road by its name (e.g. "Lawrence Street").
///
/// Returns an empty vector if no way has exactly the provided name.
pub fn road_waypoints_by_name(
    index: &MapIndex,
    name: &str,
    options: &RouteOptions,
) -> Result<Vec<Position>, RouteError> {
    road_waypoints(index, |w| w.name == name, options)
}

/// Reconstructs the waypoints of a road by its reference (e.g. "A64").
///
/// Returns an empty vector if no way has exactly the provided reference.
pub fn road_waypoints_by_ref(
    index: &MapIndex,
    ref_: &str,
    options: &RouteOptions,
) -> Result<Vec<Position>, RouteError> {
    road_waypoints(index, |w| w.ref_ == ref_, options)
}

/// Reconstructs the waypoints of a road made up from all ways matching a predicate.
///
/// Every distinct node is visited exactly once. The walk starts at the southernmost node
/// if the road spans more degrees of latitude than of longitude, otherwise at the
/// westernmost node.
pub fn road_waypoints<F: Fn(&Way) -> bool>(
    index: &MapIndex,
    predicate: F,
    options: &RouteOptions,
) -> Result<Vec<Position>, RouteError> {
    let road = match RoadNodes::collect(index, predicate, options.resolution)? {
        Some(road) => road,
        None => return Ok(vec![]),
    };

    let start = road.start();
    log::debug!(
        "reconstructing road with {} nodes starting at node {}",
        road.nodes.len(),
        road.nodes[start].id
    );

    road.walk(start, options.step_limit)
}

/// Distinct nodes of a road, together with their extremes.
/// All extremes are indices into `nodes`.
#[derive(Debug)]
struct RoadNodes {
    nodes: Vec<Node>,
    north: usize,
    south: usize,
    east: usize,
    west: usize,
}

impl RoadNodes {
    /// Gathers distinct nodes of all matching ways, in order of first appearance.
    /// Returns `None` if no way matches the predicate.
    fn collect<F: Fn(&Way) -> bool>(
        index: &MapIndex,
        predicate: F,
        resolution: Resolution,
    ) -> Result<Option<Self>, UnknownNode> {
        let mut seen: HashSet<u64> = HashSet::default();
        let mut road = Self {
            nodes: Vec::default(),
            north: 0,
            south: 0,
            east: 0,
            west: 0,
        };

        for way in index.ways().iter().filter(|&w| predicate(w)) {
            for &node_id in &way.nodes {
                if seen.insert(node_id) {
                    let node = index.resolve_node(node_id, resolution)?;
                    road.push(node);
                }
            }
        }

        Ok(if road.nodes.is_empty() { None } else { Some(road) })
    }

    fn push(&mut self, node: Node) {
        let idx = self.nodes.len();
        self.nodes.push(node);
        if idx == 0 {
            return;
        }

        let p = node.position;
        if p.lat > self.nodes[self.north].position.lat {
            self.north = idx;
        }
        if p.lat < self.nodes[self.south].position.lat {
            self.south = idx;
        }
        if p.lon > self.nodes[self.east].position.lon {
            self.east = idx;
        }
        if p.lon < self.nodes[self.west].position.lon {
            self.west = idx;
        }
    }

    /// Picks the index of the node where the walk should begin: south for
    /// roads running mostly north-south, west otherwise.
    fn start(&self) -> usize {
        let lat_span =
            (self.nodes[self.north].position.lat - self.nodes[self.south].position.lat).abs();
        let lon_span =
            (self.nodes[self.east].position.lon - self.nodes[self.west].position.lon).abs();

        if lat_span > lon_span {
            self.south
        } else {
            self.west
        }
    }

    /// Walks over all nodes, always stepping to the closest unvisited one.
    fn walk(&self, start: usize, step_limit: usize) -> Result<Vec<Position>, RouteError> {
        let points: Vec<Ecef> = self
            .nodes
            .iter()
            .map(|n| geodetic_to_ecef(n.position))
            .collect();

        let mut visited = vec![false; self.nodes.len()];
        let mut waypoints = Vec::with_capacity(self.nodes.len());
        let mut steps: usize = 0;

        let mut current = start;
        visited[current] = true;
        waypoints.push(self.nodes[current].position);

        while waypoints.len() < self.nodes.len() {
            let mut best: Option<(usize, f64)> = None;

            for (idx, point) in points.iter().enumerate() {
                if visited[idx] {
                    continue;
                }

                steps += 1;
                if steps > step_limit {
                    return Err(RouteError::StepLimitExceeded);
                }

                let distance = points[current].distance(point);
                if best.map_or(true, |(_, best_distance)| distance < best_distance) {
                    best = Some((idx, distance));
                }
            }

            let Some((next, _)) = best else {
                break;
            };
            visited[next] = true;
            waypoints.push(self.nodes[next].position);
            current = next;
        }

        Ok(waypoints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: u64, lat: f64, lon: f64) -> Node {
        Node {
            id,
            position: Position::new(lat, lon),
            building: false,
        }
    }

    fn way(id: u64, ref_: &str, name: &str, nodes: &[u64]) -> Way {
        Way {
            id,
            ref_: ref_.to_string(),
            name: name.to_string(),
            nodes: nodes.to_vec(),
        }
    }

    fn index_with(nodes: &[Node], ways: Vec<Way>) -> MapIndex {
        let mut index = MapIndex::default();
        nodes.iter().for_each(|&n| index.insert_node(n));
        ways.into_iter().for_each(|w| index.push_way(w));
        index
    }

    #[test]
    fn greedy_west_to_east() {
        let index = index_with(
            &[node(1, 0.0, 0.0), node(2, 0.0, 1.0), node(3, 0.0, 3.0)],
            vec![way(10, "", "Equator Road", &[3, 1, 2])],
        );

        let waypoints =
            road_waypoints_by_name(&index, "Equator Road", &RouteOptions::default()).unwrap();
        assert_eq!(
            waypoints,
            vec![
                Position::new(0.0, 0.0),
                Position::new(0.0, 1.0),
                Position::new(0.0, 3.0),
            ],
        );
    }

    #[test]
    fn vertical_road_starts_south() {
        let index = index_with(
            &[
                node(1, 53.960, -1.080),
                node(2, 53.950, -1.081),
                node(3, 53.955, -1.079),
                node(4, 53.965, -1.080),
            ],
            vec![way(10, "B1227", "Lawrence Street", &[1, 4, 2, 3])],
        );

        let waypoints =
            road_waypoints_by_ref(&index, "B1227", &RouteOptions::default()).unwrap();
        assert_eq!(
            waypoints,
            vec![
                Position::new(53.950, -1.081),
                Position::new(53.955, -1.079),
                Position::new(53.960, -1.080),
                Position::new(53.965, -1.080),
            ],
        );
    }

    #[test]
    fn horizontal_road_starts_west() {
        let index = index_with(
            &[
                node(1, 53.9601, -1.070),
                node(2, 53.9600, -1.090),
                node(3, 53.9602, -1.080),
            ],
            vec![way(10, "", "Walmgate", &[1, 2, 3])],
        );

        let waypoints =
            road_waypoints_by_name(&index, "Walmgate", &RouteOptions::default()).unwrap();
        assert_eq!(waypoints[0], Position::new(53.9600, -1.090));
        assert_eq!(waypoints[2], Position::new(53.9601, -1.070));
    }

    #[test]
    fn square_road_starts_west() {
        // Equal spans - the west-east direction wins
        let index = index_with(
            &[node(1, 1.0, 1.0), node(2, 0.0, 0.5), node(3, 0.5, 0.0)],
            vec![way(10, "", "Square", &[1, 2, 3])],
        );

        let waypoints =
            road_waypoints_by_name(&index, "Square", &RouteOptions::default()).unwrap();
        assert_eq!(waypoints[0], Position::new(0.5, 0.0));
    }

    #[test]
    fn every_node_used_exactly_once() {
        let nodes: Vec<Node> = (1..=20)
            .map(|i| {
                let i = i as f64;
                node(i as u64, 50.0 + 0.001 * i, 10.0 + 0.0001 * (i * 7.0 % 5.0))
            })
            .collect();
        let ids: Vec<u64> = vec![
            7, 3, 19, 1, 12, 20, 5, 14, 9, 2, 16, 11, 4, 18, 8, 13, 6, 17, 10, 15,
        ];
        let index = index_with(&nodes, vec![way(10, "", "Long Street", &ids)]);

        let waypoints =
            road_waypoints_by_name(&index, "Long Street", &RouteOptions::default()).unwrap();
        assert_eq!(waypoints.len(), nodes.len());
        for n in &nodes {
            assert_eq!(
                waypoints.iter().filter(|&&p| p == n.position).count(),
                1,
                "node {} must appear exactly once",
                n.id
            );
        }

        // The road runs north-south, so it must begin with the southernmost node
        assert_eq!(waypoints[0], nodes[0].position);
    }

    #[test]
    fn segments_are_merged() {
        // Two ways of the same road sharing node 3
        let index = index_with(
            &[
                node(1, 0.0, 0.0),
                node(2, 0.0, 0.1),
                node(3, 0.0, 0.2),
                node(4, 0.0, 0.3),
                node(5, 0.0, 0.4),
            ],
            vec![
                way(10, "", "Split Street", &[5, 4, 3]),
                way(11, "", "Other Street", &[1, 5]),
                way(12, "", "Split Street", &[3, 2, 1]),
            ],
        );

        let waypoints =
            road_waypoints_by_name(&index, "Split Street", &RouteOptions::default()).unwrap();
        assert_eq!(
            waypoints,
            vec![
                Position::new(0.0, 0.0),
                Position::new(0.0, 0.1),
                Position::new(0.0, 0.2),
                Position::new(0.0, 0.3),
                Position::new(0.0, 0.4),
            ],
        );
    }

    #[test]
    fn closed_way_visits_each_node_once() {
        let index = index_with(
            &[node(1, 0.0, 0.0), node(2, 0.0, 1.0), node(3, 1.0, 0.5)],
            vec![way(10, "", "Ring", &[1, 2, 3, 1])],
        );

        let waypoints =
            road_waypoints_by_name(&index, "Ring", &RouteOptions::default()).unwrap();
        assert_eq!(waypoints.len(), 3);
    }

    #[test]
    fn distinct_nodes_at_same_position_are_kept() {
        let index = index_with(
            &[node(1, 0.0, 0.0), node(2, 0.0, 0.0), node(3, 0.0, 1.0)],
            vec![way(10, "", "Twin Street", &[3, 2, 1])],
        );

        let waypoints =
            road_waypoints_by_name(&index, "Twin Street", &RouteOptions::default()).unwrap();
        assert_eq!(
            waypoints,
            vec![
                Position::new(0.0, 0.0),
                Position::new(0.0, 0.0),
                Position::new(0.0, 1.0),
            ],
        );
    }

    #[test]
    fn no_match_is_empty() {
        let index = index_with(
            &[node(1, 0.0, 0.0), node(2, 0.0, 1.0)],
            vec![way(10, "A64", "York Road", &[1, 2])],
        );

        let options = RouteOptions::default();
        assert_eq!(road_waypoints_by_name(&index, "Nowhere", &options), Ok(vec![]));
        assert_eq!(road_waypoints_by_ref(&index, "A1", &options), Ok(vec![]));
        assert_eq!(road_waypoints_by_name(&index, "A64", &options), Ok(vec![]));
        assert_eq!(road_waypoints_by_ref(&index, "York Road", &options), Ok(vec![]));
    }

    #[test]
    fn unknown_node_lenient() {
        let index = index_with(
            &[node(1, 0.5, 0.5), node(2, 0.5, 1.0)],
            vec![way(10, "", "Broken Street", &[1, 2, 99])],
        );

        let waypoints =
            road_waypoints_by_name(&index, "Broken Street", &RouteOptions::default()).unwrap();
        assert_eq!(
            waypoints,
            vec![
                Position::new(0.0, 0.0),
                Position::new(0.5, 0.5),
                Position::new(0.5, 1.0),
            ],
        );
    }

    #[test]
    fn unknown_node_strict() {
        let index = index_with(
            &[node(1, 0.5, 0.5), node(2, 0.5, 1.0)],
            vec![way(10, "", "Broken Street", &[1, 2, 99])],
        );

        let options = RouteOptions {
            resolution: Resolution::Strict,
            ..RouteOptions::default()
        };
        assert_eq!(
            road_waypoints_by_name(&index, "Broken Street", &options),
            Err(RouteError::UnknownNode(99)),
        );
    }

    #[test]
    fn step_limit() {
        let index = index_with(
            &[node(1, 0.0, 0.0), node(2, 0.0, 1.0), node(3, 0.0, 3.0)],
            vec![way(10, "", "Equator Road", &[1, 2, 3])],
        );

        // 3 nodes need 2 + 1 distance evaluations
        let options = RouteOptions {
            step_limit: 2,
            ..RouteOptions::default()
        };
        assert_eq!(
            road_waypoints_by_name(&index, "Equator Road", &options),
            Err(RouteError::StepLimitExceeded),
        );

        let options = RouteOptions {
            step_limit: 3,
            ..RouteOptions::default()
        };
        assert_eq!(
            road_waypoints_by_name(&index, "Equator Road", &options)
                .map(|w| w.len()),
            Ok(3),
        );
    }

    #[test]
    fn custom_predicate() {
        let index = index_with(
            &[node(1, 0.0, 0.0), node(2, 0.0, 1.0), node(3, 0.0, 2.0)],
            vec![
                way(10, "A64", "", &[1, 2]),
                way(11, "", "York Road", &[2, 3]),
            ],
        );

        let waypoints = road_waypoints(
            &index,
            |w| w.ref_ == "A64" || w.name == "York Road",
            &RouteOptions::default(),
        )
        .unwrap();
        assert_eq!(waypoints.len(), 3);
    }
}
