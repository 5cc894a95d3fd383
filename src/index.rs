// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::btree_map::{BTreeMap, Entry};

use crate::{Node, Position, Way};

/// Policy for resolving node ids which are absent from a [MapIndex].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Unknown ids resolve to a non-building node at [Position::ZERO].
    /// No error is raised. Loading logs a warning for every such id referenced by a way.
    #[default]
    Lenient,

    /// Unknown ids are reported as [UnknownNode] errors.
    Strict,
}

/// A node id referenced by a way, but missing from the [MapIndex].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown node: {0}")]
pub struct UnknownNode(pub u64);

/// Read-only view of an OpenStreetMap extract: all [Nodes](Node) by their ids,
/// and all [Ways](Way) which can be traced as roads.
///
/// An index is built once by one of the [loading functions](crate::osm),
/// and can't be modified afterwards.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MapIndex {
    nodes: BTreeMap<u64, Node>,
    ways: Vec<Way>,
}

impl MapIndex {
    /// Returns the number of nodes in the index.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the index has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns an iterator over all [Nodes](Node), in ascending order of their ids.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Returns all retained [Ways](Way), in document order.
    pub fn ways(&self) -> &[Way] {
        &self.ways
    }

    /// Retrieves a [Node] with the provided id.
    pub fn get_node(&self, id: u64) -> Option<Node> {
        self.nodes.get(&id).copied()
    }

    /// Retrieves a [Node] with the provided id, falling back to
    /// a node at [Position::ZERO] if there's no such node.
    ///
    /// Equivalent to [MapIndex::resolve_node] with [Resolution::Lenient].
    pub fn node_by_id(&self, id: u64) -> Node {
        self.get_node(id).unwrap_or_else(|| Self::fallback_node(id))
    }

    /// Retrieves a [Node] with the provided id, handling missing nodes
    /// as per the provided [Resolution] policy.
    pub fn resolve_node(&self, id: u64, resolution: Resolution) -> Result<Node, UnknownNode> {
        match (self.get_node(id), resolution) {
            (Some(node), _) => Ok(node),
            (None, Resolution::Lenient) => Ok(Self::fallback_node(id)),
            (None, Resolution::Strict) => Err(UnknownNode(id)),
        }
    }

    fn fallback_node(id: u64) -> Node {
        log::debug!("node {} is not present in the map - assuming (0, 0)", id);
        Node {
            id,
            position: Position::ZERO,
            building: false,
        }
    }

    /// Creates or replaces a [Node] with `node.id`.
    pub(crate) fn insert_node(&mut self, node: Node) {
        match self.nodes.entry(node.id) {
            Entry::Vacant(e) => {
                e.insert(node);
            }
            Entry::Occupied(mut e) => {
                log::warn!("node {} is defined multiple times - using the last one", node.id);
                e.insert(node);
            }
        }
    }

    pub(crate) fn push_way(&mut self, way: Way) {
        debug_assert!(way.nodes.len() > 1);
        debug_assert!(!way.ref_.is_empty() || !way.name.is_empty());
        self.ways.push(way);
    }
}
