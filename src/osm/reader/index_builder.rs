// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{BTreeSet, HashMap};

use crate::{MapIndex, Node, Position, Way};

use super::{model, Error};

/// Helper object used for converting [OSM features](super::model::Feature)
/// into a [MapIndex].
#[derive(Debug, Default)]
pub(super) struct IndexBuilder {
    index: MapIndex,
    skipped_ways: usize,
}

impl IndexBuilder {
    /// Add all features from the provided iterator, and return the built [MapIndex].
    /// The first error aborts the whole process.
    pub(super) fn add_features<I: Iterator<Item = Result<model::Feature, Error>>>(
        mut self,
        features: I,
    ) -> Result<MapIndex, Error> {
        for f in features {
            self.add_feature(f?);
        }

        for id in self.dangling_refs() {
            log::warn!("node {} is referenced by a way, but not present in the map", id);
        }

        log::debug!(
            "loaded {} nodes and {} ways ({} ways skipped)",
            self.index.len(),
            self.index.ways().len(),
            self.skipped_ways,
        );
        Ok(self.index)
    }

    fn add_feature(&mut self, f: model::Feature) {
        match f {
            model::Feature::Node(n) => self.add_node(n),
            model::Feature::Way(w) => self.add_way(w),
        }
    }

    fn add_node(&mut self, n: model::Node) {
        self.index.insert_node(Node {
            id: n.id,
            position: Position::new(n.lat, n.lon),
            building: n.tags.contains_key("building"),
        });
    }

    fn add_way(&mut self, w: model::Way) {
        if Self::is_area(&w.tags) {
            self.skipped_ways += 1;
            return;
        }

        let ref_ = w.tags.get("ref").cloned().unwrap_or_default();
        let name = w.tags.get("name").cloned().unwrap_or_default();

        // Only named or referenced roads can be looked up
        if ref_.is_empty() && name.is_empty() {
            self.skipped_ways += 1;
            return;
        }

        if w.nodes.len() < 2 {
            log::debug!("way {} has less than 2 nodes - skipping", w.id);
            self.skipped_ways += 1;
            return;
        }

        self.index.push_way(Way {
            id: w.id,
            ref_,
            name,
            nodes: w.nodes,
        });
    }

    /// Returns ids of nodes referenced by kept ways, but never defined, in ascending order.
    fn dangling_refs(&self) -> BTreeSet<u64> {
        self.index
            .ways()
            .iter()
            .flat_map(|w| w.nodes.iter().copied())
            .filter(|&id| self.index.get_node(id).is_none())
            .collect()
    }

    fn is_area(tags: &HashMap<String, String>) -> bool {
        tags.get("area").is_some_and(|v| v == "yes")
    }
}
