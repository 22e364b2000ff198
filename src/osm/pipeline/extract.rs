// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use super::assembler::RecordHandler;
use super::select::Selection;
use crate::collections::GrowVec;
use crate::osm::reader::Flow;
use crate::osm::{FeatureType, Node, Relation, Way};
use crate::Error;

/// Records materialized by the extraction pass, each kind sorted by id.
#[derive(Debug, Clone)]
pub struct Extract {
    nodes: GrowVec<Node>,
    ways: GrowVec<Way>,
    relations: GrowVec<Relation>,
}

impl Default for Extract {
    fn default() -> Self {
        Self {
            nodes: GrowVec::new("nodes"),
            ways: GrowVec::new("ways"),
            relations: GrowVec::new("relations"),
        }
    }
}

impl Extract {
    /// Builds an extract from already decoded records.
    pub fn from_records(
        nodes: Vec<Node>,
        ways: Vec<Way>,
        relations: Vec<Relation>,
    ) -> Result<Self, Error> {
        let mut e = Self::default();
        e.nodes.extend_from_slice(&nodes)?;
        e.ways.extend_from_slice(&ways)?;
        e.relations.extend_from_slice(&relations)?;
        e.sort();
        Ok(e)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn ways(&self) -> &[Way] {
        &self.ways
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn node(&self, id: i64) -> Option<&Node> {
        self.nodes.search_by_key(&id, |n| n.id)
    }

    pub fn way(&self, id: i64) -> Option<&Way> {
        self.ways.search_by_key(&id, |w| w.id)
    }

    pub fn relation(&self, id: i64) -> Option<&Relation> {
        self.relations.search_by_key(&id, |r| r.id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.ways.is_empty() && self.relations.is_empty()
    }

    pub(super) fn sort(&mut self) {
        self.nodes.sort_by_key(|n| n.id);
        self.ways.sort_by_key(|w| w.id);
        self.relations.sort_by_key(|r| r.id);
    }
}

/// [RecordHandler] of the second pass: copies selected records into an [Extract].
pub(super) struct Extractor<'a> {
    selection: &'a Selection,
    pub(super) extract: Extract,
}

impl<'a> Extractor<'a> {
    pub(super) fn new(selection: &'a Selection) -> Self {
        Self {
            selection,
            extract: Extract::default(),
        }
    }
}

impl RecordHandler for Extractor<'_> {
    fn start(&mut self, type_: FeatureType) -> Flow {
        if self.selection.is_empty_for(type_) {
            Flow::Skip
        } else {
            Flow::Continue
        }
    }

    fn id(&mut self, type_: FeatureType, id: u64) -> Flow {
        if self.selection.contains(type_, id) {
            Flow::Continue
        } else {
            Flow::Skip
        }
    }

    fn position(&mut self, _: u64, _: i32, _: i32) -> Result<Flow, Error> {
        Ok(Flow::Continue)
    }

    fn node(&mut self, node: &Node) -> Result<(), Error> {
        self.extract.nodes.push(node.clone())?;
        Ok(())
    }

    fn way(&mut self, way: &Way) -> Result<(), Error> {
        self.extract.ways.push(way.clone())?;
        Ok(())
    }

    fn relation(&mut self, relation: &Relation) -> Result<(), Error> {
        self.extract.relations.push(relation.clone())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups() -> Result<(), Error> {
        let node = |id| Node {
            id,
            lon: 0,
            lat: 0,
            tags: vec![],
        };
        let e = Extract::from_records(
            vec![node(30), node(10), node(20)],
            vec![Way {
                id: 5,
                tags: vec![],
                refs: vec![10, 20],
            }],
            vec![],
        )?;

        assert_eq!(
            e.nodes().iter().map(|n| n.id).collect::<Vec<_>>(),
            vec![10, 20, 30]
        );
        assert_eq!(e.node(20).map(|n| n.id), Some(20));
        assert!(e.node(15).is_none());
        assert_eq!(e.way(5).map(|w| w.refs.len()), Some(2));
        assert!(e.relation(5).is_none());
        assert!(!e.is_empty());
        Ok(())
    }
}
