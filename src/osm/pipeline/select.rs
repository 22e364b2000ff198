// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use super::assembler::RecordHandler;
use super::{BoundingBox, Options};
use crate::collections::Bitset;
use crate::osm::reader::Flow;
use crate::osm::{FeatureType, Node, Relation, Way};
use crate::Error;

/// Ids of records picked by the selection pass.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub nodes: Bitset,
    pub ways: Bitset,
    pub relations: Bitset,
}

impl Selection {
    pub fn contains(&self, type_: FeatureType, id: u64) -> bool {
        match type_ {
            FeatureType::Node => self.nodes.is_marked(id),
            FeatureType::Way => self.ways.is_marked(id),
            FeatureType::Relation => self.relations.is_marked(id),
        }
    }

    /// Returns true if no record of the given type is selected.
    pub fn is_empty_for(&self, type_: FeatureType) -> bool {
        match type_ {
            FeatureType::Node => self.nodes.is_empty(),
            FeatureType::Way => self.ways.is_empty(),
            FeatureType::Relation => self.relations.is_empty(),
        }
    }
}

/// [RecordHandler] of the first pass: evaluates the filter and marks matches.
pub(super) struct Selector<'a> {
    options: &'a Options<'a>,
    bbox: Option<BoundingBox>,
    inside: Bitset,
    pub(super) selection: Selection,
}

impl<'a> Selector<'a> {
    pub(super) fn new(options: &'a Options<'a>) -> Self {
        Self {
            options,
            bbox: BoundingBox::from_options(options.bbox),
            inside: Bitset::default(),
            selection: Selection::default(),
        }
    }

    fn in_bbox(&self, id: i64) -> bool {
        self.bbox.is_none() || self.inside.is_marked(id as u64)
    }
}

impl RecordHandler for Selector<'_> {
    fn start(&mut self, type_: FeatureType) -> Flow {
        let keep = match type_ {
            // Positions of excluded nodes are still needed for bbox checks of ways
            FeatureType::Node => self.options.keep.nodes || self.bbox.is_some(),
            FeatureType::Way => self.options.keep.ways,
            FeatureType::Relation => self.options.keep.relations,
        };

        if keep {
            Flow::Continue
        } else {
            Flow::Skip
        }
    }

    fn id(&mut self, _: FeatureType, _: u64) -> Flow {
        Flow::Continue
    }

    fn position(&mut self, id: u64, lon: i32, lat: i32) -> Result<Flow, Error> {
        if let Some(bbox) = self.bbox {
            if bbox.contains(lon, lat) {
                self.inside.mark(id)?;
            } else {
                return Ok(Flow::Skip);
            }
        }

        if self.options.keep.nodes {
            Ok(Flow::Continue)
        } else {
            Ok(Flow::Skip)
        }
    }

    fn node(&mut self, node: &Node) -> Result<(), Error> {
        if self.in_bbox(node.id) && self.options.filter.matches_tags(&node.tags)? {
            self.selection.nodes.mark(node.id as u64)?;
        }
        Ok(())
    }

    fn way(&mut self, way: &Way) -> Result<(), Error> {
        if self.bbox.is_some() && !way.refs.iter().any(|&r| self.in_bbox(r)) {
            return Ok(());
        }

        if self.options.filter.matches_tags(&way.tags)? {
            self.selection.ways.mark(way.id as u64)?;
            for &r in &way.refs {
                self.selection.nodes.mark(r as u64)?;
            }
        }
        Ok(())
    }

    fn relation(&mut self, relation: &Relation) -> Result<(), Error> {
        if self.options.filter.matches_tags(&relation.tags)? {
            self.selection.relations.mark(relation.id as u64)?;
        }
        Ok(())
    }
}
