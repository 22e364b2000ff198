// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;

use crate::osm::Node;
use crate::tags::Tag;

mod builder;
mod profile;

pub use builder::{build_mesh, MeshOptions};
pub use profile::{Classification, MeshProfile, WayClass, RESTRICTED_ROAD_PROFILE, ROAD_PROFILE};

/// Index of a [MeshNode] in its [Mesh].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeHandle(pub usize);

/// Allowed direction of travel along a way, relative to the order of its nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
    Both,
}

/// Which edge property is minimized by the route solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CostModel {
    /// Travel time, with speeds coming from way classes and `maxspeed` tags.
    #[default]
    Duration,

    /// Plain distance.
    Distance,
}

impl CostModel {
    pub fn cost(self, distance_m: f64, duration_s: f64) -> f64 {
        match self {
            CostModel::Duration => duration_s,
            CostModel::Distance => distance_m,
        }
    }
}

/// Outgoing connection of a [MeshNode].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub to: NodeHandle,
    pub distance_m: f64,
    pub duration_s: f64,
    pub cost: f64,
}

/// Way admitted into the [Mesh], with its class defaults and overrides applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshWay {
    pub way_id: i64,
    pub class: Tag,
    pub direction: Direction,
    pub speed: Tag,
    pub speed_kmh: f64,
}

/// Routable node: its source record, indices of [MeshWays](MeshWay)
/// touching it and its outgoing edges.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshNode {
    pub node: Node,
    pub ways: Vec<usize>,
    pub edges: Vec<Edge>,
}

impl MeshNode {
    pub fn lat(&self) -> f64 {
        self.node.lat_deg()
    }

    pub fn lon(&self) -> f64 {
        self.node.lon_deg()
    }
}

/// Routable graph built from extracted ways.
///
/// Nodes are stored in an arena and addressed by [NodeHandles](NodeHandle);
/// OSM node ids are only used by [Mesh::handle].
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    nodes: Vec<MeshNode>,
    ways: Vec<MeshWay>,
    registry: BTreeMap<i64, NodeHandle>,
}

impl Mesh {
    /// Returns the number of nodes in the mesh.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, handle: NodeHandle) -> &MeshNode {
        &self.nodes[handle.0]
    }

    pub fn get_node(&self, handle: NodeHandle) -> Option<&MeshNode> {
        self.nodes.get(handle.0)
    }

    /// Finds a mesh node by its OSM id.
    pub fn handle(&self, node_id: i64) -> Option<NodeHandle> {
        self.registry.get(&node_id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeHandle, &MeshNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeHandle(i), n))
    }

    pub fn ways(&self) -> &[MeshWay] {
        &self.ways
    }

    pub fn edges(&self, handle: NodeHandle) -> &[Edge] {
        &self.nodes[handle.0].edges
    }

    /// Returns the edge from one node to another, if it exists.
    pub fn get_edge(&self, from: NodeHandle, to: NodeHandle) -> Option<&Edge> {
        self.get_node(from)?.edges.iter().find(|e| e.to == to)
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.edges.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_models() {
        assert_eq!(CostModel::default(), CostModel::Duration);
        assert_eq!(CostModel::Duration.cost(100.0, 7.5), 7.5);
        assert_eq!(CostModel::Distance.cost(100.0, 7.5), 100.0);
    }
}
