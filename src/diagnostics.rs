// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use log::{debug, warn};

/// Reason for leaving a way out of the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// No class of the profile matches the way tags.
    Unclassified,

    /// Access tags prohibit the profile's mode of transport.
    Prohibited,

    /// Fewer than two of the way's nodes are available.
    TooShort,
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unclassified => write!(f, "no matching way class"),
            Self::Prohibited => write!(f, "prohibited by access tags"),
            Self::TooShort => write!(f, "less than 2 known nodes"),
        }
    }
}

/// Non-fatal conditions encountered while building a mesh and solving routes.
///
/// Every recorded condition is also logged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// Ways left out of the mesh, with the reason.
    pub dropped_ways: Vec<(i64, DropReason)>,

    /// `(way id, node id)` pairs of way references to nodes absent from the extract.
    pub missing_nodes: Vec<(i64, i64)>,

    /// Indices of waypoints which could not be attached to the mesh.
    pub unsnapped: Vec<usize>,

    /// `(from, to)` waypoint index pairs without a connecting path.
    pub unreachable: Vec<(usize, usize)>,
}

impl Diagnostics {
    pub(crate) fn drop_way(&mut self, way_id: i64, reason: DropReason) {
        debug!("way {way_id} skipped: {reason}");
        self.dropped_ways.push((way_id, reason));
    }

    pub(crate) fn missing_node(&mut self, way_id: i64, node_id: i64) {
        warn!("way {way_id} references node {node_id}, which is not available");
        self.missing_nodes.push((way_id, node_id));
    }

    pub(crate) fn unsnapped(&mut self, waypoint: usize) {
        warn!("waypoint {} can't be attached to the mesh", waypoint + 1);
        self.unsnapped.push(waypoint);
    }

    pub(crate) fn unreachable(&mut self, from: usize, to: usize) {
        warn!("no route from waypoint {} to waypoint {}", from + 1, to + 1);
        self.unreachable.push((from, to));
    }

    /// Returns true if nothing was recorded.
    pub fn is_clean(&self) -> bool {
        self.dropped_ways.is_empty()
            && self.missing_nodes.is_empty()
            && self.unsnapped.is_empty()
            && self.unreachable.is_empty()
    }
}
