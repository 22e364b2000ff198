// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{HashSet, VecDeque};

use super::Waypoint;
use crate::distance::{earth_distance, envelope};
use crate::mesh::{Mesh, NodeHandle};

/// Maximum number of hops explored when checking if a node is well connected.
pub const REACH_DEPTH: usize = 16;

/// Number of nodes a snapping candidate must reach within [REACH_DEPTH] hops.
///
/// Scales with the mesh size, clamped to 4..=8.
pub fn reach_threshold(node_count: usize) -> usize {
    (node_count / 100).clamp(4, 8)
}

/// Finds the mesh node closest to `waypoint` which is not stranded on a tiny
/// disconnected fragment.
///
/// Falls back to the closest node regardless of connectivity if no node
/// reaches [reach_threshold] others. Returns `None` only for an empty mesh.
pub fn snap(mesh: &Mesh, waypoint: &Waypoint) -> Option<NodeHandle> {
    let threshold = reach_threshold(mesh.len());
    let mut nearest: Option<(NodeHandle, f64)> = None;
    let mut best: Option<(NodeHandle, f64)> = None;
    let mut bounds: Option<(f64, f64)> = None;
    let mut scratch = Reach::default();

    for (handle, node) in mesh.iter() {
        let (lat, lon) = (node.lat(), node.lon());

        if let Some((dlat, dlon)) = bounds {
            if (lat - waypoint.lat).abs() > dlat || (lon - waypoint.lon).abs() > dlon {
                continue;
            }
        }

        let distance = earth_distance(waypoint.lat, waypoint.lon, lat, lon);

        if nearest.map_or(true, |(_, d)| distance < d) {
            nearest = Some((handle, distance));
        }

        if best.map_or(true, |(_, d)| distance < d)
            && scratch.count(mesh, handle, threshold) >= threshold
        {
            best = Some((handle, distance));
            bounds = Some(envelope(waypoint.lat, distance));
        }
    }

    best.or(nearest).map(|(handle, _)| handle)
}

/// Reusable breadth-first search state.
#[derive(Debug, Default)]
struct Reach {
    seen: HashSet<NodeHandle>,
    queue: VecDeque<(NodeHandle, usize)>,
}

impl Reach {
    /// Counts nodes reachable from `start` within [REACH_DEPTH] hops,
    /// stopping once `limit` is reached.
    fn count(&mut self, mesh: &Mesh, start: NodeHandle, limit: usize) -> usize {
        self.seen.clear();
        self.queue.clear();
        self.seen.insert(start);
        self.queue.push_back((start, 0));

        let mut reached = 0;
        while let Some((at, depth)) = self.queue.pop_front() {
            if depth >= REACH_DEPTH {
                continue;
            }

            for edge in mesh.edges(at) {
                if self.seen.insert(edge.to) {
                    reached += 1;
                    if reached >= limit {
                        return reached;
                    }
                    self.queue.push_back((edge.to, depth + 1));
                }
            }
        }

        reached
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_mesh, MeshOptions};
    use crate::osm::{to_fixed, Extract, Node, Way};
    use crate::tags::Vocabulary;
    use crate::Diagnostics;

    /// Bidirectional road through `len` nodes with ids `1..=len`.
    fn chain(len: i64) -> Mesh {
        let v = Vocabulary::builtin();
        let nodes = (1..=len)
            .map(|id| Node {
                id,
                lon: to_fixed(id as f64 * 0.001),
                lat: 0,
                tags: vec![],
            })
            .collect();
        let way = Way {
            id: 1,
            tags: vec![v.intern("highway_residential")],
            refs: (1..=len).collect(),
        };
        let extract = Extract::from_records(nodes, vec![way], vec![]).unwrap();
        let mut d = Diagnostics::default();
        build_mesh(&extract, v, &MeshOptions::default(), &mut d).unwrap()
    }

    #[test]
    fn reach_stops_at_depth_limit() {
        let m = chain(25);
        let mut r = Reach::default();

        let end = m.handle(1).unwrap();
        assert_eq!(r.count(&m, end, usize::MAX), REACH_DEPTH);

        let middle = m.handle(13).unwrap();
        assert_eq!(r.count(&m, middle, usize::MAX), 24);

        let short = chain(5);
        assert_eq!(r.count(&short, short.handle(1).unwrap(), usize::MAX), 4);
    }

    #[test]
    fn reach_stops_at_limit() {
        let m = chain(25);
        let mut r = Reach::default();
        assert_eq!(r.count(&m, m.handle(1).unwrap(), 3), 3);
    }

    #[test]
    fn thresholds() {
        assert_eq!(reach_threshold(0), 4);
        assert_eq!(reach_threshold(450), 4);
        assert_eq!(reach_threshold(650), 6);
        assert_eq!(reach_threshold(1_000_000), 8);
    }
}
