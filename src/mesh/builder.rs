// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use log::info;

use super::profile::{Classification, ResolvedProfile};
use super::{CostModel, Direction, Edge, Mesh, MeshNode, MeshProfile, MeshWay, NodeHandle, ROAD_PROFILE};
use crate::collections::{reserve_doubling, AllocationError};
use crate::diagnostics::DropReason;
use crate::distance::earth_distance;
use crate::osm::{Extract, Node, Way};
use crate::tags::Vocabulary;
use crate::Diagnostics;

/// Additional controls for converting an [Extract] into a [Mesh].
#[derive(Debug, Clone, Copy)]
pub struct MeshOptions<'a> {
    /// How ways should be classified.
    pub profile: &'a MeshProfile<'a>,

    /// Which edge property becomes the edge cost.
    pub cost: CostModel,
}

impl Default for MeshOptions<'static> {
    fn default() -> Self {
        Self {
            profile: &ROAD_PROFILE,
            cost: CostModel::default(),
        }
    }
}

/// Builds a routable [Mesh] out of all classifiable ways of an [Extract].
///
/// When several ways connect the same ordered pair of nodes, only the
/// cheapest edge is kept (the first one on ties).
///
/// Non-fatal conditions (unusable ways, missing nodes) are recorded in `diagnostics`.
pub fn build_mesh(
    extract: &Extract,
    vocabulary: &Vocabulary,
    options: &MeshOptions<'_>,
    diagnostics: &mut Diagnostics,
) -> Result<Mesh, AllocationError> {
    let mut b = MeshBuilder {
        extract,
        profile: ResolvedProfile::new(options.profile, vocabulary),
        cost: options.cost,
        mesh: Mesh::default(),
        diagnostics,
    };

    for way in extract.ways() {
        b.add_way(way)?;
    }

    info!(
        "mesh built: {} nodes, {} edges from {} ways",
        b.mesh.len(),
        b.mesh.edge_count(),
        b.mesh.ways.len(),
    );
    Ok(b.mesh)
}

struct MeshBuilder<'a> {
    extract: &'a Extract,
    profile: ResolvedProfile<'a>,
    cost: CostModel,
    mesh: Mesh,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> MeshBuilder<'a> {
    fn add_way(&mut self, w: &Way) -> Result<(), AllocationError> {
        let Some(class) = self.profile.class(&w.tags) else {
            self.diagnostics.drop_way(w.id, DropReason::Unclassified);
            return Ok(());
        };

        if !self.profile.is_allowed(&w.tags) {
            self.diagnostics.drop_way(w.id, DropReason::Prohibited);
            return Ok(());
        }

        let nodes = self.way_nodes(w);
        if nodes.len() < 2 {
            self.diagnostics.drop_way(w.id, DropReason::TooShort);
            return Ok(());
        }

        let way_index = self.mesh.ways.len();
        reserve_doubling(&mut self.mesh.ways, 1, "mesh ways")?;
        self.mesh.ways.push(MeshWay {
            way_id: w.id,
            class: class.class,
            direction: class.direction,
            speed: class.speed,
            speed_kmh: class.speed_kmh,
        });

        let mut prev: Option<NodeHandle> = None;
        for node in nodes {
            let at = self.get_or_create(node)?;

            let touching = &mut self.mesh.nodes[at.0].ways;
            if touching.last() != Some(&way_index) {
                touching.push(way_index);
            }

            if let Some(from) = prev.filter(|&from| from != at) {
                self.connect(from, at, &class)?;
            }
            prev = Some(at);
        }

        Ok(())
    }

    /// Returns the way's nodes available in the extract, recording missing ones.
    fn way_nodes(&mut self, w: &Way) -> Vec<&'a Node> {
        let extract = self.extract;
        let mut nodes = Vec::with_capacity(w.refs.len());
        for &node_id in &w.refs {
            match extract.node(node_id) {
                Some(n) => nodes.push(n),
                None => self.diagnostics.missing_node(w.id, node_id),
            }
        }
        nodes
    }

    fn get_or_create(&mut self, node: &Node) -> Result<NodeHandle, AllocationError> {
        if let Some(handle) = self.mesh.handle(node.id) {
            return Ok(handle);
        }

        let handle = NodeHandle(self.mesh.nodes.len());
        reserve_doubling(&mut self.mesh.nodes, 1, "mesh nodes")?;
        self.mesh.nodes.push(MeshNode {
            node: node.clone(),
            ways: Vec::default(),
            edges: Vec::default(),
        });
        self.mesh.registry.insert(node.id, handle);
        Ok(handle)
    }

    fn connect(
        &mut self,
        from: NodeHandle,
        to: NodeHandle,
        class: &Classification,
    ) -> Result<(), AllocationError> {
        let a = self.mesh.node(from);
        let b = self.mesh.node(to);
        let distance_m = earth_distance(a.lat(), a.lon(), b.lat(), b.lon());
        let duration_s = distance_m / (class.speed_kmh / 3.6);
        let cost = self.cost.cost(distance_m, duration_s);

        let edge = |to| Edge {
            to,
            distance_m,
            duration_s,
            cost,
        };

        match class.direction {
            Direction::Forward => self.set_edge(from, edge(to)),
            Direction::Reverse => self.set_edge(to, edge(from)),
            Direction::Both => {
                self.set_edge(from, edge(to))?;
                self.set_edge(to, edge(from))
            }
        }
    }

    /// Adds an edge, keeping only the cheaper one if the nodes are already connected.
    fn set_edge(&mut self, from: NodeHandle, edge: Edge) -> Result<(), AllocationError> {
        let edges = &mut self.mesh.nodes[from.0].edges;
        match edges.iter_mut().find(|e| e.to == edge.to) {
            Some(existing) => {
                if edge.cost < existing.cost {
                    *existing = edge;
                }
            }
            None => {
                reserve_doubling(edges, 1, "mesh edges")?;
                edges.push(edge);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Expression;
    use crate::mesh::RESTRICTED_ROAD_PROFILE;
    use crate::osm::{extract_from_buffer, FileFormat, KindFilter, Options};

    const MAP: &[u8] = include_bytes!("../osm/test_fixtures/map.osm");

    macro_rules! assert_almost_eq {
        ($a:expr, $b:expr) => {
            assert!(
                (($a - $b).abs() < 1e-2),
                "assertion failed: {} ≈ {}",
                $a,
                $b
            )
        };
    }

    fn build(filter: &str, cost: CostModel) -> (Mesh, Diagnostics) {
        let v = Vocabulary::builtin();
        let filter = Expression::compile(filter, v).unwrap();
        let options = Options {
            filter: &filter,
            keep: KindFilter::default(),
            file_format: FileFormat::Xml,
            bbox: [0.0; 4],
        };
        let extract = extract_from_buffer(MAP, v, &options).unwrap();

        let mut d = Diagnostics::default();
        let options = MeshOptions {
            profile: &ROAD_PROFILE,
            cost,
        };
        let mesh = build_mesh(&extract, v, &options, &mut d).unwrap();
        (mesh, d)
    }

    fn edge(m: &Mesh, from: i64, to: i64) -> Option<Edge> {
        m.get_edge(m.handle(from)?, m.handle(to)?).copied()
    }

    #[test]
    fn structure() {
        let (m, d) = build("highway_*", CostModel::Duration);

        //   7 ── 20
        //   │
        //   3 ──> 4
        //   │     │
        //   2     │
        //   │     │
        //   1 ─── 5
        assert_eq!(m.len(), 7);
        assert_eq!(m.edge_count(), 13);
        assert_eq!(m.ways().len(), 5);

        assert!(edge(&m, 1, 2).is_some());
        assert!(edge(&m, 2, 1).is_some());
        assert!(edge(&m, 3, 4).is_some());
        assert!(edge(&m, 4, 3).is_none());
        assert!(edge(&m, 1, 3).is_none());

        assert_eq!(d.dropped_ways, vec![(106, DropReason::TooShort)]);
        assert_eq!(d.missing_nodes, vec![(106, 99)]);
    }

    #[test]
    fn edge_weights() {
        let (m, _) = build("highway_*", CostModel::Duration);

        // highway=primary defaults to 90 km/h
        let e = edge(&m, 1, 2).unwrap();
        assert_almost_eq!(e.distance_m, 111.19);
        assert_almost_eq!(e.duration_s, 111.19 / 25.0);
        assert_eq!(e.cost, e.duration_s);

        // maxspeed=50 overrides the highway=secondary default
        let e = edge(&m, 5, 4).unwrap();
        assert_almost_eq!(e.distance_m, 222.39);
        assert_almost_eq!(e.duration_s, 222.39 / (50.0 / 3.6));

        let (m, _) = build("highway_*", CostModel::Distance);
        let e = edge(&m, 1, 2).unwrap();
        assert_eq!(e.cost, e.distance_m);
    }

    #[test]
    fn node_ways() {
        let (m, _) = build("highway_*", CostModel::Duration);
        let ways = |id| {
            m.node(m.handle(id).unwrap())
                .ways
                .iter()
                .map(|&i| m.ways()[i].way_id)
                .collect::<Vec<_>>()
        };

        assert_eq!(ways(1), vec![100, 102]);
        assert_eq!(ways(2), vec![100]);
        assert_eq!(ways(3), vec![100, 101, 104]);
        assert_eq!(ways(20), vec![105]);
    }

    #[test]
    fn unclassified_ways_are_dropped() {
        let (m, d) = build("", CostModel::Duration);
        assert!(d.dropped_ways.contains(&(103, DropReason::Unclassified)));
        assert!(m.handle(6).is_none());
        assert!(m.handle(10).is_none());
    }

    fn two_node_way(v: &Vocabulary, names: &[&str]) -> Result<Extract, crate::Error> {
        let node = |id, lat: f64| Node {
            id,
            lon: 0,
            lat: crate::osm::to_fixed(lat),
            tags: vec![],
        };
        let mut tags: Vec<_> = names.iter().map(|n| v.intern(n)).collect();
        tags.sort();
        Extract::from_records(
            vec![node(1, 0.0), node(2, 0.001)],
            vec![Way {
                id: 9,
                tags,
                refs: vec![1, 2],
            }],
            vec![],
        )
    }

    #[test]
    fn road_profile_keeps_access_restricted_ways() -> Result<(), crate::Error> {
        let v = Vocabulary::builtin();
        let extract = two_node_way(v, &["highway_primary", "access_no", "motorroad_yes"])?;

        let mut d = Diagnostics::default();
        let m = build_mesh(&extract, v, &MeshOptions::default(), &mut d)?;
        assert_eq!(m.len(), 2);
        assert_eq!(m.edge_count(), 2);
        assert!(d.is_clean());
        Ok(())
    }

    #[test]
    fn restricted_profile_drops_prohibited_ways() -> Result<(), crate::Error> {
        let v = Vocabulary::builtin();
        let options = MeshOptions {
            profile: &RESTRICTED_ROAD_PROFILE,
            cost: CostModel::Duration,
        };

        for names in [
            &["highway_primary", "access_no"][..],
            &["highway_primary", "motor_vehicle_private"][..],
            &["highway_trunk", "motorroad_yes"][..],
        ] {
            let extract = two_node_way(v, names)?;
            let mut d = Diagnostics::default();
            let m = build_mesh(&extract, v, &options, &mut d)?;
            assert!(m.is_empty(), "{names:?} should be dropped");
            assert_eq!(d.dropped_ways, vec![(9, DropReason::Prohibited)]);
        }

        let extract = two_node_way(v, &["highway_primary", "access_no", "motor_vehicle_yes"])?;
        let mut d = Diagnostics::default();
        let m = build_mesh(&extract, v, &options, &mut d)?;
        assert_eq!(m.len(), 2);
        Ok(())
    }

    #[test]
    fn parallel_ways_keep_the_cheaper_edge() -> Result<(), crate::Error> {
        let v = Vocabulary::builtin();
        let node = |id, lat: f64| Node {
            id,
            lon: 0,
            lat: crate::osm::to_fixed(lat),
            tags: vec![],
        };
        let way = |id, class: &str| Way {
            id,
            tags: vec![v.intern(class)],
            refs: vec![1, 2],
        };

        // Ways are processed by id, so the slower one comes first and gets replaced
        let extract = Extract::from_records(
            vec![node(1, 0.0), node(2, 0.001)],
            vec![way(1, "highway_residential"), way(2, "highway_primary")],
            vec![],
        )?;

        let mut d = Diagnostics::default();
        let m = build_mesh(&extract, v, &MeshOptions::default(), &mut d)?;
        assert_eq!(m.edge_count(), 2);
        assert_eq!(m.ways().len(), 2);

        let e = edge(&m, 1, 2).unwrap();
        assert_almost_eq!(e.duration_s, e.distance_m / 25.0);
        let e = edge(&m, 2, 1).unwrap();
        assert_almost_eq!(e.duration_s, e.distance_m / 25.0);

        // With distance costs both candidates tie, and the first one stays
        let options = MeshOptions {
            profile: &ROAD_PROFILE,
            cost: CostModel::Distance,
        };
        let m = build_mesh(&extract, v, &options, &mut d)?;
        assert_eq!(m.edge_count(), 2);
        let e = edge(&m, 1, 2).unwrap();
        assert_almost_eq!(e.duration_s, e.distance_m / (30.0 / 3.6));
        Ok(())
    }

    #[test]
    fn repeated_refs_make_no_loops() -> Result<(), crate::Error> {
        let v = Vocabulary::builtin();
        let node = |id, lat: f64| Node {
            id,
            lon: 0,
            lat: crate::osm::to_fixed(lat),
            tags: vec![],
        };
        let extract = Extract::from_records(
            vec![node(1, 0.0), node(2, 0.001)],
            vec![Way {
                id: 9,
                tags: vec![v.intern("highway_residential")],
                refs: vec![1, 1, 2, 2],
            }],
            vec![],
        )?;

        let mut d = Diagnostics::default();
        let m = build_mesh(&extract, v, &MeshOptions::default(), &mut d)?;
        assert_eq!(m.len(), 2);
        assert_eq!(m.edge_count(), 2);
        assert!(d.is_clean());
        Ok(())
    }
}
