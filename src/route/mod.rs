// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::str::FromStr;

use log::info;

use crate::collections::AllocationError;
use crate::mesh::{Mesh, NodeHandle};
use crate::Diagnostics;

mod snap;
mod solve;

pub use snap::{reach_threshold, snap, REACH_DEPTH};
pub use solve::Router;

/// Requested route point, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub lat: f64,
    pub lon: f64,
}

impl Waypoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Error returned when parsing a [Waypoint] from `lat,lon` text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid waypoint {0:?}: expected \"lat,lon\" in degrees")]
pub struct ParseWaypointError(pub String);

impl FromStr for Waypoint {
    type Err = ParseWaypointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseWaypointError(s.to_string());
        let (lat, lon) = s.split_once(',').ok_or_else(err)?;
        let lat: f64 = lat.trim().parse().map_err(|_| err())?;
        let lon: f64 = lon.trim().parse().map_err(|_| err())?;

        if lat.abs() <= 90.0 && lon.abs() <= 180.0 {
            Ok(Self { lat, lon })
        } else {
            Err(err())
        }
    }
}

/// Cheapest path between two waypoints.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Index of the source waypoint.
    pub from: usize,

    /// Index of the destination waypoint.
    pub to: usize,

    /// Mesh nodes from the source to the destination, inclusive.
    pub path: Vec<NodeHandle>,

    pub distance_m: f64,
    pub duration_s: f64,
    pub cost: f64,
}

impl Solution {
    /// Returns the `(lat, lon)` positions of the path nodes.
    pub fn coordinates<'a>(&'a self, mesh: &'a Mesh) -> impl Iterator<Item = (f64, f64)> + 'a {
        self.path.iter().map(move |&h| {
            let n = mesh.node(h);
            (n.lat(), n.lon())
        })
    }
}

/// Snaps every waypoint and finds the cheapest path between every ordered
/// pair of snapped waypoints.
///
/// Unsnappable waypoints and unreachable pairs are recorded in `diagnostics`;
/// solutions are ordered by source, then destination waypoint index.
pub fn solve_all(
    mesh: &Mesh,
    waypoints: &[Waypoint],
    diagnostics: &mut Diagnostics,
) -> Result<Vec<Solution>, AllocationError> {
    let snapped: Vec<Option<NodeHandle>> = waypoints
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let s = snap(mesh, w);
            if s.is_none() {
                diagnostics.unsnapped(i);
            }
            s
        })
        .collect();

    let mut router = Router::new(mesh);
    let mut solutions = Vec::new();
    for source in 0..waypoints.len() {
        solutions.extend(router.solve(source, &snapped, diagnostics)?);
    }

    info!(
        "found {} of {} routes",
        solutions.len(),
        waypoints.len() * waypoints.len().saturating_sub(1),
    );
    Ok(solutions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Expression;
    use crate::mesh::{build_mesh, MeshOptions};
    use crate::osm::{extract_from_buffer, to_fixed, Extract, FileFormat, KindFilter, Node, Options, Way};
    use crate::tags::Vocabulary;

    const MAP: &[u8] = include_bytes!("../osm/test_fixtures/map.osm");

    /// 1 km expressed in degrees of latitude.
    const KM_LAT: f64 = 0.0089932;

    fn node(id: i64, lat: f64, lon: f64) -> Node {
        Node {
            id,
            lon: to_fixed(lon),
            lat: to_fixed(lat),
            tags: vec![],
        }
    }

    fn residential(id: i64, refs: &[i64]) -> Way {
        Way {
            id,
            tags: vec![Vocabulary::builtin().intern("highway_residential")],
            refs: refs.to_vec(),
        }
    }

    fn mesh_of(nodes: Vec<Node>, ways: Vec<Way>) -> Mesh {
        let extract = Extract::from_records(nodes, ways, vec![]).unwrap();
        let mut d = Diagnostics::default();
        build_mesh(&extract, Vocabulary::builtin(), &MeshOptions::default(), &mut d).unwrap()
    }

    fn fixture_mesh() -> Mesh {
        let v = Vocabulary::builtin();
        let filter = Expression::compile("highway_*", v).unwrap();
        let options = Options {
            filter: &filter,
            keep: KindFilter::default(),
            file_format: FileFormat::Xml,
            bbox: [0.0; 4],
        };
        let extract = extract_from_buffer(MAP, v, &options).unwrap();
        let mut d = Diagnostics::default();
        build_mesh(&extract, v, &MeshOptions::default(), &mut d).unwrap()
    }

    fn ids(mesh: &Mesh, path: &[NodeHandle]) -> Vec<i64> {
        path.iter().map(|&h| mesh.node(h).node.id).collect()
    }

    #[test]
    fn parse_waypoint() {
        assert_eq!("52.1,21.5".parse(), Ok(Waypoint::new(52.1, 21.5)));
        assert_eq!(" -3.5 , 100 ".parse(), Ok(Waypoint::new(-3.5, 100.0)));
        assert!("52.1".parse::<Waypoint>().is_err());
        assert!("abc,1".parse::<Waypoint>().is_err());
        assert!("91,1".parse::<Waypoint>().is_err());
    }

    #[test]
    fn collinear_path() {
        let m = mesh_of(
            vec![
                node(1, 0.0, 0.0),
                node(2, KM_LAT, 0.0),
                node(3, 2.0 * KM_LAT, 0.0),
            ],
            vec![residential(10, &[1, 2, 3])],
        );

        let mut d = Diagnostics::default();
        let solutions = solve_all(
            &m,
            &[Waypoint::new(0.0, 0.0), Waypoint::new(2.0 * KM_LAT, 0.0)],
            &mut d,
        )
        .unwrap();

        assert_eq!(solutions.len(), 2);
        let s = &solutions[0];
        assert_eq!((s.from, s.to), (0, 1));
        assert_eq!(ids(&m, &s.path), vec![1, 2, 3]);
        assert!((s.distance_m - 2000.0).abs() < 0.5);
        // 30 km/h default for highway=residential
        assert!((s.duration_s - 240.0).abs() < 0.1);
        assert_eq!(s.cost, s.duration_s);

        assert_eq!(ids(&m, &solutions[1].path), vec![3, 2, 1]);
        assert!(d.is_clean());

        let coords: Vec<(f64, f64)> = s.coordinates(&m).collect();
        assert_eq!(coords.len(), 3);
        assert!((coords[2].0 - 2.0 * KM_LAT).abs() < 1e-6);
    }

    #[test]
    fn fixture_routes_respect_oneway() {
        let m = fixture_mesh();
        let mut d = Diagnostics::default();
        let solutions = solve_all(
            &m,
            &[Waypoint::new(52.0, 21.0), Waypoint::new(52.002, 21.002)],
            &mut d,
        )
        .unwrap();

        assert_eq!(solutions.len(), 2);
        assert_eq!(ids(&m, &solutions[0].path), vec![1, 2, 3, 4]);
        assert_eq!(ids(&m, &solutions[1].path), vec![4, 5, 1]);
        assert!(solutions[0].cost < solutions[1].cost);
        assert!(d.unreachable.is_empty());
    }

    #[test]
    fn path_costs_are_sums_of_edges() {
        let m = fixture_mesh();
        let mut d = Diagnostics::default();
        let solutions = solve_all(
            &m,
            &[Waypoint::new(52.0, 21.0), Waypoint::new(53.0, 22.0)],
            &mut d,
        )
        .unwrap();

        for s in &solutions {
            let mut cost = 0.0;
            for pair in s.path.windows(2) {
                cost += m.get_edge(pair[0], pair[1]).unwrap().cost;
            }
            assert!((cost - s.cost).abs() < 1e-9);
        }
    }

    #[test]
    fn snapping_skips_small_fragments() {
        let m = mesh_of(
            vec![
                node(1, 0.0, 0.0),
                node(2, 0.0, 0.001),
                node(3, 0.0, 0.002),
                node(4, 0.0, 0.003),
                node(5, 0.0, 0.004),
                node(6, 0.0, 0.005),
                node(10, 0.0005, 0.0100),
                node(11, 0.0005, 0.0101),
            ],
            vec![
                residential(100, &[1, 2, 3, 4, 5, 6]),
                residential(101, &[10, 11]),
            ],
        );

        let h = snap(&m, &Waypoint::new(0.0005, 0.0100)).unwrap();
        assert_eq!(m.node(h).node.id, 6);

        let h = snap(&m, &Waypoint::new(0.0, 0.0021)).unwrap();
        assert_eq!(m.node(h).node.id, 3);
    }

    #[test]
    fn snapping_falls_back_to_nearest() {
        let m = mesh_of(
            vec![node(1, 0.0, 0.0), node(2, 0.0, 0.001), node(3, 1.0, 1.0)],
            vec![residential(100, &[1, 2])],
        );
        let h = snap(&m, &Waypoint::new(0.0, 0.0009)).unwrap();
        assert_eq!(m.node(h).node.id, 2);

        assert!(snap(&Mesh::default(), &Waypoint::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn unreachable_pairs() {
        let m = mesh_of(
            vec![
                node(1, 0.0, 0.0),
                node(2, 0.0, 0.001),
                node(3, 1.0, 1.0),
                node(4, 1.0, 1.001),
            ],
            vec![residential(100, &[1, 2]), residential(101, &[3, 4])],
        );

        let mut d = Diagnostics::default();
        let solutions =
            solve_all(&m, &[Waypoint::new(0.0, 0.0), Waypoint::new(1.0, 1.0)], &mut d).unwrap();
        assert!(solutions.is_empty());
        assert_eq!(d.unreachable, vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn empty_mesh() {
        let mut d = Diagnostics::default();
        let solutions = solve_all(
            &Mesh::default(),
            &[Waypoint::new(0.0, 0.0), Waypoint::new(1.0, 1.0)],
            &mut d,
        )
        .unwrap();
        assert!(solutions.is_empty());
        assert_eq!(d.unsnapped, vec![0, 1]);
        assert!(d.unreachable.is_empty());
    }

    #[test]
    fn waypoints_on_the_same_node() {
        let m = fixture_mesh();
        let mut d = Diagnostics::default();
        let solutions = solve_all(
            &m,
            &[Waypoint::new(52.0, 21.0), Waypoint::new(52.00001, 21.00001)],
            &mut d,
        )
        .unwrap();

        assert_eq!(solutions.len(), 2);
        assert_eq!(ids(&m, &solutions[0].path), vec![1]);
        assert_eq!(solutions[0].cost, 0.0);
    }

    #[test]
    fn router_reuse() {
        let m = fixture_mesh();
        let snapped: Vec<Option<NodeHandle>> = [1, 4, 20].iter().map(|&id| m.handle(id)).collect();
        let mut router = Router::new(&m);
        let mut d = Diagnostics::default();

        let first = router.solve(0, &snapped, &mut d).unwrap();
        let again = router.solve(0, &snapped, &mut d).unwrap();
        assert_eq!(first, again);
        assert_eq!(first.iter().map(|s| s.to).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(ids(&m, &first[1].path), vec![1, 2, 3, 7, 20]);
    }
}
