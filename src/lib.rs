// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Tag-filtered extraction and multi-waypoint routing over
//! [OpenStreetMap](https://www.openstreetmap.org/) data.
//!
//! Processing happens in stages:
//! 1. a [filter expression](crate::filter::Expression) selects features by their tags,
//! 2. [osm::extract_from_file] decodes the input twice: once to select
//!    matching features (and the nodes of matching ways), then to copy them
//!    into an [Extract](osm::Extract),
//! 3. [mesh::build_mesh] turns classifiable ways into a routable [Mesh](mesh::Mesh),
//! 4. [route::solve_all] finds cheapest paths between every pair of waypoints,
//! 5. [gpx::write_gpx] exports the result.
//!
//! Non-fatal problems (unusable ways, unreachable waypoints) are collected
//! into [Diagnostics].
//!
//! # Example
//!
//! ```no_run
//! let vocabulary = routemesh::tags::Vocabulary::builtin();
//! let filter = routemesh::filter::Expression::compile("highway_*", vocabulary)?;
//! let options = routemesh::osm::Options {
//!     filter: &filter,
//!     keep: routemesh::osm::KindFilter::default(),
//!     file_format: routemesh::osm::FileFormat::Unknown,
//!     bbox: [0.0; 4],
//! };
//! let extract = routemesh::osm::extract_from_file("path/to/monaco.osm.pbf", vocabulary, &options)?;
//!
//! let mut diagnostics = routemesh::Diagnostics::default();
//! let mesh = routemesh::mesh::build_mesh(
//!     &extract,
//!     vocabulary,
//!     &routemesh::mesh::MeshOptions::default(),
//!     &mut diagnostics,
//! )?;
//!
//! let waypoints = [
//!     routemesh::route::Waypoint::new(43.7384, 7.4246),
//!     routemesh::route::Waypoint::new(43.7478, 7.4323),
//! ];
//! let solutions = routemesh::route::solve_all(&mesh, &waypoints, &mut diagnostics)?;
//! routemesh::gpx::write_gpx(std::io::stdout(), &mesh, &waypoints, &solutions)?;
//! # Ok::<(), routemesh::Error>(())
//! ```

pub mod collections;
mod diagnostics;
mod distance;
mod error;
pub mod filter;
pub mod gpx;
pub mod mesh;
pub mod osm;
pub mod route;
pub mod tags;

pub use diagnostics::{Diagnostics, DropReason};
pub use distance::{earth_distance, EARTH_RADIUS};
pub use error::Error;
