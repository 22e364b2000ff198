// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

mod model;
pub mod pipeline;
pub mod reader;

pub use model::{from_fixed, to_fixed, FeatureType, Member, Node, Relation, Way, COORDINATE_SCALE};
pub use pipeline::{
    extract_from_buffer, extract_from_file, Extract, KindFilter, Options, ProtocolError, Selection,
};
pub use reader::{DecodeError, FileFormat, Input};
