// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::tags::Tag;

/// Fixed-point coordinates are stored as degrees multiplied by this value.
pub const COORDINATE_SCALE: f64 = 1e7;

/// Converts degrees to fixed-point (10^-7 degree) units.
pub fn to_fixed(degrees: f64) -> i32 {
    (degrees * COORDINATE_SCALE).round() as i32
}

/// Converts fixed-point (10^-7 degree) units to degrees.
pub fn from_fixed(value: i32) -> f64 {
    value as f64 / COORDINATE_SCALE
}

/// Represents an [OSM node](https://wiki.openstreetmap.org/wiki/Node).
///
/// `tags` are sorted and free of duplicates and unknown tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: i64,
    pub lon: i32,
    pub lat: i32,
    pub tags: Vec<Tag>,
}

impl Node {
    pub fn lat_deg(&self) -> f64 {
        from_fixed(self.lat)
    }

    pub fn lon_deg(&self) -> f64 {
        from_fixed(self.lon)
    }
}

/// Represents an [OSM way](https://wiki.openstreetmap.org/wiki/Way).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Way {
    pub id: i64,
    pub tags: Vec<Tag>,
    pub refs: Vec<i64>,
}

/// Type of an [OSM feature/element](https://wiki.openstreetmap.org/wiki/Elements).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureType {
    Node,
    Way,
    Relation,
}

impl std::fmt::Display for FeatureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Node => write!(f, "node"),
            Self::Way => write!(f, "way"),
            Self::Relation => write!(f, "relation"),
        }
    }
}

/// Represents a member of an [OSM relation](https://wiki.openstreetmap.org/wiki/Relation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub type_: FeatureType,
    pub ref_: i64,
    pub role: String,
}

/// Represents an [OSM relation](https://wiki.openstreetmap.org/wiki/Relation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub id: i64,
    pub tags: Vec<Tag>,
    pub members: Vec<Member>,
}
