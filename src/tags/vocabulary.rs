// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::OnceLock;

use super::{GroupId, Tag};

/// Canonical speed buckets (km/h) for `maxspeed` values.
const SPEED_BUCKETS: &[u32] = &[5, 10, 15, 20, 25, 30, 40, 50, 60, 70, 80, 90, 100, 110, 120, 130];

const MAX_LAYER: i32 = 5;
const MAX_LANES: i32 = 8;

const MPH_TO_KMH: f64 = 1.609344;

/// Recognized keys and their values, already in normalized form
/// (`-` replaced by `_`). Order determines tag numbering.
const GROUPS: &[(&str, &[&str])] = &[
    (
        "highway",
        &[
            "motorway",
            "motorway_link",
            "trunk",
            "trunk_link",
            "primary",
            "primary_link",
            "secondary",
            "secondary_link",
            "tertiary",
            "tertiary_link",
            "unclassified",
            "residential",
            "living_street",
            "service",
            "track",
            "road",
            "busway",
            "path",
            "footway",
            "cycleway",
            "bridleway",
            "pedestrian",
            "steps",
        ],
    ),
    ("junction", &["roundabout", "circular"]),
    ("oneway", &["yes", "no", "true", "1", "_1", "reverse"]),
    (
        "maxspeed",
        &[
            "5", "10", "15", "20", "25", "30", "40", "50", "60", "70", "80", "90", "100", "110",
            "120", "130",
        ],
    ),
    (
        "surface",
        &[
            "asphalt",
            "paved",
            "concrete",
            "paving_stones",
            "sett",
            "cobblestone",
            "compacted",
            "fine_gravel",
            "gravel",
            "unpaved",
            "dirt",
            "ground",
            "grass",
            "sand",
            "mud",
        ],
    ),
    (
        "access",
        &["yes", "no", "private", "destination", "permissive", "agricultural"],
    ),
    ("motor_vehicle", &["yes", "no", "private", "destination"]),
    ("motorroad", &["yes", "no"]),
    ("tracktype", &["grade1", "grade2", "grade3", "grade4", "grade5"]),
    (
        "smoothness",
        &["excellent", "good", "intermediate", "bad", "very_bad"],
    ),
    ("scenic", &["yes", "no"]),
    (
        "route",
        &["road", "bicycle", "mtb", "hiking", "foot", "bus", "ferry"],
    ),
    ("natural", &["peak", "water", "wood", "coastline", "cliff"]),
    ("tourism", &["viewpoint", "attraction"]),
    ("landuse", &["forest", "meadow", "farmland", "residential"]),
    ("waterway", &["river", "stream"]),
    ("bridge", &["yes", "viaduct"]),
    ("tunnel", &["yes"]),
    (
        "layer",
        &["_5", "_4", "_3", "_2", "_1", "0", "1", "2", "3", "4", "5"],
    ),
    ("lanes", &["1", "2", "3", "4", "5", "6", "7", "8"]),
    ("toll", &["yes", "no"]),
    ("type", &["multipolygon", "route", "restriction", "boundary"]),
    (
        "boundary",
        &["administrative", "national_park", "protected_area"],
    ),
    ("building", &["yes"]),
    ("amenity", &["fuel", "parking", "cafe", "restaurant"]),
    ("place", &["city", "town", "village", "hamlet"]),
];

#[derive(Debug, Clone)]
struct Group {
    name: &'static str,
    members: Vec<Tag>,
}

/// Static table interning `key_value` strings into [Tags](Tag).
///
/// Keys and values are normalized before lookup: surrounding whitespace is
/// trimmed, letters are lowercased and `-`, `:` and inner whitespace become `_`.
/// Numeric `maxspeed` values are rounded up to a canonical speed bucket,
/// `layer` and `lanes` are clamped to a canonical range.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    names: Vec<String>,
    index: HashMap<String, Tag>,
    groups: Vec<Group>,
    group_index: HashMap<&'static str, GroupId>,
    tag_groups: Vec<Option<GroupId>>,
    speed_group: GroupId,
}

impl Default for Vocabulary {
    fn default() -> Self {
        let mut names = vec![String::new()];
        let mut index = HashMap::default();
        let mut groups = Vec::with_capacity(GROUPS.len());
        let mut group_index = HashMap::default();
        let mut tag_groups = vec![None];

        for (group_idx, &(key, values)) in GROUPS.iter().enumerate() {
            let group_id = GroupId(group_idx as u16);
            let mut members = Vec::with_capacity(values.len());

            for value in values {
                let tag = Tag(names.len() as u32);
                let name = format!("{key}_{value}");
                index.insert(name.clone(), tag);
                names.push(name);
                tag_groups.push(Some(group_id));
                members.push(tag);
            }

            group_index.insert(key, group_id);
            groups.push(Group { name: key, members });
        }

        let speed_group = group_index["maxspeed"];

        Self {
            names,
            index,
            groups,
            group_index,
            tag_groups,
            speed_group,
        }
    }
}

impl Vocabulary {
    /// Returns the shared, built-in vocabulary.
    pub fn builtin() -> &'static Vocabulary {
        static BUILTIN: OnceLock<Vocabulary> = OnceLock::new();
        BUILTIN.get_or_init(Vocabulary::default)
    }

    /// Returns the number of known tags, excluding [Tag::UNKNOWN].
    pub fn len(&self) -> usize {
        self.names.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Interns a `key_value` string, like `highway_primary` or `maxspeed_50`.
    pub fn intern(&self, key_value: &str) -> Tag {
        let normalized = normalize(key_value);
        if let Some(&tag) = self.index.get(&normalized) {
            return tag;
        }

        // Bucketed keys need their value canonicalized first
        for &key in self.group_index.keys().filter(|k| is_bucketed(k)) {
            if let Some(value) = normalized
                .strip_prefix(key)
                .and_then(|rest| rest.strip_prefix('_'))
            {
                return self.intern_pair(key, value);
            }
        }

        Tag::UNKNOWN
    }

    /// Interns a raw OSM key and value.
    pub fn intern_pair(&self, key: &str, value: &str) -> Tag {
        let key = normalize(key);
        let value = match key.as_str() {
            "maxspeed" => bucket_speed(value),
            "layer" => clamp_number(value, -MAX_LAYER, MAX_LAYER),
            "lanes" => clamp_number(value, 1, MAX_LANES),
            _ => Some(normalize(value)),
        };

        match value {
            Some(value) => self
                .index
                .get(&format!("{key}_{value}"))
                .copied()
                .unwrap_or(Tag::UNKNOWN),
            None => Tag::UNKNOWN,
        }
    }

    /// Returns the `key_value` name of a tag.
    pub fn name(&self, tag: Tag) -> Option<&str> {
        if tag.is_known() {
            self.names.get(tag.0 as usize).map(|s| s.as_str())
        } else {
            None
        }
    }

    /// Finds a wildcard group by its key, e.g. `highway`.
    pub fn group_lookup(&self, name: &str) -> Option<GroupId> {
        self.group_index.get(normalize(name).as_str()).copied()
    }

    pub fn group_name(&self, group: GroupId) -> Option<&str> {
        self.groups.get(group.0 as usize).map(|g| g.name)
    }

    /// Returns all tags of a group; empty for unknown groups.
    pub fn group_members(&self, group: GroupId) -> &[Tag] {
        self.groups
            .get(group.0 as usize)
            .map(|g| g.members.as_slice())
            .unwrap_or_default()
    }

    pub fn group_of(&self, tag: Tag) -> Option<GroupId> {
        self.tag_groups.get(tag.0 as usize).copied().flatten()
    }

    /// Checks if `tag` is a `maxspeed_*` speed class.
    pub fn is_speed_class(&self, tag: Tag) -> bool {
        self.group_of(tag) == Some(self.speed_group)
    }

    /// Returns the speed, in km/h, of a speed class tag.
    pub fn speed_kmh(&self, tag: Tag) -> Option<f64> {
        if !self.is_speed_class(tag) {
            return None;
        }
        self.name(tag)?
            .strip_prefix("maxspeed_")?
            .parse::<u32>()
            .ok()
            .map(f64::from)
    }

    /// Returns the speed class tag for a speed in km/h, rounded up to the nearest bucket.
    pub fn speed_class(&self, kmh: f64) -> Tag {
        match bucket_speed(&format!("{kmh}")) {
            Some(value) => self.intern(&format!("maxspeed_{value}")),
            None => Tag::UNKNOWN,
        }
    }
}

fn is_bucketed(key: &str) -> bool {
    matches!(key, "maxspeed" | "layer" | "lanes")
}

fn normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_space = false;

    for c in s.trim().chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            out.push('_');
            pending_space = false;
        }

        match c {
            '-' | ':' => out.push('_'),
            c => out.extend(c.to_lowercase()),
        }
    }

    out
}

fn bucket_speed(value: &str) -> Option<String> {
    let value = value.trim().to_lowercase();
    let kmh = if value == "walk" {
        5.0
    } else if let Some(mph) = value.strip_suffix("mph") {
        mph.trim().parse::<f64>().ok()? * MPH_TO_KMH
    } else {
        value
            .strip_suffix("km/h")
            .or_else(|| value.strip_suffix("kmh"))
            .unwrap_or(value.as_str())
            .trim()
            .parse::<f64>()
            .ok()?
    };

    if !kmh.is_finite() || kmh <= 0.0 {
        return None;
    }

    let bucket = SPEED_BUCKETS
        .iter()
        .copied()
        .find(|&b| f64::from(b) >= kmh)
        .unwrap_or(SPEED_BUCKETS[SPEED_BUCKETS.len() - 1]);
    Some(bucket.to_string())
}

fn clamp_number(value: &str, min: i32, max: i32) -> Option<String> {
    let n = value.trim().parse::<i32>().ok()?.clamp(min, max);
    if n < 0 {
        Some(format!("_{}", -n))
    } else {
        Some(n.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_round_trip() {
        let v = Vocabulary::default();
        let primary = v.intern("highway_primary");
        assert!(primary.is_known());
        assert_eq!(v.name(primary), Some("highway_primary"));
        assert_eq!(v.intern_pair("highway", "primary"), primary);
        assert_eq!(v.intern("highway_nonexistent"), Tag::UNKNOWN);
        assert_eq!(v.name(Tag::UNKNOWN), None);
    }

    #[test]
    fn normalization() {
        let v = Vocabulary::default();
        assert_eq!(v.intern_pair("oneway", "-1"), v.intern("oneway__1"));
        assert_eq!(v.intern_pair(" Highway ", "Living Street"), v.intern("highway_living_street"));
        assert_eq!(v.intern_pair("motor-vehicle", "no"), v.intern("motor_vehicle_no"));
        assert_eq!(v.intern_pair("smoothness", "very-bad"), v.intern("smoothness_very_bad"));
    }

    #[test]
    fn speed_bucketing() {
        let v = Vocabulary::default();
        assert_eq!(v.intern_pair("maxspeed", "50"), v.intern("maxspeed_50"));
        assert_eq!(v.intern_pair("maxspeed", "45"), v.intern("maxspeed_50"));
        assert_eq!(v.intern_pair("maxspeed", "30 mph"), v.intern("maxspeed_50"));
        assert_eq!(v.intern_pair("maxspeed", "250"), v.intern("maxspeed_130"));
        assert_eq!(v.intern_pair("maxspeed", "walk"), v.intern("maxspeed_5"));
        assert_eq!(v.intern_pair("maxspeed", "none"), Tag::UNKNOWN);
        assert_eq!(v.intern("maxspeed_47"), v.intern("maxspeed_50"));

        let fifty = v.intern("maxspeed_50");
        assert!(v.is_speed_class(fifty));
        assert_eq!(v.speed_kmh(fifty), Some(50.0));
        assert_eq!(v.speed_kmh(v.intern("highway_primary")), None);
        assert_eq!(v.speed_class(88.0), v.intern("maxspeed_90"));
    }

    #[test]
    fn layer_and_lanes_clamping() {
        let v = Vocabulary::default();
        assert_eq!(v.intern_pair("layer", "-1"), v.intern("layer__1"));
        assert_eq!(v.intern_pair("layer", "-9"), v.intern("layer__5"));
        assert_eq!(v.intern_pair("layer", "12"), v.intern("layer_5"));
        assert_eq!(v.intern_pair("lanes", "0"), v.intern("lanes_1"));
        assert_eq!(v.intern_pair("lanes", "14"), v.intern("lanes_8"));
        assert_eq!(v.intern("layer_-2"), v.intern("layer__2"));
    }

    #[test]
    fn groups() {
        let v = Vocabulary::default();
        let highway = v.group_lookup("highway").unwrap();
        assert_eq!(v.group_name(highway), Some("highway"));
        let members = v.group_members(highway);
        assert!(members.contains(&v.intern("highway_primary")));
        assert!(!members.contains(&v.intern("surface_asphalt")));
        assert_eq!(v.group_of(v.intern("highway_track")), Some(highway));
        assert_eq!(v.group_lookup("nonexistent"), None);
        assert!(v.group_members(GroupId(u16::MAX)).is_empty());
    }

    #[test]
    fn builtin_is_shared() {
        assert!(std::ptr::eq(Vocabulary::builtin(), Vocabulary::builtin()));
        assert_eq!(Vocabulary::builtin().len(), Vocabulary::default().len());
    }
}
