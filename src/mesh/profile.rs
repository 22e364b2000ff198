// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use log::warn;

use super::Direction;
use crate::tags::{tag_set_contains, GroupId, Tag, Vocabulary};

/// Describes how to convert extracted ways into a [Mesh](super::Mesh).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshProfile<'a> {
    /// Human readable name of the profile.
    pub name: &'a str,

    /// Way classes, in order of priority.
    ///
    /// A way is matched against all [WayClass] objects in order, and
    /// once a class tag is found among the way tags, the way is added to
    /// the mesh with that class defaults. Ways without a matching class are dropped.
    pub classes: &'a [WayClass<'a>],

    /// Keys of OSM [access tags](https://wiki.openstreetmap.org/wiki/Key:access#Land-based_transportation)
    /// (in order from least to most specific) to consider when checking for road prohibitions.
    /// Only keys known to the [Vocabulary] have an effect. Empty disables access checks.
    pub access: &'a [&'a str],

    /// Force no routing over [motorroad=yes](https://wiki.openstreetmap.org/wiki/Key:motorroad) ways.
    pub disallow_motorroad: bool,
}

/// Defaults for ways carrying a specific tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WayClass<'a> {
    /// Name of the class tag, e.g. `highway_primary`.
    pub tag: &'a str,

    /// Direction of travel, unless overridden by `oneway` tags.
    pub direction: Direction,

    /// Name of the speed class tag, e.g. `maxspeed_90`, unless overridden by `maxspeed` tags.
    pub speed: &'a str,
}

/// Speed assumed when a speed class can't be interpreted.
const LOWEST_SPEED_KMH: f64 = 5.0;

macro_rules! class {
    ($tag:literal, $direction:ident, $speed:literal) => {
        WayClass {
            tag: $tag,
            direction: Direction::$direction,
            speed: $speed,
        }
    };
}

/// Default profile for motor vehicles on public roads.
///
/// Classifies ways only; access tags are not checked.
pub const ROAD_PROFILE: MeshProfile = MeshProfile {
    name: "road",
    classes: &[
        class!("highway_motorway", Forward, "maxspeed_130"),
        class!("highway_motorway_link", Forward, "maxspeed_80"),
        class!("highway_trunk", Both, "maxspeed_110"),
        class!("highway_trunk_link", Both, "maxspeed_60"),
        class!("highway_primary", Both, "maxspeed_90"),
        class!("highway_primary_link", Both, "maxspeed_50"),
        class!("highway_secondary", Both, "maxspeed_70"),
        class!("highway_secondary_link", Both, "maxspeed_50"),
        class!("highway_tertiary", Both, "maxspeed_60"),
        class!("highway_tertiary_link", Both, "maxspeed_40"),
        class!("highway_unclassified", Both, "maxspeed_50"),
        class!("highway_road", Both, "maxspeed_40"),
        class!("highway_residential", Both, "maxspeed_30"),
        class!("highway_living_street", Both, "maxspeed_10"),
        class!("highway_service", Both, "maxspeed_20"),
        class!("highway_track", Both, "maxspeed_15"),
    ],
    access: &[],
    disallow_motorroad: false,
};

/// [ROAD_PROFILE] which also honors `access`/`motor_vehicle` prohibitions
/// and keeps out of `motorroad=yes` ways.
pub const RESTRICTED_ROAD_PROFILE: MeshProfile = MeshProfile {
    name: "restricted-road",
    classes: ROAD_PROFILE.classes,
    access: &["access", "motor_vehicle"],
    disallow_motorroad: true,
};

/// Properties of a way admitted into the mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub class: Tag,
    pub direction: Direction,
    pub speed: Tag,
    pub speed_kmh: f64,
}

#[derive(Debug, Clone, Copy)]
struct ResolvedClass {
    tag: Tag,
    direction: Direction,
    speed: Tag,
}

/// [MeshProfile] with all tag names resolved through a [Vocabulary].
#[derive(Debug, Clone)]
pub(super) struct ResolvedProfile<'v> {
    vocabulary: &'v Vocabulary,
    classes: Vec<ResolvedClass>,
    access: Vec<GroupId>,
    prohibited: Vec<Tag>,
    motorroad: Option<Tag>,
    roundabout: [Tag; 2],
    oneway_forward: [Tag; 3],
    oneway_reverse: [Tag; 2],
    oneway_no: Tag,
}

impl<'v> ResolvedProfile<'v> {
    pub(super) fn new(profile: &MeshProfile<'_>, vocabulary: &'v Vocabulary) -> Self {
        let classes = profile
            .classes
            .iter()
            .filter_map(|c| {
                let tag = vocabulary.intern(c.tag);
                let speed = vocabulary.intern(c.speed);
                if !tag.is_known() || !vocabulary.is_speed_class(speed) {
                    warn!(
                        "profile {}: ignoring class {} with speed {} - unknown tags",
                        profile.name, c.tag, c.speed
                    );
                    return None;
                }
                Some(ResolvedClass {
                    tag,
                    direction: c.direction,
                    speed,
                })
            })
            .collect();

        let access = profile
            .access
            .iter()
            .filter_map(|&key| vocabulary.group_lookup(key))
            .collect();

        let prohibited = profile
            .access
            .iter()
            .flat_map(|&key| [vocabulary.intern_pair(key, "no"), vocabulary.intern_pair(key, "private")])
            .filter(|t| t.is_known())
            .collect();

        let known = |t: Tag| if t.is_known() { Some(t) } else { None };

        Self {
            vocabulary,
            classes,
            access,
            prohibited,
            motorroad: if profile.disallow_motorroad {
                known(vocabulary.intern("motorroad_yes"))
            } else {
                None
            },
            roundabout: [
                vocabulary.intern("junction_roundabout"),
                vocabulary.intern("junction_circular"),
            ],
            oneway_forward: [
                vocabulary.intern("oneway_yes"),
                vocabulary.intern("oneway_true"),
                vocabulary.intern("oneway_1"),
            ],
            oneway_reverse: [
                vocabulary.intern("oneway__1"),
                vocabulary.intern("oneway_reverse"),
            ],
            oneway_no: vocabulary.intern("oneway_no"),
        }
    }

    /// Finds the first matching class for a way with given tags,
    /// returning `None` if there is no such class.
    pub(super) fn class(&self, tags: &[Tag]) -> Option<Classification> {
        let class = self
            .classes
            .iter()
            .find(|c| tag_set_contains(tags, c.tag))?;

        let speed = tags
            .iter()
            .copied()
            .find(|&t| self.vocabulary.is_speed_class(t))
            .unwrap_or(class.speed);

        let speed_kmh = self.vocabulary.speed_kmh(speed).unwrap_or(LOWEST_SPEED_KMH);

        Some(Classification {
            class: class.tag,
            direction: self.way_direction(class.direction, tags),
            speed,
            speed_kmh,
        })
    }

    /// Checks if the way is routable, by considering motor roads and access tags.
    /// The most specific access key present on the way decides.
    pub(super) fn is_allowed(&self, tags: &[Tag]) -> bool {
        if self.motorroad.is_some_and(|t| tag_set_contains(tags, t)) {
            return false;
        }

        let decisive = self.access.iter().rev().find_map(|&group| {
            tags.iter()
                .copied()
                .find(|&t| self.vocabulary.group_of(t) == Some(group))
        });

        match decisive {
            Some(tag) => !self.prohibited.contains(&tag),
            None => true,
        }
    }

    /// Applies `junction` and `oneway` tags over the class default direction.
    pub(super) fn way_direction(&self, default: Direction, tags: &[Tag]) -> Direction {
        let has_any = |candidates: &[Tag]| candidates.iter().any(|&t| tag_set_contains(tags, t));

        if has_any(&self.oneway_forward) {
            Direction::Forward
        } else if has_any(&self.oneway_reverse) {
            Direction::Reverse
        } else if tag_set_contains(tags, self.oneway_no) {
            Direction::Both
        } else if has_any(&self.roundabout) {
            Direction::Forward
        } else {
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::normalize_tag_set;

    fn tags(names: &[&str]) -> Vec<Tag> {
        let v = Vocabulary::builtin();
        let mut t: Vec<Tag> = names.iter().map(|n| v.intern(n)).collect();
        normalize_tag_set(&mut t);
        t
    }

    #[test]
    fn builtin_profiles_resolve() {
        let p = ResolvedProfile::new(&ROAD_PROFILE, Vocabulary::builtin());
        assert_eq!(p.classes.len(), ROAD_PROFILE.classes.len());
        assert!(p.access.is_empty());
        assert!(p.motorroad.is_none());

        let p = ResolvedProfile::new(&RESTRICTED_ROAD_PROFILE, Vocabulary::builtin());
        assert_eq!(p.classes.len(), ROAD_PROFILE.classes.len());
        assert_eq!(p.access.len(), 2);
        assert!(p.motorroad.is_some());
    }

    #[test]
    fn classification() {
        let v = Vocabulary::builtin();
        let p = ResolvedProfile::new(&ROAD_PROFILE, v);

        let c = p.class(&tags(&["highway_primary"])).unwrap();
        assert_eq!(c.class, v.intern("highway_primary"));
        assert_eq!(c.direction, Direction::Both);
        assert_eq!(c.speed, v.intern("maxspeed_90"));
        assert_eq!(c.speed_kmh, 90.0);

        let c = p.class(&tags(&["highway_motorway", "maxspeed_120"])).unwrap();
        assert_eq!(c.direction, Direction::Forward);
        assert_eq!(c.speed_kmh, 120.0);

        assert!(p.class(&tags(&["waterway_river"])).is_none());
        assert!(p.class(&tags(&["highway_footway"])).is_none());
    }

    #[test]
    fn directions() {
        let p = ResolvedProfile::new(&ROAD_PROFILE, Vocabulary::builtin());
        let dir = |names: &[&str]| p.class(&tags(names)).unwrap().direction;

        assert_eq!(dir(&["highway_residential", "oneway_yes"]), Direction::Forward);
        assert_eq!(dir(&["highway_residential", "oneway__1"]), Direction::Reverse);
        assert_eq!(dir(&["highway_residential", "oneway_reverse"]), Direction::Reverse);
        assert_eq!(dir(&["highway_motorway", "oneway_no"]), Direction::Both);
        assert_eq!(dir(&["highway_primary", "junction_roundabout"]), Direction::Forward);
        assert_eq!(
            dir(&["highway_primary", "junction_roundabout", "oneway_no"]),
            Direction::Both
        );
    }

    #[test]
    fn road_profile_ignores_access() {
        let p = ResolvedProfile::new(&ROAD_PROFILE, Vocabulary::builtin());
        assert!(p.is_allowed(&tags(&["highway_primary", "access_no"])));
        assert!(p.is_allowed(&tags(&["highway_primary", "motorroad_yes"])));
    }

    #[test]
    fn access() {
        let p = ResolvedProfile::new(&RESTRICTED_ROAD_PROFILE, Vocabulary::builtin());
        assert!(p.is_allowed(&tags(&["highway_primary"])));
        assert!(!p.is_allowed(&tags(&["highway_primary", "access_no"])));
        assert!(!p.is_allowed(&tags(&["highway_primary", "motor_vehicle_private"])));
        assert!(p.is_allowed(&tags(&["highway_primary", "access_no", "motor_vehicle_yes"])));
        assert!(!p.is_allowed(&tags(&["highway_primary", "access_yes", "motor_vehicle_no"])));
        assert!(!p.is_allowed(&tags(&["highway_trunk", "motorroad_yes"])));
        assert!(p.is_allowed(&tags(&["highway_trunk", "motorroad_no"])));
    }
}
