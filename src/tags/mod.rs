// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Interned OSM tags.
//!
//! Every recognized `key=value` pair is mapped to a small integer [Tag] by a
//! [Vocabulary]. Tags sharing a key form a wildcard group, addressed by a
//! [GroupId], which filter expressions refer to as `key_*`.

mod vocabulary;

pub use vocabulary::Vocabulary;

/// An interned `key_value` pair, e.g. `highway_primary`.
///
/// [Tag::UNKNOWN] stands for any pair missing from the [Vocabulary].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(pub u32);

impl Tag {
    pub const UNKNOWN: Self = Self(0);

    pub fn is_known(self) -> bool {
        self != Self::UNKNOWN
    }
}

/// Identifies a group of tags sharing the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(pub u16);

/// Sorts and de-duplicates a tag set, dropping [Tag::UNKNOWN].
pub fn normalize_tag_set(tags: &mut Vec<Tag>) {
    tags.retain(|t| t.is_known());
    tags.sort_unstable();
    tags.dedup();
}

/// Checks whether a tag set normalized with [normalize_tag_set] contains `tag`.
pub fn tag_set_contains(tags: &[Tag], tag: Tag) -> bool {
    tags.binary_search(&tag).is_ok()
}
