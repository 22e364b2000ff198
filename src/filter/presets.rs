// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Named, canned filter expressions which may be used in place of filter text.
pub const PRESETS: &[(&str, &str)] = &[
    (
        "moto-scenic",
        "(highway_secondary or highway_tertiary or highway_unclassified or scenic_yes) \
         and not (highway_motorway or highway_motorway_link or highway_trunk or highway_trunk_link)",
    ),
    (
        "moto-scenic-paved",
        "(highway_secondary or highway_tertiary or highway_unclassified or scenic_yes) \
         and not (highway_motorway or highway_motorway_link or highway_trunk or highway_trunk_link \
         or surface_unpaved or surface_compacted or surface_fine_gravel or surface_gravel \
         or surface_dirt or surface_ground or surface_grass or surface_sand or surface_mud \
         or tracktype_grade3 or tracktype_grade4 or tracktype_grade5)",
    ),
];

/// Returns the expression text of a preset with the given name.
pub fn preset(name: &str) -> Option<&'static str> {
    PRESETS
        .iter()
        .find_map(|&(n, text)| if n == name { Some(text) } else { None })
}
