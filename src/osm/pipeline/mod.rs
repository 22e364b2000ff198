// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::path::Path;

use log::{debug, info};

use super::reader::{decode, FileFormat, Input};
use super::to_fixed;
use crate::filter::Expression;
use crate::tags::Vocabulary;
use crate::Error;

mod assembler;
mod extract;
mod select;

use assembler::Assembler;
pub use assembler::ProtocolError;
pub use extract::Extract;
pub use select::Selection;

/// Which kinds of records may be selected by their own tags.
///
/// Nodes referenced by selected ways are extracted regardless of `nodes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindFilter {
    pub nodes: bool,
    pub ways: bool,
    pub relations: bool,
}

impl Default for KindFilter {
    fn default() -> Self {
        Self {
            nodes: true,
            ways: true,
            relations: true,
        }
    }
}

/// Additional controls for extracting OSM records.
#[derive(Debug)]
pub struct Options<'a> {
    /// Records must match this expression to be selected.
    pub filter: &'a Expression,

    /// Kinds of records which may be selected.
    pub keep: KindFilter,

    /// Format of the input data.
    pub file_format: FileFormat,

    /// Filter features by a specific bounding box. In order: left (min lon), bottom (min lat),
    /// right (max lon), top (max lat). Ignored if all values are set to zero, or at least one
    /// of them is not finite.
    pub bbox: [f32; 4],
}

/// Bounding box in fixed-point coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BoundingBox {
    min_lon: i32,
    min_lat: i32,
    max_lon: i32,
    max_lat: i32,
}

impl BoundingBox {
    pub(crate) fn from_options(bbox: [f32; 4]) -> Option<Self> {
        if bbox.iter().all(|&x| x == 0.0) || bbox.iter().any(|x| !x.is_finite()) {
            return None;
        }

        let [min_lon, min_lat, max_lon, max_lat] = bbox.map(|x| to_fixed(x as f64));
        Some(Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        })
    }

    pub(crate) fn contains(&self, lon: i32, lat: i32) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }
}

/// First pass: marks ids of records matching the filter, plus nodes used by matching ways.
pub fn select(input: &Input<'_>, vocabulary: &Vocabulary, options: &Options<'_>) -> Result<Selection, Error> {
    debug!("selecting records matching {:?}", options.filter.text());

    let mut assembler = Assembler::new(vocabulary, select::Selector::new(options));
    decode(input, options.file_format, &mut assembler)?;
    let selection = assembler.finish()?.selection;

    info!(
        "selected {} nodes, {} ways and {} relations",
        selection.nodes.count(),
        selection.ways.count(),
        selection.relations.count(),
    );
    Ok(selection)
}

/// Second pass: materializes every record marked in the [Selection].
pub fn extract(
    input: &Input<'_>,
    vocabulary: &Vocabulary,
    file_format: FileFormat,
    selection: &Selection,
) -> Result<Extract, Error> {
    let mut assembler = Assembler::new(vocabulary, extract::Extractor::new(selection));
    decode(input, file_format, &mut assembler)?;
    let mut extract = assembler.finish()?.extract;
    extract.sort();

    info!(
        "extracted {} nodes, {} ways and {} relations",
        extract.nodes().len(),
        extract.ways().len(),
        extract.relations().len(),
    );
    Ok(extract)
}

/// Runs both passes over an OSM file at the provided path.
pub fn extract_from_file<P: AsRef<Path>>(
    path: P,
    vocabulary: &Vocabulary,
    options: &Options<'_>,
) -> Result<Extract, Error> {
    let input = Input::File(path.as_ref());
    let file_format = input.detect_format(options.file_format)?;
    let options = Options {
        file_format,
        ..*options
    };

    let selection = select(&input, vocabulary, &options)?;
    extract(&input, vocabulary, file_format, &selection)
}

/// Runs both passes over an in-memory OSM document.
pub fn extract_from_buffer(
    data: &[u8],
    vocabulary: &Vocabulary,
    options: &Options<'_>,
) -> Result<Extract, Error> {
    let input = Input::Buffer(data);
    let file_format = input.detect_format(options.file_format)?;
    let options = Options {
        file_format,
        ..*options
    };

    let selection = select(&input, vocabulary, &options)?;
    extract(&input, vocabulary, file_format, &selection)
}
