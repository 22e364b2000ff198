// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use crate::Error;

mod events;
mod pbf;
mod xml;

pub use events::{Event, EventSink, Flow};

#[cfg(test)]
pub(crate) use events::Recorder;

/// Format of the input OSM file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileFormat {
    /// Unknown format - guess the format based on the file name and content
    #[default]
    Unknown,

    /// Force uncompressed [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    Xml,

    /// Force [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    /// with [gzip](https://en.wikipedia.org/wiki/Gzip) compression
    XmlGz,

    /// Force [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    /// with [bzip2](https://en.wikipedia.org/wiki/Bzip2) compression
    XmlBz2,

    /// Force [OSM PBF](https://wiki.openstreetmap.org/wiki/PBF_Format)
    Pbf,
}

impl FileFormat {
    /// Guesses the format from the extension of a file name.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let name = match path.as_ref().file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_ascii_lowercase(),
            None => return Self::Unknown,
        };

        if name.ends_with(".pbf") {
            Self::Pbf
        } else if name.ends_with(".gz") {
            Self::XmlGz
        } else if name.ends_with(".bz2") {
            Self::XmlBz2
        } else if name.ends_with(".osm") || name.ends_with(".xml") {
            Self::Xml
        } else {
            Self::Unknown
        }
    }

    /// Guesses the format from the first bytes of the data.
    pub fn from_magic(head: &[u8]) -> Self {
        if head.starts_with(&[0x1f, 0x8b]) {
            Self::XmlGz
        } else if head.starts_with(b"BZh") {
            Self::XmlBz2
        } else if head
            .iter()
            .find(|b| !b.is_ascii_whitespace())
            .is_some_and(|&b| b == b'<')
        {
            Self::Xml
        } else if head.len() >= 4 && head[0] == 0 {
            // PBF files start with a big-endian length of the first BlobHeader
            Self::Pbf
        } else {
            Self::Unknown
        }
    }
}

/// Source of OSM data for a decoding pass.
#[derive(Debug, Clone, Copy)]
pub enum Input<'a> {
    File(&'a Path),
    Buffer(&'a [u8]),
}

impl Input<'_> {
    /// Resolves [FileFormat::Unknown] by looking at the file name and the leading bytes.
    pub fn detect_format(&self, format: FileFormat) -> Result<FileFormat, Error> {
        if format != FileFormat::Unknown {
            return Ok(format);
        }

        let detected = match self {
            Input::Buffer(data) => FileFormat::from_magic(&data[..data.len().min(MAGIC_LEN)]),
            Input::File(path) => match FileFormat::from_path(path) {
                FileFormat::Unknown => {
                    let mut head = Vec::with_capacity(MAGIC_LEN);
                    File::open(path)?
                        .take(MAGIC_LEN as u64)
                        .read_to_end(&mut head)?;
                    FileFormat::from_magic(&head)
                }
                known => known,
            },
        };

        match detected {
            FileFormat::Unknown => Err(DecodeError::UnknownFormat.into()),
            known => Ok(known),
        }
    }
}

const MAGIC_LEN: usize = 64;

/// Fatal failure of a decoder.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DecodeError {
    #[error("xml: {0}")]
    Xml(Arc<quick_xml::Error>),

    #[error("pbf: {0}")]
    Pbf(Arc<osmpbf::Error>),

    #[error("<{element}> has an invalid {attribute:?} attribute")]
    InvalidAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("<{element}> is missing the {attribute:?} attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("unable to detect the file format - provide it explicitly")]
    UnknownFormat,
}

/// Decodes the whole `input`, pushing every [Event] into `sink`.
pub fn decode<S: EventSink>(input: &Input<'_>, format: FileFormat, sink: &mut S) -> Result<(), Error> {
    let format = input.detect_format(format)?;
    match *input {
        Input::File(path) => decode_io(File::open(path)?, format, sink),

        // Fast path is available for in-memory XML data
        Input::Buffer(data) if format == FileFormat::Xml => {
            xml::decode(xml::BufParser::new(data), sink)
        }

        Input::Buffer(data) => decode_io(io::Cursor::new(data), format, sink),
    }
}

/// Decodes data from a reader in a known format.
///
/// The provided stream will be automatically wrapped in a buffered reader when needed.
pub fn decode_io<R: io::Read + Send, S: EventSink>(
    reader: R,
    format: FileFormat,
    sink: &mut S,
) -> Result<(), Error> {
    match format {
        FileFormat::Unknown => Err(DecodeError::UnknownFormat.into()),

        FileFormat::Xml => {
            let b = io::BufReader::new(reader);
            xml::decode(xml::IoParser::new(b), sink)
        }

        FileFormat::XmlGz => {
            let d = flate2::read::MultiGzDecoder::new(reader);
            let b = io::BufReader::new(d);
            xml::decode(xml::IoParser::new(b), sink)
        }

        FileFormat::XmlBz2 => {
            let d = bzip2::read::MultiBzDecoder::new(reader);
            let b = io::BufReader::new(d);
            xml::decode(xml::IoParser::new(b), sink)
        }

        FileFormat::Pbf => pbf::decode(io::BufReader::new(reader), sink),
    }
}
