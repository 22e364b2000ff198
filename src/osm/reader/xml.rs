// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::io;
use std::str::{from_utf8, FromStr};
use std::sync::Arc;

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event as XmlEvent};

use super::events::{emit_member, emit_node_ref, emit_tag, Event, EventSink, Flow};
use super::DecodeError;
use crate::osm::{to_fixed, FeatureType};
use crate::Error;

/// Parser is a trait for objects which can parse XML.
///
/// This trait only exists to fix the mismatch of
/// [quick_xml::Reader::read_event] when working on buffered data
/// and [quick_xml::Reader::read_event_into] when working on IO.
pub(super) trait Parser {
    fn read_event<'a>(&'a mut self) -> quick_xml::Result<XmlEvent<'a>>;
}

/// IoParser implements [Parser] over an [std::io::BufRead].
pub(super) struct IoParser<R: io::BufRead>(quick_xml::Reader<R>, Vec<u8>);

impl<R: io::BufRead> IoParser<R> {
    #[inline]
    pub(super) fn new(reader: R) -> Self {
        Self(quick_xml::Reader::from_reader(reader), Vec::default())
    }
}

impl<R: io::BufRead> Parser for IoParser<R> {
    #[inline]
    fn read_event<'a>(&'a mut self) -> quick_xml::Result<XmlEvent<'a>> {
        self.1.clear();
        self.0.read_event_into(&mut self.1)
    }
}

/// BufParser implements [Parser] over a slice of bytes (`&[u8]`).
pub(super) struct BufParser<'a>(quick_xml::Reader<&'a [u8]>);

impl<'a> BufParser<'a> {
    #[inline]
    pub(super) fn new(data: &'a [u8]) -> Self {
        Self(quick_xml::Reader::from_reader(data))
    }
}

impl<'a> Parser for BufParser<'a> {
    #[inline]
    fn read_event<'b>(&'b mut self) -> quick_xml::Result<XmlEvent<'b>> {
        self.0.read_event()
    }
}

/// Streams an [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML) document into `sink`.
pub(super) fn decode<P: Parser, S: EventSink>(mut parser: P, sink: &mut S) -> Result<(), Error> {
    let mut record = RecordState::default();

    loop {
        match parser.read_event().map_err(xml_error)? {
            XmlEvent::Start(start) => record.element(sink, &start, false)?,
            XmlEvent::Empty(start) => record.element(sink, &start, true)?,
            XmlEvent::End(end) => {
                if let Some(type_) = parse_feature_type(end.local_name().as_ref()) {
                    record.close(sink, type_)?;
                }
            }
            XmlEvent::Eof => return Ok(()),
            _ => {}
        }
    }
}

/// Tracks the currently open record and whether its nested events
/// were declined by the sink.
#[derive(Debug, Default)]
struct RecordState {
    open: Option<FeatureType>,
    skipping: bool,
}

impl RecordState {
    fn element<S: EventSink>(
        &mut self,
        sink: &mut S,
        start: &BytesStart<'_>,
        empty: bool,
    ) -> Result<(), Error> {
        match start.local_name().as_ref() {
            b"bounds" => {
                let [min_lon, min_lat, max_lon, max_lat] = parse_bounds(start)?;
                sink.event(Event::StartBounds)?;
                sink.event(Event::Position {
                    lon: min_lon,
                    lat: min_lat,
                })?;
                sink.event(Event::Position {
                    lon: max_lon,
                    lat: max_lat,
                })?;
                sink.event(Event::EndBounds)?;
            }

            b"node" => {
                let (id, lon, lat) = parse_node(start)?;
                self.begin(sink, FeatureType::Node, id)?;
                if !self.skipping {
                    self.forward(sink, Event::Position { lon, lat })?;
                }
                if empty {
                    self.close(sink, FeatureType::Node)?;
                }
            }

            b"way" => {
                let id = parse_id(start, "way")?;
                self.begin(sink, FeatureType::Way, id)?;
                if empty {
                    self.close(sink, FeatureType::Way)?;
                }
            }

            b"relation" => {
                let id = parse_id(start, "relation")?;
                self.begin(sink, FeatureType::Relation, id)?;
                if empty {
                    self.close(sink, FeatureType::Relation)?;
                }
            }

            b"tag" if !self.skipping => {
                let (key, value) = parse_tag(start)?;
                let flow = emit_tag(sink, &key, &value)?;
                self.skip_on(flow);
            }

            b"nd" if !self.skipping => {
                let ref_ = parse_ref(start, "nd")?;
                let flow = emit_node_ref(sink, ref_)?;
                self.skip_on(flow);
            }

            b"member" if !self.skipping => {
                let (type_, ref_, role) = parse_member(start)?;
                let flow = emit_member(sink, type_, ref_, &role)?;
                self.skip_on(flow);
            }

            _ => {}
        }

        Ok(())
    }

    fn begin<S: EventSink>(
        &mut self,
        sink: &mut S,
        type_: FeatureType,
        id: i64,
    ) -> Result<(), Error> {
        self.open = Some(type_);
        self.skipping = false;
        self.forward(sink, Event::start_of(type_))?;
        if !self.skipping {
            self.forward(sink, Event::Id(id))?;
        }
        Ok(())
    }

    fn close<S: EventSink>(&mut self, sink: &mut S, type_: FeatureType) -> Result<(), Error> {
        self.open = None;
        self.skipping = false;
        sink.event(Event::end_of(type_))?;
        Ok(())
    }

    fn forward<S: EventSink>(&mut self, sink: &mut S, event: Event<'_>) -> Result<(), Error> {
        let flow = sink.event(event)?;
        self.skip_on(flow);
        Ok(())
    }

    fn skip_on(&mut self, flow: Flow) {
        if flow == Flow::Skip && self.open.is_some() {
            self.skipping = true;
        }
    }
}

fn xml_error<E: Into<quick_xml::Error>>(e: E) -> DecodeError {
    DecodeError::Xml(Arc::new(e.into()))
}

fn invalid(element: &'static str, attribute: &'static str) -> DecodeError {
    DecodeError::InvalidAttribute { element, attribute }
}

fn require<T>(value: Option<T>, element: &'static str, attribute: &'static str) -> Result<T, DecodeError> {
    value.ok_or(DecodeError::MissingAttribute { element, attribute })
}

fn parse_number<T: FromStr>(
    attr: &Attribute<'_>,
    element: &'static str,
    attribute: &'static str,
) -> Result<T, DecodeError> {
    from_utf8(&attr.value)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| invalid(element, attribute))
}

fn parse_coordinate(
    attr: &Attribute<'_>,
    element: &'static str,
    attribute: &'static str,
) -> Result<i32, DecodeError> {
    let degrees: f64 = parse_number(attr, element, attribute)?;
    if degrees.is_finite() && degrees.abs() <= 180.0 {
        Ok(to_fixed(degrees))
    } else {
        Err(invalid(element, attribute))
    }
}

fn parse_text(
    attr: &Attribute<'_>,
    element: &'static str,
    attribute: &'static str,
) -> Result<String, DecodeError> {
    let raw = from_utf8(&attr.value).map_err(|_| invalid(element, attribute))?;
    let text = quick_xml::escape::unescape(raw).map_err(xml_error)?;
    Ok(text.into_owned())
}

fn parse_bounds(start: &BytesStart<'_>) -> Result<[i32; 4], DecodeError> {
    let mut min_lon = None;
    let mut min_lat = None;
    let mut max_lon = None;
    let mut max_lat = None;

    for attr in start.attributes() {
        let attr = attr.map_err(xml_error)?;
        match attr.key.as_ref() {
            b"minlon" => min_lon = Some(parse_coordinate(&attr, "bounds", "minlon")?),
            b"minlat" => min_lat = Some(parse_coordinate(&attr, "bounds", "minlat")?),
            b"maxlon" => max_lon = Some(parse_coordinate(&attr, "bounds", "maxlon")?),
            b"maxlat" => max_lat = Some(parse_coordinate(&attr, "bounds", "maxlat")?),
            _ => {}
        }
    }

    Ok([
        require(min_lon, "bounds", "minlon")?,
        require(min_lat, "bounds", "minlat")?,
        require(max_lon, "bounds", "maxlon")?,
        require(max_lat, "bounds", "maxlat")?,
    ])
}

fn parse_node(start: &BytesStart<'_>) -> Result<(i64, i32, i32), DecodeError> {
    let mut id = None;
    let mut lat = None;
    let mut lon = None;

    for attr in start.attributes() {
        let attr = attr.map_err(xml_error)?;
        match attr.key.as_ref() {
            b"id" => id = Some(parse_number(&attr, "node", "id")?),
            b"lat" => lat = Some(parse_coordinate(&attr, "node", "lat")?),
            b"lon" => lon = Some(parse_coordinate(&attr, "node", "lon")?),
            _ => {}
        }
    }

    Ok((
        require(id, "node", "id")?,
        require(lon, "node", "lon")?,
        require(lat, "node", "lat")?,
    ))
}

fn parse_id(start: &BytesStart<'_>, element: &'static str) -> Result<i64, DecodeError> {
    let mut id = None;
    for attr in start.attributes() {
        let attr = attr.map_err(xml_error)?;
        if attr.key.as_ref() == b"id" {
            id = Some(parse_number(&attr, element, "id")?);
        }
    }
    require(id, element, "id")
}

fn parse_ref(start: &BytesStart<'_>, element: &'static str) -> Result<i64, DecodeError> {
    let mut ref_ = None;
    for attr in start.attributes() {
        let attr = attr.map_err(xml_error)?;
        if attr.key.as_ref() == b"ref" {
            ref_ = Some(parse_number(&attr, element, "ref")?);
        }
    }
    require(ref_, element, "ref")
}

fn parse_tag(start: &BytesStart<'_>) -> Result<(String, String), DecodeError> {
    let mut k = None;
    let mut v = None;

    for attr in start.attributes() {
        let attr = attr.map_err(xml_error)?;
        match attr.key.as_ref() {
            b"k" => k = Some(parse_text(&attr, "tag", "k")?),
            b"v" => v = Some(parse_text(&attr, "tag", "v")?),
            _ => {}
        }
    }

    Ok((require(k, "tag", "k")?, v.unwrap_or_default()))
}

fn parse_member(start: &BytesStart<'_>) -> Result<(FeatureType, i64, String), DecodeError> {
    let mut type_ = None;
    let mut ref_ = None;
    let mut role = None;

    for attr in start.attributes() {
        let attr = attr.map_err(xml_error)?;
        match attr.key.as_ref() {
            b"type" => {
                type_ = Some(
                    parse_feature_type(&attr.value).ok_or_else(|| invalid("member", "type"))?,
                )
            }
            b"ref" => ref_ = Some(parse_number(&attr, "member", "ref")?),
            b"role" => role = Some(parse_text(&attr, "member", "role")?),
            _ => {}
        }
    }

    Ok((
        require(type_, "member", "type")?,
        require(ref_, "member", "ref")?,
        role.unwrap_or_default(),
    ))
}

fn parse_feature_type(s: &[u8]) -> Option<FeatureType> {
    match s {
        b"node" => Some(FeatureType::Node),
        b"way" => Some(FeatureType::Way),
        b"relation" => Some(FeatureType::Relation),
        _ => None,
    }
}
