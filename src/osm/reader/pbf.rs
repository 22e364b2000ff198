// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::io;
use std::sync::Arc;

use osmpbf::{Element, ElementReader, RelMemberType};

use super::events::{emit_member, emit_node_ref, emit_tag, Event, EventSink, Flow};
use super::DecodeError;
use crate::osm::FeatureType;
use crate::Error;

/// Streams an [OSM PBF](https://wiki.openstreetmap.org/wiki/PBF_Format) file into `sink`.
///
/// Elements are decoded sequentially, in file order. The first error returned
/// by the sink stops event emission and is returned once the reader finishes.
pub(super) fn decode<R: io::Read + Send, S: EventSink>(reader: R, sink: &mut S) -> Result<(), Error> {
    let mut failure: Option<Error> = None;

    ElementReader::new(reader)
        .for_each(|element| {
            if failure.is_some() {
                return;
            }

            let result = match element {
                Element::Node(n) => {
                    emit_node(sink, n.id(), n.decimicro_lon(), n.decimicro_lat(), n.tags())
                }
                Element::DenseNode(n) => {
                    emit_node(sink, n.id(), n.decimicro_lon(), n.decimicro_lat(), n.tags())
                }
                Element::Way(w) => emit_way(sink, w.id(), w.tags(), w.refs()),
                Element::Relation(r) => emit_relation(sink, &r),
            };

            if let Err(e) = result {
                failure = Some(e);
            }
        })
        .map_err(|e| DecodeError::Pbf(Arc::new(e)))?;

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Emits the start and id of a record, returning [Flow::Skip] if the sink declined it.
fn begin<S: EventSink>(sink: &mut S, type_: FeatureType, id: i64) -> Result<Flow, Error> {
    if sink.event(Event::start_of(type_))? == Flow::Skip {
        return Ok(Flow::Skip);
    }
    sink.event(Event::Id(id))
}

fn emit_tags<'a, S, I>(sink: &mut S, tags: I) -> Result<Flow, Error>
where
    S: EventSink,
    I: Iterator<Item = (&'a str, &'a str)>,
{
    for (k, v) in tags {
        if emit_tag(sink, k, v)? == Flow::Skip {
            return Ok(Flow::Skip);
        }
    }
    Ok(Flow::Continue)
}

fn emit_node<'a, S, I>(sink: &mut S, id: i64, lon: i32, lat: i32, tags: I) -> Result<(), Error>
where
    S: EventSink,
    I: Iterator<Item = (&'a str, &'a str)>,
{
    if begin(sink, FeatureType::Node, id)? == Flow::Continue
        && sink.event(Event::Position { lon, lat })? == Flow::Continue
    {
        emit_tags(sink, tags)?;
    }
    sink.event(Event::EndNode)?;
    Ok(())
}

fn emit_way<'a, S, T, R>(sink: &mut S, id: i64, tags: T, refs: R) -> Result<(), Error>
where
    S: EventSink,
    T: Iterator<Item = (&'a str, &'a str)>,
    R: Iterator<Item = i64>,
{
    if begin(sink, FeatureType::Way, id)? == Flow::Continue
        && emit_tags(sink, tags)? == Flow::Continue
    {
        for ref_ in refs {
            if emit_node_ref(sink, ref_)? == Flow::Skip {
                break;
            }
        }
    }
    sink.event(Event::EndWay)?;
    Ok(())
}

fn emit_relation<S: EventSink>(sink: &mut S, r: &osmpbf::Relation<'_>) -> Result<(), Error> {
    if begin(sink, FeatureType::Relation, r.id())? == Flow::Continue
        && emit_tags(sink, r.tags())? == Flow::Continue
    {
        for member in r.members() {
            let type_ = match member.member_type {
                RelMemberType::Node => FeatureType::Node,
                RelMemberType::Way => FeatureType::Way,
                RelMemberType::Relation => FeatureType::Relation,
            };
            let role = member
                .role()
                .map_err(|e| DecodeError::Pbf(Arc::new(e)))?;

            if emit_member(sink, type_, member.member_id, role)? == Flow::Skip {
                break;
            }
        }
    }
    sink.event(Event::EndRelation)?;
    Ok(())
}
