// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::osm::FeatureType;
use crate::Error;

/// A single step of a decoded OSM document.
///
/// Decoders emit records as a flat stream: a `Start*` event, the record's
/// scalar and nested events, and the matching `End*` event. Node positions
/// always follow the node's id, which always follows its start event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event<'a> {
    StartBounds,
    EndBounds,
    StartNode,
    EndNode,
    StartWay,
    EndWay,
    StartRelation,
    EndRelation,
    StartTag,
    EndTag,
    StartNodeRef,
    EndNodeRef,
    StartMember,
    EndMember,
    Id(i64),
    /// Fixed-point (10^-7 degree) coordinates.
    Position {
        lon: i32,
        lat: i32,
    },
    Ref(i64),
    MemberType(FeatureType),
    MemberRole(&'a str),
    TagKey(&'a str),
    TagValue(&'a str),
}

impl Event<'_> {
    /// Short name of the event kind, for error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StartBounds => "start-bounds",
            Self::EndBounds => "end-bounds",
            Self::StartNode => "start-node",
            Self::EndNode => "end-node",
            Self::StartWay => "start-way",
            Self::EndWay => "end-way",
            Self::StartRelation => "start-relation",
            Self::EndRelation => "end-relation",
            Self::StartTag => "start-tag",
            Self::EndTag => "end-tag",
            Self::StartNodeRef => "start-nd",
            Self::EndNodeRef => "end-nd",
            Self::StartMember => "start-member",
            Self::EndMember => "end-member",
            Self::Id(_) => "id",
            Self::Position { .. } => "position",
            Self::Ref(_) => "ref",
            Self::MemberType(_) => "member-type",
            Self::MemberRole(_) => "member-role",
            Self::TagKey(_) => "tag-key",
            Self::TagValue(_) => "tag-value",
        }
    }

    /// Event opening a record of the provided type.
    pub fn start_of(type_: FeatureType) -> Self {
        match type_ {
            FeatureType::Node => Self::StartNode,
            FeatureType::Way => Self::StartWay,
            FeatureType::Relation => Self::StartRelation,
        }
    }

    /// Event closing a record of the provided type.
    pub fn end_of(type_: FeatureType) -> Self {
        match type_ {
            FeatureType::Node => Self::EndNode,
            FeatureType::Way => Self::EndWay,
            FeatureType::Relation => Self::EndRelation,
        }
    }
}

/// Answer of an [EventSink] to a single [Event].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,

    /// Suppress the remaining nested events of the current record.
    /// The record's end event is still delivered.
    Skip,
}

/// Consumer of decoded [Events](Event).
pub trait EventSink {
    fn event(&mut self, event: Event<'_>) -> Result<Flow, Error>;
}

/// Emits a full tag (start, key, value, end), stopping early on [Flow::Skip].
pub(super) fn emit_tag<S: EventSink>(sink: &mut S, key: &str, value: &str) -> Result<Flow, Error> {
    for event in [
        Event::StartTag,
        Event::TagKey(key),
        Event::TagValue(value),
        Event::EndTag,
    ] {
        if sink.event(event)? == Flow::Skip {
            return Ok(Flow::Skip);
        }
    }
    Ok(Flow::Continue)
}

/// Emits a full way node reference, stopping early on [Flow::Skip].
pub(super) fn emit_node_ref<S: EventSink>(sink: &mut S, ref_: i64) -> Result<Flow, Error> {
    for event in [Event::StartNodeRef, Event::Ref(ref_), Event::EndNodeRef] {
        if sink.event(event)? == Flow::Skip {
            return Ok(Flow::Skip);
        }
    }
    Ok(Flow::Continue)
}

/// Emits a full relation member, stopping early on [Flow::Skip].
pub(super) fn emit_member<S: EventSink>(
    sink: &mut S,
    type_: FeatureType,
    ref_: i64,
    role: &str,
) -> Result<Flow, Error> {
    for event in [
        Event::StartMember,
        Event::MemberType(type_),
        Event::Ref(ref_),
        Event::MemberRole(role),
        Event::EndMember,
    ] {
        if sink.event(event)? == Flow::Skip {
            return Ok(Flow::Skip);
        }
    }
    Ok(Flow::Continue)
}

/// [EventSink] which records every event, used to test decoders.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct Recorder {
    pub events: Vec<String>,
    pub skip_at: Option<String>,
}

#[cfg(test)]
impl EventSink for Recorder {
    fn event(&mut self, event: Event<'_>) -> Result<Flow, Error> {
        let text = match event {
            Event::Id(id) => format!("id {id}"),
            Event::Position { lon, lat } => format!("position {lon} {lat}"),
            Event::Ref(r) => format!("ref {r}"),
            Event::MemberType(t) => format!("member-type {t}"),
            Event::MemberRole(r) => format!("member-role {r}"),
            Event::TagKey(k) => format!("tag-key {k}"),
            Event::TagValue(v) => format!("tag-value {v}"),
            other => other.name().to_string(),
        };

        let skip = self.skip_at.as_deref() == Some(text.as_str());
        self.events.push(text);
        Ok(if skip { Flow::Skip } else { Flow::Continue })
    }
}
