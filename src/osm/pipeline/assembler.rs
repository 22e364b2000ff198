// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::osm::reader::{Event, EventSink, Flow};
use crate::osm::{FeatureType, Member, Node, Relation, Way};
use crate::tags::{normalize_tag_set, Vocabulary};
use crate::Error;

/// Violation of the record nesting rules in a decoded event stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("unexpected {event} event {state}")]
    UnexpectedEvent {
        event: &'static str,
        state: &'static str,
    },

    #[error("{0} without an id")]
    MissingId(FeatureType),

    #[error("node {0} without a position")]
    MissingPosition(i64),

    #[error("{type_} id {id} is not positive")]
    InvalidId { type_: FeatureType, id: i64 },

    #[error("{0} without a reference")]
    MissingRef(&'static str),

    #[error("member of relation {0} without a type")]
    MissingMemberType(i64),
}

/// Pass-specific reactions to assembled records.
///
/// Returning [Flow::Skip] from `start`, `id` or `position` drops the record:
/// it is never delivered to `node`, `way` or `relation`.
pub(super) trait RecordHandler {
    fn start(&mut self, type_: FeatureType) -> Flow;
    fn id(&mut self, type_: FeatureType, id: u64) -> Flow;
    fn position(&mut self, id: u64, lon: i32, lat: i32) -> Result<Flow, Error>;
    fn node(&mut self, node: &Node) -> Result<(), Error>;
    fn way(&mut self, way: &Way) -> Result<(), Error>;
    fn relation(&mut self, relation: &Relation) -> Result<(), Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Top,
    Bounds,
    Record(FeatureType),
    Tag(FeatureType),
    NodeRef,
    Member,
    Skipping(FeatureType),
}

impl State {
    fn describe(self) -> &'static str {
        match self {
            State::Top => "outside of any record",
            State::Bounds => "inside bounds",
            State::Record(FeatureType::Node) => "inside a node",
            State::Record(FeatureType::Way) => "inside a way",
            State::Record(FeatureType::Relation) => "inside a relation",
            State::Tag(_) => "inside a tag",
            State::NodeRef => "inside a way node reference",
            State::Member => "inside a relation member",
            State::Skipping(_) => "inside a skipped record",
        }
    }
}

/// Turns a stream of decoder [Events](Event) into complete records,
/// validating their nesting on the way.
pub(super) struct Assembler<'v, H: RecordHandler> {
    vocabulary: &'v Vocabulary,
    pub(super) handler: H,
    state: State,
    seen_record: bool,

    id: Option<i64>,
    position: Option<(i32, i32)>,
    tags: Vec<crate::tags::Tag>,
    refs: Vec<i64>,
    members: Vec<Member>,

    key: String,
    value: String,
    ref_: Option<i64>,
    member_type: Option<FeatureType>,
    role: String,
}

impl<'v, H: RecordHandler> Assembler<'v, H> {
    pub(super) fn new(vocabulary: &'v Vocabulary, handler: H) -> Self {
        Self {
            vocabulary,
            handler,
            state: State::Top,
            seen_record: false,
            id: None,
            position: None,
            tags: Vec::default(),
            refs: Vec::default(),
            members: Vec::default(),
            key: String::default(),
            value: String::default(),
            ref_: None,
            member_type: None,
            role: String::default(),
        }
    }

    /// Checks that the stream did not end inside a record.
    pub(super) fn finish(self) -> Result<H, Error> {
        match self.state {
            State::Top => Ok(self.handler),
            other => Err(ProtocolError::UnexpectedEvent {
                event: "end-of-input",
                state: other.describe(),
            }
            .into()),
        }
    }

    fn start_record(&mut self, type_: FeatureType) -> Flow {
        self.seen_record = true;
        self.id = None;
        self.position = None;
        self.tags.clear();
        self.refs.clear();
        self.members.clear();

        let flow = self.handler.start(type_);
        self.state = match flow {
            Flow::Continue => State::Record(type_),
            Flow::Skip => State::Skipping(type_),
        };
        flow
    }

    fn record_id(&mut self, type_: FeatureType, id: i64) -> Result<Flow, Error> {
        if self.id.is_some() {
            return Err(self.unexpected(Event::Id(id)));
        }
        if id <= 0 {
            return Err(ProtocolError::InvalidId { type_, id }.into());
        }

        self.id = Some(id);
        let flow = self.handler.id(type_, id as u64);
        if flow == Flow::Skip {
            self.state = State::Skipping(type_);
        }
        Ok(flow)
    }

    fn record_position(&mut self, lon: i32, lat: i32) -> Result<Flow, Error> {
        let id = match self.id {
            Some(id) if self.position.is_none() => id,
            _ => return Err(self.unexpected(Event::Position { lon, lat })),
        };

        self.position = Some((lon, lat));
        let flow = self.handler.position(id as u64, lon, lat)?;
        if flow == Flow::Skip {
            self.state = State::Skipping(FeatureType::Node);
        }
        Ok(flow)
    }

    fn end_record(&mut self, type_: FeatureType) -> Result<(), Error> {
        self.state = State::Top;
        let id = self.id.ok_or(ProtocolError::MissingId(type_))?;
        normalize_tag_set(&mut self.tags);

        match type_ {
            FeatureType::Node => {
                let (lon, lat) = self.position.ok_or(ProtocolError::MissingPosition(id))?;
                let node = Node {
                    id,
                    lon,
                    lat,
                    tags: std::mem::take(&mut self.tags),
                };
                let result = self.handler.node(&node);
                self.tags = node.tags;
                result
            }

            FeatureType::Way => {
                let way = Way {
                    id,
                    tags: std::mem::take(&mut self.tags),
                    refs: std::mem::take(&mut self.refs),
                };
                let result = self.handler.way(&way);
                self.tags = way.tags;
                self.refs = way.refs;
                result
            }

            FeatureType::Relation => {
                let relation = Relation {
                    id,
                    tags: std::mem::take(&mut self.tags),
                    members: std::mem::take(&mut self.members),
                };
                let result = self.handler.relation(&relation);
                self.tags = relation.tags;
                self.members = relation.members;
                result
            }
        }
    }

    fn end_member(&mut self) -> Result<(), Error> {
        let relation_id = self.id.unwrap_or_default();
        let type_ = self
            .member_type
            .take()
            .ok_or(ProtocolError::MissingMemberType(relation_id))?;
        let ref_ = self.ref_.take().ok_or(ProtocolError::MissingRef("member"))?;

        self.members.push(Member {
            type_,
            ref_,
            role: std::mem::take(&mut self.role),
        });
        self.state = State::Record(FeatureType::Relation);
        Ok(())
    }

    fn unexpected(&self, event: Event<'_>) -> Error {
        ProtocolError::UnexpectedEvent {
            event: event.name(),
            state: self.state.describe(),
        }
        .into()
    }
}

impl<H: RecordHandler> EventSink for Assembler<'_, H> {
    fn event(&mut self, event: Event<'_>) -> Result<Flow, Error> {
        use FeatureType::{Node as N, Relation as R, Way as W};

        match (self.state, event) {
            (State::Top, Event::StartBounds) if !self.seen_record => self.state = State::Bounds,
            (State::Bounds, Event::Position { .. }) => {}
            (State::Bounds, Event::EndBounds) => self.state = State::Top,

            (State::Top, Event::StartNode) => return Ok(self.start_record(N)),
            (State::Top, Event::StartWay) => return Ok(self.start_record(W)),
            (State::Top, Event::StartRelation) => return Ok(self.start_record(R)),

            (State::Record(type_), Event::Id(id)) => return self.record_id(type_, id),
            (State::Record(N), Event::Position { lon, lat }) => {
                return self.record_position(lon, lat)
            }

            (State::Record(type_), Event::StartTag) if self.id.is_some() => {
                self.key.clear();
                self.value.clear();
                self.state = State::Tag(type_);
            }
            (State::Tag(_), Event::TagKey(k)) => {
                self.key.clear();
                self.key.push_str(k);
            }
            (State::Tag(_), Event::TagValue(v)) => {
                self.value.clear();
                self.value.push_str(v);
            }
            (State::Tag(type_), Event::EndTag) => {
                let tag = self.vocabulary.intern_pair(&self.key, &self.value);
                if tag.is_known() {
                    self.tags.push(tag);
                }
                self.state = State::Record(type_);
            }

            (State::Record(W), Event::StartNodeRef) if self.id.is_some() => {
                self.ref_ = None;
                self.state = State::NodeRef;
            }
            (State::NodeRef, Event::Ref(r)) if self.ref_.is_none() => {
                if r <= 0 {
                    return Err(ProtocolError::InvalidId { type_: N, id: r }.into());
                }
                self.ref_ = Some(r);
            }
            (State::NodeRef, Event::EndNodeRef) => {
                let r = self.ref_.take().ok_or(ProtocolError::MissingRef("nd"))?;
                self.refs.push(r);
                self.state = State::Record(W);
            }

            (State::Record(R), Event::StartMember) if self.id.is_some() => {
                self.ref_ = None;
                self.member_type = None;
                self.role.clear();
                self.state = State::Member;
            }
            (State::Member, Event::MemberType(t)) if self.member_type.is_none() => {
                self.member_type = Some(t)
            }
            (State::Member, Event::Ref(r)) if self.ref_.is_none() => {
                if r <= 0 {
                    let type_ = self.member_type.unwrap_or(N);
                    return Err(ProtocolError::InvalidId { type_, id: r }.into());
                }
                self.ref_ = Some(r);
            }
            (State::Member, Event::MemberRole(role)) => {
                self.role.clear();
                self.role.push_str(role);
            }
            (State::Member, Event::EndMember) => self.end_member()?,

            (State::Record(N), Event::EndNode) => self.end_record(N)?,
            (State::Record(W), Event::EndWay) => self.end_record(W)?,
            (State::Record(R), Event::EndRelation) => self.end_record(R)?,

            (State::Skipping(N), Event::EndNode)
            | (State::Skipping(W), Event::EndWay)
            | (State::Skipping(R), Event::EndRelation) => self.state = State::Top,

            // Decoders are allowed to ignore a skip request
            (
                State::Skipping(_),
                Event::Id(_)
                | Event::Position { .. }
                | Event::StartTag
                | Event::TagKey(_)
                | Event::TagValue(_)
                | Event::EndTag
                | Event::StartNodeRef
                | Event::EndNodeRef
                | Event::Ref(_)
                | Event::StartMember
                | Event::MemberType(_)
                | Event::MemberRole(_)
                | Event::EndMember,
            ) => return Ok(Flow::Skip),

            (_, event) => return Err(self.unexpected(event)),
        }

        Ok(Flow::Continue)
    }
}
