// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::io;
use std::sync::Arc;

use crate::collections::AllocationError;
use crate::filter::{CompileError, MatchError};
use crate::gpx::GpxError;
use crate::osm::{DecodeError, ProtocolError};

/// Any error which aborts an extraction or routing run.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("filter: {0}")]
    Compile(#[from] CompileError),

    #[error("filter evaluation: {0}")]
    Match(#[from] MatchError),

    #[error("decode: {0}")]
    Decode(#[from] DecodeError),

    #[error("malformed input: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("out of memory: {0}")]
    Allocation(#[from] AllocationError),

    #[error("gpx: {0}")]
    Gpx(#[from] GpxError),

    #[error("io: {0}")]
    Io(#[from] Arc<io::Error>),
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(Arc::new(e))
    }
}
