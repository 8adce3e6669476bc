//! Error types for the transport, codec and request loop.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::message::RequestId;

/// Transport-layer errors. Every variant is fatal: once framing is lost the
/// stream cannot be resynchronised.
#[derive(Debug, Error)]
pub enum TransportError {
    /// I/O error during read or write.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The stream ended part-way through a header block.
    #[error("stream closed while reading frame headers")]
    UnexpectedEof,

    /// A header line did not contain the `": "` separator.
    #[error("malformed header line '{line}'")]
    MalformedHeader {
        /// Offending line, lossily decoded.
        line: String,
    },

    /// A header block grew past the header size limit without ending.
    #[error("frame headers exceed the {limit} byte limit")]
    HeaderTooLarge {
        /// Largest accepted header block, in bytes.
        limit: usize,
    },

    /// Missing Content-Length header.
    #[error("missing Content-Length header")]
    MissingContentLength,

    /// The Content-Length value was not a byte count.
    #[error("invalid Content-Length value '{value}'")]
    InvalidContentLength {
        /// Raw header value.
        value: String,
    },

    /// The declared body exceeds the configured limit.
    #[error("frame of {length} bytes exceeds the {max} byte limit")]
    FrameTooLarge {
        /// Declared body length.
        length: usize,
        /// Configured limit.
        max: usize,
    },

    /// The stream ended before the declared body was read.
    #[error("stream closed after {received} of {expected} body bytes")]
    TruncatedBody {
        /// Declared body length.
        expected: usize,
        /// Bytes received before end-of-stream.
        received: usize,
    },
}

/// Errors raised while decoding a request body.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The body is not valid UTF-8 JSON.
    #[error("request body is not valid JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    /// The body is JSON but not an object.
    #[error("request body must be a JSON object")]
    NotAnObject,

    /// The request has no number or string `id` to answer.
    #[error("request has no usable id")]
    MissingId,

    /// The request has an id but is otherwise malformed.
    #[error("{message}")]
    Invalid {
        /// Id of the malformed request.
        id: RequestId,
        /// Description of the problem.
        message: String,
    },
}

impl DecodeError {
    /// Creates an answerable decode error.
    pub fn invalid(id: RequestId, message: impl Into<String>) -> Self {
        Self::Invalid {
            id,
            message: message.into(),
        }
    }

    /// Id to answer, when the request can still be answered.
    #[must_use]
    pub const fn answerable_id(&self) -> Option<&RequestId> {
        match self {
            Self::Invalid { id, .. } => Some(id),
            Self::Syntax(_) | Self::NotAnObject | Self::MissingId => None,
        }
    }
}

/// States of the request loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Between requests.
    Idle,
    /// Reading a header block.
    AwaitingHeader,
    /// Reading a frame body.
    AwaitingBody,
    /// Decoding, dispatching and answering one request.
    Dispatching,
    /// Input exhausted; terminal.
    Closed,
}

impl fmt::Display for LoopState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::AwaitingHeader => "awaiting header",
            Self::AwaitingBody => "awaiting body",
            Self::Dispatching => "dispatching",
            Self::Closed => "closed",
        };
        formatter.write_str(label)
    }
}

/// Fatal faults that end the request loop.
///
/// Orderly end-of-stream is not represented here: it is the `Ok` outcome of
/// [`Server::serve`](crate::Server::serve).
#[derive(Debug, Error)]
pub enum ServeError {
    /// Framing failed while reading or writing a frame.
    #[error("transport failed while {state}: {source}")]
    Transport {
        /// Loop state at the time of the fault.
        state: LoopState,
        /// Underlying transport error.
        #[source]
        source: TransportError,
    },

    /// A request body could not be decoded into something answerable.
    #[error("unanswerable request: {0}")]
    Decode(#[source] DecodeError),

    /// A response could not be serialized.
    #[error("failed to serialize response: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ServeError {
    /// Loop state in which the fault occurred.
    #[must_use]
    pub const fn state(&self) -> LoopState {
        match self {
            Self::Transport { state, .. } => *state,
            Self::Decode(_) | Self::Encode(_) => LoopState::Dispatching,
        }
    }
}
