//! The request loop.
//!
//! One request is read, dispatched and answered before the next frame is
//! touched:
//!
//! ```text
//! Idle -> AwaitingHeader -> AwaitingBody -> Dispatching -> Idle
//!              |
//!              +-> Closed (end of input before a frame starts)
//! ```

use std::io::{BufRead, Write};

use tracing::{debug, error, info};

use crate::dispatch::Dispatcher;
use crate::errors::{DecodeError, LoopState, ServeError, TransportError};
use crate::message::{INTERNAL_ERROR, Response, decode_request, encode_response};
use crate::transport::StdioTransport;

/// Tracing target for request loop events.
const SERVER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::server");

/// Outcome of a loop that ended on orderly end-of-input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServeSummary {
    /// Responses written, including error responses.
    pub requests: u64,
}

/// Serves requests from a transport until the input ends.
pub struct Server<R, W> {
    transport: StdioTransport<R, W>,
    dispatcher: Dispatcher,
    state: LoopState,
    requests: u64,
}

impl<R, W> Server<R, W>
where
    R: BufRead,
    W: Write,
{
    /// Creates a server in the idle state.
    #[must_use]
    pub const fn new(transport: StdioTransport<R, W>, dispatcher: Dispatcher) -> Self {
        Self {
            transport,
            dispatcher,
            state: LoopState::Idle,
            requests: 0,
        }
    }

    /// Current loop state.
    #[must_use]
    pub const fn state(&self) -> LoopState {
        self.state
    }

    /// Runs the loop until end-of-input or a fatal fault.
    ///
    /// # Errors
    ///
    /// Returns [`ServeError`] when framing is lost, a request carries no id
    /// to answer, or a response cannot be written. The loop does not continue
    /// after an error.
    pub fn serve(&mut self) -> Result<ServeSummary, ServeError> {
        info!(target: SERVER_TARGET, "serving requests");
        loop {
            if !self.step()? {
                info!(target: SERVER_TARGET, requests = self.requests, "input closed");
                return Ok(ServeSummary {
                    requests: self.requests,
                });
            }
        }
    }

    /// Handles one frame. Returns `false` once the input has closed.
    fn step(&mut self) -> Result<bool, ServeError> {
        self.state = LoopState::AwaitingHeader;
        let Some(length) = self.transport.read_headers().map_err(|source| self.fail(source))? else {
            self.state = LoopState::Closed;
            return Ok(false);
        };

        self.state = LoopState::AwaitingBody;
        let body = self
            .transport
            .read_body(length)
            .map_err(|source| self.fail(source))?;

        self.state = LoopState::Dispatching;
        let response = self.respond(&body)?;
        let encoded = encode_response(&response).map_err(|source| {
            error!(target: SERVER_TARGET, error = %source, "failed to encode response");
            ServeError::Encode(source)
        })?;
        self.transport
            .send(&encoded)
            .map_err(|source| self.fail(source))?;

        self.requests += 1;
        self.state = LoopState::Idle;
        Ok(true)
    }

    fn respond(&self, body: &[u8]) -> Result<Response, ServeError> {
        match decode_request(body) {
            Ok(request) => {
                debug!(
                    target: SERVER_TARGET,
                    id = %request.id(),
                    method = request.method(),
                    params = request.params().len(),
                    "dispatching request"
                );
                Ok(self.dispatcher.dispatch(&request))
            }
            Err(DecodeError::Invalid { id, message }) => {
                debug!(target: SERVER_TARGET, %id, reason = %message, "answering malformed request");
                Ok(Response::error(id, INTERNAL_ERROR, message))
            }
            Err(fault) => {
                error!(target: SERVER_TARGET, error = %fault, "unanswerable request");
                Err(ServeError::Decode(fault))
            }
        }
    }

    fn fail(&self, source: TransportError) -> ServeError {
        error!(target: SERVER_TARGET, state = %self.state, error = %source, "transport failed");
        ServeError::Transport {
            state: self.state,
            source,
        }
    }

    /// Consumes the server, returning the transport.
    pub fn into_transport(self) -> StdioTransport<R, W> {
        self.transport
    }
}
