//! Out-of-process Python module introspection over stdio.
//!
//! The host launches `pyinspect` as a long-lived child and exchanges
//! JSON-RPC 2.0 messages framed with LSP `Content-Length` headers over its
//! stdin and stdout. Each request is decoded, routed by method name to a
//! [`MethodHandler`], and answered before the next frame is read. Stderr is
//! reserved for diagnostics.
//!
//! The crate is layered bottom-up:
//!
//! - [`StdioTransport`] frames byte payloads.
//! - [`decode_request`] and [`encode_response`] convert payloads to and from
//!   [`Request`] and [`Response`] envelopes.
//! - [`Dispatcher`] looks handlers up in a [`MethodRegistry`] and converts
//!   [`HandlerError`]s into error envelopes.
//! - [`Server`] drives the loop until the input closes.
//! - [`run`] wires configuration, telemetry and the Python collaborators.

mod bootstrap;
mod dispatch;
mod errors;
pub mod handlers;
mod message;
mod server;
pub mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, SystemConfigLoader, build_dispatcher, run, run_with_loader,
};
pub use dispatch::{
    BoxedError, Dispatcher, HandlerError, MethodHandler, MethodRegistry, Params, RegistryError,
};
pub use errors::{DecodeError, LoopState, ServeError, TransportError};
pub use message::{
    INTERNAL_ERROR, JSONRPC_VERSION, METHOD_NOT_FOUND, Outcome, Request, RequestId, Response,
    ResponseError, decode_request, encode_response,
};
pub use server::{ServeSummary, Server};
pub use transport::{MAX_HEADER_BYTES, StdioTransport};

#[cfg(test)]
mod tests;
