//! Method dispatch.
//!
//! The [`Dispatcher`] is the only place where handler failures are turned
//! into error envelopes. Handlers report failure through [`HandlerError`];
//! nothing they return can end the request loop.

mod errors;
mod params;
mod registry;

use tracing::{debug, warn};

pub use errors::{BoxedError, HandlerError, RegistryError};
pub use params::Params;
pub use registry::{MethodHandler, MethodRegistry};

use crate::message::{INTERNAL_ERROR, METHOD_NOT_FOUND, Request, Response};

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Routes requests to registered handlers.
#[derive(Debug)]
pub struct Dispatcher {
    registry: MethodRegistry,
}

impl Dispatcher {
    /// Creates a dispatcher over a finished registry.
    #[must_use]
    pub const fn new(registry: MethodRegistry) -> Self {
        Self { registry }
    }

    /// Registry consulted for lookups.
    #[must_use]
    pub const fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// Invokes the handler for `request` and builds its response.
    ///
    /// Unknown methods produce `METHOD_NOT_FOUND` without invoking anything.
    /// Handler failures produce `INTERNAL_ERROR` carrying the failure text.
    #[must_use]
    pub fn dispatch(&self, request: &Request) -> Response {
        let id = request.id().clone();
        let method = request.method();

        let Some(handler) = self.registry.get(method) else {
            debug!(target: DISPATCH_TARGET, %id, method, "method not found");
            return Response::error(id, METHOD_NOT_FOUND, format!("method {method} not found"));
        };

        match handler.call(Params::new(method, request.params())) {
            Ok(result) => Response::success(id, result),
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %id, method, %error, "handler failed");
                Response::error(id, INTERNAL_ERROR, error.to_string())
            }
        }
    }
}
