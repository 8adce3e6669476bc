//! Method name to handler registry.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;

use serde_json::Value;

use super::errors::{HandlerError, RegistryError};
use super::params::Params;

/// A handler for one JSON-RPC method.
///
/// Returning `Ok(Value::Null)` is a successful "no answer" and is distinct
/// from returning an error.
pub trait MethodHandler {
    /// Handles one invocation.
    ///
    /// # Errors
    ///
    /// Any [`HandlerError`] is reported to the caller as `INTERNAL_ERROR`.
    fn call(&self, params: Params<'_>) -> Result<Value, HandlerError>;
}

impl<F> MethodHandler for F
where
    F: Fn(Params<'_>) -> Result<Value, HandlerError>,
{
    fn call(&self, params: Params<'_>) -> Result<Value, HandlerError> {
        self(params)
    }
}

/// Registry of handlers keyed by method name.
///
/// The registry is built once at startup and handed to
/// [`Dispatcher`](super::Dispatcher), which never mutates it.
#[derive(Default)]
pub struct MethodRegistry {
    handlers: HashMap<String, Box<dyn MethodHandler>>,
}

impl MethodRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `method`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] if the name is taken; the
    /// existing handler is kept.
    pub fn register<H>(&mut self, method: impl Into<String>, handler: H) -> Result<(), RegistryError>
    where
        H: MethodHandler + 'static,
    {
        match self.handlers.entry(method.into()) {
            Entry::Occupied(entry) => Err(RegistryError::Duplicate {
                method: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(Box::new(handler));
                Ok(())
            }
        }
    }

    /// Looks up the handler for `method`.
    #[must_use]
    pub fn get(&self, method: &str) -> Option<&dyn MethodHandler> {
        self.handlers.get(method).map(AsRef::as_ref)
    }

    /// Registered method names in sorted order.
    #[must_use]
    pub fn methods(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no methods are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for MethodRegistry {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("MethodRegistry")
            .field("methods", &self.methods())
            .finish()
    }
}
