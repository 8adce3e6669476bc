//! Errors raised while registering or invoking method handlers.

use std::error::Error as StdError;

use thiserror::Error;

/// Boxed error carried by [`HandlerError::Failed`].
pub type BoxedError = Box<dyn StdError + Send + Sync + 'static>;

/// Failure reported by a method handler.
///
/// The dispatcher turns every variant into an `INTERNAL_ERROR` response whose
/// message is this error's display text.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Wrong number of positional parameters.
    #[error("{method} expects {expected} parameter(s), got {actual}")]
    Arity {
        /// Method being invoked.
        method: String,
        /// Number of parameters the handler takes.
        expected: usize,
        /// Number of parameters supplied.
        actual: usize,
    },

    /// A positional parameter had the wrong JSON type.
    #[error("{method} parameter {index} must be a {expected}")]
    ParamType {
        /// Method being invoked.
        method: String,
        /// Zero-based parameter position.
        index: usize,
        /// Expected JSON type.
        expected: &'static str,
    },

    /// The handler's collaborator failed.
    #[error(transparent)]
    Failed(BoxedError),
}

impl HandlerError {
    /// Wraps a collaborator failure.
    pub fn failed(error: impl Into<BoxedError>) -> Self {
        Self::Failed(error.into())
    }
}

/// Errors raised while building a method registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A handler is already registered under this name.
    #[error("method '{method}' is already registered")]
    Duplicate {
        /// Conflicting method name.
        method: String,
    },
}
