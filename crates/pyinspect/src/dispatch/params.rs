//! Positional parameter access for handlers.

use serde_json::Value;

use super::errors::HandlerError;

/// Borrowed view of a request's positional parameters.
#[derive(Debug, Clone, Copy)]
pub struct Params<'a> {
    method: &'a str,
    values: &'a [Value],
}

impl<'a> Params<'a> {
    /// Wraps the parameters of a call to `method`.
    #[must_use]
    pub const fn new(method: &'a str, values: &'a [Value]) -> Self {
        Self { method, values }
    }

    /// Method being invoked.
    #[must_use]
    pub const fn method(&self) -> &'a str {
        self.method
    }

    /// Raw parameter values.
    #[must_use]
    pub const fn values(&self) -> &'a [Value] {
        self.values
    }

    /// Number of parameters supplied.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when no parameters were supplied.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Checks that exactly `expected` parameters were supplied.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::Arity`] on a mismatch.
    pub fn expect_arity(&self, expected: usize) -> Result<(), HandlerError> {
        if self.values.len() == expected {
            return Ok(());
        }
        Err(HandlerError::Arity {
            method: self.method.to_owned(),
            expected,
            actual: self.values.len(),
        })
    }

    /// Returns the string parameter at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::ParamType`] when the parameter is missing or
    /// is not a string.
    pub fn string(&self, index: usize) -> Result<&'a str, HandlerError> {
        self.values
            .get(index)
            .and_then(Value::as_str)
            .ok_or_else(|| HandlerError::ParamType {
                method: self.method.to_owned(),
                index,
                expected: "string",
            })
    }

    /// Returns the sole parameter of a one-argument method as a string.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::Arity`] or [`HandlerError::ParamType`].
    pub fn single_string(&self) -> Result<&'a str, HandlerError> {
        self.expect_arity(1)?;
        self.string(0)
    }
}
