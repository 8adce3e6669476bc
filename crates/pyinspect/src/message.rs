//! JSON-RPC 2.0 envelopes exchanged with the host.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::DecodeError;

/// Protocol version stamped on every response.
pub const JSONRPC_VERSION: &str = "2.0";

/// The method named in a request has no registered handler.
pub const METHOD_NOT_FOUND: i64 = -32601;

/// A handler or request decoder failed.
pub const INTERNAL_ERROR: i64 = -32603;

/// Request identifier, echoed verbatim on the response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric id. Integers and floats are preserved as written.
    Number(serde_json::Number),
    /// String id.
    String(String),
}

impl RequestId {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => Some(Self::Number(number.clone())),
            Value::String(text) => Some(Self::String(text.clone())),
            _ => None,
        }
    }
}

impl From<i64> for RequestId {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => write!(formatter, "{number}"),
            Self::String(text) => write!(formatter, "{text:?}"),
        }
    }
}

/// A decoded request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    id: RequestId,
    method: String,
    params: Vec<Value>,
}

impl Request {
    /// Builds a request from its parts.
    #[must_use]
    pub fn new(id: impl Into<RequestId>, method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            id: id.into(),
            method: method.into(),
            params,
        }
    }

    /// Request identifier.
    #[must_use]
    pub const fn id(&self) -> &RequestId {
        &self.id
    }

    /// Method name.
    #[must_use]
    pub fn method(&self) -> &str {
        self.method.as_str()
    }

    /// Positional parameters.
    #[must_use]
    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

/// Decodes a frame body into a [`Request`].
///
/// Unknown top-level fields, including `jsonrpc`, are ignored. Absent or
/// `null` params decode as an empty list.
///
/// # Errors
///
/// Returns [`DecodeError::Syntax`], [`DecodeError::NotAnObject`] or
/// [`DecodeError::MissingId`] when no response can be addressed, and
/// [`DecodeError::Invalid`] when the id is usable but the rest of the
/// envelope is not.
pub fn decode_request(body: &[u8]) -> Result<Request, DecodeError> {
    let value: Value = serde_json::from_slice(body).map_err(DecodeError::Syntax)?;
    let Value::Object(mut object) = value else {
        return Err(DecodeError::NotAnObject);
    };

    let id = object
        .get("id")
        .and_then(RequestId::from_value)
        .ok_or(DecodeError::MissingId)?;

    let method = match object.remove("method") {
        Some(Value::String(method)) => method,
        Some(_) => return Err(DecodeError::invalid(id, "request method must be a string")),
        None => return Err(DecodeError::invalid(id, "request is missing a method")),
    };

    let params = take_params(&mut object).ok_or_else(|| {
        DecodeError::invalid(id.clone(), format!("{method} params must be an array"))
    })?;

    Ok(Request { id, method, params })
}

fn take_params(object: &mut Map<String, Value>) -> Option<Vec<Value>> {
    match object.remove("params") {
        None | Some(Value::Null) => Some(Vec::new()),
        Some(Value::Array(params)) => Some(params),
        Some(_) => None,
    }
}

/// Error object carried by a failed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseError {
    code: i64,
    message: String,
}

impl ResponseError {
    /// Creates an error object.
    #[must_use]
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Numeric error code.
    #[must_use]
    pub const fn code(&self) -> i64 {
        self.code
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Exactly one of `result` or `error`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Successful result. `null` is a valid result.
    Result(Value),
    /// Failure.
    Error(ResponseError),
}

/// A response envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    jsonrpc: &'static str,
    id: RequestId,
    #[serde(flatten)]
    outcome: Outcome,
}

impl Response {
    /// Creates a success response.
    #[must_use]
    pub const fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            outcome: Outcome::Result(result),
        }
    }

    /// Creates an error response.
    #[must_use]
    pub fn error(id: RequestId, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            outcome: Outcome::Error(ResponseError::new(code, message)),
        }
    }

    /// Id of the request being answered.
    #[must_use]
    pub const fn id(&self) -> &RequestId {
        &self.id
    }

    /// Result or error carried by the response.
    #[must_use]
    pub const fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Error object, if this response reports a failure.
    #[must_use]
    pub const fn error_object(&self) -> Option<&ResponseError> {
        match &self.outcome {
            Outcome::Error(error) => Some(error),
            Outcome::Result(_) => None,
        }
    }
}

/// Serialises a response to its frame body.
///
/// # Errors
///
/// Returns the serialiser error; this only happens for values that cannot be
/// represented as JSON.
pub fn encode_response(response: &Response) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(response)
}
