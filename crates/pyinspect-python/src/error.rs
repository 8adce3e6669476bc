//! Error types for the Python collaborators.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while launching the Python interpreter.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The interpreter process could not be started.
    #[error("failed to spawn python interpreter '{interpreter}': {source}")]
    Spawn {
        /// Interpreter command that failed to start.
        interpreter: String,
        /// Underlying process spawn error.
        #[source]
        source: io::Error,
    },
}

/// Errors raised while introspecting a module.
#[derive(Debug, Error)]
pub enum IntrospectionError {
    /// The interpreter could not be run.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    /// The introspection script exited with an unexpected status.
    #[error("introspection of '{module}' failed: {message}")]
    ScriptFailed {
        /// Module being introspected.
        module: String,
        /// Message captured from stderr, or a status summary.
        message: String,
    },
    /// The introspection script printed something other than the expected JSON.
    #[error("introspection of '{module}' returned invalid output: {message}")]
    InvalidOutput {
        /// Module being introspected.
        module: String,
        /// Parsing error details.
        message: String,
    },
}

/// Errors raised while locating distribution metadata.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The interpreter could not be run to report `sys.path`.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    /// The interpreter reported its search paths in an unexpected form.
    #[error("python interpreter reported invalid search paths: {message}")]
    InvalidSearchPaths {
        /// Failure details.
        message: String,
    },
    /// A metadata file could not be read.
    #[error("failed to read distribution metadata '{}': {source}", path.display())]
    Read {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Errors raised while resolving a module version.
#[derive(Debug, Error)]
pub enum VersionError {
    /// The distribution index could not be built.
    #[error("failed to index installed distributions: {0}")]
    Metadata(#[from] MetadataError),
    /// The version attribute lookup failed.
    #[error(transparent)]
    Introspection(#[from] IntrospectionError),
}
