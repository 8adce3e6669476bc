//! Shared configuration for the `pyinspect` helper process.
//!
//! Values are layered by `ortho_config`: built-in defaults first, then a
//! `pyinspect.toml` file, then `PYINSPECT_*` environment variables and finally
//! command-line flags. The host normally launches the helper without any
//! arguments, so the environment is the usual override channel.

mod defaults;
mod logging;

use std::path::{Path, PathBuf};

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_MAX_FRAME_BYTES, DEFAULT_PYTHON_INTERPRETER,
    default_log_filter_string, default_log_format, default_max_frame_bytes,
    default_python_interpreter,
};
pub use logging::LogFormat;

/// Resolved configuration for the helper.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "PYINSPECT")]
pub struct Config {
    /// Tracing filter expression, in `EnvFilter` syntax.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    log_filter: String,
    /// Output format for diagnostic logs written to stderr.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    log_format: LogFormat,
    /// Python interpreter used for module introspection.
    #[serde(default = "default_python_interpreter")]
    #[ortho_config(default = default_python_interpreter())]
    python: String,
    /// Directories scanned for distribution metadata. Empty means "ask the
    /// interpreter for `sys.path`".
    #[serde(default)]
    #[ortho_config(default = Vec::new())]
    search_paths: Vec<PathBuf>,
    /// Upper bound on a single frame body, in bytes.
    #[serde(default = "default_max_frame_bytes")]
    #[ortho_config(default = default_max_frame_bytes())]
    max_frame_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            python: default_python_interpreter(),
            search_paths: Vec::new(),
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

impl Config {
    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Interpreter command used to run introspection scripts.
    #[must_use]
    pub fn python(&self) -> &str {
        self.python.as_str()
    }

    /// Explicit metadata search paths, if any were configured.
    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Largest accepted frame body, in bytes.
    #[must_use]
    pub const fn max_frame_bytes(&self) -> usize {
        self.max_frame_bytes
    }

    /// Returns a copy using a different interpreter command.
    #[must_use]
    pub fn with_python(mut self, python: impl Into<String>) -> Self {
        self.python = python.into();
        self
    }

    /// Returns a copy with explicit metadata search paths.
    #[must_use]
    pub fn with_search_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.search_paths = paths
            .into_iter()
            .map(|path| path.as_ref().to_path_buf())
            .collect();
        self
    }

    /// Returns a copy with a different frame size limit.
    #[must_use]
    pub const fn with_max_frame_bytes(mut self, max_frame_bytes: usize) -> Self {
        self.max_frame_bytes = max_frame_bytes;
        self
    }
}
