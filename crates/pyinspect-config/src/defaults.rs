/// Default log filter expression used by the helper.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Interpreter launched when no override is configured.
pub const DEFAULT_PYTHON_INTERPRETER: &str = "python3";

/// Largest frame body accepted from the host (64 MiB).
pub const DEFAULT_MAX_FRAME_BYTES: usize = 64 * 1024 * 1024;

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the helper.
#[must_use]
pub const fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}

/// Owned interpreter command used by serde defaults.
#[must_use]
pub fn default_python_interpreter() -> String {
    DEFAULT_PYTHON_INTERPRETER.to_owned()
}

/// Frame size limit used by serde defaults.
#[must_use]
pub const fn default_max_frame_bytes() -> usize {
    DEFAULT_MAX_FRAME_BYTES
}
