//! Out-of-process execution of short Python scripts.
//!
//! Every query runs in a fresh interpreter so that importing a misbehaving
//! module cannot corrupt the helper. The child never inherits our stdin: that
//! stream carries the protocol.

use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::RuntimeError;

/// Tracing target for interpreter launches.
const RUNTIME_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::runtime");

/// Captured result of one script execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOutput {
    status: Option<i32>,
    stdout: Vec<u8>,
    stderr: String,
}

impl ScriptOutput {
    /// Builds an output record; mostly useful for test doubles.
    #[must_use]
    pub fn new(status: Option<i32>, stdout: impl Into<Vec<u8>>, stderr: impl Into<String>) -> Self {
        Self {
            status,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Exit status, or `None` when the process was killed by a signal.
    #[must_use]
    pub const fn status(&self) -> Option<i32> {
        self.status
    }

    /// Raw bytes written to stdout.
    #[must_use]
    pub fn stdout(&self) -> &[u8] {
        &self.stdout
    }

    /// Trimmed stderr text.
    #[must_use]
    pub fn stderr(&self) -> &str {
        self.stderr.as_str()
    }

    /// Returns `true` when the script exited with status zero.
    #[must_use]
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Describes a failed run using stderr when available.
    #[must_use]
    pub fn failure_message(&self) -> String {
        if !self.stderr.is_empty() {
            return self.stderr.clone();
        }
        match self.status {
            Some(code) => format!("python exited with status {code} without stderr output"),
            None => String::from("python was terminated by a signal"),
        }
    }
}

/// Handle on a Python interpreter command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PythonRuntime {
    interpreter: String,
}

impl PythonRuntime {
    /// Creates a runtime that launches `interpreter`.
    #[must_use]
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }

    /// Runs `script` via `-c`, passing `args` as `sys.argv[1:]`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Spawn`] if the interpreter cannot be started.
    /// A non-zero exit status is not an error at this layer.
    pub fn run_script(&self, script: &str, args: &[&str]) -> Result<ScriptOutput, RuntimeError> {
        debug!(
            target: RUNTIME_TARGET,
            interpreter = self.interpreter.as_str(),
            args = ?args,
            "running python script"
        );

        let output = Command::new(&self.interpreter)
            .arg("-c")
            .arg(script)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| RuntimeError::Spawn {
                interpreter: self.interpreter.clone(),
                source,
            })?;

        Ok(ScriptOutput {
            status: output.status.code(),
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        })
    }
}
