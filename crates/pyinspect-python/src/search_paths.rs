//! Sources for the directories scanned for distribution metadata.

use std::path::PathBuf;

use crate::error::MetadataError;
use crate::runtime::PythonRuntime;

const SYS_PATH_SCRIPT: &str = concat!(
    "import json, sys\n",
    "sys.stdout.write(json.dumps([entry for entry in sys.path if entry]))\n",
);

/// Where the metadata search paths come from.
#[derive(Debug, Clone)]
pub enum SearchPaths {
    /// A fixed list supplied by configuration.
    Explicit(Vec<PathBuf>),
    /// The interpreter's own `sys.path`.
    Interpreter(PythonRuntime),
}

impl SearchPaths {
    /// Resolves the list of existing directories to scan, in precedence order.
    ///
    /// # Errors
    ///
    /// Returns an error if the interpreter cannot be run or reports its
    /// search paths in an unexpected form.
    pub fn resolve(&self) -> Result<Vec<PathBuf>, MetadataError> {
        let candidates = match self {
            Self::Explicit(paths) => paths.clone(),
            Self::Interpreter(runtime) => interpreter_paths(runtime)?,
        };
        Ok(candidates.into_iter().filter(|path| path.is_dir()).collect())
    }
}

fn interpreter_paths(runtime: &PythonRuntime) -> Result<Vec<PathBuf>, MetadataError> {
    let output = runtime.run_script(SYS_PATH_SCRIPT, &[])?;
    if !output.success() {
        return Err(MetadataError::InvalidSearchPaths {
            message: output.failure_message(),
        });
    }

    let entries: Vec<String> = serde_json::from_slice(output.stdout()).map_err(|source| {
        MetadataError::InvalidSearchPaths {
            message: source.to_string(),
        }
    })?;
    Ok(entries.into_iter().map(PathBuf::from).collect())
}
