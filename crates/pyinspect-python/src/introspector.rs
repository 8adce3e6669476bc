//! Module introspection through a Python interpreter.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::error::IntrospectionError;
use crate::runtime::{PythonRuntime, ScriptOutput};

/// Exit status used by the script when the module cannot be imported.
const IMPORT_FAILED_STATUS: i32 = 3;

// Module-level prints during import are redirected to stderr so that stdout
// carries only the JSON answer.
const INTROSPECT_SCRIPT: &str = concat!(
    "import importlib, inspect, json, sys\n",
    "query, name = sys.argv[1], sys.argv[2]\n",
    "real_stdout = sys.stdout\n",
    "sys.stdout = sys.stderr\n",
    "try:\n",
    "    module = importlib.import_module(name)\n",
    "except BaseException:\n",
    "    sys.exit(3)\n",
    "finally:\n",
    "    sys.stdout = real_stdout\n",
    "if query == 'members':\n",
    "    try:\n",
    "        value = [member for member, _ in inspect.getmembers(module)]\n",
    "    except Exception:\n",
    "        value = sorted(dir(module))\n",
    "elif query == 'exports':\n",
    "    value = getattr(module, '__all__', None)\n",
    "    try:\n",
    "        value = None if value is None else [str(item) for item in value]\n",
    "    except Exception:\n",
    "        value = None\n",
    "elif query == 'version':\n",
    "    value = getattr(module, '__version__', None)\n",
    "    if not isinstance(value, str):\n",
    "        value = None\n",
    "else:\n",
    "    sys.stderr.write('unknown introspection query: ' + query)\n",
    "    sys.exit(2)\n",
    "sys.stdout.write(json.dumps(value))\n",
);

/// Narrow capability interface over a module's runtime attributes.
///
/// Every method returns `Ok(None)` when the module cannot be imported: a
/// missing module is an expected answer, not a failure.
pub trait ModuleIntrospector {
    /// Enumerates the names of the module's members, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the interpreter cannot answer the query.
    fn member_names(&self, module: &str) -> Result<Option<Vec<String>>, IntrospectionError>;

    /// Returns the module's `__all__` list, when it defines one.
    ///
    /// # Errors
    ///
    /// Returns an error if the interpreter cannot answer the query.
    fn export_list(&self, module: &str) -> Result<Option<Vec<String>>, IntrospectionError>;

    /// Returns the module's `__version__` string, when present.
    ///
    /// # Errors
    ///
    /// Returns an error if the interpreter cannot answer the query.
    fn version_attribute(&self, module: &str) -> Result<Option<String>, IntrospectionError>;
}

impl<T> ModuleIntrospector for Arc<T>
where
    T: ModuleIntrospector + ?Sized,
{
    fn member_names(&self, module: &str) -> Result<Option<Vec<String>>, IntrospectionError> {
        (**self).member_names(module)
    }

    fn export_list(&self, module: &str) -> Result<Option<Vec<String>>, IntrospectionError> {
        (**self).export_list(module)
    }

    fn version_attribute(&self, module: &str) -> Result<Option<String>, IntrospectionError> {
        (**self).version_attribute(module)
    }
}

/// Introspector that imports modules in a child interpreter.
#[derive(Debug, Clone)]
pub struct PythonIntrospector {
    runtime: PythonRuntime,
}

impl PythonIntrospector {
    /// Builds an introspector over the supplied runtime.
    #[must_use]
    pub const fn new(runtime: PythonRuntime) -> Self {
        Self { runtime }
    }

    fn query<T: DeserializeOwned>(
        &self,
        query: &str,
        module: &str,
    ) -> Result<Option<T>, IntrospectionError> {
        let output = self
            .runtime
            .run_script(INTROSPECT_SCRIPT, &[query, module])?;
        interpret_output(module, &output)
    }
}

impl ModuleIntrospector for PythonIntrospector {
    fn member_names(&self, module: &str) -> Result<Option<Vec<String>>, IntrospectionError> {
        self.query("members", module)
    }

    fn export_list(&self, module: &str) -> Result<Option<Vec<String>>, IntrospectionError> {
        self.query("exports", module)
    }

    fn version_attribute(&self, module: &str) -> Result<Option<String>, IntrospectionError> {
        self.query("version", module)
    }
}

/// Maps a script run onto the introspection contract.
///
/// The import-failure status becomes `Ok(None)`; a successful run must print
/// one JSON document, where `null` also means "no answer".
fn interpret_output<T: DeserializeOwned>(
    module: &str,
    output: &ScriptOutput,
) -> Result<Option<T>, IntrospectionError> {
    if output.status() == Some(IMPORT_FAILED_STATUS) {
        return Ok(None);
    }

    if !output.success() {
        return Err(IntrospectionError::ScriptFailed {
            module: module.to_owned(),
            message: output.failure_message(),
        });
    }

    serde_json::from_slice::<Option<T>>(output.stdout()).map_err(|source| {
        IntrospectionError::InvalidOutput {
            module: module.to_owned(),
            message: source.to_string(),
        }
    })
}
