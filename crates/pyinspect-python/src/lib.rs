//! Python-side collaborators for the `pyinspect` helper.
//!
//! The protocol core never touches Python directly. It depends on two narrow
//! capabilities defined here:
//!
//! - [`ModuleIntrospector`]: member names, the `__all__` export list and the
//!   `__version__` attribute of an importable module. [`PythonIntrospector`]
//!   answers these by importing the module in a short-lived child
//!   interpreter.
//! - [`VersionResolver`]: the installed version of a module.
//!   [`MetadataVersionResolver`] consults a lazily built
//!   [`DistributionIndex`] and falls back to the version attribute.
//!
//! A module that cannot be imported is an expected outcome and is reported
//! as `Ok(None)` rather than as an error.

mod distributions;
mod error;
mod introspector;
mod runtime;
mod search_paths;
mod versions;

pub use distributions::{Distribution, DistributionIndex};
pub use error::{IntrospectionError, MetadataError, RuntimeError, VersionError};
pub use introspector::{ModuleIntrospector, PythonIntrospector};
pub use runtime::{PythonRuntime, ScriptOutput};
pub use search_paths::SearchPaths;
pub use versions::{MetadataVersionResolver, VersionResolver};
