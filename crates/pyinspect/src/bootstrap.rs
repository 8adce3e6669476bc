//! Process bootstrap: configuration, telemetry and collaborator wiring.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use pyinspect_config::Config;
use pyinspect_python::{MetadataVersionResolver, PythonIntrospector, PythonRuntime, SearchPaths};
use thiserror::Error;
use tracing::info;

use crate::dispatch::{Dispatcher, RegistryError};
use crate::errors::ServeError;
use crate::handlers::default_registry;
use crate::server::{ServeSummary, Server};
use crate::telemetry::{self, TelemetryError};
use crate::transport::StdioTransport;

/// Abstracts configuration loading for testability.
pub trait ConfigLoader {
    /// Loads the helper configuration.
    ///
    /// # Errors
    ///
    /// Returns the loader error when a layer cannot be read or merged.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`OrthoConfig::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Errors surfaced before or while serving.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The method registry could not be assembled.
    #[error("failed to register methods: {source}")]
    Registry {
        /// Underlying registry error.
        #[source]
        source: RegistryError,
    },
    /// The request loop ended on a fatal fault.
    #[error("request loop failed: {source}")]
    Serve {
        /// Underlying loop error.
        #[source]
        source: ServeError,
    },
}

/// Wires the Python collaborators into a dispatcher.
///
/// Nothing is spawned here: search paths and the distribution index are
/// resolved on the first `moduleVersion` request.
///
/// # Errors
///
/// Returns [`RegistryError`] if two handlers claim the same method.
pub fn build_dispatcher(config: &Config) -> Result<Dispatcher, RegistryError> {
    let runtime = PythonRuntime::new(config.python());
    let introspector = Arc::new(PythonIntrospector::new(runtime.clone()));
    let search_paths = if config.search_paths().is_empty() {
        SearchPaths::Interpreter(runtime)
    } else {
        SearchPaths::Explicit(config.search_paths().to_vec())
    };
    let versions = MetadataVersionResolver::new(search_paths, Arc::clone(&introspector));
    default_registry(introspector, versions).map(Dispatcher::new)
}

/// Serves requests over `reader` and `writer` with the supplied loader.
///
/// # Errors
///
/// Returns [`BootstrapError`] for configuration, telemetry or registry
/// failures, and for fatal faults in the request loop.
pub fn run_with_loader<L, R, W>(
    loader: &L,
    reader: R,
    writer: W,
) -> Result<ServeSummary, BootstrapError>
where
    L: ConfigLoader + ?Sized,
    R: BufRead,
    W: Write,
{
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;
    telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source })?;
    info!(
        python = config.python(),
        search_paths = config.search_paths().len(),
        max_frame_bytes = config.max_frame_bytes(),
        "pyinspect starting"
    );

    let dispatcher =
        build_dispatcher(&config).map_err(|source| BootstrapError::Registry { source })?;
    let transport =
        StdioTransport::new(reader, writer).with_max_frame_bytes(config.max_frame_bytes());
    Server::new(transport, dispatcher)
        .serve()
        .map_err(|source| BootstrapError::Serve { source })
}

/// Serves requests over the process's stdin and stdout.
///
/// # Errors
///
/// See [`run_with_loader`].
pub fn run() -> Result<ServeSummary, BootstrapError> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    run_with_loader(&SystemConfigLoader, stdin.lock(), stdout.lock())
}
