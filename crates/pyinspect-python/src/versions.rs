//! Version resolution for importable modules.
//!
//! Two strategies are tried in order: the metadata of the distribution owning
//! the module (longest dotted-prefix match), then the module's own
//! `__version__` attribute. The distribution index is built lazily, exactly
//! once, the first time a version is requested.

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::distributions::DistributionIndex;
use crate::error::VersionError;
use crate::introspector::ModuleIntrospector;
use crate::search_paths::SearchPaths;

const VERSIONS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::versions");

/// Resolves the installed version of a module.
pub trait VersionResolver {
    /// Returns the version, or `None` when no strategy yields one.
    ///
    /// # Errors
    ///
    /// Returns an error if a strategy fails outright (as opposed to finding
    /// nothing).
    fn resolve(&self, module: &str) -> Result<Option<String>, VersionError>;
}

/// Resolver backed by installed distribution metadata and module attributes.
#[derive(Debug)]
pub struct MetadataVersionResolver<I> {
    search_paths: SearchPaths,
    introspector: I,
    index: OnceCell<DistributionIndex>,
}

impl<I> MetadataVersionResolver<I> {
    /// Creates a resolver; no filesystem or interpreter work happens yet.
    #[must_use]
    pub const fn new(search_paths: SearchPaths, introspector: I) -> Self {
        Self {
            search_paths,
            introspector,
            index: OnceCell::new(),
        }
    }

    /// Creates a resolver over a prebuilt index.
    #[must_use]
    pub fn with_index(index: DistributionIndex, introspector: I) -> Self {
        Self {
            search_paths: SearchPaths::Explicit(Vec::new()),
            introspector,
            index: OnceCell::with_value(index),
        }
    }

    /// Returns `true` once the distribution index has been built.
    #[must_use]
    pub fn is_indexed(&self) -> bool {
        self.index.get().is_some()
    }

    /// Returns the distribution index, building it on first use.
    ///
    /// A failed build leaves the cell empty so a later call retries.
    ///
    /// # Errors
    ///
    /// Returns an error if the search paths cannot be resolved.
    pub fn index(&self) -> Result<&DistributionIndex, VersionError> {
        self.index
            .get_or_try_init(|| {
                let paths = self.search_paths.resolve()?;
                Ok(DistributionIndex::scan(&paths))
            })
            .map_err(VersionError::Metadata)
    }
}

impl<I> VersionResolver for MetadataVersionResolver<I>
where
    I: ModuleIntrospector,
{
    fn resolve(&self, module: &str) -> Result<Option<String>, VersionError> {
        if let Some(distribution) = self.index()?.lookup(module) {
            debug!(
                target: VERSIONS_TARGET,
                module,
                distribution = distribution.name(),
                version = distribution.version(),
                "version resolved from distribution metadata"
            );
            return Ok(Some(distribution.version().to_owned()));
        }

        let attribute = self.introspector.version_attribute(module)?;
        debug!(
            target: VERSIONS_TARGET,
            module,
            found = attribute.is_some(),
            "version attribute consulted"
        );
        Ok(attribute)
    }
}
