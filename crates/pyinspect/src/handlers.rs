//! The methods served to the host.
//!
//! | Method              | Params         | Result                          |
//! |---------------------|----------------|---------------------------------|
//! | `cancelRequest`     | any            | `null`                          |
//! | `moduleMemberNames` | `[moduleName]` | sorted names, or `null`         |
//! | `moduleVersion`     | `[moduleName]` | version string, or `null`       |
//! | `moduleExports`     | `[moduleName]` | `__all__` entries, or `null`    |
//!
//! A `null` result means the module could not be imported or does not carry
//! the requested fact. Collaborator failures surface as handler errors.

use std::sync::Arc;

use pyinspect_python::{ModuleIntrospector, VersionResolver};
use serde_json::Value;
use tracing::debug;

use crate::dispatch::{DISPATCH_TARGET, HandlerError, MethodHandler, MethodRegistry, Params, RegistryError};

/// Method name for [`CancelRequest`].
pub const CANCEL_REQUEST: &str = "cancelRequest";
/// Method name for [`ModuleMemberNames`].
pub const MODULE_MEMBER_NAMES: &str = "moduleMemberNames";
/// Method name for [`ModuleVersion`].
pub const MODULE_VERSION: &str = "moduleVersion";
/// Method name for [`ModuleExports`].
pub const MODULE_EXPORTS: &str = "moduleExports";

/// Accepts a cancellation notice. Requests are served one at a time and
/// answered before the next is read, so there is never anything to cancel.
#[derive(Debug, Default, Clone, Copy)]
pub struct CancelRequest;

impl MethodHandler for CancelRequest {
    fn call(&self, params: Params<'_>) -> Result<Value, HandlerError> {
        debug!(target: DISPATCH_TARGET, params = params.len(), "cancellation ignored");
        Ok(Value::Null)
    }
}

/// Lists the members of a module.
#[derive(Debug)]
pub struct ModuleMemberNames<I: ?Sized> {
    introspector: Arc<I>,
}

impl<I: ?Sized> ModuleMemberNames<I> {
    /// Creates the handler.
    #[must_use]
    pub const fn new(introspector: Arc<I>) -> Self {
        Self { introspector }
    }
}

impl<I> MethodHandler for ModuleMemberNames<I>
where
    I: ModuleIntrospector + ?Sized,
{
    fn call(&self, params: Params<'_>) -> Result<Value, HandlerError> {
        let module = params.single_string()?;
        let names = self
            .introspector
            .member_names(module)
            .map_err(HandlerError::failed)?;
        Ok(names.map_or(Value::Null, Value::from))
    }
}

/// Lists the names a module exports through `__all__`.
#[derive(Debug)]
pub struct ModuleExports<I: ?Sized> {
    introspector: Arc<I>,
}

impl<I: ?Sized> ModuleExports<I> {
    /// Creates the handler.
    #[must_use]
    pub const fn new(introspector: Arc<I>) -> Self {
        Self { introspector }
    }
}

impl<I> MethodHandler for ModuleExports<I>
where
    I: ModuleIntrospector + ?Sized,
{
    fn call(&self, params: Params<'_>) -> Result<Value, HandlerError> {
        let module = params.single_string()?;
        let exports = self
            .introspector
            .export_list(module)
            .map_err(HandlerError::failed)?;
        Ok(exports.map_or(Value::Null, Value::from))
    }
}

/// Reports the installed version of a module.
#[derive(Debug)]
pub struct ModuleVersion<V> {
    versions: V,
}

impl<V> ModuleVersion<V> {
    /// Creates the handler.
    #[must_use]
    pub const fn new(versions: V) -> Self {
        Self { versions }
    }
}

impl<V> MethodHandler for ModuleVersion<V>
where
    V: VersionResolver,
{
    fn call(&self, params: Params<'_>) -> Result<Value, HandlerError> {
        let module = params.single_string()?;
        let version = self.versions.resolve(module).map_err(HandlerError::failed)?;
        Ok(version.map_or(Value::Null, Value::from))
    }
}

/// Builds the registry of every served method.
///
/// # Errors
///
/// Returns [`RegistryError`] if two handlers claim the same name.
pub fn default_registry<I, V>(
    introspector: Arc<I>,
    versions: V,
) -> Result<MethodRegistry, RegistryError>
where
    I: ModuleIntrospector + ?Sized + 'static,
    V: VersionResolver + 'static,
{
    let mut registry = MethodRegistry::new();
    registry.register(CANCEL_REQUEST, CancelRequest)?;
    registry.register(
        MODULE_MEMBER_NAMES,
        ModuleMemberNames::new(Arc::clone(&introspector)),
    )?;
    registry.register(MODULE_EXPORTS, ModuleExports::new(introspector))?;
    registry.register(MODULE_VERSION, ModuleVersion::new(versions))?;
    Ok(registry)
}
