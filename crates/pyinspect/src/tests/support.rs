//! Shared doubles and frame helpers for request loop tests.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use mockall::mock;
use pyinspect_python::{
    IntrospectionError, MetadataError, ModuleIntrospector, VersionError, VersionResolver,
};
use serde_json::Value;

use crate::handlers::default_registry;
use crate::{Dispatcher, ServeError, ServeSummary, Server, StdioTransport};

mock! {
    pub Introspector {}
    impl ModuleIntrospector for Introspector {
        fn member_names(&self, module: &str) -> Result<Option<Vec<String>>, IntrospectionError>;
        fn export_list(&self, module: &str) -> Result<Option<Vec<String>>, IntrospectionError>;
        fn version_attribute(&self, module: &str) -> Result<Option<String>, IntrospectionError>;
    }
}

/// Version resolver answering from a fixed table.
#[derive(Debug, Default)]
pub struct FixedVersions {
    versions: HashMap<String, String>,
}

impl FixedVersions {
    pub fn with(mut self, module: &str, version: &str) -> Self {
        self.versions.insert(module.to_owned(), version.to_owned());
        self
    }
}

impl VersionResolver for FixedVersions {
    fn resolve(&self, module: &str) -> Result<Option<String>, VersionError> {
        Ok(self.versions.get(module).cloned())
    }
}

/// Version resolver whose index can never be built.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrokenVersions;

impl VersionResolver for BrokenVersions {
    fn resolve(&self, _module: &str) -> Result<Option<String>, VersionError> {
        Err(VersionError::Metadata(MetadataError::InvalidSearchPaths {
            message: String::from("sys.path was not a list"),
        }))
    }
}

/// Introspector that knows nothing about any module.
pub fn empty_introspector() -> MockIntrospector {
    let mut introspector = MockIntrospector::new();
    introspector.expect_member_names().returning(|_| Ok(None));
    introspector.expect_export_list().returning(|_| Ok(None));
    introspector.expect_version_attribute().returning(|_| Ok(None));
    introspector
}

pub fn dispatcher_with<V>(introspector: MockIntrospector, versions: V) -> Dispatcher
where
    V: VersionResolver + 'static,
{
    let registry = default_registry(Arc::new(introspector), versions).expect("default registry");
    Dispatcher::new(registry)
}

/// Frames `body` with a `Content-Length` header.
pub fn frame(body: &str) -> Vec<u8> {
    format!("Content-Length: {}\r\n\r\n{body}", body.len()).into_bytes()
}

pub fn request_frame(request: &Value) -> Vec<u8> {
    frame(&request.to_string())
}

/// Splits written output back into response values.
pub fn responses(output: Vec<u8>) -> Vec<Value> {
    let mut transport = StdioTransport::new(Cursor::new(output), Vec::new());
    let mut values = Vec::new();
    while let Some(body) = transport.receive().expect("well-formed response frames") {
        values.push(serde_json::from_slice(&body).expect("response JSON"));
    }
    values
}

/// Runs a server over `input` to completion.
pub fn serve(
    dispatcher: Dispatcher,
    input: Vec<u8>,
) -> (Result<ServeSummary, ServeError>, Vec<Value>) {
    let transport = StdioTransport::new(Cursor::new(input), Vec::new());
    let mut server = Server::new(transport, dispatcher);
    let outcome = server.serve();
    let (_, output) = server.into_transport().into_parts();
    (outcome, responses(output))
}
