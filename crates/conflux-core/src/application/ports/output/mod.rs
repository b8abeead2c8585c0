//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `conflux-adapters` crate provides implementations.

use async_trait::async_trait;

use crate::application::error::{StoreError, WriterError};
use crate::domain::{
    DomainError, ExpandedWriterData, LabelSelector, ObjectKind, PropertyMap, PropertyValue,
    RenderContext, StoredObject, TemplateScript,
};
use crate::error::ConfluxResult;

/// Port for the persisted object store.
///
/// Implemented by:
/// - `conflux_adapters::store::InMemoryObjectStore` (tests, embedding)
/// - `conflux_adapters::store::FileObjectStore` (one JSON file per object)
///
/// ## Design Notes
///
/// - `apply` is an upsert: the create time is stamped on first creation and
///   preserved afterwards
/// - `list` returns an empty vector, never an error, when nothing matches
/// - Adapters do not enforce timeouts; the factory wraps every call
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch one object.
    async fn get(
        &self,
        kind: ObjectKind,
        namespace: &str,
        name: &str,
    ) -> Result<StoredObject, StoreError>;

    /// List the objects of a namespace whose labels match the selector.
    async fn list(
        &self,
        kind: ObjectKind,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<StoredObject>, StoreError>;

    /// Create or replace an object, returning it as stored.
    async fn apply(&self, object: StoredObject) -> Result<StoredObject, StoreError>;

    /// Delete one object.
    async fn delete(&self, kind: ObjectKind, namespace: &str, name: &str)
    -> Result<(), StoreError>;
}

/// Port for evaluating template scripts.
///
/// Implemented by:
/// - `conflux_adapters::engine::MiniJinjaEngine`
pub trait ScriptEngine: Send + Sync {
    /// Check the script syntax and return its raw (unrendered) document.
    fn parse(&self, script: &TemplateScript) -> Result<PropertyMap, DomainError>;

    /// Render the value found at `path` with the given variables.
    ///
    /// Returns `Ok(None)` when the script has nothing at `path`.
    fn render(
        &self,
        script: &TemplateScript,
        context: &RenderContext,
        parameter: &PropertyMap,
        path: &[&str],
    ) -> Result<Option<PropertyValue>, DomainError>;
}

/// Read access to integrations, handed to sink writers to resolve endpoints.
///
/// Unlike the public read path this access is not gated by the sensitive
/// flag: endpoint credentials usually live in sensitive integrations.
#[async_trait]
pub trait IntegrationReader: Send + Sync {
    /// Namespace of system-scoped integrations such as sink endpoints.
    fn system_namespace(&self) -> &str;

    /// The stored input properties of an integration.
    async fn resolve_integration(&self, namespace: &str, name: &str)
    -> ConfluxResult<PropertyMap>;
}

/// Port for delivering rendered payloads to an external configuration store.
///
/// Implemented by:
/// - `conflux_adapters::writer::NacosWriter`
#[async_trait]
pub trait SinkWriter: Send + Sync {
    /// The `[template.<kind>]` table this writer handles.
    fn kind(&self) -> &'static str;

    /// Deliver one payload.
    async fn write(
        &self,
        payload: &ExpandedWriterData,
        reader: &dyn IntegrationReader,
    ) -> Result<(), WriterError>;
}
