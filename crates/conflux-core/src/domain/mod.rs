// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for Conflux.
//!
//! This module contains the pure model of templates and integrations. Script
//! evaluation, storage and delivery to sinks are handled via ports (traits)
//! defined in the application layer.
//!
//! ## Hexagonal Architecture Compliance
//!
//! - **No async**: Domain logic is synchronous
//! - **No I/O**: No filesystem, network, or external calls
//! - **Serialization only**: serde formats are the domain's encoders
//! - **Value types**: All domain objects are Clone + PartialEq
//!
pub mod encoding;
pub mod error;
pub mod integration;
pub mod object;
pub mod schema;
pub mod template;
pub mod value;

pub use encoding::{encode, flatten, Format};
pub use error::DomainError;
pub use integration::{
    decode_properties, encode_properties, ExpandedWriterData, Integration, IntegrationRequest,
    PrimaryOutput, RenderContext, Validation,
};
pub use object::{keys, LabelSelector, ObjectKind, StoredObject};
pub use schema::{Schema, SchemaType};
pub use template::{ExpandedWriterConfig, Scope, SinkConfig, Template, TemplateScript};
pub use value::{PropertyMap, PropertyValue, ValueKind};
