//! Application layer for Conflux.
//!
//! This layer contains:
//! - **Services**: Use case orchestration (IntegrationFactory, WriterRegistry)
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Application-specific error types
//!
//! The application layer coordinates the domain layer. Validation, schema
//! and encoding rules live in `crate::domain`.

pub mod error;
pub mod ports;
pub mod services;

// Re-export main services
pub use services::{
    guarded_write, FactoryConfig, IntegrationFactory, WriterRegistry, DEFAULT_SYSTEM_NAMESPACE,
};

// Re-export port traits (for adapter implementation)
pub use ports::{IntegrationReader, ObjectStore, ScriptEngine, SinkWriter};

pub use error::{ApplicationError, StoreError, WriterError};
