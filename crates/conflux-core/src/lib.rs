//! Conflux Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers of the Conflux
//! configuration engine: typed templates are parsed from scripts, bound to
//! caller properties as integrations, persisted, and fanned out to external
//! configuration stores through sink writers.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           conflux-cli (CLI)             │
//! │     (Implements Driving Ports)          │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │ (IntegrationFactory, WriterRegistry)    │
//! │         Orchestrates Use Cases          │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │ (ObjectStore, ScriptEngine, SinkWriter) │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │    conflux-adapters (Infrastructure)    │
//! │ (FileObjectStore, MiniJinjaEngine, ...) │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │ (Template, Integration, Schema, Format) │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use conflux_core::prelude::*;
//!
//! let factory = IntegrationFactory::new(store, engine, writers);
//!
//! let template = factory.parse_template("", script.as_bytes())?;
//! factory.apply_template("default", &template).await?;
//!
//! let request = IntegrationRequest::new("cache-1", "default")
//!     .template(&template.name, "default")
//!     .property("host", "10.0.0.1")
//!     .property("port", 6379);
//! let integration = factory.parse_integration(request).await?;
//! factory.apply_integration(&integration, "default").await?;
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        FactoryConfig, IntegrationFactory, WriterRegistry,
        ports::{IntegrationReader, ObjectStore, ScriptEngine, SinkWriter},
    };
    pub use crate::domain::{
        Format, Integration, IntegrationRequest, LabelSelector, ObjectKind, PropertyMap,
        PropertyValue, RenderContext, Scope, StoredObject, Template,
    };
    pub use crate::error::{ConfluxError, ConfluxResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
