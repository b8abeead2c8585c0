//! Infrastructure adapters for Conflux.
//!
//! This crate implements the ports defined in `conflux-core::application::ports`.
//! It contains all external dependencies and I/O operations.

pub mod builtin_templates;
pub mod engine;
pub mod script_loader;
pub mod store;
pub mod writer;

// Re-export commonly used adapters
pub use engine::MiniJinjaEngine;
pub use script_loader::{ScriptFile, ScriptLoader};
pub use store::{FileObjectStore, InMemoryObjectStore};
pub use writer::NacosWriter;
