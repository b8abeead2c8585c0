//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `conflux-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `ObjectStore`: Persisted, labeled objects
//!   - `ScriptEngine`: Template script evaluation
//!   - `SinkWriter`: Delivery to external configuration stores
//!
//! - **Callback Ports**: Implemented by application, handed to adapters
//!   - `IntegrationReader`: Endpoint lookups for sink writers

pub mod output;

#[cfg(test)]
pub use output::MockObjectStore;
pub use output::{IntegrationReader, ObjectStore, ScriptEngine, SinkWriter};
