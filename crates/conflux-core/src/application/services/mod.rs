pub mod integration_factory;
pub mod writer;

pub use integration_factory::{FactoryConfig, IntegrationFactory, DEFAULT_SYSTEM_NAMESPACE};
pub use writer::{guarded_write, WriterRegistry};
