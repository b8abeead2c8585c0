//! Sink writer adapters.

pub mod nacos;

pub use nacos::{NacosEndpoint, NacosWriter};
