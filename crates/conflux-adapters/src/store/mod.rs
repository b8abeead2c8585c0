//! Object store adapters.

pub mod file;
pub mod memory;

pub use file::FileObjectStore;
pub use memory::InMemoryObjectStore;
