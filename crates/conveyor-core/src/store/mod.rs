//! Store implementations.

mod memory;

pub use memory::InMemoryTaskStore;
