//! Session result sink adapters.

mod in_memory;

pub use in_memory::InMemoryResultSink;
