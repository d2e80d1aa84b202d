//! Catalog adapters for personas, stages and tracks.

mod in_memory;

pub use in_memory::InMemoryCatalog;
