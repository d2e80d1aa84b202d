//! Event bus adapters.
//!
//! - `InMemoryEventBus` - Synchronous, in-process bus for testing and
//!   single-process embedding

mod in_memory;

pub use in_memory::InMemoryEventBus;
