//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the simulation to its collaborators:
//! - `catalog` - Persona, stage and track sources
//! - `events` - Event bus implementations
//! - `options` - Response option generators
//! - `sink` - Session result sinks

pub mod catalog;
pub mod events;
pub mod options;
pub mod sink;

pub use catalog::InMemoryCatalog;
pub use events::InMemoryEventBus;
pub use options::{MockOptionGenerator, ScriptedOptionGenerator};
pub use sink::InMemoryResultSink;
