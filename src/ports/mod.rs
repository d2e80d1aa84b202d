//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the simulation and the outside world. Adapters implement these ports.
//!
//! ## Catalog Ports
//!
//! - `PersonaCatalog` - Lookup and filtering of client personas
//! - `StageSource` - Stage sets by selector (global, track, channel)
//! - `TrackSource` - Per-track time limit, rewards and related skills
//!
//! ## Session Ports
//!
//! - `OptionGenerator` - Asynchronous, fallible source of response menus
//! - `SessionResultSink` - Receives finished session results
//!
//! ## Event Ports
//!
//! - `EventPublisher` - Port for publishing domain events
//! - `EventSubscriber` - Port for subscribing to domain events
//! - `EventHandler` - Handler that processes incoming events

mod event_publisher;
mod event_subscriber;
mod option_generator;
mod persona_catalog;
mod result_sink;
mod stage_source;
mod track_source;

pub use event_publisher::EventPublisher;
pub use event_subscriber::{EventBus, EventHandler, EventSubscriber};
pub use option_generator::{GenerationError, OptionGenerator};
pub use persona_catalog::PersonaCatalog;
pub use result_sink::SessionResultSink;
pub use stage_source::StageSource;
pub use track_source::TrackSource;
