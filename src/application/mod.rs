//! Application layer - Orchestrates sessions against the ports.
//!
//! - `SimulationRunner` - Resolves inputs and starts sessions
//! - `SessionHandle` - Drives one running session (timer, options, turns)
//! - `resolve_stages` - Fetches and sequences a session's stages

mod errors;
mod simulation_runner;
mod stages;

pub use errors::RunnerError;
pub use simulation_runner::{SessionHandle, SimulationRunner, StartSession};
pub use stages::resolve_stages;
