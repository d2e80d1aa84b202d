//! Response option generator adapters.
//!
//! - `ScriptedOptionGenerator` - Serves the bundled scenario table
//! - `MockOptionGenerator` - Configurable generator for tests

mod mock_generator;
mod scripted_generator;

pub use mock_generator::{GenerationCall, MockOptionGenerator, MockReply};
pub use scripted_generator::ScriptedOptionGenerator;
