//! Catalog domain module.
//!
//! Value types owned by external collaborators (persona catalog, stage and
//! track configuration) and consumed read-only by the simulation.

mod persona;
mod stage;
mod track;

pub use persona::{
    Channel, Difficulty, Persona, PersonaFilter, Personality, DEFAULT_INITIAL_RAPPORT,
    MAX_REWARD_MULTIPLIER, MIN_REWARD_MULTIPLIER,
};
pub use stage::{Stage, StageSelector};
pub use track::{SkillWeight, Track, DEFAULT_COINS_REWARD, DEFAULT_XP_REWARD};
