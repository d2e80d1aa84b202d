//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, status, errors, event envelope)
//! - `catalog` - Personas, stages and tracks supplied by collaborators
//! - `simulation` - Session engine: sequencing, evaluation, rewards, events

pub mod catalog;
pub mod foundation;
pub mod simulation;
