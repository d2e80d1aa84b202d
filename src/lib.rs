//! Sales Simulator - Turn-based sales conversation engine
//!
//! A player negotiates with a simulated client persona through an ordered
//! sequence of funnel stages. Each turn the player picks a response; the
//! engine updates rapport and score, advances the conversation and, when a
//! session ends, computes XP, coins and per-skill impact.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
