//! Stage Sequencer - orders the funnel stages of a session.

use std::collections::HashSet;

use super::errors::SimulationError;
use super::mode::SessionMode;
use crate::domain::catalog::{Stage, StageSelector};

/// Which stage sets a session draws from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePlan {
    /// Shared stages merged in first, if any.
    pub global: Option<StageSelector>,
    /// Track or channel specific stages.
    pub specific: StageSelector,
}

/// Merges and orders stage sets.
pub struct StageSequencer;

impl StageSequencer {
    /// Stage sets to fetch for a session.
    ///
    /// Standard sessions merge the global funnel with the track's own stages.
    /// Cold outreach replaces the funnel with the channel's stage set.
    pub fn plan(mode: SessionMode, track_key: &str) -> StagePlan {
        match mode {
            SessionMode::Standard => StagePlan {
                global: Some(StageSelector::Global),
                specific: StageSelector::Track(track_key.to_string()),
            },
            SessionMode::ColdOutreach { channel } => StagePlan {
                global: None,
                specific: StageSelector::Channel(channel),
            },
        }
    }

    /// Merges `global` and `specific` into the session's stage list.
    ///
    /// Stages are deduplicated by key (first occurrence wins, globals first)
    /// and stable-sorted by order index, so ties keep insertion order.
    ///
    /// # Errors
    ///
    /// `Configuration` if a stage is malformed or the merged list is empty.
    pub fn sequence(global: Vec<Stage>, specific: Vec<Stage>) -> Result<Vec<Stage>, SimulationError> {
        let mut seen = HashSet::new();
        let mut stages = Vec::with_capacity(global.len() + specific.len());

        for stage in global.into_iter().chain(specific) {
            stage
                .validate()
                .map_err(|e| SimulationError::configuration(format!("invalid stage: {}", e)))?;
            if seen.insert(stage.key.clone()) {
                stages.push(stage);
            } else {
                tracing::debug!(stage = %stage.key, "Duplicate stage key dropped");
            }
        }

        if stages.is_empty() {
            return Err(SimulationError::configuration(
                "a session needs at least one stage",
            ));
        }

        stages.sort_by_key(|stage| stage.order_index);
        Ok(stages)
    }
}
