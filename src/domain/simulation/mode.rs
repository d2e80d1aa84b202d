//! Session modes and engine settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::catalog::{Channel, DEFAULT_INITIAL_RAPPORT};

/// Which variant of the engine a session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionMode {
    /// Full funnel negotiation; success means the sale closed.
    Standard,
    /// Channel-specific prospecting; success means a commitment was obtained.
    ColdOutreach { channel: Channel },
}

impl SessionMode {
    /// Human-readable name of the success outcome.
    pub fn outcome_label(&self) -> &'static str {
        match self {
            SessionMode::Standard => "sale closed",
            SessionMode::ColdOutreach { .. } => "commitment obtained",
        }
    }

    pub fn is_cold_outreach(&self) -> bool {
        matches!(self, SessionMode::ColdOutreach { .. })
    }
}

/// Tunables the state machine needs from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub standard_time_limit_secs: u32,
    pub cold_outreach_time_limit_secs: u32,
    /// Starting rapport for personas that do not define one.
    pub default_initial_rapport: u8,
    /// Pause between a rapport threshold being crossed and the session ending.
    pub grace_delay: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            standard_time_limit_secs: 300,
            cold_outreach_time_limit_secs: 180,
            default_initial_rapport: DEFAULT_INITIAL_RAPPORT,
            grace_delay: Duration::from_millis(1500),
        }
    }
}

impl SessionSettings {
    /// Time limit for a mode when the track does not set one.
    pub fn default_time_limit(&self, mode: SessionMode) -> u32 {
        match mode {
            SessionMode::Standard => self.standard_time_limit_secs,
            SessionMode::ColdOutreach { .. } => self.cold_outreach_time_limit_secs,
        }
    }
}
