//! Session behaviour configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ConfigValidationError;
use crate::domain::catalog::DEFAULT_INITIAL_RAPPORT;

/// Session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Pause between a rapport threshold being crossed and the results screen
    #[serde(default = "default_grace_delay_ms")]
    pub grace_delay_ms: u64,

    /// Starting rapport for personas that do not define one
    #[serde(default = "default_initial_rapport")]
    pub default_initial_rapport: u8,

    /// Seed for scenario variant selection; unset means random per session
    #[serde(default)]
    pub scenario_seed: Option<u64>,
}

impl SessionConfig {
    pub fn grace_delay(&self) -> Duration {
        Duration::from_millis(self.grace_delay_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.grace_delay_ms > 10_000 {
            return Err(ConfigValidationError::InvalidGraceDelay);
        }
        if self.default_initial_rapport > 100 {
            return Err(ConfigValidationError::InvalidInitialRapport);
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            grace_delay_ms: default_grace_delay_ms(),
            default_initial_rapport: default_initial_rapport(),
            scenario_seed: None,
        }
    }
}

fn default_grace_delay_ms() -> u64 {
    1500
}

fn default_initial_rapport() -> u8 {
    DEFAULT_INITIAL_RAPPORT
}
