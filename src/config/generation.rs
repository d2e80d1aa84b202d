//! Option generation configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ConfigValidationError;

/// Option generation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// Ask the generator at all; when false every menu comes from the
    /// scripted table
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Time budget for one generation call
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.timeout_ms == 0 || self.timeout_ms > 60_000 {
            return Err(ConfigValidationError::InvalidGenerationTimeout);
        }
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    8000
}
