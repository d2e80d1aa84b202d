//! Session timer configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ConfigValidationError;

/// Upper bound for any configured time limit (one hour).
const MAX_TIME_LIMIT_SECS: u32 = 3600;

/// Timer configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TimerConfig {
    /// Time limit for standard sessions when the track sets none
    #[serde(default = "default_standard_limit")]
    pub standard_time_limit_secs: u32,

    /// Time limit for cold-outreach sessions when the track sets none
    #[serde(default = "default_cold_outreach_limit")]
    pub cold_outreach_time_limit_secs: u32,

    /// Wall-clock length of one session second.
    ///
    /// 1000 in production; tests shrink it to run sessions quickly.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
}

impl TimerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        for value in [
            self.standard_time_limit_secs,
            self.cold_outreach_time_limit_secs,
        ] {
            if value == 0 || value > MAX_TIME_LIMIT_SECS {
                return Err(ConfigValidationError::InvalidTimeLimit {
                    value,
                    max: MAX_TIME_LIMIT_SECS,
                });
            }
        }
        if self.tick_interval_ms == 0 || self.tick_interval_ms > 60_000 {
            return Err(ConfigValidationError::InvalidTickInterval);
        }
        Ok(())
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            standard_time_limit_secs: default_standard_limit(),
            cold_outreach_time_limit_secs: default_cold_outreach_limit(),
            tick_interval_ms: default_tick_interval(),
        }
    }
}

fn default_standard_limit() -> u32 {
    300
}

fn default_cold_outreach_limit() -> u32 {
    180
}

fn default_tick_interval() -> u64 {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_defaults() {
        let config = TimerConfig::default();
        assert_eq!(config.standard_time_limit_secs, 300);
        assert_eq!(config.cold_outreach_time_limit_secs, 180);
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_time_limit_rejected() {
        let config = TimerConfig {
            cold_outreach_time_limit_secs: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::InvalidTimeLimit { value: 0, max: 3600 })
        );
    }

    #[test]
    fn test_zero_tick_interval_rejected() {
        let config = TimerConfig {
            tick_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::InvalidTickInterval)
        );
    }
}
