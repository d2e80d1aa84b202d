//! Engine configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables use the `SALES_SIM` prefix and
//! nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use sales_simulator::config::EngineConfig;
//!
//! let config = EngineConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Generation timeout: {:?}", config.generation.timeout());
//! ```

mod error;
mod generation;
mod logging;
mod rewards;
mod session;
mod timer;

pub use error::{ConfigError, ConfigValidationError};
pub use generation::GenerationConfig;
pub use logging::LoggingConfig;
pub use rewards::RewardsConfig;
pub use session::SessionConfig;
pub use timer::TimerConfig;

use serde::Deserialize;

use crate::domain::simulation::SessionSettings;

/// Root engine configuration
///
/// Every section has defaults, so an empty environment yields a working
/// configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    /// Time limits and tick interval
    #[serde(default)]
    pub timer: TimerConfig,

    /// Option generation (enabled, timeout)
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Grace delay, default rapport, scenario seed
    #[serde(default)]
    pub session: SessionConfig,

    /// Rewards for tracks without configuration
    #[serde(default)]
    pub rewards: RewardsConfig,

    /// Log filter and format
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `SALES_SIM` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `SALES_SIM__TIMER__TICK_INTERVAL_MS=1000` -> `timer.tick_interval_ms = 1000`
    /// - `SALES_SIM__GENERATION__ENABLED=false` -> `generation.enabled = false`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("SALES_SIM")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ConfigValidationError` for the first invalid section.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.timer.validate()?;
        self.generation.validate()?;
        self.session.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// The subset of configuration the session state machine reads.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            standard_time_limit_secs: self.timer.standard_time_limit_secs,
            cold_outreach_time_limit_secs: self.timer.cold_outreach_time_limit_secs,
            default_initial_rapport: self.session.default_initial_rapport,
            grace_delay: self.session.grace_delay(),
        }
    }
}
