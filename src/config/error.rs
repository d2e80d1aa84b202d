//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ConfigValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("Time limit must be between 1 and {max} seconds, got {value}")]
    InvalidTimeLimit { value: u32, max: u32 },

    #[error("Tick interval must be between 1 and 60000 ms")]
    InvalidTickInterval,

    #[error("Generation timeout must be between 1 and 60000 ms")]
    InvalidGenerationTimeout,

    #[error("Grace delay must not exceed 10000 ms")]
    InvalidGraceDelay,

    #[error("Initial rapport must be between 0 and 100")]
    InvalidInitialRapport,

    #[error("Invalid log filter: {0}")]
    InvalidLogFilter(String),
}
