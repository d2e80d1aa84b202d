//! Simulation-specific error types.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, SessionStatus, ValidationError};

/// Errors raised by the simulation engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// Stage or track data cannot support a session. Fatal to start.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A transition was attempted in the wrong state. Callers ignore and log it.
    #[error("Invalid state: {message} (status: {status})")]
    InvalidState {
        status: SessionStatus,
        message: String,
    },

    /// `start` was called on a session that already started.
    #[error("Session already started")]
    AlreadyStarted,

    /// The option source could not produce a menu.
    #[error("Option generation failed: {0}")]
    Generation(String),

    /// Input data violates a value-object invariant.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl SimulationError {
    pub fn configuration(message: impl Into<String>) -> Self {
        SimulationError::Configuration(message.into())
    }

    pub fn invalid_state(status: SessionStatus, message: impl Into<String>) -> Self {
        SimulationError::InvalidState {
            status,
            message: message.into(),
        }
    }

    pub fn generation(message: impl Into<String>) -> Self {
        SimulationError::Generation(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            SimulationError::Configuration(_) => ErrorCode::InvalidConfiguration,
            SimulationError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            SimulationError::AlreadyStarted => ErrorCode::SessionAlreadyStarted,
            SimulationError::Generation(_) => ErrorCode::GenerationFailed,
            SimulationError::Validation(err) => ErrorCode::from(err),
        }
    }

    /// Returns true for errors the engine recovers from locally.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SimulationError::InvalidState { .. } | SimulationError::Generation(_)
        )
    }
}

impl From<SimulationError> for DomainError {
    fn from(err: SimulationError) -> Self {
        DomainError::new(err.code(), err.to_string())
    }
}
