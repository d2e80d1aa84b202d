//! Errors surfaced by the application layer.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::simulation::SimulationError;

/// Failure of a runner operation.
#[derive(Debug, Clone, Error)]
pub enum RunnerError {
    /// The session state machine refused the operation.
    #[error(transparent)]
    Simulation(#[from] SimulationError),

    /// A collaborator port (catalog, stage or track source) failed.
    #[error(transparent)]
    Collaborator(#[from] DomainError),
}

impl RunnerError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RunnerError::Simulation(e) => e.code(),
            RunnerError::Collaborator(e) => e.code,
        }
    }

    /// True for rejections that leave the session untouched.
    pub fn is_invalid_state(&self) -> bool {
        matches!(
            self,
            RunnerError::Simulation(SimulationError::InvalidState { .. })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SessionStatus;

    #[test]
    fn codes_follow_the_wrapped_error() {
        let err: RunnerError = DomainError::new(ErrorCode::TrackNotFound, "nope").into();
        assert_eq!(err.code(), ErrorCode::TrackNotFound);

        let err: RunnerError = SimulationError::configuration("no stages").into();
        assert_eq!(err.code(), ErrorCode::InvalidConfiguration);
    }

    #[test]
    fn invalid_state_is_detected() {
        let err: RunnerError =
            SimulationError::invalid_state(SessionStatus::Results, "finished").into();
        assert!(err.is_invalid_state());
        assert!(!RunnerError::from(SimulationError::AlreadyStarted).is_invalid_state());
    }
}
