//! OptionGenerator port - Asynchronous source of response menus.
//!
//! Generation may be network-bound, slow or unavailable. Callers bound it
//! with a timeout and fall back to the scripted scenario table on any
//! error, so implementations never need to retry internally.

use async_trait::async_trait;

use crate::domain::catalog::{Persona, Stage};
use crate::domain::simulation::{Message, ResponseOption};

/// Port for generating the options a player chooses from.
#[async_trait]
pub trait OptionGenerator: Send + Sync {
    /// Generates candidate options for the next turn.
    ///
    /// `history` is the session's message log so far, oldest first.
    async fn generate_response_options(
        &self,
        persona: &Persona,
        stage: &Stage,
        history: &[Message],
    ) -> Result<Vec<ResponseOption>, GenerationError>;

    /// Name used in logs.
    fn name(&self) -> &'static str;
}

/// Option generation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    /// The generation service is disabled or unreachable.
    #[error("generator unavailable: {message}")]
    Unavailable { message: String },

    /// Rate limited by the service.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    /// The call exceeded its time budget.
    #[error("generation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The service answered with something that is not a menu.
    #[error("parse error: {0}")]
    Parse(String),
}

impl GenerationError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Short label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::Unavailable { .. } => "unavailable",
            GenerationError::RateLimited { .. } => "rate_limited",
            GenerationError::Timeout { .. } => "timeout",
            GenerationError::Parse(_) => "parse",
        }
    }
}
