//! SessionResultSink port - Hand-off of finished sessions.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::simulation::SessionResult;

/// Port receiving finished session results for persistence and reward
/// granting.
///
/// The engine never waits on this call before entering `results`;
/// failures are logged and dropped.
#[async_trait]
pub trait SessionResultSink: Send + Sync {
    async fn persist(&self, result: SessionResult) -> Result<(), DomainError>;
}
