//! TrackSource port - Reward configuration per track.

use async_trait::async_trait;

use crate::domain::catalog::Track;
use crate::domain::foundation::DomainError;

/// Port for fetching track reward configuration.
#[async_trait]
pub trait TrackSource: Send + Sync {
    /// # Errors
    ///
    /// `TrackNotFound` if the key is unknown.
    async fn get_track_config(&self, track_key: &str) -> Result<Track, DomainError>;
}
