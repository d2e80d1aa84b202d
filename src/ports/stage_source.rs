//! StageSource port - Funnel stage configuration.

use async_trait::async_trait;

use crate::domain::catalog::{Stage, StageSelector};
use crate::domain::foundation::DomainError;

/// Port for fetching stage sets.
///
/// An unknown track or channel yields an empty list, not an error; the
/// sequencer decides whether the merged result is usable.
#[async_trait]
pub trait StageSource: Send + Sync {
    async fn get_stages(&self, selector: &StageSelector) -> Result<Vec<Stage>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn StageSource) {}
}
