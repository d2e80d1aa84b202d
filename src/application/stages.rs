//! Stage resolution against the `StageSource` port.

use crate::domain::catalog::Stage;
use crate::domain::simulation::{StagePlan, StageSequencer};
use crate::ports::StageSource;

use super::errors::RunnerError;

/// Fetches the stage sets a plan names and merges them into play order.
///
/// # Errors
///
/// - `Collaborator` if the source fails
/// - `Simulation(Configuration)` if the merged sequence is empty or malformed
pub async fn resolve_stages(
    source: &dyn StageSource,
    plan: &StagePlan,
) -> Result<Vec<Stage>, RunnerError> {
    let global = match &plan.global {
        Some(selector) => source.get_stages(selector).await?,
        None => Vec::new(),
    };
    let specific = source.get_stages(&plan.specific).await?;

    tracing::debug!(
        global = global.len(),
        specific = specific.len(),
        "Resolving stage sequence"
    );

    Ok(StageSequencer::sequence(global, specific)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryCatalog;
    use crate::domain::catalog::{Channel, StageSelector};
    use crate::domain::foundation::ErrorCode;
    use crate::domain::simulation::SessionMode;

    #[tokio::test]
    async fn standard_plan_merges_track_stages_into_funnel() {
        let catalog = InMemoryCatalog::with_defaults().unwrap();
        let plan = StageSequencer::plan(SessionMode::Standard, "saas");
        let stages = resolve_stages(&catalog, &plan).await.unwrap();

        let keys: Vec<_> = stages.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "opening",
                "discovery",
                "presentation",
                "demo",
                "objection_handling",
                "closing"
            ]
        );
    }

    #[tokio::test]
    async fn cold_outreach_uses_channel_stages_only() {
        let catalog = InMemoryCatalog::with_defaults().unwrap();
        let plan = StageSequencer::plan(
            SessionMode::ColdOutreach {
                channel: Channel::Email,
            },
            "cold_outreach",
        );
        let stages = resolve_stages(&catalog, &plan).await.unwrap();
        let keys: Vec<_> = stages.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["approach", "value_hook", "commitment_ask"]);
    }

    #[tokio::test]
    async fn empty_sources_are_a_configuration_error() {
        let catalog = InMemoryCatalog::new();
        let plan = StageSequencer::plan(SessionMode::Standard, "saas");
        let err = resolve_stages(&catalog, &plan).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidConfiguration);

        assert!(catalog
            .get_stages(&StageSelector::Global)
            .await
            .unwrap()
            .is_empty());
    }
}
