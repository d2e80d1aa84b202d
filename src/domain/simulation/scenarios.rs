//! Scripted scenario table.
//!
//! Static fallback content keyed by `(personality, stage_key)`, parsed once
//! from the bundled YAML table. Randomness in the engine is confined to
//! [`ScenarioTable::pick`], which chooses among variants.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::errors::SimulationError;
use super::evaluator::ResponseEvaluator;
use super::option::ResponseOption;
use crate::domain::catalog::{Personality, Stage};

const BUNDLED_SCENARIOS: &str = include_str!("scenarios.yaml");

/// A client line and the menu the player answers it with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub client_message: String,
    #[serde(default)]
    pub options: Vec<ResponseOption>,
}

/// One scripted way a stage can play out.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScenarioVariant {
    #[serde(default)]
    pub exchanges: Vec<Exchange>,
}

/// Scripted exchanges for one stage of a running session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StageScript {
    pub stage_key: String,
    pub exchanges: Vec<Exchange>,
}

impl StageScript {
    pub fn new(stage_key: impl Into<String>, exchanges: Vec<Exchange>) -> Self {
        Self {
            stage_key: stage_key.into(),
            exchanges,
        }
    }

    pub fn exchange(&self, index: usize) -> Option<&Exchange> {
        self.exchanges.get(index)
    }
}

/// Fallback scenario content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioTable {
    /// Used for stage keys the table knows nothing about.
    #[serde(default)]
    generic: Vec<ScenarioVariant>,
    /// Per-stage content shared by all personalities.
    #[serde(default)]
    stages: HashMap<String, Vec<ScenarioVariant>>,
    /// Personality-specific overrides.
    #[serde(default)]
    personalities: HashMap<Personality, HashMap<String, Vec<ScenarioVariant>>>,
}

static DEFAULT_TABLE: Lazy<ScenarioTable> = Lazy::new(|| {
    ScenarioTable::from_yaml(BUNDLED_SCENARIOS).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Bundled scenario table is invalid, using empty table");
        ScenarioTable::default()
    })
});

impl ScenarioTable {
    /// The bundled table, parsed on first use.
    pub fn bundled() -> &'static ScenarioTable {
        &DEFAULT_TABLE
    }

    /// Parses a table and normalizes every option in it.
    ///
    /// # Errors
    ///
    /// `Configuration` if the YAML does not describe a table.
    pub fn from_yaml(source: &str) -> Result<Self, SimulationError> {
        let mut table: ScenarioTable = serde_yaml::from_str(source)
            .map_err(|e| SimulationError::configuration(format!("scenario table: {}", e)))?;
        table.normalize();
        Ok(table)
    }

    fn normalize(&mut self) {
        let variants = self
            .generic
            .iter_mut()
            .chain(self.stages.values_mut().flatten())
            .chain(
                self.personalities
                    .values_mut()
                    .flat_map(|by_stage| by_stage.values_mut())
                    .flatten(),
            );
        for variant in variants {
            for exchange in &mut variant.exchanges {
                let options = std::mem::take(&mut exchange.options);
                exchange.options = options.into_iter().map(ResponseEvaluator::normalize).collect();
            }
        }
    }

    /// Candidate variants for a stage: personality overrides first, then
    /// stage defaults, then the generic script.
    pub fn variants(&self, personality: Personality, stage_key: &str) -> &[ScenarioVariant] {
        let personal = self
            .personalities
            .get(&personality)
            .and_then(|by_stage| by_stage.get(stage_key))
            .filter(|variants| !variants.is_empty());
        let shared = self
            .stages
            .get(stage_key)
            .filter(|variants| !variants.is_empty());

        personal.or(shared).map_or(self.generic.as_slice(), Vec::as_slice)
    }

    /// Chooses one variant for a stage.
    pub fn pick<R: Rng + ?Sized>(
        &self,
        personality: Personality,
        stage_key: &str,
        rng: &mut R,
    ) -> Option<&ScenarioVariant> {
        self.variants(personality, stage_key).choose(rng)
    }

    /// Builds the scripts for every stage of a session, in stage order.
    pub fn scripts_for<R: Rng + ?Sized>(
        &self,
        personality: Personality,
        stages: &[Stage],
        rng: &mut R,
    ) -> Vec<StageScript> {
        stages
            .iter()
            .map(|stage| {
                let exchanges = self
                    .pick(personality, &stage.key, rng)
                    .map(|variant| variant.exchanges.clone())
                    .unwrap_or_default();
                StageScript::new(stage.key.clone(), exchanges)
            })
            .collect()
    }
}
