//! In-memory catalog of personas, stages and tracks.
//!
//! Implements the three read ports over data held in memory. The bundled
//! default content covers the standard funnel, cold-outreach stage sets for
//! every channel, one persona per personality and a few tracks.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

use crate::domain::catalog::{Channel, Persona, PersonaFilter, Stage, StageSelector, Track};
use crate::domain::foundation::{DomainError, ErrorCode, PersonaId};
use crate::ports::{PersonaCatalog, StageSource, TrackSource};

const DEFAULT_CATALOG: &str = include_str!("default_catalog.yaml");

#[derive(Debug, Default, Deserialize)]
struct StageSets {
    #[serde(default)]
    global: Vec<Stage>,
    #[serde(default)]
    tracks: HashMap<String, Vec<Stage>>,
    #[serde(default)]
    channels: HashMap<Channel, Vec<Stage>>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogData {
    #[serde(default)]
    stages: StageSets,
    #[serde(default)]
    personas: Vec<Persona>,
    #[serde(default)]
    tracks: Vec<Track>,
}

/// Catalog adapter backed by plain collections.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    personas: Vec<Persona>,
    global_stages: Vec<Stage>,
    track_stages: HashMap<String, Vec<Stage>>,
    channel_stages: HashMap<Channel, Vec<Stage>>,
    tracks: HashMap<String, Track>,
}

impl InMemoryCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The bundled default content.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` if the bundled data fails validation.
    pub fn with_defaults() -> Result<Self, DomainError> {
        Self::from_yaml(DEFAULT_CATALOG)
    }

    /// Parses and validates catalog content.
    pub fn from_yaml(source: &str) -> Result<Self, DomainError> {
        let data: CatalogData = serde_yaml::from_str(source).map_err(|e| {
            DomainError::new(ErrorCode::InvalidConfiguration, format!("catalog: {}", e))
        })?;

        let mut catalog = Self::new();
        for persona in data.personas {
            catalog = catalog.with_persona(persona)?;
        }
        for track in data.tracks {
            catalog = catalog.with_track(track)?;
        }
        catalog = catalog.with_stages(StageSelector::Global, data.stages.global)?;
        for (key, stages) in data.stages.tracks {
            catalog = catalog.with_stages(StageSelector::Track(key), stages)?;
        }
        for (channel, stages) in data.stages.channels {
            catalog = catalog.with_stages(StageSelector::Channel(channel), stages)?;
        }

        tracing::debug!(
            personas = catalog.personas.len(),
            tracks = catalog.tracks.len(),
            "Catalog loaded"
        );
        Ok(catalog)
    }

    /// Adds a persona, replacing one with the same id.
    pub fn with_persona(mut self, persona: Persona) -> Result<Self, DomainError> {
        persona.validate()?;
        self.personas.retain(|p| p.id != persona.id);
        self.personas.push(persona);
        Ok(self)
    }

    pub fn with_track(mut self, track: Track) -> Result<Self, DomainError> {
        track.validate()?;
        self.tracks.insert(track.key.clone(), track);
        Ok(self)
    }

    /// Sets the stage set for a selector.
    pub fn with_stages(
        mut self,
        selector: StageSelector,
        stages: Vec<Stage>,
    ) -> Result<Self, DomainError> {
        for stage in &stages {
            stage.validate()?;
        }
        match selector {
            StageSelector::Global => self.global_stages = stages,
            StageSelector::Track(key) => {
                self.track_stages.insert(key, stages);
            }
            StageSelector::Channel(channel) => {
                self.channel_stages.insert(channel, stages);
            }
        }
        Ok(self)
    }
}

#[async_trait]
impl PersonaCatalog for InMemoryCatalog {
    async fn get_personas(&self, filter: &PersonaFilter) -> Result<Vec<Persona>, DomainError> {
        Ok(self
            .personas
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    async fn get_persona(&self, id: &PersonaId) -> Result<Persona, DomainError> {
        self.personas
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| {
                DomainError::new(ErrorCode::PersonaNotFound, format!("persona {} not found", id))
            })
    }
}

#[async_trait]
impl StageSource for InMemoryCatalog {
    async fn get_stages(&self, selector: &StageSelector) -> Result<Vec<Stage>, DomainError> {
        let stages = match selector {
            StageSelector::Global => Some(&self.global_stages),
            StageSelector::Track(key) => self.track_stages.get(key),
            StageSelector::Channel(channel) => self.channel_stages.get(channel),
        };
        Ok(stages.cloned().unwrap_or_default())
    }
}

#[async_trait]
impl TrackSource for InMemoryCatalog {
    async fn get_track_config(&self, track_key: &str) -> Result<Track, DomainError> {
        self.tracks.get(track_key).cloned().ok_or_else(|| {
            DomainError::new(
                ErrorCode::TrackNotFound,
                format!("track {} not found", track_key),
            )
        })
    }
}
