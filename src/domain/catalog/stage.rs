//! Funnel stages.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Channel;
use crate::domain::foundation::ValidationError;

/// A named phase of the sales funnel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub key: String,
    pub label: String,
    pub order_index: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Stage {
    /// Creates a stage.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if key or label is blank
    /// - `InvalidFormat` if key contains whitespace
    pub fn new(
        key: impl Into<String>,
        label: impl Into<String>,
        order_index: i32,
    ) -> Result<Self, ValidationError> {
        let stage = Self {
            key: key.into(),
            label: label.into(),
            order_index,
            icon: None,
        };
        stage.validate()?;
        Ok(stage)
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Checks key and label of a stage deserialized from a source.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.key.trim().is_empty() {
            return Err(ValidationError::empty_field("stage.key"));
        }
        if self.key.chars().any(char::is_whitespace) {
            return Err(ValidationError::invalid_format(
                "stage.key",
                "must not contain whitespace",
            ));
        }
        if self.label.trim().is_empty() {
            return Err(ValidationError::empty_field("stage.label"));
        }
        Ok(())
    }
}

/// Selects which stage set a stage source should return.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StageSelector {
    /// Stages shared by every track.
    Global,
    /// Stages specific to a track.
    Track(String),
    /// Cold-outreach stages for a channel.
    Channel(Channel),
}

impl fmt::Display for StageSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageSelector::Global => write!(f, "global"),
            StageSelector::Track(key) => write!(f, "track:{}", key),
            StageSelector::Channel(channel) => write!(f, "channel:{}", channel),
        }
    }
}
