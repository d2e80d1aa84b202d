//! Response options and conversation messages.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{Timestamp, ValidationError};

/// Effectiveness classification of a response option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Poor,
    Good,
    Optimal,
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QualityTier::Poor => "poor",
            QualityTier::Good => "good",
            QualityTier::Optimal => "optimal",
        };
        write!(f, "{}", s)
    }
}

/// One entry of the menu the player picks from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseOption {
    pub text: String,
    pub tier: QualityTier,
    pub rapport_impact: i32,
    #[serde(default)]
    pub score_value: u32,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub is_optimal: bool,
}

impl ResponseOption {
    /// Creates an option; `is_optimal` follows the tier.
    pub fn new(
        text: impl Into<String>,
        tier: QualityTier,
        rapport_impact: i32,
        score_value: u32,
        feedback: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ValidationError::empty_field("option.text"));
        }
        Ok(Self {
            text,
            tier,
            rapport_impact,
            score_value,
            feedback: feedback.into(),
            is_optimal: tier == QualityTier::Optimal,
        })
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    Client,
    Player,
}

/// A line of the conversation log. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
    pub created_at: Timestamp,
}

impl Message {
    pub fn client(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Client,
            text: text.into(),
            created_at: Timestamp::now(),
        }
    }

    pub fn player(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Player,
            text: text.into(),
            created_at: Timestamp::now(),
        }
    }
}
