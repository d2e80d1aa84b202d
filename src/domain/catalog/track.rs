//! Track reward configuration.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// Base XP granted by a track when none is configured.
pub const DEFAULT_XP_REWARD: u32 = 100;

/// Base coins granted by a track when none is configured.
pub const DEFAULT_COINS_REWARD: u32 = 50;

/// Weight of a skill trained by a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillWeight {
    pub skill: String,
    pub weight: f64,
}

impl SkillWeight {
    pub fn new(skill: impl Into<String>, weight: f64) -> Self {
        Self {
            skill: skill.into(),
            weight,
        }
    }
}

fn default_xp_reward() -> u32 {
    DEFAULT_XP_REWARD
}

fn default_coins_reward() -> u32 {
    DEFAULT_COINS_REWARD
}

/// Reward configuration for a learning track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub key: String,
    /// Session time limit; the session mode default applies when absent.
    #[serde(default)]
    pub time_limit_secs: Option<u32>,
    #[serde(default = "default_xp_reward")]
    pub xp_reward: u32,
    #[serde(default = "default_coins_reward")]
    pub coins_reward: u32,
    /// Skills in display order.
    #[serde(default)]
    pub related_skills: Vec<SkillWeight>,
}

impl Track {
    /// Creates a track with default rewards and no related skills.
    pub fn new(key: impl Into<String>) -> Result<Self, ValidationError> {
        let track = Self {
            key: key.into(),
            time_limit_secs: None,
            xp_reward: DEFAULT_XP_REWARD,
            coins_reward: DEFAULT_COINS_REWARD,
            related_skills: Vec::new(),
        };
        track.validate()?;
        Ok(track)
    }

    pub fn with_time_limit(mut self, secs: u32) -> Self {
        self.time_limit_secs = Some(secs);
        self
    }

    pub fn with_rewards(mut self, xp: u32, coins: u32) -> Self {
        self.xp_reward = xp;
        self.coins_reward = coins;
        self
    }

    pub fn with_skill(mut self, skill: impl Into<String>, weight: f64) -> Self {
        self.related_skills.push(SkillWeight::new(skill, weight));
        self
    }

    /// Checks a track deserialized from a source.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.key.trim().is_empty() {
            return Err(ValidationError::empty_field("track.key"));
        }
        if self.time_limit_secs == Some(0) {
            return Err(ValidationError::out_of_range(
                "track.time_limit_secs",
                1.0,
                f64::from(u32::MAX),
                0.0,
            ));
        }
        for skill in &self.related_skills {
            if skill.skill.trim().is_empty() {
                return Err(ValidationError::empty_field("track.related_skills.skill"));
            }
            if !skill.weight.is_finite() || skill.weight < 0.0 {
                return Err(ValidationError::invalid_format(
                    "track.related_skills.weight",
                    format!("weight for '{}' must be a non-negative number", skill.skill),
                ));
            }
        }
        Ok(())
    }
}
