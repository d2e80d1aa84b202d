//! Reward configuration

use serde::Deserialize;

use crate::domain::catalog::{Track, DEFAULT_COINS_REWARD, DEFAULT_XP_REWARD};

/// Rewards used for tracks the track source does not know
#[derive(Debug, Clone, Deserialize)]
pub struct RewardsConfig {
    #[serde(default = "default_xp")]
    pub default_track_xp: u32,

    #[serde(default = "default_coins")]
    pub default_track_coins: u32,
}

impl RewardsConfig {
    /// A track with no time limit or related skills and the default rewards.
    pub fn fallback_track(&self, key: &str) -> Track {
        Track {
            key: key.to_string(),
            time_limit_secs: None,
            xp_reward: self.default_track_xp,
            coins_reward: self.default_track_coins,
            related_skills: Vec::new(),
        }
    }
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            default_track_xp: default_xp(),
            default_track_coins: default_coins(),
        }
    }
}

fn default_xp() -> u32 {
    DEFAULT_XP_REWARD
}

fn default_coins() -> u32 {
    DEFAULT_COINS_REWARD
}
