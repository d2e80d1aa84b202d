//! Reward Calculator - XP, coins and skill impact at session end.
//!
//! The multipliers are fixed contracts shared with persistence and display,
//! so they are reproduced exactly. All rounding is round-half-up.

use serde::{Deserialize, Serialize};

use super::mode::SessionMode;
use crate::domain::catalog::Track;

const BASE_XP_FACTOR: f64 = 0.5;
const SUCCESS_XP_FACTOR: f64 = 1.5;
const FAILURE_XP_FACTOR: f64 = 0.8;
const COINS_SCORE_FACTOR: f64 = 0.2;
const SUCCESS_COINS_FACTOR: f64 = 1.3;
const FAILURE_COINS_FACTOR: f64 = 0.7;
const SKILL_FACTOR: f64 = 0.1;

const OUTREACH_XP_FACTOR: f64 = 1.2;
const OUTREACH_COINS_FACTOR: f64 = 0.5;
const OUTREACH_XP_BONUS: u32 = 50;
const OUTREACH_COINS_BONUS: u32 = 25;

/// Score credited to one skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillImpact {
    pub skill: String,
    pub impact: u32,
}

/// Everything the reward service needs to grant a session's rewards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardBreakdown {
    /// Standard sessions only.
    pub base_xp: Option<u32>,
    pub xp_earned: u32,
    pub coins_earned: u32,
    pub skill_impacts: Vec<SkillImpact>,
}

/// Calculator for end-of-session rewards.
pub struct RewardCalculator;

impl RewardCalculator {
    /// Computes rewards for a finished session.
    pub fn calculate(
        mode: SessionMode,
        score: u32,
        track: &Track,
        persona_multiplier: f64,
        succeeded: bool,
    ) -> RewardBreakdown {
        match mode {
            SessionMode::Standard => Self::standard(score, track, persona_multiplier, succeeded),
            SessionMode::ColdOutreach { .. } => Self::cold_outreach(score, track, succeeded),
        }
    }

    /// Full-funnel rewards.
    ///
    /// - `base_xp = round(score * 0.5)`
    /// - `xp = round((base_xp + track.xp_reward) * multiplier * (closed ? 1.5 : 0.8))`
    /// - `coins = round((score * 0.2 + track.coins_reward) * (closed ? 1.3 : 0.7))`
    pub fn standard(
        score: u32,
        track: &Track,
        persona_multiplier: f64,
        sale_closed: bool,
    ) -> RewardBreakdown {
        let score_f = f64::from(score);
        let base_xp = round_half_up(score_f * BASE_XP_FACTOR);

        let outcome_xp = if sale_closed { SUCCESS_XP_FACTOR } else { FAILURE_XP_FACTOR };
        let xp_earned = round_half_up(
            (f64::from(base_xp) + f64::from(track.xp_reward)) * persona_multiplier * outcome_xp,
        );

        let outcome_coins = if sale_closed { SUCCESS_COINS_FACTOR } else { FAILURE_COINS_FACTOR };
        let coins_earned = round_half_up(
            (score_f * COINS_SCORE_FACTOR + f64::from(track.coins_reward)) * outcome_coins,
        );

        RewardBreakdown {
            base_xp: Some(base_xp),
            xp_earned,
            coins_earned,
            skill_impacts: Self::skill_impacts(score, track),
        }
    }

    /// Prospecting rewards; `commitment` replaces the sale-closed gate.
    pub fn cold_outreach(score: u32, track: &Track, commitment: bool) -> RewardBreakdown {
        let score_f = f64::from(score);
        let (xp_bonus, coins_bonus) = if commitment {
            (OUTREACH_XP_BONUS, OUTREACH_COINS_BONUS)
        } else {
            (0, 0)
        };

        RewardBreakdown {
            base_xp: None,
            xp_earned: round_half_up(score_f * OUTREACH_XP_FACTOR).saturating_add(xp_bonus),
            coins_earned: round_half_up(score_f * OUTREACH_COINS_FACTOR)
                .saturating_add(coins_bonus),
            skill_impacts: Self::skill_impacts(score, track),
        }
    }

    /// `max(0, round(score * weight * 0.1))` for each related skill, in track order.
    pub fn skill_impacts(score: u32, track: &Track) -> Vec<SkillImpact> {
        track
            .related_skills
            .iter()
            .map(|sw| SkillImpact {
                skill: sw.skill.clone(),
                impact: round_half_up(f64::from(score) * sw.weight * SKILL_FACTOR),
            })
            .collect()
    }
}

/// Rounds half away from zero for non-negative inputs, flooring at 0.
pub(crate) fn round_half_up(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let rounded = (value + 0.5).floor();
    if rounded >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        rounded as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::Channel;
    use proptest::prelude::*;

    fn track() -> Track {
        Track::new("saas").unwrap()
    }

    #[test]
    fn documented_standard_example() {
        let rewards = RewardCalculator::standard(100, &track(), 1.5, true);
        assert_eq!(rewards.base_xp, Some(50));
        assert_eq!(rewards.xp_earned, 338);
        assert_eq!(rewards.coins_earned, 91);
    }

    #[test]
    fn failed_standard_session_uses_lower_factors() {
        // xp = round((25 + 100) * 1.0 * 0.8) = 100; coins = round((10 + 50) * 0.7) = 42
        let rewards = RewardCalculator::standard(50, &track(), 1.0, false);
        assert_eq!(rewards.base_xp, Some(25));
        assert_eq!(rewards.xp_earned, 100);
        assert_eq!(rewards.coins_earned, 42);
    }

    #[test]
    fn base_xp_rounds_half_up() {
        let rewards = RewardCalculator::standard(5, &track(), 1.0, true);
        assert_eq!(rewards.base_xp, Some(3));
    }

    #[test]
    fn zero_score_still_earns_track_base() {
        let rewards = RewardCalculator::standard(0, &track(), 1.0, false);
        assert_eq!(rewards.xp_earned, 80);
        assert_eq!(rewards.coins_earned, 35);
    }

    #[test]
    fn cold_outreach_formula() {
        let with = RewardCalculator::cold_outreach(75, &track(), true);
        assert_eq!(with.base_xp, None);
        assert_eq!(with.xp_earned, 140);
        assert_eq!(with.coins_earned, 63);

        let without = RewardCalculator::cold_outreach(75, &track(), false);
        assert_eq!(without.xp_earned, 90);
        assert_eq!(without.coins_earned, 38);
    }

    #[test]
    fn calculate_dispatches_on_mode() {
        let mode = SessionMode::ColdOutreach {
            channel: Channel::Email,
        };
        assert_eq!(
            RewardCalculator::calculate(mode, 10, &track(), 3.0, true),
            RewardCalculator::cold_outreach(10, &track(), true)
        );
        assert_eq!(
            RewardCalculator::calculate(SessionMode::Standard, 10, &track(), 3.0, true),
            RewardCalculator::standard(10, &track(), 3.0, true)
        );
    }

    #[test]
    fn skill_impacts_follow_track_order_and_floor_at_zero() {
        let track = track()
            .with_skill("negotiation", 1.5)
            .with_skill("listening", 0.0)
            .with_skill("closing", 0.25);
        let impacts = RewardCalculator::skill_impacts(100, &track);
        assert_eq!(
            impacts,
            vec![
                SkillImpact { skill: "negotiation".into(), impact: 15 },
                SkillImpact { skill: "listening".into(), impact: 0 },
                SkillImpact { skill: "closing".into(), impact: 3 },
            ]
        );
    }

    #[test]
    fn round_half_up_edges() {
        assert_eq!(round_half_up(337.5), 338);
        assert_eq!(round_half_up(2.4999), 2);
        assert_eq!(round_half_up(-3.0), 0);
        assert_eq!(round_half_up(f64::NAN), 0);
        assert_eq!(round_half_up(f64::INFINITY), 0);
    }

    proptest! {
        #[test]
        fn success_never_earns_less_than_failure(score in 0u32..10_000, mult in 0.5f64..=3.0) {
            let won = RewardCalculator::standard(score, &track(), mult, true);
            let lost = RewardCalculator::standard(score, &track(), mult, false);
            prop_assert!(won.xp_earned >= lost.xp_earned);
            prop_assert!(won.coins_earned >= lost.coins_earned);
        }

        #[test]
        fn rewards_are_deterministic(score in 0u32..10_000, closed in any::<bool>()) {
            prop_assert_eq!(
                RewardCalculator::standard(score, &track(), 1.2, closed),
                RewardCalculator::standard(score, &track(), 1.2, closed)
            );
        }
    }
}
