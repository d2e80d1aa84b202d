//! Response Evaluator - classification and scoring of player choices.
//!
//! Everything here is pure and deterministic: the same option always gets
//! the same tier and the same score.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::option::{QualityTier, ResponseOption};
use super::rapport::Rapport;
use crate::domain::catalog::{Personality, Stage};

/// Rapport impact from which an option counts as optimal.
pub const OPTIMAL_IMPACT_THRESHOLD: i32 = 10;

/// Minimum score credited for an optimal choice.
pub const MIN_OPTIMAL_SCORE: u32 = 15;

/// Minimum score credited for a choice that improved rapport.
pub const MIN_POSITIVE_SCORE: u32 = 5;

/// Largest menu presented to the player.
pub const MAX_MENU_SIZE: usize = 4;

/// Outcome of applying one option to the current rapport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub rapport_before: Rapport,
    pub rapport_after: Rapport,
    pub score_delta: u32,
    pub tier: QualityTier,
    pub is_optimal: bool,
    pub feedback: String,
}

/// Evaluator for response options.
pub struct ResponseEvaluator;

impl ResponseEvaluator {
    /// Tier implied by a rapport impact.
    pub fn classify(rapport_impact: i32) -> QualityTier {
        if rapport_impact >= OPTIMAL_IMPACT_THRESHOLD {
            QualityTier::Optimal
        } else if rapport_impact >= 0 {
            QualityTier::Good
        } else {
            QualityTier::Poor
        }
    }

    /// Re-tags an option so tier and `is_optimal` agree with its impact.
    ///
    /// Idempotent: `normalize(normalize(x)) == normalize(x)`.
    pub fn normalize(option: ResponseOption) -> ResponseOption {
        let tier = Self::classify(option.rapport_impact);
        ResponseOption {
            tier,
            is_optimal: tier == QualityTier::Optimal,
            ..option
        }
    }

    /// Score credited for choosing `option`.
    pub fn score_delta(option: &ResponseOption) -> u32 {
        if option.is_optimal {
            option.score_value.max(MIN_OPTIMAL_SCORE)
        } else if option.rapport_impact > 0 {
            option.score_value.max(MIN_POSITIVE_SCORE)
        } else {
            0
        }
    }

    /// Applies `option` to `rapport` without mutating anything.
    pub fn evaluate(
        personality: Personality,
        rapport: Rapport,
        option: &ResponseOption,
    ) -> Evaluation {
        let feedback = if option.feedback.trim().is_empty() {
            Self::default_feedback(personality, option.tier).to_string()
        } else {
            option.feedback.clone()
        };

        Evaluation {
            rapport_before: rapport,
            rapport_after: rapport.apply(option.rapport_impact),
            score_delta: Self::score_delta(option),
            tier: option.tier,
            is_optimal: option.is_optimal,
            feedback,
        }
    }

    /// Builds the menu shown for a turn.
    ///
    /// Options are normalized, blank and duplicate texts are dropped, missing
    /// feedback is filled with personality-specific coaching and the menu is
    /// capped at [`MAX_MENU_SIZE`]. Input order is preserved.
    pub fn select_options(
        personality: Personality,
        stage: &Stage,
        candidates: Vec<ResponseOption>,
    ) -> Vec<ResponseOption> {
        let mut seen = HashSet::new();
        let menu: Vec<ResponseOption> = candidates
            .into_iter()
            .filter(|option| !option.text.trim().is_empty())
            .filter(|option| seen.insert(option.text.trim().to_lowercase()))
            .map(Self::normalize)
            .map(|mut option| {
                if option.feedback.trim().is_empty() {
                    option.feedback = Self::default_feedback(personality, option.tier).to_string();
                }
                option
            })
            .take(MAX_MENU_SIZE)
            .collect();

        tracing::debug!(
            stage = %stage.key,
            personality = %personality,
            options = menu.len(),
            "Response menu selected"
        );
        menu
    }

    /// Coaching line used when an option carries no feedback of its own.
    pub fn default_feedback(personality: Personality, tier: QualityTier) -> &'static str {
        use Personality::*;
        match (tier, personality) {
            (QualityTier::Optimal, _) => "Excellent! That response builds real trust.",
            (QualityTier::Good, Analytical) => "Reasonable, but this client wants data to back it up.",
            (QualityTier::Good, Busy) => "Fine, though a busy client rewards getting to the point.",
            (QualityTier::Good, _) => "Good response. There was room to connect more deeply.",
            (QualityTier::Poor, Skeptical) => "Pressure makes a skeptical client dig in. Offer proof instead.",
            (QualityTier::Poor, Aggressive) => "Escalating with an aggressive client rarely ends well. Stay calm.",
            (QualityTier::Poor, Indecisive) => "Too much at once overwhelms an indecisive client.",
            (QualityTier::Poor, Indifferent) => "That did nothing to earn this client's attention.",
            (QualityTier::Poor, _) => "That response hurt the relationship. Focus on the client's needs.",
        }
    }
}
