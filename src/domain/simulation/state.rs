//! Session state and result records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::mode::SessionMode;
use super::option::{Message, QualityTier, ResponseOption};
use super::rapport::Rapport;
use super::rewards::SkillImpact;
use crate::domain::foundation::{PersonaId, SessionId, SessionStatus, Timestamp};

/// Score and time spent in one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagePerformance {
    pub stage_index: usize,
    pub stage_key: String,
    pub score: u32,
    /// Session-clock seconds since the stage was entered.
    ///
    /// One second per timer tick, the same clock as `time_remaining_secs`.
    /// Matches wall time only at the default one-second tick interval.
    pub elapsed_secs: u32,
    pub turns: u32,
    /// Set when the stage was skipped for lack of playable options.
    #[serde(default)]
    pub skipped: bool,
}

impl StagePerformance {
    pub fn entered(stage_index: usize, stage_key: impl Into<String>) -> Self {
        Self {
            stage_index,
            stage_key: stage_key.into(),
            score: 0,
            elapsed_secs: 0,
            turns: 0,
            skipped: false,
        }
    }
}

/// Feedback on the most recent choice, for transient display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub text: String,
    pub is_optimal: bool,
    pub tier: QualityTier,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Rapport reached the close threshold.
    ClientWon,
    /// Rapport fell to the loss threshold.
    ClientLost,
    /// Every stage was played.
    StagesCompleted,
    /// The timer ran out.
    TimeExpired,
}

/// A threshold crossing waiting out the grace delay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTermination {
    pub reason: EndReason,
    pub sale_closed: bool,
    pub scheduled_at: Timestamp,
}

/// Authoritative mutable state of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub status: SessionStatus,
    pub stage_index: usize,
    /// Scripted exchange within the current stage.
    pub exchange_index: usize,
    pub rapport: Rapport,
    pub score: u32,
    pub time_limit_secs: u32,
    pub time_remaining_secs: u32,
    pub messages: Vec<Message>,
    pub options: Vec<ResponseOption>,
    pub stage_performance: Vec<StagePerformance>,
    /// Score credited to each related skill during play.
    pub skill_scores: BTreeMap<String, u32>,
    pub sale_closed: bool,
    pub is_generating: bool,
    pub last_feedback: Option<Feedback>,
    pub pending_termination: Option<PendingTermination>,
    /// Session-clock second at which the current stage was entered.
    pub stage_entered_at_secs: u32,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            status: SessionStatus::Intro,
            stage_index: 0,
            exchange_index: 0,
            rapport: Rapport::new(0),
            score: 0,
            time_limit_secs: 0,
            time_remaining_secs: 0,
            messages: Vec::new(),
            options: Vec::new(),
            stage_performance: Vec::new(),
            skill_scores: BTreeMap::new(),
            sale_closed: false,
            is_generating: false,
            last_feedback: None,
            pending_termination: None,
            stage_entered_at_secs: 0,
        }
    }
}

impl SessionState {
    /// Seconds elapsed on the session clock.
    pub fn elapsed_secs(&self) -> u32 {
        self.time_limit_secs.saturating_sub(self.time_remaining_secs)
    }

    /// Seconds spent in the current stage so far.
    pub fn stage_elapsed_secs(&self) -> u32 {
        self.elapsed_secs().saturating_sub(self.stage_entered_at_secs)
    }

    pub fn current_performance_mut(&mut self) -> Option<&mut StagePerformance> {
        let index = self.stage_index;
        self.stage_performance
            .iter_mut()
            .rev()
            .find(|p| p.stage_index == index)
    }

    /// Refreshes the current stage's elapsed time from the session clock.
    pub fn sync_stage_clock(&mut self) {
        let elapsed = self.stage_elapsed_secs();
        if let Some(perf) = self.current_performance_mut() {
            perf.elapsed_secs = elapsed;
        }
    }
}

/// Serializable read model for presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub persona_id: Option<PersonaId>,
    pub mode: SessionMode,
    pub status: SessionStatus,
    pub stage_index: usize,
    pub stage_key: Option<String>,
    pub stage_count: usize,
    pub rapport: u8,
    pub score: u32,
    pub time_remaining_secs: u32,
    pub is_generating: bool,
    pub sale_closed: bool,
    pub termination_pending: bool,
    pub messages: Vec<Message>,
    pub options: Vec<ResponseOption>,
    pub last_feedback: Option<Feedback>,
    pub skill_scores: BTreeMap<String, u32>,
}

/// Immutable outcome of a finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResult {
    pub session_id: SessionId,
    pub persona_id: PersonaId,
    pub track_key: String,
    pub mode: SessionMode,
    pub end_reason: EndReason,
    pub final_score: u32,
    pub final_rapport: u8,
    /// Sale closed, or commitment obtained in cold outreach.
    pub sale_closed: bool,
    pub skill_impacts: Vec<SkillImpact>,
    pub stage_performance: Vec<StagePerformance>,
    pub base_xp: Option<u32>,
    pub xp_earned: u32,
    pub coins_earned: u32,
    pub time_spent_secs: u32,
    pub completed_at: Timestamp,
}

impl SessionResult {
    /// Human-readable outcome line.
    pub fn outcome(&self) -> String {
        if self.sale_closed {
            self.mode.outcome_label().to_string()
        } else {
            format!("no {}", self.mode.outcome_label())
        }
    }
}
