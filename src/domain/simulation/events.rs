//! Simulation domain events.
//!
//! Events published as a session progresses:
//! - `SessionStarted` - Persona selected and the clock started
//! - `TurnResolved` - A response was scored
//! - `SessionEnded` - Terminal transition with rewards
//!
//! `SimulationEvent` wraps these together with presentation-only
//! notifications for subscribers of the session's broadcast channel.

use serde::{Deserialize, Serialize};

use super::mode::SessionMode;
use super::option::ResponseOption;
use super::rewards::SkillImpact;
use super::state::{EndReason, SessionResult, StagePerformance};
use crate::domain::foundation::{
    domain_event, EventEnvelope, EventId, PersonaId, SessionId, Timestamp,
};

// ════════════════════════════════════════════════════════════════════════════
// SessionStarted
// ════════════════════════════════════════════════════════════════════════════

/// Published when a session enters `playing`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStarted {
    pub event_id: EventId,
    pub session_id: SessionId,
    pub persona_id: PersonaId,
    pub mode: SessionMode,
    /// Stage keys in play order.
    pub stage_ids: Vec<String>,
    pub time_limit_secs: u32,
    pub initial_rapport: u8,
    pub started_at: Timestamp,
}

domain_event!(
    SessionStarted,
    event_type = "simulation.session_started.v1",
    schema_version = 1,
    aggregate_id = session_id,
    aggregate_type = "SimulationSession",
    occurred_at = started_at,
    event_id = event_id
);

// ════════════════════════════════════════════════════════════════════════════
// TurnResolved
// ════════════════════════════════════════════════════════════════════════════

/// Published after every scored response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnResolved {
    pub event_id: EventId,
    pub session_id: SessionId,
    pub stage_index: usize,
    pub rapport: u8,
    pub score: u32,
    pub score_delta: u32,
    pub feedback_text: String,
    pub is_optimal: bool,
    pub resolved_at: Timestamp,
}

domain_event!(
    TurnResolved,
    event_type = "simulation.turn_resolved.v1",
    schema_version = 1,
    aggregate_id = session_id,
    aggregate_type = "SimulationSession",
    occurred_at = resolved_at,
    event_id = event_id
);

// ════════════════════════════════════════════════════════════════════════════
// SessionEnded
// ════════════════════════════════════════════════════════════════════════════

/// Published exactly once, when the session reaches `results`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEnded {
    pub event_id: EventId,
    pub session_id: SessionId,
    pub end_reason: EndReason,
    pub final_score: u32,
    pub final_rapport: u8,
    pub sale_closed: bool,
    pub skill_impacts: Vec<SkillImpact>,
    pub xp_earned: u32,
    pub coins_earned: u32,
    pub stage_performance: Vec<StagePerformance>,
    pub time_spent_seconds: u32,
    pub ended_at: Timestamp,
}

domain_event!(
    SessionEnded,
    event_type = "simulation.session_ended.v1",
    schema_version = 1,
    aggregate_id = session_id,
    aggregate_type = "SimulationSession",
    occurred_at = ended_at,
    event_id = event_id
);

impl SessionEnded {
    pub fn from_result(result: &SessionResult) -> Self {
        Self {
            event_id: EventId::new(),
            session_id: result.session_id,
            end_reason: result.end_reason,
            final_score: result.final_score,
            final_rapport: result.final_rapport,
            sale_closed: result.sale_closed,
            skill_impacts: result.skill_impacts.clone(),
            xp_earned: result.xp_earned,
            coins_earned: result.coins_earned,
            stage_performance: result.stage_performance.clone(),
            time_spent_seconds: result.time_spent_secs,
            ended_at: result.completed_at,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Broadcast events
// ════════════════════════════════════════════════════════════════════════════

/// Everything a presentation layer can observe about a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimulationEvent {
    SessionStarted(SessionStarted),
    TurnResolved(TurnResolved),
    SessionEnded(SessionEnded),

    /// One second elapsed on the session clock.
    TimerTicked {
        session_id: SessionId,
        time_remaining_secs: u32,
    },

    /// Options for the current turn are being generated.
    GenerationStarted {
        session_id: SessionId,
        stage_index: usize,
    },

    /// A menu is ready to be answered.
    OptionsReady {
        session_id: SessionId,
        stage_index: usize,
        options: Vec<ResponseOption>,
        from_fallback: bool,
    },

    /// The client said something.
    ClientMessage {
        session_id: SessionId,
        stage_index: usize,
        text: String,
    },

    /// The session moved on to another stage.
    StageAdvanced {
        session_id: SessionId,
        from_index: usize,
        to_index: usize,
        stage_key: String,
        skipped: bool,
    },

    /// A rapport threshold was crossed; the session ends after the grace delay.
    TerminationScheduled {
        session_id: SessionId,
        reason: EndReason,
        sale_closed: bool,
    },

    /// The player left; the session was discarded without a result.
    SessionExited {
        session_id: SessionId,
        time_remaining_secs: u32,
    },
}

impl SimulationEvent {
    pub fn session_id(&self) -> SessionId {
        match self {
            SimulationEvent::SessionStarted(e) => e.session_id,
            SimulationEvent::TurnResolved(e) => e.session_id,
            SimulationEvent::SessionEnded(e) => e.session_id,
            SimulationEvent::TimerTicked { session_id, .. }
            | SimulationEvent::GenerationStarted { session_id, .. }
            | SimulationEvent::OptionsReady { session_id, .. }
            | SimulationEvent::ClientMessage { session_id, .. }
            | SimulationEvent::StageAdvanced { session_id, .. }
            | SimulationEvent::TerminationScheduled { session_id, .. }
            | SimulationEvent::SessionExited { session_id, .. } => *session_id,
        }
    }

    /// Returns true for the events external consumers persist or react to.
    pub fn is_domain_event(&self) -> bool {
        matches!(
            self,
            SimulationEvent::SessionStarted(_)
                | SimulationEvent::TurnResolved(_)
                | SimulationEvent::SessionEnded(_)
        )
    }

    /// Wraps a domain event for the event publisher.
    ///
    /// Returns `Ok(None)` for presentation-only events.
    pub fn to_envelope(&self) -> Result<Option<EventEnvelope>, serde_json::Error> {
        let envelope = match self {
            SimulationEvent::SessionStarted(e) => EventEnvelope::from_event(e)?,
            SimulationEvent::TurnResolved(e) => EventEnvelope::from_event(e)?,
            SimulationEvent::SessionEnded(e) => EventEnvelope::from_event(e)?,
            _ => return Ok(None),
        };
        Ok(Some(
            envelope.with_correlation_id(self.session_id().to_string()),
        ))
    }
}
