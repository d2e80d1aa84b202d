//! Simulation domain module.
//!
//! The sales-conversation engine: stage sequencing, response evaluation,
//! the session state machine and reward calculation.
//!
//! # Module Structure
//!
//! - `sequencer` - Orders funnel stages for a session
//! - `evaluator` - Tiers and scores response options
//! - `session` - Session aggregate and its transitions
//! - `gate` - First-wins guard for the terminal transition
//! - `rewards` - XP, coins and skill impact
//! - `scenarios` - Scripted fallback content

mod errors;
mod evaluator;
mod events;
mod gate;
mod mode;
mod option;
mod rapport;
mod rewards;
mod scenarios;
mod sequencer;
mod session;
mod state;

pub use errors::SimulationError;
pub use evaluator::{
    Evaluation, ResponseEvaluator, MAX_MENU_SIZE, MIN_OPTIMAL_SCORE, MIN_POSITIVE_SCORE,
    OPTIMAL_IMPACT_THRESHOLD,
};
pub use events::{SessionEnded, SessionStarted, SimulationEvent, TurnResolved};
pub use gate::TerminationGate;
pub use mode::{SessionMode, SessionSettings};
pub use option::{Message, QualityTier, ResponseOption, Sender};
pub use rapport::{Rapport, CLOSE_THRESHOLD, LOSS_THRESHOLD};
pub use rewards::{RewardBreakdown, RewardCalculator, SkillImpact};
pub use scenarios::{Exchange, ScenarioTable, ScenarioVariant, StageScript};
pub use sequencer::{StagePlan, StageSequencer};
pub use session::{SimulationSession, TickOutcome, TurnOutcome, TurnProgress};
pub use state::{
    EndReason, Feedback, PendingTermination, SessionResult, SessionSnapshot, SessionState,
    StagePerformance,
};
