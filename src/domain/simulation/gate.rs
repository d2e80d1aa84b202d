//! First-wins gate guarding the terminal transition.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::domain::foundation::{SessionStatus, StateMachine};

/// Shared status cell that every terminal trigger races through.
///
/// Only the caller whose compare-and-set flips `playing -> results` wins;
/// every later attempt observes `results` and must discard its effect.
#[derive(Debug, Clone, Default)]
pub struct TerminationGate {
    status: Arc<AtomicU8>,
}

impl TerminationGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// Flips `intro -> playing`. Returns false if the session already left intro.
    pub fn open(&self) -> bool {
        self.transition(SessionStatus::Intro, SessionStatus::Playing)
    }

    /// Attempts the terminal transition. Returns true for the single winner.
    pub fn try_finish(&self) -> bool {
        self.transition(SessionStatus::Playing, SessionStatus::Results)
    }

    fn transition(&self, from: SessionStatus, to: SessionStatus) -> bool {
        if !from.can_transition_to(&to) {
            return false;
        }
        self.status
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
