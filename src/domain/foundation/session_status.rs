//! SessionStatus enum for the lifecycle of a simulation session.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::StateMachine;

/// Lifecycle status of a simulation session.
///
/// `Intro` → `Playing` → `Results`. `Results` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Intro,
    Playing,
    Results,
}

impl SessionStatus {
    /// Returns true if turns and timer ticks may mutate the session.
    pub fn is_playing(&self) -> bool {
        matches!(self, SessionStatus::Playing)
    }

    /// Compact encoding used by the termination gate.
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            SessionStatus::Intro => 0,
            SessionStatus::Playing => 1,
            SessionStatus::Results => 2,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => SessionStatus::Intro,
            1 => SessionStatus::Playing,
            _ => SessionStatus::Results,
        }
    }
}

impl StateMachine for SessionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SessionStatus::*;
        matches!((self, target), (Intro, Playing) | (Playing, Results))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SessionStatus::*;
        match self {
            Intro => vec![Playing],
            Playing => vec![Results],
            Results => vec![],
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Intro => "intro",
            SessionStatus::Playing => "playing",
            SessionStatus::Results => "results",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_intro() {
        assert_eq!(SessionStatus::default(), SessionStatus::Intro);
    }

    #[test]
    fn intro_can_start_playing() {
        assert!(SessionStatus::Intro.can_transition_to(&SessionStatus::Playing));
    }

    #[test]
    fn intro_cannot_skip_to_results() {
        assert!(!SessionStatus::Intro.can_transition_to(&SessionStatus::Results));
    }

    #[test]
    fn results_is_terminal() {
        assert!(SessionStatus::Results.is_terminal());
        assert!(SessionStatus::Results.transition_to(SessionStatus::Playing).is_err());
    }

    #[test]
    fn u8_encoding_round_trips() {
        for status in [SessionStatus::Intro, SessionStatus::Playing, SessionStatus::Results] {
            assert_eq!(SessionStatus::from_u8(status.as_u8()), status);
        }
    }

    #[test]
    fn serializes_to_snake_case_json() {
        assert_eq!(
            serde_json::to_string(&SessionStatus::Playing).unwrap(),
            "\"playing\""
        );
        let status: SessionStatus = serde_json::from_str("\"results\"").unwrap();
        assert_eq!(status, SessionStatus::Results);
    }
}
