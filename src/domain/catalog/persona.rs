//! Persona value types supplied by the external catalog.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{PersonaId, ValidationError};

/// Lower bound for a persona's reward multiplier.
pub const MIN_REWARD_MULTIPLIER: f64 = 0.5;

/// Upper bound for a persona's reward multiplier.
pub const MAX_REWARD_MULTIPLIER: f64 = 3.0;

/// Starting rapport when the persona does not define one.
pub const DEFAULT_INITIAL_RAPPORT: u8 = 40;

/// Temperament of the simulated client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    Friendly,
    Analytical,
    Busy,
    Skeptical,
    Indecisive,
    Aggressive,
    Indifferent,
}

impl Personality {
    /// All personalities, in catalog order.
    pub const ALL: [Personality; 7] = [
        Personality::Friendly,
        Personality::Analytical,
        Personality::Busy,
        Personality::Skeptical,
        Personality::Indecisive,
        Personality::Aggressive,
        Personality::Indifferent,
    ];

    /// Returns the snake_case key used in scenario tables.
    pub fn key(&self) -> &'static str {
        match self {
            Personality::Friendly => "friendly",
            Personality::Analytical => "analytical",
            Personality::Busy => "busy",
            Personality::Skeptical => "skeptical",
            Personality::Indecisive => "indecisive",
            Personality::Aggressive => "aggressive",
            Personality::Indifferent => "indifferent",
        }
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Difficulty tier of a persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Extreme,
}

/// Communication channel a persona is reached on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Call,
    Email,
    Linkedin,
    Whatsapp,
    Meeting,
    #[default]
    All,
}

impl Channel {
    /// Returns true if a persona with this affinity can appear on `other`.
    pub fn accepts(&self, other: Channel) -> bool {
        *self == Channel::All || other == Channel::All || *self == other
    }

    /// Returns the snake_case key used for stage selection.
    pub fn key(&self) -> &'static str {
        match self {
            Channel::Call => "call",
            Channel::Email => "email",
            Channel::Linkedin => "linkedin",
            Channel::Whatsapp => "whatsapp",
            Channel::Meeting => "meeting",
            Channel::All => "all",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

fn default_reward_multiplier() -> f64 {
    1.0
}

/// A simulated client. Immutable for the duration of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub id: PersonaId,
    pub name: String,
    pub personality: Personality,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub channel: Channel,
    #[serde(default)]
    pub pain_points: Vec<String>,
    #[serde(default)]
    pub decision_factors: Vec<String>,
    #[serde(default = "default_reward_multiplier")]
    pub reward_multiplier: f64,
    #[serde(default)]
    pub initial_rapport: Option<u8>,
}

impl Persona {
    /// Creates a persona with default difficulty, channel and multiplier.
    pub fn new(
        id: PersonaId,
        name: impl Into<String>,
        personality: Personality,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        Ok(Self {
            id,
            name,
            personality,
            difficulty: Difficulty::default(),
            channel: Channel::default(),
            pain_points: Vec::new(),
            decision_factors: Vec::new(),
            reward_multiplier: default_reward_multiplier(),
            initial_rapport: None,
        })
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_pain_points(mut self, pain_points: Vec<String>) -> Self {
        self.pain_points = pain_points;
        self
    }

    pub fn with_decision_factors(mut self, factors: Vec<String>) -> Self {
        self.decision_factors = factors;
        self
    }

    /// Sets the reward multiplier.
    ///
    /// # Errors
    ///
    /// `OutOfRange` if the multiplier is outside 0.5..=3.0.
    pub fn with_reward_multiplier(mut self, multiplier: f64) -> Result<Self, ValidationError> {
        Self::validate_multiplier(multiplier)?;
        self.reward_multiplier = multiplier;
        Ok(self)
    }

    /// Sets the starting rapport.
    ///
    /// # Errors
    ///
    /// `OutOfRange` if rapport exceeds 100.
    pub fn with_initial_rapport(mut self, rapport: u8) -> Result<Self, ValidationError> {
        if rapport > 100 {
            return Err(ValidationError::out_of_range(
                "initial_rapport",
                0.0,
                100.0,
                f64::from(rapport),
            ));
        }
        self.initial_rapport = Some(rapport);
        Ok(self)
    }

    /// Starting rapport, falling back to the engine default.
    pub fn starting_rapport(&self) -> u8 {
        self.initial_rapport.unwrap_or(DEFAULT_INITIAL_RAPPORT)
    }

    /// Re-checks invariants of a persona deserialized from a catalog.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        Self::validate_multiplier(self.reward_multiplier)?;
        if let Some(rapport) = self.initial_rapport {
            if rapport > 100 {
                return Err(ValidationError::out_of_range(
                    "initial_rapport",
                    0.0,
                    100.0,
                    f64::from(rapport),
                ));
            }
        }
        Ok(())
    }

    fn validate_multiplier(multiplier: f64) -> Result<(), ValidationError> {
        if !(MIN_REWARD_MULTIPLIER..=MAX_REWARD_MULTIPLIER).contains(&multiplier) {
            return Err(ValidationError::out_of_range(
                "reward_multiplier",
                MIN_REWARD_MULTIPLIER,
                MAX_REWARD_MULTIPLIER,
                multiplier,
            ));
        }
        Ok(())
    }
}

/// Filter accepted by the persona catalog port.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonaFilter {
    pub channel: Option<Channel>,
    pub difficulty: Option<Difficulty>,
    pub personality: Option<Personality>,
}

impl PersonaFilter {
    pub fn for_channel(channel: Channel) -> Self {
        Self {
            channel: Some(channel),
            ..Default::default()
        }
    }

    /// Returns true if the persona satisfies every set criterion.
    pub fn matches(&self, persona: &Persona) -> bool {
        self.channel.map_or(true, |c| persona.channel.accepts(c))
            && self.difficulty.map_or(true, |d| persona.difficulty == d)
            && self.personality.map_or(true, |p| persona.personality == p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn persona() -> Persona {
        Persona::new(PersonaId::new("p-1").unwrap(), "Dana", Personality::Skeptical).unwrap()
    }

    #[test]
    fn new_persona_uses_defaults() {
        let p = persona();
        assert_eq!(p.reward_multiplier, 1.0);
        assert_eq!(p.starting_rapport(), DEFAULT_INITIAL_RAPPORT);
        assert_eq!(p.channel, Channel::All);
    }

    #[test]
    fn reward_multiplier_bounds_are_inclusive() {
        assert!(persona().with_reward_multiplier(0.5).is_ok());
        assert!(persona().with_reward_multiplier(3.0).is_ok());
        assert!(persona().with_reward_multiplier(0.49).is_err());
        assert!(persona().with_reward_multiplier(3.01).is_err());
    }

    #[test]
    fn initial_rapport_above_100_is_rejected() {
        assert!(persona().with_initial_rapport(101).is_err());
        assert_eq!(persona().with_initial_rapport(65).unwrap().starting_rapport(), 65);
    }

    #[test]
    fn empty_name_is_rejected() {
        assert!(Persona::new(PersonaId::new("p").unwrap(), " ", Personality::Busy).is_err());
    }

    #[test]
    fn deserialized_persona_gets_defaults_and_validates() {
        let json = r#"{"id":"p-9","name":"Lee","personality":"busy"}"#;
        let p: Persona = serde_json::from_str(json).unwrap();
        assert_eq!(p.personality, Personality::Busy);
        assert_eq!(p.reward_multiplier, 1.0);
        assert!(p.validate().is_ok());

        let bad = r#"{"id":"p-9","name":"Lee","personality":"busy","reward_multiplier":9.0}"#;
        let p: Persona = serde_json::from_str(bad).unwrap();
        assert!(p.validate().is_err());
    }

    #[test]
    fn channel_all_accepts_everything() {
        assert!(Channel::All.accepts(Channel::Whatsapp));
        assert!(Channel::Call.accepts(Channel::All));
        assert!(!Channel::Call.accepts(Channel::Email));
    }

    #[test]
    fn filter_matches_on_all_set_fields() {
        let p = persona()
            .with_channel(Channel::Linkedin)
            .with_difficulty(Difficulty::Hard);

        assert!(PersonaFilter::default().matches(&p));
        assert!(PersonaFilter::for_channel(Channel::Linkedin).matches(&p));
        assert!(!PersonaFilter::for_channel(Channel::Call).matches(&p));

        let filter = PersonaFilter {
            difficulty: Some(Difficulty::Easy),
            ..Default::default()
        };
        assert!(!filter.matches(&p));
    }
}
