//! Rapport value object (0-100 scale).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Rapport at or above which the client is won over.
pub const CLOSE_THRESHOLD: u8 = 80;

/// Rapport at or below which the client walks away.
pub const LOSS_THRESHOLD: u8 = 10;

/// The simulated client's receptiveness, always within 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rapport(u8);

impl Rapport {
    pub const MIN: Self = Self(0);
    pub const MAX: Self = Self(100);

    /// Creates a Rapport, clamping to valid range.
    pub fn new(value: u8) -> Self {
        Self(value.min(100))
    }

    /// Returns the value as u8.
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Applies a signed impact, clamping to 0..=100.
    pub fn apply(&self, impact: i32) -> Self {
        let next = i32::from(self.0).saturating_add(impact).clamp(0, 100);
        Self(next as u8)
    }

    /// True once the client is ready to buy or commit.
    pub fn is_won(&self) -> bool {
        self.0 >= CLOSE_THRESHOLD
    }

    /// True once the client is lost.
    pub fn is_lost(&self) -> bool {
        self.0 <= LOSS_THRESHOLD
    }
}

impl fmt::Display for Rapport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
