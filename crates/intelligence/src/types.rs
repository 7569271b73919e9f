//! Common types shared across intelligence modules.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Upper bound of every score the engine reports.
pub const MAX_SCORE: f64 = 10.0;

/// Score clamped to the [0.0, 10.0] display range.
///
/// This newtype ensures reported scores are always valid by clamping
/// any input to the valid range during construction. Non-finite input
/// (NaN, infinities) becomes 0.
///
/// # Examples
///
/// ```
/// use mentora_intelligence::Score;
///
/// // Normal values are preserved
/// let s = Score::new(7.5);
/// assert_eq!(s.value(), 7.5);
///
/// // Values are clamped to valid range
/// assert_eq!(Score::new(12.0).value(), 10.0);
/// assert_eq!(Score::new(-3.0).value(), 0.0);
/// assert_eq!(Score::new(f64::NAN).value(), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Score(f64);

impl Score {
    /// Create a new Score, clamping the value to [0.0, 10.0].
    #[must_use]
    pub fn new(value: f64) -> Self {
        if value.is_finite() {
            Self(value.clamp(0.0, MAX_SCORE))
        } else {
            Self(0.0)
        }
    }

    /// Map a unit-interval similarity (0.0 - 1.0) onto the score range.
    #[must_use]
    pub fn from_unit(similarity: f64) -> Self {
        Self::new(similarity * MAX_SCORE)
    }

    /// Get the inner score value.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.0
    }

    #[must_use]
    pub fn zero() -> Self {
        Self(0.0)
    }

    #[must_use]
    pub fn max() -> Self {
        Self(MAX_SCORE)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }

    /// Total order over scores; construction rules out NaN.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Default for Score {
    fn default() -> Self {
        Self(0.0)
    }
}

impl From<f64> for Score {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<Score> for f64 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
