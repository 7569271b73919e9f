//! Failure taxonomy for the recommendation pipeline.
//!
//! Only [`RecommendError::InvalidFilter`] ever reaches the caller of
//! [`crate::RecommendationEngine::get_recommendations`]. Unavailable signal
//! sources and per-candidate scoring failures are absorbed by the engine and
//! degrade the ranking instead.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A collaborator read the engine depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalSource {
    /// The requesting mentee's own interaction events.
    Interactions,
    /// Events of neighbor mentees used for item-item similarity.
    Neighbors,
    /// The requesting mentee's declared profile.
    Profile,
    /// Candidate items of the requested kind.
    Catalog,
    /// Catalog entries for items the mentee already interacted with.
    InteractedItems,
    /// Mentor profile details used to enrich mentor candidates.
    MentorProfiles,
    /// Prior bookings of the requesting mentee.
    Bookings,
}

impl SignalSource {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Interactions => "interactions",
            Self::Neighbors => "neighbors",
            Self::Profile => "profile",
            Self::Catalog => "catalog",
            Self::InteractedItems => "interacted-items",
            Self::MentorProfiles => "mentor-profiles",
            Self::Bookings => "bookings",
        }
    }
}

impl fmt::Display for SignalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RecommendError {
    #[error("invalid filter `{field}`: {reason}")]
    InvalidFilter { field: &'static str, reason: String },
    #[error("{signal} unavailable: {reason}")]
    DataUnavailable { signal: SignalSource, reason: String },
    #[error("cannot score `{item_id}`: {reason}")]
    Computation { item_id: String, reason: String },
}

impl RecommendError {
    pub fn invalid_filter(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidFilter {
            field,
            reason: reason.into(),
        }
    }

    pub fn unavailable(signal: SignalSource, reason: impl fmt::Display) -> Self {
        Self::DataUnavailable {
            signal,
            reason: reason.to_string(),
        }
    }

    pub fn computation(item_id: &str, reason: impl Into<String>) -> Self {
        Self::Computation {
            item_id: item_id.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = RecommendError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = RecommendError::invalid_filter("tags", "blank tag");
        assert_eq!(err.to_string(), "invalid filter `tags`: blank tag");

        let err = RecommendError::unavailable(SignalSource::Catalog, "timed out");
        assert_eq!(err.to_string(), "catalog unavailable: timed out");

        let err = RecommendError::computation("mat-1", "non-finite weight");
        assert_eq!(err.to_string(), "cannot score `mat-1`: non-finite weight");
    }

    #[test]
    fn test_signal_source_serializes_kebab_case() {
        let json = serde_json::to_string(&SignalSource::InteractedItems).unwrap();
        assert_eq!(json, "\"interacted-items\"");
    }
}
