//! Hybrid recommendations combining collaborative and content signals.

pub mod blend;
pub mod collaborative;
pub mod content;
mod explainer;
pub mod rank;
pub mod similarity;

pub use blend::{Blender, ScoreBlender};
pub use collaborative::SimilarityTable;
pub use explainer::{generate_explanation, summarize_recommendations};
pub use rank::{Eligibility, Pagination, RecommendationFilters, SearchMode, ValidatedFilters};
pub use similarity::{compute_similarity, match_item, MatchedField, DEFAULT_THRESHOLD};

use crate::error::SignalSource;
use crate::signals::ItemKind;
use crate::types::Score;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The three scores the caller renders for each result.
///
/// `final_score` is a deterministic, monotonic function of the two
/// component scores for fixed blend weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub item_id: String,
    pub collaborative_score: Score,
    pub content_based_score: Score,
    pub final_score: Score,
}

/// A ranked result with the display fields the caller needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub scores: ScoredResult,
    pub kind: ItemKind,
    pub title: String,
    pub description: String,
    pub owner_id: String,
    pub tags: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_years: Option<u32>,
    pub created_at: DateTime<Utc>,
    /// Human-readable explanation.
    pub explanation: String,
    /// Recommendation source signals.
    pub signals: Vec<RecommendationSignal>,
}

/// One page of ranked recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationPage {
    pub items: Vec<Recommendation>,
    /// Eligible candidates before pagination.
    pub total_count: usize,
    pub page_number: usize,
    pub page_size: usize,
    pub total_pages: usize,
    /// Collaborative signal was absent; ranking used content only.
    pub cold_start: bool,
    /// Signal sources that could not be read for this request.
    pub degraded_sources: Vec<SignalSource>,
    pub summary: String,
}

/// Signals that contribute to a recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RecommendationSignal {
    /// Candidate shares tags/skills/industries with the mentee's profile.
    SharedInterests {
        /// Strongest shared tokens.
        matched: Vec<String>,
    },
    /// Mentees who engaged with the same items also engaged with this one.
    SimilarMentees {
        /// Items from the mentee's history that drive the affinity.
        anchors: Vec<String>,
    },
    /// No interaction history; ranked on content alone.
    ColdStart,
    /// Recently added to the catalog.
    Fresh {
        /// Age in whole days.
        days: i64,
    },
}

impl RecommendationSignal {
    /// Get a short label for this signal.
    pub fn label(&self) -> &'static str {
        match self {
            Self::SharedInterests { .. } => "shared-interests",
            Self::SimilarMentees { .. } => "similar-mentees",
            Self::ColdStart => "cold-start",
            Self::Fresh { .. } => "fresh",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_labels() {
        assert_eq!(RecommendationSignal::ColdStart.label(), "cold-start");
        assert_eq!(
            RecommendationSignal::Fresh { days: 2 }.label(),
            "fresh"
        );
    }

    #[test]
    fn test_signal_serde_is_tagged() {
        let json = serde_json::to_value(RecommendationSignal::SharedInterests {
            matched: vec!["rust".into()],
        })
        .unwrap();
        assert_eq!(json["type"], "shared-interests");
        assert_eq!(json["matched"][0], "rust");
    }

    #[test]
    fn test_scores_always_serialize_as_numbers() {
        let result = ScoredResult {
            item_id: "a".into(),
            collaborative_score: Score::zero(),
            content_based_score: Score::new(3.0),
            final_score: Score::new(3.0),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["collaborative_score"], 0.0);
        assert_eq!(json["final_score"], 3.0);
    }
}
