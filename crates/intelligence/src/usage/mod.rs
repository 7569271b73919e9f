//! Interaction aggregation: raw mentee events into weighted item affinities.

mod aggregate;

pub use aggregate::{build_matrix, top_neighbors_by_recency};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregated mentee -> item affinities.
///
/// All maps are ordered so that every walk over the matrix, and therefore
/// every floating-point sum derived from it, is reproducible.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionMatrix {
    /// Aggregated weight (mentee -> item -> weight).
    pub weights: BTreeMap<String, BTreeMap<String, f64>>,
    /// Latest interaction time (mentee -> item -> timestamp).
    pub last_seen: BTreeMap<String, BTreeMap<String, DateTime<Utc>>>,
    /// Number of reviews written (mentee -> item -> count).
    pub review_counts: BTreeMap<String, BTreeMap<String, u32>>,
    /// Events that contributed a weight.
    pub events_aggregated: usize,
    /// Time range of aggregated events.
    pub time_range: Option<TimeRange>,
}

/// Time range for aggregated events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl InteractionMatrix {
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Item affinities for one mentee.
    pub fn weights_for(&self, mentee_id: &str) -> Option<&BTreeMap<String, f64>> {
        self.weights.get(mentee_id)
    }

    pub fn weight(&self, mentee_id: &str, item_id: &str) -> f64 {
        self.weights
            .get(mentee_id)
            .and_then(|items| items.get(item_id))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn review_count(&self, mentee_id: &str, item_id: &str) -> u32 {
        self.review_counts
            .get(mentee_id)
            .and_then(|items| items.get(item_id))
            .copied()
            .unwrap_or(0)
    }

    pub fn mentee_count(&self) -> usize {
        self.weights.len()
    }

    /// Transpose into item -> (mentee -> weight), the column view used for
    /// item-item similarity.
    pub fn item_columns(&self) -> BTreeMap<String, BTreeMap<String, f64>> {
        let mut columns: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
        for (mentee, items) in &self.weights {
            for (item, &weight) in items {
                columns
                    .entry(item.clone())
                    .or_default()
                    .insert(mentee.clone(), weight);
            }
        }
        columns
    }

    /// Merge another matrix into this one; `other` wins for mentees present in both.
    pub fn merge(&mut self, other: InteractionMatrix) {
        for (mentee, items) in other.weights {
            self.weights.insert(mentee, items);
        }
        for (mentee, items) in other.last_seen {
            self.last_seen.insert(mentee, items);
        }
        for (mentee, items) in other.review_counts {
            self.review_counts.insert(mentee, items);
        }
        self.events_aggregated += other.events_aggregated;
        self.time_range = match (self.time_range, other.time_range) {
            (Some(a), Some(b)) => Some(TimeRange {
                start: a.start.min(b.start),
                end: a.end.max(b.end),
            }),
            (a, b) => a.or(b),
        };
    }
}
