//! Build an interaction matrix from raw events.

use super::{InteractionMatrix, TimeRange};
use crate::signals::{InteractionEvent, InteractionKind};
use chrono::{DateTime, Utc};
use mentora_state::InteractionWeights;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Valid star-rating range for reviews.
const MIN_RATING: f64 = 1.0;
const MAX_RATING: f64 = 5.0;

/// Build an interaction matrix from a collection of events.
///
/// Repeated events of one kind on one item accumulate up to that kind's cap,
/// then the capped per-kind totals are summed. Reviews weigh their rating
/// (clamped to 1-5); views and likes use the configured constants.
pub fn build_matrix(events: &[InteractionEvent], weights: &InteractionWeights) -> InteractionMatrix {
    if events.is_empty() {
        return InteractionMatrix::default();
    }

    // (mentee, item, kind) -> uncapped accumulation
    let mut per_kind: BTreeMap<(&str, &str, InteractionKind), f64> = BTreeMap::new();
    let mut last_seen: BTreeMap<String, BTreeMap<String, DateTime<Utc>>> = BTreeMap::new();
    let mut review_counts: BTreeMap<String, BTreeMap<String, u32>> = BTreeMap::new();
    let mut aggregated = 0usize;
    let mut min_ts: Option<DateTime<Utc>> = None;
    let mut max_ts: Option<DateTime<Utc>> = None;

    for event in events {
        let weight = match event.kind {
            InteractionKind::View => weights.view,
            InteractionKind::Like => weights.like,
            InteractionKind::Review => {
                if !event.weight.is_finite() {
                    tracing::warn!(
                        target: "mentora::recommend",
                        mentee = %event.subject_id,
                        item = %event.item_id,
                        "skipping review with non-finite rating"
                    );
                    continue;
                }
                *review_counts
                    .entry(event.subject_id.clone())
                    .or_default()
                    .entry(event.item_id.clone())
                    .or_insert(0) += 1;
                event.weight.clamp(MIN_RATING, MAX_RATING)
            }
        };

        *per_kind
            .entry((event.subject_id.as_str(), event.item_id.as_str(), event.kind))
            .or_insert(0.0) += weight;
        aggregated += 1;

        // Keep latest timestamp
        let seen = last_seen
            .entry(event.subject_id.clone())
            .or_default()
            .entry(event.item_id.clone())
            .or_insert(event.occurred_at);
        if event.occurred_at > *seen {
            *seen = event.occurred_at;
        }

        min_ts = Some(min_ts.map_or(event.occurred_at, |t| t.min(event.occurred_at)));
        max_ts = Some(max_ts.map_or(event.occurred_at, |t| t.max(event.occurred_at)));
    }

    let mut matrix_weights: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
    for ((mentee, item, kind), total) in per_kind {
        let cap = match kind {
            InteractionKind::View => weights.view_cap,
            InteractionKind::Like => weights.like_cap,
            InteractionKind::Review => weights.review_cap,
        };
        *matrix_weights
            .entry(mentee.to_string())
            .or_default()
            .entry(item.to_string())
            .or_insert(0.0) += total.min(cap);
    }

    let time_range = match (min_ts, max_ts) {
        (Some(start), Some(end)) => Some(TimeRange { start, end }),
        _ => None,
    };

    InteractionMatrix {
        weights: matrix_weights,
        last_seen,
        review_counts,
        events_aggregated: aggregated,
        time_range,
    }
}

/// Pick up to `limit` other mentees who share at least one item with
/// `requester`, most recent shared interaction first.
///
/// Selection is deterministic: ties on recency fall back to mentee id.
pub fn top_neighbors_by_recency(
    requester: &str,
    shared_item_events: &[InteractionEvent],
    limit: usize,
) -> Vec<String> {
    let requester_items: HashSet<&str> = shared_item_events
        .iter()
        .filter(|e| e.subject_id == requester)
        .map(|e| e.item_id.as_str())
        .collect();

    let mut latest: HashMap<&str, DateTime<Utc>> = HashMap::new();
    for event in shared_item_events {
        if event.subject_id == requester {
            continue;
        }
        // Callers may pass events for the requester's items only, in which
        // case the requester's own rows are absent and every item is shared.
        if !requester_items.is_empty() && !requester_items.contains(event.item_id.as_str()) {
            continue;
        }
        let entry = latest
            .entry(event.subject_id.as_str())
            .or_insert(event.occurred_at);
        if event.occurred_at > *entry {
            *entry = event.occurred_at;
        }
    }

    let mut ranked: Vec<(&str, DateTime<Utc>)> = latest.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(limit)
        .map(|(id, _)| id.to_string())
        .collect()
}
