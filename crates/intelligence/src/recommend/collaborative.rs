//! Item-based collaborative filtering.
//!
//! Similarity between two items is the cosine of their interaction columns
//! (one weight per mentee who touched the item). A mentee's affinity for a
//! candidate is the similarity-weighted sum over the items already in their
//! history, so the cost scales with catalog overlap rather than user count.

use crate::error::{RecommendError, Result};
use crate::types::Score;
use crate::usage::InteractionMatrix;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Raw ranges narrower than this are treated as a single value.
const DEGENERATE_RANGE: f64 = 1e-12;

/// Sparse symmetric item-item cosine table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimilarityTable {
    rows: BTreeMap<String, BTreeMap<String, f64>>,
}

impl SimilarityTable {
    /// Build the table from an interaction matrix.
    ///
    /// Rows are computed in parallel. Each row sums its dot products over
    /// mentees in id order, so the table is identical across runs and
    /// `similarity(a, b) == similarity(b, a)` exactly.
    pub fn build(matrix: &InteractionMatrix) -> Self {
        let columns = matrix.item_columns();
        let norms: BTreeMap<&str, f64> = columns
            .iter()
            .map(|(item, col)| {
                let norm = col.values().map(|w| w * w).sum::<f64>().sqrt();
                (item.as_str(), norm)
            })
            .collect();

        let rows: Vec<(String, BTreeMap<String, f64>)> = columns
            .par_iter()
            .map(|(item, column)| {
                let mut dots: BTreeMap<&str, f64> = BTreeMap::new();
                for (mentee, &w_item) in column {
                    let Some(history) = matrix.weights_for(mentee) else {
                        continue;
                    };
                    for (other, &w_other) in history {
                        if other == item {
                            continue;
                        }
                        *dots.entry(other.as_str()).or_insert(0.0) += w_item * w_other;
                    }
                }

                let norm_item = norms.get(item.as_str()).copied().unwrap_or(0.0);
                let row: BTreeMap<String, f64> = dots
                    .into_iter()
                    .filter_map(|(other, dot)| {
                        let norm_other = norms.get(other).copied().unwrap_or(0.0);
                        let denom = norm_item * norm_other;
                        if denom <= 0.0 || !denom.is_finite() {
                            return None;
                        }
                        let sim = dot / denom;
                        (sim > 0.0).then(|| (other.to_string(), sim.min(1.0)))
                    })
                    .collect();
                (item.clone(), row)
            })
            .collect();

        Self {
            rows: rows.into_iter().filter(|(_, row)| !row.is_empty()).collect(),
        }
    }

    /// Cosine similarity of two items; 0 when they share no mentee.
    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        self.rows
            .get(a)
            .and_then(|row| row.get(b))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn row(&self, item: &str) -> Option<&BTreeMap<String, f64>> {
        self.rows.get(item)
    }

    /// Items with at least one positive similarity.
    pub fn item_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of stored (directed) similarity entries.
    pub fn entry_count(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Unnormalized affinity of the mentee for `candidate`.
///
/// Sum over history items `j` of `similarity(candidate, j) * weight(j)`.
pub fn raw_score(
    candidate: &str,
    history: &BTreeMap<String, f64>,
    table: &SimilarityTable,
) -> Result<f64> {
    let Some(row) = table.row(candidate) else {
        return Ok(0.0);
    };
    let mut total = 0.0;
    for (item, &weight) in history {
        if item == candidate {
            continue;
        }
        if let Some(&sim) = row.get(item) {
            total += sim * weight;
        }
    }
    if !total.is_finite() {
        return Err(RecommendError::computation(
            candidate,
            "collaborative score is not finite",
        ));
    }
    Ok(total)
}

/// History items contributing most to the candidate's affinity.
pub fn top_anchors(
    candidate: &str,
    history: &BTreeMap<String, f64>,
    table: &SimilarityTable,
    limit: usize,
) -> Vec<String> {
    let Some(row) = table.row(candidate) else {
        return Vec::new();
    };
    let mut contributions: Vec<(&str, f64)> = history
        .iter()
        .filter(|(item, _)| item.as_str() != candidate)
        .filter_map(|(item, &w)| row.get(item).map(|&sim| (item.as_str(), sim * w)))
        .filter(|(_, c)| *c > 0.0)
        .collect();
    contributions.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    contributions
        .into_iter()
        .take(limit)
        .map(|(item, _)| item.to_string())
        .collect()
}

/// Min-max scale raw affinities onto [0, 10] within one request.
///
/// All-zero input stays zero (collaborative signal absent). When every
/// positive score is equal, positives map to 10 and zeros stay 0.
pub fn normalize_min_max(raw: &[f64]) -> Vec<Score> {
    let max = raw.iter().copied().fold(0.0_f64, f64::max);
    if max <= 0.0 {
        return vec![Score::zero(); raw.len()];
    }
    let min = raw.iter().copied().fold(f64::INFINITY, f64::min).max(0.0);
    let range = max - min;
    raw.iter()
        .map(|&r| {
            if range < DEGENERATE_RANGE {
                if r > 0.0 {
                    Score::max()
                } else {
                    Score::zero()
                }
            } else {
                Score::from_unit((r - min) / range)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::{InteractionEvent, InteractionKind};
    use crate::usage::build_matrix;
    use chrono::{TimeZone, Utc};
    use mentora_state::InteractionWeights;

    fn view(subject: &str, item: &str) -> InteractionEvent {
        InteractionEvent {
            subject_id: subject.to_string(),
            item_id: item.to_string(),
            kind: InteractionKind::View,
            weight: 1.0,
            occurred_at: Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
        }
    }

    fn table(events: &[InteractionEvent]) -> (InteractionMatrix, SimilarityTable) {
        let matrix = build_matrix(events, &InteractionWeights::default());
        let table = SimilarityTable::build(&matrix);
        (matrix, table)
    }

    #[test]
    fn test_similarity_of_co_viewed_items() {
        let (_, t) = table(&[view("a", "x"), view("a", "y"), view("b", "x"), view("b", "y")]);
        assert!((t.similarity("x", "y") - 1.0).abs() < 1e-12);
        assert_eq!(t.similarity("x", "x"), 0.0);
        assert_eq!(t.similarity("x", "missing"), 0.0);
    }

    #[test]
    fn test_similarity_is_symmetric() {
        let events = vec![
            view("a", "x"),
            view("a", "y"),
            view("b", "x"),
            view("c", "y"),
            view("c", "z"),
            view("d", "x"),
            view("d", "z"),
        ];
        let (_, t) = table(&events);
        for (p, q) in [("x", "y"), ("x", "z"), ("y", "z")] {
            assert_eq!(t.similarity(p, q), t.similarity(q, p));
        }
        assert!((t.similarity("x", "y") - 1.0 / 6f64.sqrt() * 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_items_have_no_row() {
        let (_, t) = table(&[view("a", "x"), view("b", "y")]);
        assert!(t.is_empty());
        assert_eq!(t.entry_count(), 0);
    }

    #[test]
    fn test_build_is_deterministic() {
        let events: Vec<_> = (0..30)
            .map(|i| view(&format!("m{}", i % 7), &format!("i{}", i % 5)))
            .collect();
        let (_, first) = table(&events);
        let (_, second) = table(&events);
        assert_eq!(first, second);
    }

    #[test]
    fn test_raw_score_weights_history() {
        let events = vec![view("a", "x"), view("a", "y"), view("b", "x"), view("b", "y")];
        let (_, t) = table(&events);
        let history = BTreeMap::from([("x".to_string(), 3.0)]);
        assert!((raw_score("y", &history, &t).unwrap() - 3.0).abs() < 1e-12);
        // Candidate equal to a history item does not count itself
        assert_eq!(raw_score("x", &history, &t).unwrap(), 0.0);
        assert_eq!(raw_score("unseen", &history, &t).unwrap(), 0.0);
    }

    #[test]
    fn test_raw_score_empty_history_is_zero() {
        let (_, t) = table(&[view("a", "x"), view("a", "y")]);
        assert_eq!(raw_score("y", &BTreeMap::new(), &t).unwrap(), 0.0);
    }

    #[test]
    fn test_top_anchors() {
        let events = vec![
            view("a", "x"),
            view("a", "y"),
            view("a", "z"),
            view("b", "x"),
            view("b", "z"),
        ];
        let (_, t) = table(&events);
        let history = BTreeMap::from([("x".to_string(), 1.0), ("y".to_string(), 1.0)]);
        let anchors = top_anchors("z", &history, &t, 1);
        assert_eq!(anchors, vec!["x".to_string()]);
    }

    #[test]
    fn test_normalize_all_zero() {
        let scores = normalize_min_max(&[0.0, 0.0, 0.0]);
        assert!(scores.iter().all(Score::is_zero));
    }

    #[test]
    fn test_normalize_min_max_range() {
        let scores = normalize_min_max(&[0.0, 1.0, 2.0]);
        assert_eq!(scores[0].value(), 0.0);
        assert!((scores[1].value() - 5.0).abs() < 1e-12);
        assert_eq!(scores[2].value(), 10.0);
    }

    #[test]
    fn test_normalize_degenerate_range() {
        let scores = normalize_min_max(&[2.5, 2.5]);
        assert!(scores.iter().all(|s| s.value() == 10.0));
        assert!(normalize_min_max(&[]).is_empty());
    }
}
