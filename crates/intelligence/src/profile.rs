//! Sparse tag/skill/industry vectors for candidates and mentees.

use crate::signals::{CandidateItem, MenteeProfile};
use mentora_state::ProfileWeights;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Sparse token -> weight mapping.
///
/// Backed by a `BTreeMap` so dot products always sum in the same order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentVector {
    weights: BTreeMap<String, f64>,
}

/// Canonical form of a tag, skill or language: trimmed and lower-cased.
pub fn normalize_token(raw: &str) -> Option<String> {
    let token = raw.trim().to_lowercase();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

impl ContentVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Presence vector: every distinct token weighs 1.
    pub fn from_tokens<'a>(tokens: impl IntoIterator<Item = &'a str>) -> Self {
        let mut vector = Self::new();
        for token in tokens.into_iter().filter_map(normalize_token) {
            vector.weights.insert(token, 1.0);
        }
        vector
    }

    /// Add `weight` to `token`, accumulating with any existing weight.
    pub fn add(&mut self, token: &str, weight: f64) {
        if let Some(token) = normalize_token(token) {
            *self.weights.entry(token).or_insert(0.0) += weight;
        }
    }

    pub fn get(&self, token: &str) -> f64 {
        self.weights.get(token).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// True when no token carries weight.
    pub fn is_zero(&self) -> bool {
        self.weights.values().all(|&w| w == 0.0)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.weights.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(k, &v)| (k.as_str(), v))
    }

    pub fn sum(&self) -> f64 {
        self.weights.values().sum()
    }

    pub fn norm(&self) -> f64 {
        self.weights.values().map(|w| w * w).sum::<f64>().sqrt()
    }

    /// Scale so the weights sum to 1. A zero vector stays zero.
    pub fn normalized(mut self) -> Self {
        let total = self.sum();
        if total > 0.0 && total.is_finite() {
            for w in self.weights.values_mut() {
                *w /= total;
            }
        }
        self
    }

    /// First token whose weight is negative or non-finite.
    pub fn malformed_token(&self) -> Option<&str> {
        self.weights
            .iter()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
            .map(|(k, _)| k.as_str())
    }

    /// Cosine similarity in [0, 1]; 0 when either vector is zero.
    pub fn cosine(&self, other: &ContentVector) -> f64 {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        let dot: f64 = small
            .weights
            .iter()
            .filter_map(|(token, &w)| large.weights.get(token).map(|&o| w * o))
            .sum();
        let denom = self.norm() * other.norm();
        if denom == 0.0 || !denom.is_finite() {
            return 0.0;
        }
        (dot / denom).clamp(0.0, 1.0)
    }

    /// Shared tokens ordered by combined weight, strongest first.
    pub fn top_overlap(&self, other: &ContentVector, limit: usize) -> Vec<String> {
        let mut shared: Vec<(&str, f64)> = self
            .weights
            .iter()
            .filter_map(|(token, &w)| {
                other
                    .weights
                    .get(token)
                    .filter(|&&o| o > 0.0 && w > 0.0)
                    .map(|&o| (token.as_str(), w * o))
            })
            .collect();
        shared.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        shared
            .into_iter()
            .take(limit)
            .map(|(t, _)| t.to_string())
            .collect()
    }
}

/// Item vector: union of tags, skills, programming languages and industries.
pub fn item_vector(item: &CandidateItem) -> ContentVector {
    let tokens = item
        .tags
        .iter()
        .chain(item.skills.iter())
        .chain(item.programming_languages.iter())
        .map(String::as_str)
        .chain(item.industries.iter().map(|i| i.slug()));
    ContentVector::from_tokens(tokens)
}

/// Build item vectors for a batch of candidates, keyed by item id.
pub fn item_vectors<'a>(
    items: impl IntoIterator<Item = &'a CandidateItem>,
) -> HashMap<String, ContentVector> {
    items
        .into_iter()
        .map(|item| (item.id.clone(), item_vector(item)))
        .collect()
}

/// Mentee vector: declared interests plus tags of everything interacted with.
///
/// Declared skills, languages and industries each add `declared_weight`
/// once. Every interacted item adds its tokens scaled by the aggregated
/// interaction weight. The result is normalized to sum to 1 so heavy users
/// do not dominate by volume alone.
pub fn mentee_vector(
    profile: &MenteeProfile,
    history: Option<&BTreeMap<String, f64>>,
    interacted_items: &HashMap<String, ContentVector>,
    weights: &ProfileWeights,
) -> ContentVector {
    let mut vector = ContentVector::new();

    let declared: BTreeSet<String> = profile
        .skills
        .iter()
        .chain(profile.programming_languages.iter())
        .map(String::as_str)
        .chain(profile.industries.iter().map(|i| i.slug()))
        .filter_map(normalize_token)
        .collect();
    for token in &declared {
        vector.add(token, weights.declared_weight);
    }

    if let Some(history) = history {
        for (item_id, &interaction_weight) in history {
            let Some(item) = interacted_items.get(item_id) else {
                continue;
            };
            for (token, token_weight) in item.iter() {
                vector.add(token, token_weight * interaction_weight);
            }
        }
    }

    vector.normalized()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::{Industry, ItemKind};
    use chrono::{TimeZone, Utc};

    fn item(id: &str, tags: &[&str]) -> CandidateItem {
        CandidateItem {
            id: id.to_string(),
            kind: ItemKind::Material,
            owner_id: "owner".to_string(),
            title: id.to_string(),
            description: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            skills: BTreeSet::new(),
            programming_languages: BTreeSet::new(),
            industries: BTreeSet::new(),
            item_type: None,
            experience_years: None,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_normalize_token() {
        assert_eq!(normalize_token("  React "), Some("react".to_string()));
        assert_eq!(normalize_token("   "), None);
    }

    #[test]
    fn test_item_vector_is_presence_union() {
        let mut candidate = item("a", &["React", "react", "frontend"]);
        candidate.skills.insert("TypeScript".into());
        candidate.industries.insert(Industry::Ecommerce);
        let v = item_vector(&candidate);
        assert_eq!(v.len(), 4);
        assert_eq!(v.get("react"), 1.0);
        assert_eq!(v.get("typescript"), 1.0);
        assert_eq!(v.get("ecommerce"), 1.0);
    }

    #[test]
    fn test_cosine_identical_and_disjoint() {
        let a = ContentVector::from_tokens(["rust", "tokio"]);
        let b = ContentVector::from_tokens(["rust", "tokio"]);
        let c = ContentVector::from_tokens(["cooking"]);
        assert!((a.cosine(&b) - 1.0).abs() < 1e-12);
        assert_eq!(a.cosine(&c), 0.0);
    }

    #[test]
    fn test_cosine_zero_vector_is_zero() {
        let a = ContentVector::from_tokens(["rust"]);
        let zero = ContentVector::new();
        assert_eq!(a.cosine(&zero), 0.0);
        assert_eq!(zero.cosine(&zero), 0.0);
    }

    #[test]
    fn test_normalized_sums_to_one() {
        let mut v = ContentVector::new();
        v.add("a", 3.0);
        v.add("b", 1.0);
        let n = v.normalized();
        assert!((n.sum() - 1.0).abs() < 1e-12);
        assert!((n.get("a") - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_normalized_zero_stays_zero() {
        let n = ContentVector::new().normalized();
        assert!(n.is_zero());
    }

    #[test]
    fn test_malformed_token_detection() {
        let mut v = ContentVector::new();
        v.add("ok", 1.0);
        assert_eq!(v.malformed_token(), None);
        v.add("bad", f64::NAN);
        assert_eq!(v.malformed_token(), Some("bad"));
    }

    #[test]
    fn test_mentee_vector_without_signals_is_zero() {
        let profile = MenteeProfile::anonymous("m");
        let v = mentee_vector(&profile, None, &HashMap::new(), &ProfileWeights::default());
        assert!(v.is_zero());
    }

    #[test]
    fn test_mentee_vector_declared_and_implicit() {
        let mut profile = MenteeProfile::anonymous("m");
        profile.skills.insert("Docker".into());
        profile.programming_languages.insert("docker".into());
        profile.industries.insert(Industry::Software);

        let items = item_vectors([&item("x", &["react"])]);
        let history = BTreeMap::from([("x".to_string(), 2.0), ("unknown".to_string(), 9.0)]);

        let v = mentee_vector(&profile, Some(&history), &items, &ProfileWeights::default());
        // docker: 2 (declared once), software: 2, react: 2 -> each 1/3 after normalization
        assert!((v.sum() - 1.0).abs() < 1e-12);
        assert!((v.get("docker") - 1.0 / 3.0).abs() < 1e-12);
        assert!((v.get("react") - 1.0 / 3.0).abs() < 1e-12);
        assert!((v.get("software") - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_top_overlap_orders_by_weight() {
        let mut mentee = ContentVector::new();
        mentee.add("react", 0.6);
        mentee.add("docker", 0.3);
        mentee.add("go", 0.1);
        let candidate = ContentVector::from_tokens(["docker", "react", "css"]);
        assert_eq!(
            mentee.top_overlap(&candidate, 5),
            vec!["react".to_string(), "docker".to_string()]
        );
        assert_eq!(mentee.top_overlap(&candidate, 1), vec!["react".to_string()]);
    }
}
