//! Trigram-based similarity matching for fuzzy catalog search.
//!
//! Uses the `trigram` crate so that a search term with a typo still finds
//! the material or mentor whose title or description it was meant for.

use trigram::similarity;

/// Default similarity threshold for fuzzy matching.
pub const DEFAULT_THRESHOLD: f64 = 0.3;

/// Which field contributed the highest similarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchedField {
    Title,
    Description,
    /// Both matched equally (or no match).
    Both,
}

/// Compute trigram similarity between two strings.
///
/// Returns a value between 0.0 (no similarity) and 1.0 (identical after normalization).
pub fn compute_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    f64::from(similarity(&a.to_lowercase(), &b.to_lowercase()))
}

/// Highest similarity between `needle` and any word of `haystack`.
pub fn best_word_match(needle: &str, haystack: &str) -> f64 {
    if needle.is_empty() || haystack.is_empty() {
        return 0.0;
    }

    let needle_lower = needle.to_lowercase();

    haystack
        .split(|c: char| !c.is_alphanumeric() && c != '-' && c != '_')
        .filter(|word| word.chars().count() >= 3)
        .map(|word| f64::from(similarity(&needle_lower, &word.to_lowercase())))
        .fold(0.0, f64::max)
}

/// Match a query against an item's title and description.
///
/// The title is compared whole and word by word; the description word by word.
pub fn match_item(query: &str, title: &str, description: Option<&str>) -> (f64, MatchedField) {
    let title_score = compute_similarity(query, title).max(best_word_match(query, title));

    let desc_score = description
        .map(|d| best_word_match(query, d))
        .unwrap_or(0.0);

    if title_score > desc_score {
        (title_score, MatchedField::Title)
    } else if title_score < desc_score {
        (desc_score, MatchedField::Description)
    } else {
        (title_score, MatchedField::Both)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_similarity_identical() {
        assert!((compute_similarity("kubernetes", "Kubernetes") - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_compute_similarity_typo() {
        let score = compute_similarity("kubernets", "kubernetes");
        assert!(score >= 0.5, "Expected high similarity for typo, got {score}");
    }

    #[test]
    fn test_compute_similarity_unrelated() {
        let score = compute_similarity("sourdough", "frontend");
        assert!(score < 0.3, "Expected low similarity, got {score}");
    }

    #[test]
    fn test_compute_similarity_empty() {
        assert_eq!(compute_similarity("", "test"), 0.0);
        assert_eq!(compute_similarity("test", ""), 0.0);
    }

    #[test]
    fn test_best_word_match() {
        let haystack = "Container orchestration with Kubernetes";
        let score = best_word_match("kubernetes", haystack);
        assert!(score > 0.9, "Expected exact word match, got {score}");
        assert_eq!(best_word_match("kubernetes", "a b c"), 0.0);
    }

    #[test]
    fn test_match_item_title() {
        let (score, field) = match_item("docker", "Docker in practice", Some("Ship images"));
        assert!(score > 0.9, "Expected title match, got {score}");
        assert_eq!(field, MatchedField::Title);
    }

    #[test]
    fn test_match_item_description() {
        let (score, field) = match_item(
            "orchestration",
            "Cluster basics",
            Some("Container orchestration explained"),
        );
        assert!(score > 0.9);
        assert_eq!(field, MatchedField::Description);
    }

    #[test]
    fn test_match_item_no_match() {
        let (score, field) = match_item("zzz", "", None);
        assert_eq!(score, 0.0);
        assert_eq!(field, MatchedField::Both);
    }
}
