//! Content-based scoring: cosine of mentee and candidate vectors on the 0-10 scale.

use crate::error::{RecommendError, Result};
use crate::profile::ContentVector;
use crate::types::Score;

/// Score one candidate against the mentee's content profile.
///
/// A zero vector on either side scores 0. Vectors carrying negative or
/// non-finite weights are rejected so the caller can isolate the candidate.
pub fn content_score(item_id: &str, mentee: &ContentVector, item: &ContentVector) -> Result<Score> {
    if let Some(token) = mentee.malformed_token() {
        return Err(RecommendError::computation(
            item_id,
            format!("mentee vector has malformed weight for `{token}`"),
        ));
    }
    if let Some(token) = item.malformed_token() {
        return Err(RecommendError::computation(
            item_id,
            format!("item vector has malformed weight for `{token}`"),
        ));
    }
    if mentee.is_zero() || item.is_zero() {
        return Ok(Score::zero());
    }
    Ok(Score::from_unit(mentee.cosine(item)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_vectors_score_ten() {
        let v = ContentVector::from_tokens(["rust", "async"]);
        let score = content_score("a", &v, &v).unwrap();
        assert!((score.value() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_vectors_score_zero() {
        let v = ContentVector::from_tokens(["rust"]);
        let zero = ContentVector::new();
        assert_eq!(content_score("a", &zero, &v).unwrap(), Score::zero());
        assert_eq!(content_score("a", &v, &zero).unwrap(), Score::zero());
    }

    #[test]
    fn test_partial_overlap() {
        let mut mentee = ContentVector::new();
        mentee.add("react", 0.5);
        mentee.add("docker", 0.5);
        let item = ContentVector::from_tokens(["react"]);
        let score = content_score("a", &mentee, &item).unwrap();
        // cos = 0.5 / (sqrt(0.5) * 1)
        assert!((score.value() - 10.0 * 0.5 / 0.5f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_malformed_vector_is_a_computation_error() {
        let mut mentee = ContentVector::new();
        mentee.add("react", f64::INFINITY);
        let item = ContentVector::from_tokens(["react"]);
        let err = content_score("mat-1", &mentee, &item).unwrap_err();
        assert!(matches!(err, RecommendError::Computation { ref item_id, .. } if item_id == "mat-1"));
    }
}
