//! Blend component scores into the final 0-10 score.

use super::ScoredResult;
use crate::types::Score;
use mentora_state::{BlendWeights, RecommendSettings};

/// Trait for combining component scores.
pub trait Blender {
    /// Final score for one candidate under the given weights.
    fn blend(&self, weights: &BlendWeights, collaborative: Score, content: Score) -> Score;
}

/// Linear blender with a cold-start fallback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBlender {
    warm: BlendWeights,
    cold: BlendWeights,
}

impl Default for ScoreBlender {
    fn default() -> Self {
        Self {
            warm: BlendWeights::warm(),
            cold: BlendWeights::cold_start(),
        }
    }
}

impl ScoreBlender {
    pub fn new(warm: BlendWeights, cold: BlendWeights) -> Self {
        Self { warm, cold }
    }

    pub fn from_settings(settings: &RecommendSettings) -> Self {
        Self::new(settings.blend, settings.cold_start)
    }

    /// Cold start means collaborative signal is absent for every candidate.
    pub fn is_cold_start(collaborative: &[Score]) -> bool {
        collaborative.iter().all(Score::is_zero)
    }

    /// Weights for this request, plus whether the cold-start set was chosen.
    pub fn weights_for(&self, collaborative: &[Score]) -> (BlendWeights, bool) {
        if Self::is_cold_start(collaborative) {
            (self.cold, true)
        } else {
            (self.warm, false)
        }
    }

    /// Blend a request's worth of `(item_id, collaborative, content)` triples.
    ///
    /// Returns the scored results in input order and whether cold-start
    /// weights were used.
    pub fn blend_all(&self, components: Vec<(String, Score, Score)>) -> (Vec<ScoredResult>, bool) {
        let collaborative: Vec<Score> = components.iter().map(|(_, c, _)| *c).collect();
        let (weights, cold_start) = self.weights_for(&collaborative);
        let results = components
            .into_iter()
            .map(|(item_id, collaborative, content)| ScoredResult {
                final_score: self.blend(&weights, collaborative, content),
                item_id,
                collaborative_score: collaborative,
                content_based_score: content,
            })
            .collect();
        (results, cold_start)
    }
}

impl Blender for ScoreBlender {
    fn blend(&self, weights: &BlendWeights, collaborative: Score, content: Score) -> Score {
        Score::new(weights.collaborative * collaborative.value() + weights.content * content.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn components(pairs: &[(f64, f64)]) -> Vec<(String, Score, Score)> {
        pairs
            .iter()
            .enumerate()
            .map(|(i, &(c, b))| (format!("item-{i}"), Score::new(c), Score::new(b)))
            .collect()
    }

    #[test]
    fn test_warm_blend_is_weighted_average() {
        let blender = ScoreBlender::default();
        let (results, cold) = blender.blend_all(components(&[(8.0, 4.0), (0.0, 6.0)]));
        assert!(!cold);
        assert!((results[0].final_score.value() - 6.0).abs() < 1e-12);
        assert!((results[1].final_score.value() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_cold_start_uses_content_only() {
        let blender = ScoreBlender::default();
        let (results, cold) = blender.blend_all(components(&[(0.0, 7.5), (0.0, 0.0)]));
        assert!(cold);
        assert_eq!(results[0].final_score, results[0].content_based_score);
        assert_eq!(results[1].final_score, Score::zero());
    }

    #[test]
    fn test_blend_is_clamped() {
        let blender = ScoreBlender::new(
            BlendWeights {
                collaborative: 1.0,
                content: 1.0,
            },
            BlendWeights::cold_start(),
        );
        let (results, _) = blender.blend_all(components(&[(9.0, 9.0)]));
        assert_eq!(results[0].final_score.value(), 10.0);
    }

    #[test]
    fn test_blend_is_monotonic_in_each_component() {
        let blender = ScoreBlender::default();
        let w = BlendWeights::warm();
        let base = blender.blend(&w, Score::new(3.0), Score::new(3.0));
        assert!(blender.blend(&w, Score::new(4.0), Score::new(3.0)) > base);
        assert!(blender.blend(&w, Score::new(3.0), Score::new(4.0)) > base);
    }

    #[test]
    fn test_from_settings() {
        let mut settings = RecommendSettings::default();
        settings.blend.collaborative = 0.8;
        settings.blend.content = 0.2;
        let blender = ScoreBlender::from_settings(&settings);
        let (weights, cold) = blender.weights_for(&[Score::new(1.0)]);
        assert!(!cold);
        assert_eq!(weights.collaborative, 0.8);
    }
}
