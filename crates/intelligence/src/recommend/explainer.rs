//! Generate human-readable explanations for recommendations.

use super::RecommendationSignal;
use crate::error::SignalSource;

/// Generate a human-readable explanation from recommendation signals.
pub fn generate_explanation(signals: &[RecommendationSignal]) -> String {
    if signals.is_empty() {
        return "Popular in the catalog".to_string();
    }

    let parts: Vec<String> = signals
        .iter()
        .map(|signal| match signal {
            RecommendationSignal::SharedInterests { matched } => match matched.as_slice() {
                [] => "Matches your profile".to_string(),
                [one] => format!("Matches your interest in {one}"),
                many => format!("Matches your interests: {}", many.join(", ")),
            },
            RecommendationSignal::SimilarMentees { anchors } => match anchors.as_slice() {
                [] => "Mentees like you engaged with this".to_string(),
                many => format!("Mentees who engaged with {} also engaged with this", many.join(", ")),
            },
            RecommendationSignal::ColdStart => {
                "Based on your profile while we learn your preferences".to_string()
            }
            RecommendationSignal::Fresh { days } => format_freshness(*days),
        })
        .collect();

    parts.join("; ")
}

fn format_freshness(days: i64) -> String {
    match days {
        d if d <= 0 => "Added today".to_string(),
        1 => "Added yesterday".to_string(),
        d => format!("Added {d} days ago"),
    }
}

/// Generate a one-line summary of a recommendation page.
pub fn summarize_recommendations(
    count: usize,
    cold_start: bool,
    degraded: &[SignalSource],
) -> String {
    let mut parts = vec![match count {
        1 => "Found 1 recommendation".to_string(),
        n => format!("Found {n} recommendations"),
    }];

    if cold_start {
        parts.push("ranked on profile match only".to_string());
    } else if count > 0 {
        parts.push("blending similar mentees and profile match".to_string());
    }

    if !degraded.is_empty() {
        let labels: Vec<&str> = degraded.iter().map(SignalSource::label).collect();
        parts.push(format!("without {}", labels.join(", ")));
    }

    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_signals() {
        assert_eq!(generate_explanation(&[]), "Popular in the catalog");
    }

    #[test]
    fn test_shared_interests_single_and_multiple() {
        let one = vec![RecommendationSignal::SharedInterests {
            matched: vec!["rust".into()],
        }];
        assert_eq!(generate_explanation(&one), "Matches your interest in rust");

        let many = vec![RecommendationSignal::SharedInterests {
            matched: vec!["docker".into(), "kubernetes".into()],
        }];
        assert_eq!(
            generate_explanation(&many),
            "Matches your interests: docker, kubernetes"
        );
    }

    #[test]
    fn test_multiple_signals_are_joined() {
        let signals = vec![
            RecommendationSignal::SimilarMentees {
                anchors: vec!["Intro to Docker".into()],
            },
            RecommendationSignal::Fresh { days: 3 },
        ];
        let explanation = generate_explanation(&signals);
        assert_eq!(
            explanation,
            "Mentees who engaged with Intro to Docker also engaged with this; Added 3 days ago"
        );
    }

    #[test]
    fn test_freshness() {
        assert_eq!(format_freshness(0), "Added today");
        assert_eq!(format_freshness(1), "Added yesterday");
        assert_eq!(format_freshness(9), "Added 9 days ago");
    }

    #[test]
    fn test_summarize() {
        assert_eq!(
            summarize_recommendations(5, false, &[]),
            "Found 5 recommendations, blending similar mentees and profile match"
        );
        assert_eq!(
            summarize_recommendations(1, true, &[]),
            "Found 1 recommendation, ranked on profile match only"
        );
        assert_eq!(
            summarize_recommendations(0, true, &[SignalSource::Bookings]),
            format!(
                "Found 0 recommendations, ranked on profile match only, without {}",
                SignalSource::Bookings.label()
            )
        );
    }
}
