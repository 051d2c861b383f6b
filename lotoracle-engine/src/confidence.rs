use lotoracle_db::models::Numbers;
use serde::Serialize;

use crate::analysis::zone::ZoneAnalysis;
use crate::analysis::{anti_pattern, gap, position};
use crate::dataset::{frequencies, recent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    VeryLow,
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.75 {
            ConfidenceLevel::High
        } else if score >= 0.55 {
            ConfidenceLevel::Medium
        } else if score >= 0.35 {
            ConfidenceLevel::Low
        } else {
            ConfidenceLevel::VeryLow
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceLevel::VeryLow => "very_low",
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfidenceFactors {
    pub zone_diversity: f64,
    pub gap_pattern: f64,
    pub pattern_validity: f64,
    pub position_alignment: f64,
    pub strategy_agreement: f64,
    pub historical_frequency: f64,
}

impl ConfidenceFactors {
    pub const WEIGHTS: [f64; 6] = [0.15, 0.15, 0.20, 0.15, 0.25, 0.10];

    pub fn named(&self) -> [(&'static str, f64); 6] {
        [
            ("zone_diversity", self.zone_diversity),
            ("gap_pattern", self.gap_pattern),
            ("pattern_validity", self.pattern_validity),
            ("position_alignment", self.position_alignment),
            ("strategy_agreement", self.strategy_agreement),
            ("historical_frequency", self.historical_frequency),
        ]
    }

    pub fn weighted_sum(&self) -> f64 {
        self.named().iter().zip(Self::WEIGHTS).map(|((_, v), w)| v * w).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfidenceReport {
    pub confidence: f64,
    pub level: ConfidenceLevel,
    pub factors: ConfidenceFactors,
    pub recommendation: String,
}

/// Analyse d'une fenêtre récente, réutilisée pour noter plusieurs grilles.
pub struct ConfidenceScorer {
    gaps: gap::GapAnalysis,
    positions: position::PositionAnalysis,
    recent_counts: Vec<usize>,
}

impl ConfidenceScorer {
    pub fn new(window: &[Numbers]) -> Self {
        Self {
            gaps: gap::analyze(window),
            positions: position::analyze(window),
            recent_counts: frequencies(recent(window, 50)),
        }
    }

    pub fn score(&self, candidate: &Numbers, strategy_agreement: f64) -> ConfidenceReport {
        let historical_frequency = candidate
            .iter()
            .map(|&n| (self.recent_counts[(n - 1) as usize] as f64 / 10.0).min(0.2))
            .sum::<f64>()
            .min(1.0);

        let factors = ConfidenceFactors {
            zone_diversity: ZoneAnalysis::diversity(candidate),
            gap_pattern: self.gaps.score(candidate),
            pattern_validity: anti_pattern::check(candidate).score,
            position_alignment: self.positions.score(candidate),
            strategy_agreement: strategy_agreement.clamp(0.0, 1.0),
            historical_frequency,
        };

        let confidence = (factors.weighted_sum().clamp(0.0, 1.0) * 1000.0).round() / 1000.0;
        let level = ConfidenceLevel::from_score(confidence);
        let recommendation = recommendation(level, &factors);

        ConfidenceReport { confidence, level, factors, recommendation }
    }
}

fn recommendation(level: ConfidenceLevel, factors: &ConfidenceFactors) -> String {
    match level {
        ConfidenceLevel::High => "Prédiction solide : facteurs concordants".to_string(),
        ConfidenceLevel::Medium => {
            let weak: Vec<&str> =
                factors.named().iter().filter(|(_, v)| *v < 0.5).take(2).map(|(name, _)| *name).collect();
            if weak.is_empty() {
                "Prédiction correcte".to_string()
            } else {
                format!("Prédiction correcte, points faibles : {}", weak.join(", "))
            }
        }
        ConfidenceLevel::Low => "Confiance faible : à jouer avec prudence".to_string(),
        ConfidenceLevel::VeryLow => "Confiance très faible : grille peu étayée".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::make_test_draws;

    #[test]
    fn test_level_thresholds() {
        assert_eq!(ConfidenceLevel::from_score(0.75), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(0.74), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(0.55), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(0.35), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_score(0.1), ConfidenceLevel::VeryLow);
    }

    #[test]
    fn test_weights_sum_to_one() {
        let total: f64 = ConfidenceFactors::WEIGHTS.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_score_bounded_and_rounded() {
        let draws = make_test_draws(100);
        let scorer = ConfidenceScorer::new(&draws);
        for candidate in &draws[..20] {
            let r = scorer.score(candidate, 0.4);
            assert!((0.0..=1.0).contains(&r.confidence));
            assert!(((r.confidence * 1000.0).round() - r.confidence * 1000.0).abs() < 1e-6);
            assert_eq!(r.level, ConfidenceLevel::from_score(r.confidence));
        }
    }

    #[test]
    fn test_agreement_raises_confidence() {
        let draws = make_test_draws(100);
        let scorer = ConfidenceScorer::new(&draws);
        let low = scorer.score(&[3, 18, 44, 57, 81], 0.0);
        let high = scorer.score(&[3, 18, 44, 57, 81], 1.0);
        assert!((high.confidence - low.confidence - 0.25).abs() < 2e-3);
    }

    #[test]
    fn test_medium_recommendation_names_weak_factors() {
        let factors = ConfidenceFactors {
            zone_diversity: 1.0,
            gap_pattern: 0.2,
            pattern_validity: 1.0,
            position_alignment: 0.1,
            strategy_agreement: 0.6,
            historical_frequency: 0.3,
        };
        let text = recommendation(ConfidenceLevel::Medium, &factors);
        assert!(text.contains("gap_pattern") && text.contains("position_alignment"));
        assert!(!text.contains("historical_frequency"), "deux facteurs au plus");
    }
}
