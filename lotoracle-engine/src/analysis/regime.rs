use std::collections::BTreeMap;

use lotoracle_db::models::Numbers;
use serde::Serialize;

use super::{draw_sum, mean_std};
use crate::config::RegimeConfig;
use crate::dataset::recent;

const EPSILON: f64 = 1e-10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodMetrics {
    pub sum_mean: f64,
    pub sum_std: f64,
    pub number_entropy: f64,
    pub delta_entropy: f64,
    pub cluster_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegimeReport {
    pub detected: bool,
    pub confidence: f64,
    /// Variations relatives supérieures à 10 %, par métrique.
    pub details: BTreeMap<String, f64>,
    pub old_period: Option<PeriodMetrics>,
    pub new_period: Option<PeriodMetrics>,
}

impl RegimeReport {
    fn not_detected() -> Self {
        Self { detected: false, confidence: 0.0, details: BTreeMap::new(), old_period: None, new_period: None }
    }
}

/// Entropie de Shannon (log2) d'une table d'occurrences.
fn entropy<K>(counts: &BTreeMap<K, usize>) -> f64 {
    let total: usize = counts.values().sum();
    if total == 0 {
        return 0.0;
    }
    counts
        .values()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total as f64;
            -p * p.log2()
        })
        .sum()
}

pub struct RegimeDetector {
    config: RegimeConfig,
}

impl RegimeDetector {
    pub fn new(config: RegimeConfig) -> Self {
        Self { config }
    }

    pub fn period_metrics(&self, draws: &[Numbers]) -> PeriodMetrics {
        let sums: Vec<f64> = draws.iter().map(|d| draw_sum(d) as f64).collect();
        let (sum_mean, sum_std) = mean_std(&sums);

        let mut numbers: BTreeMap<u8, usize> = BTreeMap::new();
        let mut deltas: BTreeMap<u8, usize> = BTreeMap::new();
        let mut clustered = 0usize;
        for draw in draws {
            let mut sorted = *draw;
            sorted.sort_unstable();
            for &n in &sorted {
                *numbers.entry(n).or_insert(0) += 1;
            }
            let mut max_gap = 0u8;
            for w in sorted.windows(2) {
                let d = w[1] - w[0];
                *deltas.entry(d).or_insert(0) += 1;
                max_gap = max_gap.max(d);
            }
            if max_gap < self.config.cluster_gap {
                clustered += 1;
            }
        }

        PeriodMetrics {
            sum_mean,
            sum_std,
            number_entropy: entropy(&numbers),
            delta_entropy: entropy(&deltas),
            cluster_score: if draws.is_empty() { 0.0 } else { clustered as f64 / draws.len() as f64 },
        }
    }

    /// Compare les deux moitiés des `window` derniers tirages.
    pub fn detect(&self, draws: &[Numbers]) -> RegimeReport {
        if draws.len() < self.config.window {
            return RegimeReport::not_detected();
        }

        let window = recent(draws, self.config.window);
        let mid = window.len() / 2;
        let old = self.period_metrics(&window[..mid]);
        let new = self.period_metrics(&window[mid..]);

        let change = |o: f64, n: f64| (n - o).abs() / (o.abs() + EPSILON);
        let changes = [
            ("sum_mean", change(old.sum_mean, new.sum_mean)),
            ("sum_std", change(old.sum_std, new.sum_std)),
            ("number_entropy", change(old.number_entropy, new.number_entropy)),
            ("delta_entropy", change(old.delta_entropy, new.delta_entropy)),
            ("cluster_score", change(old.cluster_score, new.cluster_score)),
        ];

        let weighted = 0.3 * changes[0].1 + 0.4 * changes[3].1 + 0.3 * changes[4].1;
        let details = changes
            .iter()
            .filter(|(_, c)| *c > 0.1)
            .map(|(name, c)| (name.to_string(), *c))
            .collect();

        RegimeReport {
            detected: weighted > self.config.threshold,
            confidence: weighted.min(1.0),
            details,
            old_period: Some(old),
            new_period: Some(new),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> RegimeDetector {
        RegimeDetector::new(RegimeConfig::default())
    }

    #[test]
    fn test_short_history_not_detected() {
        let report = detector().detect(&crate::dataset::make_test_draws(99));
        assert!(!report.detected);
        assert_eq!(report.confidence, 0.0);
        assert!(report.old_period.is_none());
    }

    #[test]
    fn test_unchanged_pattern_not_detected() {
        let pattern = [[3, 18, 44, 57, 81], [7, 22, 35, 60, 88]];
        let draws: Vec<Numbers> = (0..100).map(|i| pattern[i % 2]).collect();
        let report = detector().detect(&draws);
        assert!(!report.detected, "régime stable détecté à tort : {report:?}");
        assert!(report.confidence < 1e-9);
        assert!(report.details.is_empty());
    }

    #[test]
    fn test_shifted_sums_detected() {
        let mut draws: Vec<Numbers> = Vec::new();
        for i in 0..50u8 {
            draws.push([1 + i % 3, 10, 20, 30, 40]);
        }
        for i in 0..50u8 {
            draws.push([50 + i % 3, 62, 71, 80, 89]);
        }
        let report = detector().detect(&draws);
        assert!(report.detected, "changement non détecté : {report:?}");
        assert!(report.details.contains_key("sum_mean"));
        assert!(report.confidence > 0.25 && report.confidence <= 1.0);
    }

    #[test]
    fn test_entropy_uniform() {
        let counts: BTreeMap<u8, usize> = [(1, 1), (2, 1), (3, 1), (4, 1)].into_iter().collect();
        assert!((entropy(&counts) - 2.0).abs() < 1e-12);
    }
}
