pub mod anti_pattern;
pub mod gap;
pub mod position;
pub mod regime;
pub mod trend;
pub mod zone;

use lotoracle_db::models::Numbers;
use serde::Serialize;

use crate::dataset::{frequencies, rank_counts, recent, skip_counts};

/// Grille la plus basse et la plus haute possibles.
pub const MIN_SUM: u32 = 15;
pub const MAX_SUM: u32 = 440;

/// Profil statistique d'une fenêtre de tirages récents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternSummary {
    pub window: usize,
    pub sum_mean: f64,
    pub sum_std: f64,
    /// Quartiles 25 % / 75 % des sommes, tronqués.
    pub sum_range: (u32, u32),
    pub even_mode: usize,
    pub high_mode: usize,
    pub hot_numbers: Vec<u8>,
    pub cold_numbers: Vec<u8>,
    /// Index = numéro - 1.
    pub skips: Vec<usize>,
}

impl PatternSummary {
    pub fn skip(&self, number: u8) -> usize {
        self.skips[(number - 1) as usize]
    }

    pub fn average_skip(&self) -> f64 {
        if self.skips.is_empty() {
            return 0.0;
        }
        self.skips.iter().sum::<usize>() as f64 / self.skips.len() as f64
    }

    /// Numéros dont le retard est proche du retard moyen (±20 %).
    pub fn due_numbers(&self) -> Vec<u8> {
        let avg = self.average_skip();
        (1..=self.skips.len() as u8)
            .filter(|&n| {
                let s = self.skip(n) as f64;
                s >= avg * 0.8 && s <= avg * 1.2
            })
            .collect()
    }
}

pub fn is_even(n: u8) -> bool {
    n % 2 == 0
}

pub fn is_high(n: u8) -> bool {
    n > 45
}

pub fn draw_sum(draw: &Numbers) -> u32 {
    draw.iter().map(|&n| n as u32).sum()
}

pub fn count_even(draw: &Numbers) -> usize {
    draw.iter().filter(|&&n| is_even(n)).count()
}

pub fn count_high(draw: &Numbers) -> usize {
    draw.iter().filter(|&&n| is_high(n)).count()
}

/// Paires de numéros consécutifs dans une grille triée.
pub fn consecutive_pairs(draw: &Numbers) -> usize {
    let mut sorted = *draw;
    sorted.sort_unstable();
    sorted.windows(2).filter(|w| w[1] - w[0] == 1).count()
}

pub fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

/// Percentile à interpolation linéaire entre rangs.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let pos = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Valeur la plus fréquente ; à égalité, la première rencontrée.
fn mode(values: &[usize]) -> usize {
    let mut counts = [0usize; 6];
    let mut first_seen = [usize::MAX; 6];
    for (i, &v) in values.iter().enumerate() {
        let v = v.min(5);
        counts[v] += 1;
        first_seen[v] = first_seen[v].min(i);
    }
    (0..6)
        .max_by(|&a, &b| counts[a].cmp(&counts[b]).then(first_seen[b].cmp(&first_seen[a])))
        .unwrap_or(0)
}

/// Analyse la fenêtre `draws` (déjà restreinte aux tirages récents).
pub fn analyze_patterns(draws: &[Numbers]) -> PatternSummary {
    if draws.is_empty() {
        return PatternSummary {
            window: 0,
            sum_mean: 0.0,
            sum_std: 0.0,
            sum_range: (MIN_SUM, MAX_SUM),
            even_mode: 2,
            high_mode: 2,
            hot_numbers: Vec::new(),
            cold_numbers: Vec::new(),
            skips: vec![0; crate::dataset::POOL_SIZE],
        };
    }

    let sums: Vec<f64> = draws.iter().map(|d| draw_sum(d) as f64).collect();
    let (sum_mean, sum_std) = mean_std(&sums);
    let mut sorted_sums = sums.clone();
    sorted_sums.sort_by(|a, b| a.total_cmp(b));
    let sum_range = (percentile(&sorted_sums, 25.0) as u32, percentile(&sorted_sums, 75.0) as u32);

    let evens: Vec<usize> = draws.iter().map(count_even).collect();
    let highs: Vec<usize> = draws.iter().map(count_high).collect();

    let recent_counts = frequencies(recent(draws, 20));
    let hot_numbers: Vec<u8> = rank_counts(&recent_counts)
        .into_iter()
        .filter(|&n| recent_counts[(n - 1) as usize] > 0)
        .take(15)
        .collect();

    let skips = skip_counts(draws);
    let cold_numbers: Vec<u8> = rank_counts(&skips).into_iter().take(15).collect();

    PatternSummary {
        window: draws.len(),
        sum_mean,
        sum_std,
        sum_range,
        even_mode: mode(&evens),
        high_mode: mode(&highs),
        hot_numbers,
        cold_numbers,
        skips,
    }
}

/// Comparaison d'une grille prédite avec le tirage réel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub matches: Vec<u8>,
    pub match_count: usize,
    pub expected: f64,
    pub z_score: f64,
    pub significant: bool,
}

pub fn evaluate_prediction(prediction: &Numbers, actual: &Numbers) -> Evaluation {
    let mut matches: Vec<u8> = prediction.iter().filter(|n| actual.contains(n)).copied().collect();
    matches.sort_unstable();
    let match_count = matches.len();
    let p: f64 = 5.0 / 90.0;
    let expected = 5.0 * p;
    let std = (5.0 * p * (1.0 - p)).sqrt();
    let z_score = (match_count as f64 - expected) / std;
    Evaluation { matches, match_count, expected, z_score, significant: z_score.abs() > 1.96 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_linear() {
        let v = vec![10.0, 20.0, 30.0, 40.0, 50.0];
        assert!((percentile(&v, 25.0) - 20.0).abs() < 1e-9);
        let v = vec![10.0, 20.0];
        assert!((percentile(&v, 75.0) - 17.5).abs() < 1e-9);
    }

    #[test]
    fn test_mode_first_on_tie() {
        assert_eq!(mode(&[3, 2, 2, 3]), 3);
        assert_eq!(mode(&[1, 2, 2]), 2);
    }

    #[test]
    fn test_analyze_patterns_basics() {
        let draws = vec![[1, 2, 3, 4, 5], [10, 20, 30, 40, 50], [1, 12, 46, 47, 90]];
        let s = analyze_patterns(&draws);
        assert_eq!(s.window, 3);
        assert_eq!(s.hot_numbers[0], 1, "1 sort deux fois");
        assert_eq!(s.skip(1), 0);
        assert_eq!(s.skip(2), 2);
        assert_eq!(s.skip(89), 3);
        assert_eq!(s.cold_numbers.len(), 15);
        assert!(s.sum_range.0 <= s.sum_range.1);
        assert_eq!(s.even_mode, 2);
    }

    #[test]
    fn test_analyze_patterns_empty() {
        let s = analyze_patterns(&[]);
        assert_eq!(s.sum_range, (MIN_SUM, MAX_SUM));
        assert!(s.hot_numbers.is_empty());
    }

    #[test]
    fn test_due_numbers_near_average() {
        let draws = crate::dataset::make_test_draws(50);
        let s = analyze_patterns(&draws);
        let avg = s.average_skip();
        for n in s.due_numbers() {
            let skip = s.skip(n) as f64;
            assert!(skip >= avg * 0.8 && skip <= avg * 1.2);
        }
    }

    #[test]
    fn test_evaluate_prediction() {
        let e = evaluate_prediction(&[1, 2, 3, 4, 5], &[1, 2, 3, 4, 5]);
        assert_eq!(e.match_count, 5);
        assert!(e.significant);
        let e = evaluate_prediction(&[1, 2, 3, 4, 5], &[6, 7, 8, 9, 10]);
        assert_eq!(e.match_count, 0);
        assert!(!e.significant);
        assert!((e.expected - 25.0 / 90.0).abs() < 1e-12);
        assert!(e.z_score < 0.0);
    }
}
