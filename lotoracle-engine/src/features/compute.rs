use lotoracle_db::models::Numbers;

use super::FeatureRow;
use crate::dataset::{recent, POOL_SIZE};

/// Écarts au-delà de cette valeur ignorés par la compatibilité delta.
const MAX_DELTA: usize = 30;

/// Statistiques d'une fenêtre partagées par les 90 numéros.
struct WindowStats<'a> {
    window: &'a [Numbers],
    counts: Vec<usize>,
    position_sums: Vec<f64>,
    delta_hist: [usize; MAX_DELTA + 1],
    delta_total: usize,
    trend_halves: Option<(Vec<usize>, usize, Vec<usize>, usize)>,
}

impl<'a> WindowStats<'a> {
    fn new(window: &'a [Numbers]) -> Self {
        let mut counts = vec![0usize; POOL_SIZE];
        let mut position_sums = vec![0.0f64; POOL_SIZE];
        for draw in window {
            let mut sorted = *draw;
            sorted.sort_unstable();
            for (pos, &n) in sorted.iter().enumerate() {
                counts[(n - 1) as usize] += 1;
                position_sums[(n - 1) as usize] += pos as f64 / 4.0;
            }
        }

        // Écarts courants des 10 derniers tirages
        let mut delta_hist = [0usize; MAX_DELTA + 1];
        let mut delta_total = 0;
        for draw in recent(window, 10) {
            let mut sorted = *draw;
            sorted.sort_unstable();
            for w in sorted.windows(2) {
                let d = (w[1] - w[0]) as usize;
                if d <= MAX_DELTA {
                    delta_hist[d] += 1;
                }
                delta_total += 1;
            }
        }

        let last10 = recent(window, 10);
        let trend_halves = (last10.len() >= 5).then(|| {
            let half = last10.len() / 2;
            let (first, second) = last10.split_at(half);
            (crate::dataset::frequencies(first), first.len(), crate::dataset::frequencies(second), second.len())
        });

        Self { window, counts, position_sums, delta_hist, delta_total, trend_halves }
    }

    fn recent_freq(&self, number: u8, denom: usize) -> f64 {
        if denom == 0 {
            return 0.0;
        }
        self.counts[(number - 1) as usize] as f64 / denom as f64
    }

    /// Rang moyen normalisé [0, 1] dans le tirage trié ; 0.5 si absent.
    fn position_tendency(&self, number: u8) -> f64 {
        let idx = (number - 1) as usize;
        if self.counts[idx] == 0 {
            return 0.5;
        }
        self.position_sums[idx] / self.counts[idx] as f64
    }

    /// Fréquence moyenne, parmi les écarts récents, des écarts que ce numéro
    /// formerait avec chaque numéro de la fenêtre.
    fn delta_compat(&self, number: u8) -> f64 {
        let mut total = 0.0;
        let mut n = 0usize;
        for draw in self.window {
            for &other in draw {
                let d = (number as i16 - other as i16).unsigned_abs() as usize;
                if d <= MAX_DELTA {
                    total += self.delta_hist[d] as f64 / (self.delta_total + 1) as f64;
                    n += 1;
                }
            }
        }
        if n == 0 { 0.0 } else { total / n as f64 }
    }

    /// Seconde moitié des 10 derniers tirages comparée à la première, dans [0, 1].
    fn trend_score(&self, number: u8) -> f64 {
        let Some((first, len1, second, len2)) = &self.trend_halves else {
            return 0.5;
        };
        let idx = (number - 1) as usize;
        let f1 = first[idx] as f64 / (len1 + 1) as f64;
        let f2 = second[idx] as f64 / (len2 + 1) as f64;
        (f2 - f1 + 1.0) / 2.0
    }

    fn row(&self, number: u8, skips: usize, freq_denom: usize, label: f64) -> FeatureRow {
        let features = vec![
            self.recent_freq(number, freq_denom), // 0
            skips as f64,                         // 1
            self.position_tendency(number),       // 2
            self.delta_compat(number),            // 3
            (number % 2) as f64,                  // 4
            if number > 45 { 1.0 } else { 0.0 },  // 5
            self.trend_score(number),             // 6
        ];
        FeatureRow { number, features, label }
    }
}

pub fn training_rows(draws: &[Numbers], lookback: usize) -> Vec<FeatureRow> {
    if lookback == 0 || draws.len() <= lookback {
        return Vec::new();
    }

    let mut rows = Vec::with_capacity((draws.len() - lookback) * POOL_SIZE);
    // dernier index d'apparition dans draws[..t]
    let mut last_seen: Vec<Option<usize>> = vec![None; POOL_SIZE];
    for (i, draw) in draws[..lookback].iter().enumerate() {
        for &n in draw {
            last_seen[(n - 1) as usize] = Some(i);
        }
    }

    for t in lookback..draws.len() {
        let stats = WindowStats::new(&draws[t - lookback..t]);
        let target = &draws[t];
        for number in 1..=POOL_SIZE as u8 {
            let skips = match last_seen[(number - 1) as usize] {
                Some(i) => t - i - 1,
                None => t,
            };
            let label = if target.contains(&number) { 1.0 } else { 0.0 };
            rows.push(stats.row(number, skips, lookback, label));
        }
        for &n in target {
            last_seen[(n - 1) as usize] = Some(t);
        }
    }

    rows
}

pub fn current_rows(draws: &[Numbers], lookback: usize) -> Vec<FeatureRow> {
    let window = recent(draws, lookback);
    let stats = WindowStats::new(window);
    let skips = crate::dataset::skip_counts(draws);
    (1..=POOL_SIZE as u8)
        .map(|number| stats.row(number, skips[(number - 1) as usize], window.len(), 0.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::make_test_draws;
    use crate::features::FEATURE_NAMES;

    #[test]
    fn test_training_rows_shape_and_labels() {
        let draws = make_test_draws(60);
        let rows = training_rows(&draws, 50);
        assert_eq!(rows.len(), 10 * 90);
        assert!(rows.iter().all(|r| r.features.len() == FEATURE_NAMES.len()));
        let positives = rows.iter().filter(|r| r.label == 1.0).count();
        assert_eq!(positives, 10 * 5, "5 positifs par tirage cible");
        // la première cible est draws[50]
        for r in &rows[..90] {
            assert_eq!(r.label == 1.0, draws[50].contains(&r.number));
        }
    }

    #[test]
    fn test_skips_match_backward_scan() {
        let draws = make_test_draws(70);
        let rows = training_rows(&draws, 50);
        let t = 65;
        let expected = crate::dataset::skip_counts(&draws[..t]);
        for r in &rows[(t - 50) * 90..(t - 50 + 1) * 90] {
            assert_eq!(r.features[1], expected[(r.number - 1) as usize] as f64, "numéro {}", r.number);
        }
    }

    #[test]
    fn test_current_rows_feature_ranges() {
        let draws = make_test_draws(80);
        let rows = current_rows(&draws, 50);
        assert_eq!(rows.len(), 90);
        for r in &rows {
            assert!((0.0..=1.0).contains(&r.features[0]));
            assert!((0.0..=1.0).contains(&r.features[2]));
            assert!((0.0..=1.0).contains(&r.features[6]));
            assert_eq!(r.features[4], (r.number % 2) as f64);
        }
    }

    #[test]
    fn test_trend_score_neutral_on_short_window() {
        let draws = vec![[1, 2, 3, 4, 5]; 4];
        let rows = current_rows(&draws, 50);
        assert_eq!(rows[0].features[6], 0.5);
        assert_eq!(rows[0].features[2], 0.0, "1 toujours en première position");
        assert_eq!(rows[89].features[2], 0.5);
    }

    #[test]
    fn test_too_short_history_yields_nothing() {
        assert!(training_rows(&make_test_draws(50), 50).is_empty());
    }
}
