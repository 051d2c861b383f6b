use std::collections::BTreeMap;

use lotoracle_db::models::Numbers;
use serde::Serialize;

use super::mean_std;

/// Écarts entre numéros consécutifs d'une grille triée.
pub fn gaps_of(draw: &Numbers) -> [u8; 4] {
    let mut sorted = *draw;
    sorted.sort_unstable();
    [sorted[1] - sorted[0], sorted[2] - sorted[1], sorted[3] - sorted[2], sorted[4] - sorted[3]]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapAnalysis {
    pub frequencies: BTreeMap<u8, usize>,
    /// 10 écarts les plus fréquents (écart, occurrences).
    pub common_gaps: Vec<(u8, usize)>,
    pub mean: f64,
    pub std: f64,
    pub min: u8,
    pub max: u8,
    pub common_sequences: Vec<([u8; 4], usize)>,
    pub ideal_range: (f64, f64),
}

pub fn analyze(draws: &[Numbers]) -> GapAnalysis {
    let mut frequencies: BTreeMap<u8, usize> = BTreeMap::new();
    let mut sequences: BTreeMap<[u8; 4], usize> = BTreeMap::new();
    let mut all_gaps: Vec<f64> = Vec::with_capacity(draws.len() * 4);

    for draw in draws {
        let gaps = gaps_of(draw);
        for &g in &gaps {
            *frequencies.entry(g).or_insert(0) += 1;
            all_gaps.push(g as f64);
        }
        *sequences.entry(gaps).or_insert(0) += 1;
    }

    if all_gaps.is_empty() {
        return GapAnalysis {
            frequencies,
            common_gaps: Vec::new(),
            mean: 0.0,
            std: 0.0,
            min: 0,
            max: 0,
            common_sequences: Vec::new(),
            ideal_range: (5.0, 25.0),
        };
    }

    let mut common_gaps: Vec<(u8, usize)> = frequencies.iter().map(|(&g, &c)| (g, c)).collect();
    common_gaps.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    common_gaps.truncate(10);

    let mut common_sequences: Vec<([u8; 4], usize)> = sequences.into_iter().collect();
    common_sequences.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    common_sequences.truncate(5);

    let (mean, std) = mean_std(&all_gaps);
    let min = all_gaps.iter().fold(f64::MAX, |m, &g| m.min(g)) as u8;
    let max = all_gaps.iter().fold(0.0f64, |m, &g| m.max(g)) as u8;

    GapAnalysis {
        frequencies,
        common_gaps,
        mean,
        std,
        min,
        max,
        common_sequences,
        ideal_range: ((mean - std).max(1.0), mean + std),
    }
}

impl GapAnalysis {
    /// Score [0, 1] des écarts d'une grille.
    pub fn score(&self, candidate: &Numbers) -> f64 {
        let gaps = gaps_of(candidate);
        let (lo, hi) = self.ideal_range;
        let max_count = self.common_gaps.first().map(|&(_, c)| c).unwrap_or(0);

        let mut score = 0.0;
        for &g in &gaps {
            let gf = g as f64;
            if gf >= lo && gf <= hi {
                score += 0.15;
            }
            if max_count > 0 {
                if let Some(&(_, count)) = self.common_gaps.iter().find(|&&(cg, _)| cg == g) {
                    score += 0.1 * count as f64 / max_count as f64;
                }
            }
            // Les écarts de 1 et les très grands écarts sont pénalisés
            if g == 1 {
                score -= 0.1;
            }
            if g > 30 {
                score -= 0.1;
            }
        }
        score.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaps_of_sorts_first() {
        assert_eq!(gaps_of(&[50, 1, 20, 10, 90]), [9, 10, 30, 40]);
    }

    #[test]
    fn test_analyze_statistics() {
        let draws = vec![[10, 20, 30, 40, 50], [5, 15, 25, 35, 45]];
        let a = analyze(&draws);
        assert_eq!(a.common_gaps, vec![(10, 8)]);
        assert!((a.mean - 10.0).abs() < 1e-12);
        assert!(a.std.abs() < 1e-12);
        assert_eq!(a.ideal_range, (10.0, 10.0));
        assert_eq!(a.common_sequences, vec![([10, 10, 10, 10], 2)]);
    }

    #[test]
    fn test_score_prefers_regular_gaps() {
        let draws = vec![[10, 20, 30, 40, 50], [5, 15, 25, 35, 45]];
        let a = analyze(&draws);
        let regular = a.score(&[12, 22, 32, 42, 52]);
        let clumped = a.score(&[1, 2, 3, 4, 90]);
        assert!((regular - 1.0).abs() < 1e-12, "4 × (0.15 + 0.1) = 1.0, obtenu {regular}");
        assert_eq!(clumped, 0.0);
    }

    #[test]
    fn test_empty_history_default_range() {
        let a = analyze(&[]);
        assert_eq!(a.ideal_range, (5.0, 25.0));
        let s = a.score(&[10, 20, 30, 40, 50]);
        assert!((s - 0.6).abs() < 1e-12);
    }
}
