use std::collections::BTreeMap;

use lotoracle_db::models::Numbers;
use serde::Serialize;

use crate::dataset::recent;

pub const ZONE_COUNT: usize = 9;

/// Dizaine d'un numéro : 1-10 → 0, 11-20 → 1, ..., 81-90 → 8.
pub fn zone_of(n: u8) -> usize {
    ((n - 1) / 10) as usize
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneAnalysis {
    pub total_counts: [usize; ZONE_COUNT],
    pub recent_counts: [usize; ZONE_COUNT],
    pub expected_per_zone: f64,
    pub due_scores: [f64; ZONE_COUNT],
    /// Ensembles de zones occupées les plus fréquents sur les 50 derniers tirages.
    pub common_combinations: Vec<(Vec<usize>, usize)>,
    pub hot_zones: Vec<usize>,
    pub cold_zones: Vec<usize>,
}

impl ZoneAnalysis {
    /// 2 zones chaudes puis 2 zones en retard, complétées jusqu'à 5.
    pub fn recommended_zones(&self) -> Vec<usize> {
        let mut due: Vec<usize> = (0..ZONE_COUNT).collect();
        due.sort_by(|&a, &b| self.due_scores[b].total_cmp(&self.due_scores[a]).then(a.cmp(&b)));

        let mut out: Vec<usize> = Vec::with_capacity(5);
        for z in self.hot_zones.iter().take(2).chain(due.iter().take(2)) {
            if !out.contains(z) {
                out.push(*z);
            }
        }
        for z in 0..ZONE_COUNT {
            if out.len() >= 5 {
                break;
            }
            if !out.contains(&z) {
                out.push(z);
            }
        }
        out
    }

    /// Part des zones distinctes couvertes par une grille.
    pub fn diversity(candidate: &Numbers) -> f64 {
        let mut zones: Vec<usize> = candidate.iter().map(|&n| zone_of(n)).collect();
        zones.sort_unstable();
        zones.dedup();
        zones.len() as f64 / candidate.len() as f64
    }
}

fn zone_counts(draws: &[Numbers]) -> [usize; ZONE_COUNT] {
    let mut counts = [0usize; ZONE_COUNT];
    for draw in draws {
        for &n in draw {
            counts[zone_of(n)] += 1;
        }
    }
    counts
}

pub fn analyze(draws: &[Numbers]) -> ZoneAnalysis {
    let total_counts = zone_counts(draws);
    let recent_counts = zone_counts(recent(draws, 20));
    let expected_per_zone = (draws.len() * 5) as f64 / ZONE_COUNT as f64;

    let mut due_scores = [0.0f64; ZONE_COUNT];
    for z in 0..ZONE_COUNT {
        due_scores[z] = ((expected_per_zone - recent_counts[z] as f64) / (expected_per_zone + 1.0)).max(0.0);
    }

    let mut combos: BTreeMap<Vec<usize>, usize> = BTreeMap::new();
    for draw in recent(draws, 50) {
        let mut zones: Vec<usize> = draw.iter().map(|&n| zone_of(n)).collect();
        zones.sort_unstable();
        zones.dedup();
        *combos.entry(zones).or_insert(0) += 1;
    }
    let mut common_combinations: Vec<(Vec<usize>, usize)> = combos.into_iter().collect();
    common_combinations.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    common_combinations.truncate(5);

    let mut seen: Vec<usize> = (0..ZONE_COUNT).filter(|&z| recent_counts[z] > 0).collect();
    seen.sort_by(|&a, &b| recent_counts[b].cmp(&recent_counts[a]).then(a.cmp(&b)));
    let hot_zones: Vec<usize> = seen.iter().take(3).copied().collect();
    seen.sort_by(|&a, &b| recent_counts[a].cmp(&recent_counts[b]).then(a.cmp(&b)));
    let cold_zones: Vec<usize> = seen.iter().take(3).copied().collect();

    ZoneAnalysis {
        total_counts,
        recent_counts,
        expected_per_zone,
        due_scores,
        common_combinations,
        hot_zones,
        cold_zones,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_of_boundaries() {
        assert_eq!(zone_of(1), 0);
        assert_eq!(zone_of(10), 0);
        assert_eq!(zone_of(11), 1);
        assert_eq!(zone_of(90), 8);
    }

    #[test]
    fn test_hot_zone_and_due_scores() {
        let draws = vec![[1, 2, 3, 4, 5]; 20];
        let a = analyze(&draws);
        assert_eq!(a.hot_zones, vec![0]);
        assert_eq!(a.recent_counts[0], 100);
        assert!((a.due_scores[0]).abs() < 1e-12, "zone saturée : pas en retard");
        assert!(a.due_scores[4] > 0.0);
        assert_eq!(a.common_combinations, vec![(vec![0], 20)]);
    }

    #[test]
    fn test_recommended_zones_padded() {
        let draws = vec![[1, 2, 3, 4, 5]; 20];
        let zones = analyze(&draws).recommended_zones();
        assert_eq!(zones.len(), 5);
        assert_eq!(zones[0], 0);
        let mut dedup = zones.clone();
        dedup.sort_unstable();
        dedup.dedup();
        assert_eq!(dedup.len(), 5);
    }

    #[test]
    fn test_diversity() {
        assert!((ZoneAnalysis::diversity(&[1, 12, 23, 34, 45]) - 1.0).abs() < 1e-12);
        assert!((ZoneAnalysis::diversity(&[1, 2, 3, 4, 5]) - 0.2).abs() < 1e-12);
    }
}
