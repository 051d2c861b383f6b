use lotoracle_db::models::{Numbers, PICK_COUNT};
use serde::Serialize;

use crate::dataset::{rank_counts, POOL_SIZE};

/// Fréquences par rang dans le tirage trié (position 0 = plus petit numéro).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionAnalysis {
    pub counts: Vec<Vec<usize>>,
    /// 15 numéros favoris par position.
    pub favorites: Vec<Vec<u8>>,
}

pub fn analyze(draws: &[Numbers]) -> PositionAnalysis {
    let mut counts = vec![vec![0usize; POOL_SIZE]; PICK_COUNT];
    for draw in draws {
        let mut sorted = *draw;
        sorted.sort_unstable();
        for (pos, &n) in sorted.iter().enumerate() {
            counts[pos][(n - 1) as usize] += 1;
        }
    }

    let favorites = counts
        .iter()
        .map(|c| rank_counts(c).into_iter().filter(|&n| c[(n - 1) as usize] > 0).take(15).collect())
        .collect();

    PositionAnalysis { counts, favorites }
}

impl PositionAnalysis {
    /// Positions où un numéro est le plus souvent sorti, par fréquence décroissante.
    pub fn preferred_positions(&self, number: u8) -> Vec<usize> {
        let idx = (number - 1) as usize;
        let mut positions: Vec<usize> = (0..PICK_COUNT).filter(|&p| self.counts[p][idx] > 0).collect();
        positions.sort_by(|&a, &b| self.counts[b][idx].cmp(&self.counts[a][idx]).then(a.cmp(&b)));
        positions
    }

    /// +0.15 si top 5 de sa position, +0.10 si top 10, +0.05 si favori ; plafonné à 1.
    pub fn score(&self, candidate: &Numbers) -> f64 {
        let mut sorted = *candidate;
        sorted.sort_unstable();
        let mut score = 0.0;
        for (pos, n) in sorted.iter().enumerate() {
            if let Some(rank) = self.favorites[pos].iter().position(|f| f == n) {
                score += if rank < 5 {
                    0.15
                } else if rank < 10 {
                    0.10
                } else {
                    0.05
                };
            }
        }
        f64::min(score, 1.0)
    }
}
