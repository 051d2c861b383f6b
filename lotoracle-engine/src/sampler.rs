use rand::distr::weighted::WeightedIndex;
use rand::prelude::*;
use rand::rngs::StdRng;

use crate::error::{OracleError, Result};

/// `k` tirages pondérés avec remise parmi 1..=weights.len().
pub fn weighted_choices(weights: &[f64], k: usize, rng: &mut StdRng) -> Result<Vec<u8>> {
    let dist = WeightedIndex::new(weights).map_err(|e| OracleError::subsystem("sampler", e.to_string()))?;
    Ok((0..k).map(|_| (dist.sample(rng) + 1) as u8).collect())
}

/// Un numéro tiré selon `weights` parmi `pool`.
pub fn weighted_pick(pool: &[u8], weights: &[f64], rng: &mut StdRng) -> Option<u8> {
    let dist = WeightedIndex::new(weights).ok()?;
    pool.get(dist.sample(rng)).copied()
}

/// `count` numéros distincts tirés sans remise dans une liste classée,
/// le k-ième candidat pesant 1/(k+1).
pub fn rank_weighted_sample(ranked: &[u8], count: usize, rng: &mut StdRng) -> Vec<u8> {
    let mut available: Vec<(u8, f64)> = ranked.iter().enumerate().map(|(k, &n)| (n, 1.0 / (k + 1) as f64)).collect();
    let mut selected = Vec::with_capacity(count);

    while selected.len() < count && !available.is_empty() {
        let weights: Vec<f64> = available.iter().map(|(_, w)| *w).collect();
        let Ok(dist) = WeightedIndex::new(&weights) else {
            break;
        };
        let (number, _) = available.remove(dist.sample(rng));
        selected.push(number);
    }

    selected
}

/// Échantillon uniforme sans remise.
pub fn sample_distinct(pool: &[u8], count: usize, rng: &mut StdRng) -> Vec<u8> {
    pool.choose_multiple(rng, count).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_weighted_choices_respects_zero_weight() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut weights = vec![0.0; 90];
        weights[9] = 1.0;
        let picks = weighted_choices(&weights, 5, &mut rng).unwrap();
        assert_eq!(picks, vec![10; 5]);
    }

    #[test]
    fn test_weighted_choices_all_zero_fails() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(weighted_choices(&[0.0; 90], 5, &mut rng).is_err());
    }

    #[test]
    fn test_rank_weighted_sample_distinct() {
        let mut rng = StdRng::seed_from_u64(1);
        let ranked: Vec<u8> = (1..=30).collect();
        let mut picks = rank_weighted_sample(&ranked, 5, &mut rng);
        assert_eq!(picks.len(), 5);
        picks.sort_unstable();
        picks.dedup();
        assert_eq!(picks.len(), 5, "tirage sans remise");
    }

    #[test]
    fn test_rank_weighted_sample_short_pool() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(rank_weighted_sample(&[4, 8], 5, &mut rng).len(), 2);
    }

    #[test]
    fn test_sample_distinct_deterministic() {
        let pool: Vec<u8> = (1..=90).collect();
        let a = sample_distinct(&pool, 5, &mut StdRng::seed_from_u64(3));
        let b = sample_distinct(&pool, 5, &mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
    }
}
