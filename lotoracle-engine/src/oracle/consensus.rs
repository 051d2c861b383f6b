use std::collections::BTreeMap;

use lotoracle_db::models::Numbers;

use super::Strategy;
use crate::analysis::trend::TrendReport;
use crate::dataset::POOL_SIZE;

/// Bonus de consensus par stratégie qui cite le numéro.
const CONSENSUS_BONUS: f64 = 0.5;

fn by_scores(keys: &[(f64, f64, f64)]) -> Vec<u8> {
    let mut numbers: Vec<u8> = (1..=POOL_SIZE as u8).collect();
    numbers.sort_by(|&a, &b| {
        let (ka, kb) = (keys[(a - 1) as usize], keys[(b - 1) as usize]);
        kb.0.total_cmp(&ka.0)
            .then(kb.1.total_cmp(&ka.1))
            .then(kb.2.total_cmp(&ka.2))
            .then(a.cmp(&b))
    });
    numbers
}

/// Vote pondéré : chaque numéro reçoit le poids de la stratégie plus 0,5
/// par stratégie qui le cite. Classement par `10·citations + vote`, puis
/// citations, puis vote.
pub fn ensemble_vote(inputs: &[(Strategy, Numbers)]) -> Numbers {
    let mut counts = [0usize; POOL_SIZE];
    for (_, ticket) in inputs {
        for &n in ticket {
            counts[(n - 1) as usize] += 1;
        }
    }
    let mut votes = [0.0f64; POOL_SIZE];
    for (strategy, ticket) in inputs {
        for &n in ticket {
            let idx = (n - 1) as usize;
            votes[idx] += strategy.weight() + CONSENSUS_BONUS * counts[idx] as f64;
        }
    }

    let keys: Vec<(f64, f64, f64)> =
        (0..POOL_SIZE).map(|i| (counts[i] as f64 * 10.0 + votes[i], counts[i] as f64, votes[i])).collect();
    let mut ticket = [0u8; 5];
    ticket.copy_from_slice(&by_scores(&keys)[..5]);
    ticket.sort_unstable();
    ticket
}

/// Les `n` numéros les plus partagés entre stratégies : 100 par stratégie
/// distincte, plus la somme des poids, plus 10 × bonus de tendance (0,3 en
/// hausse, 0,2 en accélération, parmi les 10 premiers de chaque liste).
pub fn extract_consensus(outputs: &BTreeMap<Strategy, Vec<Numbers>>, trends: &TrendReport, n: usize) -> Vec<u8> {
    let mut distinct = [0usize; POOL_SIZE];
    let mut weighted = [0.0f64; POOL_SIZE];
    for (strategy, candidates) in outputs {
        let mut named = [false; POOL_SIZE];
        for candidate in candidates {
            for &number in candidate {
                let idx = (number - 1) as usize;
                weighted[idx] += strategy.weight();
                named[idx] = true;
            }
        }
        for (d, seen) in distinct.iter_mut().zip(named) {
            *d += seen as usize;
        }
    }

    let boost = |number: u8| -> f64 {
        let mut b = 0.0;
        if trends.rising.iter().take(10).any(|&r| r == number) {
            b += 0.3;
        }
        if trends.accelerating.iter().take(10).any(|&a| a == number) {
            b += 0.2;
        }
        b
    };

    let keys: Vec<(f64, f64, f64)> = (0..POOL_SIZE)
        .map(|i| {
            let score = 100.0 * distinct[i] as f64 + weighted[i] + 10.0 * boost(i as u8 + 1);
            (score, distinct[i] as f64, weighted[i])
        })
        .collect();

    let mut picked: Vec<u8> = by_scores(&keys)
        .into_iter()
        .filter(|&number| weighted[(number - 1) as usize] > 0.0)
        .take(n)
        .collect();
    picked.sort_unstable();
    picked
}

/// Recouvrement moyen (fraction des 5 numéros) avec les autres grilles ;
/// 0,5 sans point de comparaison.
pub fn strategy_agreement(candidate: &Numbers, others: &[Numbers]) -> f64 {
    if others.is_empty() {
        return 0.5;
    }
    let total: f64 = others
        .iter()
        .map(|other| candidate.iter().filter(|n| other.contains(n)).count() as f64 / 5.0)
        .sum();
    total / others.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_strategies() -> BTreeMap<Strategy, Vec<Numbers>> {
        BTreeMap::from([
            (Strategy::Ml, vec![[1, 2, 3, 4, 5]]),
            (Strategy::Genetic, vec![[1, 3, 6, 7, 8]]),
            (Strategy::Pattern, vec![[1, 2, 20, 21, 22]]),
        ])
    }

    #[test]
    fn test_two_sure_and_three_direct() {
        // 1 : 300 + 3,3 ; 3 : 200 + 2,2 ; 2 : 200 + 2,1
        let outputs = three_strategies();
        let trends = TrendReport::default();
        let two = extract_consensus(&outputs, &trends, 2);
        let three = extract_consensus(&outputs, &trends, 3);
        assert_eq!(two, vec![1, 3]);
        assert_eq!(three, vec![1, 2, 3]);
        assert!(two.iter().all(|n| three.contains(n)));
    }

    #[test]
    fn test_trend_boost_breaks_weight_order() {
        let outputs = three_strategies();
        let trends = TrendReport { rising: vec![2], falling: vec![], accelerating: vec![2] };
        // 2 gagne 10 × 0,5 = 5 points et dépasse 3
        assert_eq!(extract_consensus(&outputs, &trends, 2), vec![1, 2]);
    }

    #[test]
    fn test_consensus_counts_strategy_once() {
        let outputs = BTreeMap::from([
            (Strategy::Yearly, vec![[10, 11, 12, 13, 14], [10, 15, 16, 17, 18]]),
            (Strategy::Ml, vec![[20, 21, 22, 23, 24]]),
        ]);
        // 10 est cité deux fois par la même stratégie : 100 + 2, contre 100 + 1
        assert_eq!(extract_consensus(&outputs, &TrendReport::default(), 1), vec![10]);
    }

    #[test]
    fn test_consensus_empty() {
        assert!(extract_consensus(&BTreeMap::new(), &TrendReport::default(), 2).is_empty());
    }

    #[test]
    fn test_ensemble_vote_hand_computed() {
        // 1 : 37,8 ; 3 : 24,2 ; 2 : 24,1 ; 6, 7, 8 : 11,7 ; 20-22 : 11,6 ; 4, 5 : 11,5
        let inputs = [
            (Strategy::Ml, [1, 2, 3, 4, 5]),
            (Strategy::Genetic, [1, 3, 6, 7, 8]),
            (Strategy::Pattern, [1, 2, 20, 21, 22]),
        ];
        assert_eq!(ensemble_vote(&inputs), [1, 2, 3, 6, 7]);
    }

    #[test]
    fn test_ensemble_vote_single_input() {
        assert_eq!(ensemble_vote(&[(Strategy::Ml, [5, 15, 25, 35, 45])]), [5, 15, 25, 35, 45]);
        assert_eq!(ensemble_vote(&[]), [1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_agreement() {
        let a = [1, 2, 3, 4, 5];
        assert_eq!(strategy_agreement(&a, &[]), 0.5);
        assert_eq!(strategy_agreement(&a, &[a]), 1.0);
        assert!((strategy_agreement(&a, &[[1, 2, 60, 70, 80], [10, 20, 30, 40, 50]]) - 0.2).abs() < 1e-12);
    }
}
