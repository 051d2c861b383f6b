use lotoracle_db::models::Numbers;
use serde::Serialize;

use super::{draw_sum, is_even, is_high};
use super::zone::zone_of;

/// Règles anti-motifs : nom, prédicat et priorité de réparation sont des données.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AntiPattern {
    AllEvens,
    AllOdds,
    AllHigh,
    AllLow,
    AllSameDecade,
    Consecutive5,
    SumTooLow,
    SumTooHigh,
    AllMultiples5,
    AllMultiples10,
}

/// Pénalité de validité par règle violée.
pub const VIOLATION_PENALTY: f64 = 0.15;

impl AntiPattern {
    pub const ALL: [AntiPattern; 10] = [
        AntiPattern::AllEvens,
        AntiPattern::AllOdds,
        AntiPattern::AllHigh,
        AntiPattern::AllLow,
        AntiPattern::AllSameDecade,
        AntiPattern::Consecutive5,
        AntiPattern::SumTooLow,
        AntiPattern::SumTooHigh,
        AntiPattern::AllMultiples5,
        AntiPattern::AllMultiples10,
    ];

    /// Ordre de réparation ; `None` pour les règles sans correctif.
    pub const FIX_ORDER: [AntiPattern; 6] = [
        AntiPattern::AllEvens,
        AntiPattern::AllOdds,
        AntiPattern::AllHigh,
        AntiPattern::AllLow,
        AntiPattern::SumTooLow,
        AntiPattern::SumTooHigh,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AntiPattern::AllEvens => "all_evens",
            AntiPattern::AllOdds => "all_odds",
            AntiPattern::AllHigh => "all_high",
            AntiPattern::AllLow => "all_low",
            AntiPattern::AllSameDecade => "all_same_decade",
            AntiPattern::Consecutive5 => "consecutive_5",
            AntiPattern::SumTooLow => "sum_too_low",
            AntiPattern::SumTooHigh => "sum_too_high",
            AntiPattern::AllMultiples5 => "all_multiples_5",
            AntiPattern::AllMultiples10 => "all_multiples_10",
        }
    }

    pub fn matches(&self, numbers: &Numbers) -> bool {
        let mut sorted = *numbers;
        sorted.sort_unstable();
        match self {
            AntiPattern::AllEvens => sorted.iter().all(|&n| is_even(n)),
            AntiPattern::AllOdds => sorted.iter().all(|&n| !is_even(n)),
            AntiPattern::AllHigh => sorted.iter().all(|&n| is_high(n)),
            AntiPattern::AllLow => sorted.iter().all(|&n| !is_high(n)),
            AntiPattern::AllSameDecade => sorted.iter().all(|&n| zone_of(n) == zone_of(sorted[0])),
            AntiPattern::Consecutive5 => sorted.windows(2).all(|w| w[1] - w[0] == 1),
            AntiPattern::SumTooLow => draw_sum(&sorted) < 100,
            AntiPattern::SumTooHigh => draw_sum(&sorted) > 350,
            AntiPattern::AllMultiples5 => sorted.iter().all(|&n| n % 5 == 0),
            AntiPattern::AllMultiples10 => sorted.iter().all(|&n| n % 10 == 0),
        }
    }

    pub fn fix_priority(&self) -> Option<usize> {
        Self::FIX_ORDER.iter().position(|p| p == self)
    }

    /// Remplace un numéro fautif par un candidat du pool. `None` si la
    /// règle n'a pas de correctif ou si aucun candidat ne convient.
    ///
    /// Les règles de parité et de hauteur prennent le candidat médian ; une
    /// somme trop basse prend le premier grand numéro du pool, une somme trop
    /// haute le dernier petit numéro.
    fn repair(&self, numbers: &Numbers, pool: &[u8]) -> Option<Numbers> {
        let mut sorted = *numbers;
        sorted.sort_unstable();
        let unused = |pred: &dyn Fn(u8) -> bool| -> Vec<u8> {
            pool.iter().copied().filter(|n| !sorted.contains(n) && pred(*n)).collect()
        };

        let (offender, candidates) = match self {
            AntiPattern::AllEvens => (sorted.iter().position(|&n| is_even(n))?, unused(&|n| !is_even(n))),
            AntiPattern::AllOdds => (sorted.iter().position(|&n| !is_even(n))?, unused(&|n| is_even(n))),
            AntiPattern::AllHigh => (sorted.iter().position(|&n| is_high(n))?, unused(&|n| !is_high(n))),
            AntiPattern::AllLow => (sorted.iter().position(|&n| !is_high(n))?, unused(&|n| is_high(n))),
            // la plus petite valeur cède sa place à un grand numéro, et inversement
            AntiPattern::SumTooLow => (0, unused(&|n| n > 60)),
            AntiPattern::SumTooHigh => (sorted.len() - 1, unused(&|n| n < 30)),
            _ => return None,
        };
        let replacement = match self {
            AntiPattern::SumTooLow => candidates.first(),
            AntiPattern::SumTooHigh => candidates.last(),
            _ => candidates.get(candidates.len() / 2),
        };
        let &replacement = replacement?;

        let mut out = sorted;
        out[offender] = replacement;
        out.sort_unstable();
        Some(out)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternCheck {
    pub violations: Vec<AntiPattern>,
    pub score: f64,
}

impl PatternCheck {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

pub fn check(numbers: &Numbers) -> PatternCheck {
    let violations: Vec<AntiPattern> = AntiPattern::ALL.iter().copied().filter(|r| r.matches(numbers)).collect();
    let score = (1.0 - VIOLATION_PENALTY * violations.len() as f64).max(0.0);
    PatternCheck { violations, score }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixOutcome {
    pub numbers: Numbers,
    /// Tours de réparation consommés.
    pub rounds: usize,
    pub check: PatternCheck,
}

pub struct AntiPatternFilter {
    max_rounds: usize,
}

impl Default for AntiPatternFilter {
    fn default() -> Self {
        Self { max_rounds: 10 }
    }
}

impl AntiPatternFilter {
    pub fn new(max_rounds: usize) -> Self {
        Self { max_rounds }
    }

    /// Répare au plus une règle par tour, dans l'ordre de priorité, en
    /// puisant dans `pool`. S'arrête dès que la grille est valide.
    pub fn fix(&self, numbers: &Numbers, pool: &[u8]) -> FixOutcome {
        let mut current = *numbers;
        current.sort_unstable();
        let mut rounds = 0;

        while rounds < self.max_rounds {
            let status = check(&current);
            if status.is_valid() {
                break;
            }
            rounds += 1;

            let mut fixable: Vec<AntiPattern> =
                status.violations.iter().copied().filter(|v| v.fix_priority().is_some()).collect();
            fixable.sort_by_key(|v| v.fix_priority());
            for rule in fixable {
                if let Some(repaired) = rule.repair(&current, pool) {
                    current = repaired;
                    break;
                }
            }
        }

        FixOutcome { numbers: current, rounds, check: check(&current) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_pool() -> Vec<u8> {
        (1..=90).collect()
    }

    #[test]
    fn test_rule_predicates() {
        assert!(AntiPattern::AllEvens.matches(&[2, 4, 6, 8, 10]));
        assert!(AntiPattern::Consecutive5.matches(&[11, 12, 13, 14, 15]));
        assert!(AntiPattern::AllSameDecade.matches(&[11, 12, 13, 14, 20]));
        assert!(!AntiPattern::AllSameDecade.matches(&[11, 12, 13, 14, 21]));
        assert!(AntiPattern::SumTooHigh.matches(&[70, 75, 80, 85, 90]));
        assert!(AntiPattern::AllMultiples10.matches(&[10, 20, 30, 40, 50]));
    }

    #[test]
    fn test_check_score() {
        let c = check(&[2, 4, 6, 8, 10]);
        // all_evens, all_low, all_same_decade, sum_too_low
        assert_eq!(c.violations.len(), 4);
        assert!((c.score - 0.4).abs() < 1e-12);
        assert!(check(&[3, 18, 44, 57, 81]).is_valid());
    }

    #[test]
    fn test_fix_repairs_fixable_input() {
        let filter = AntiPatternFilter::default();
        let outcome = filter.fix(&[2, 4, 6, 8, 10], &full_pool());
        assert!(outcome.check.is_valid(), "toujours invalide : {:?}", outcome);
        assert!(outcome.rounds <= 10);
        assert!(crate::error::check_candidate(&outcome.numbers).is_ok());
    }

    #[test]
    fn test_sum_rules_take_extreme_candidates() {
        let filter = AntiPatternFilter::default();
        // somme 99 : 1 cède sa place au premier numéro > 60
        let low = filter.fix(&[1, 2, 3, 4, 89], &full_pool());
        assert_eq!(low.numbers, [2, 3, 4, 61, 89]);
        assert_eq!(low.rounds, 1);
        // somme 366 : 90 cède sa place au dernier numéro < 30
        let high = filter.fix(&[41, 70, 80, 85, 90], &full_pool());
        assert_eq!(high.numbers, [29, 41, 70, 80, 85]);
        assert!(high.check.is_valid());
    }

    #[test]
    fn test_fix_gives_up_on_unfixable_input() {
        // seul all_multiples_5 est violé : aucune règle de réparation
        let filter = AntiPatternFilter::default();
        let outcome = filter.fix(&[10, 25, 40, 55, 70], &full_pool());
        assert_eq!(outcome.check.violations, vec![AntiPattern::AllMultiples5]);
        assert_eq!(outcome.rounds, 10);
        assert_eq!(outcome.numbers, [10, 25, 40, 55, 70]);
    }

    #[test]
    fn test_valid_candidate_untouched() {
        let outcome = AntiPatternFilter::default().fix(&[81, 3, 44, 18, 57], &full_pool());
        assert_eq!(outcome.rounds, 0);
        assert_eq!(outcome.numbers, [3, 18, 44, 57, 81]);
    }

    #[test]
    fn test_fix_priority_order() {
        assert_eq!(AntiPattern::AllEvens.fix_priority(), Some(0));
        assert_eq!(AntiPattern::SumTooHigh.fix_priority(), Some(5));
        assert_eq!(AntiPattern::Consecutive5.fix_priority(), None);
    }
}
