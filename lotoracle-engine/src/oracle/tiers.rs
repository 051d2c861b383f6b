use std::collections::BTreeSet;

use lotoracle_db::models::Numbers;
use rand::rngs::StdRng;
use tracing::{debug, warn};

use super::{Engine, Request, Tier};
use crate::analysis::{is_even, is_high, PatternSummary};
use crate::dataset::{frequencies, frequency_ticket, rank_numbers, recent, POOL_SIZE};
use crate::error::{check_candidate, OracleError, Result};
use crate::genetic::Constraints;
use crate::intelligence::{best_ticket, unified_scores, unified_top_five, IntelligenceEngine, BASE_PERSONA, PERSONAS};
use crate::models::normalize;
use crate::models::predictor::diverse_top_five;

/// Taille visée du vivier de la stratégie motifs.
const PATTERN_POOL: usize = 15;
/// Remplacements maximum lors du renfort ML par les motifs annuels.
const MAX_BOOST_SWAPS: usize = 2;

impl Engine {
    /// Produit la grille d'un palier. Les erreurs remontent à la chaîne de
    /// repli, qui passe au palier suivant.
    pub(super) fn produce(&self, tier: Tier, req: &mut Request<'_>) -> Result<Numbers> {
        match tier {
            Tier::Ml => self.ml_ticket(),
            Tier::Genetic => self.genetic_ticket(&req.summary, &mut req.rng),
            Tier::Pattern => Ok(pattern_ticket(&req.summary)),
            Tier::Intelligence => self.intelligence_ticket(req.machine, req.seed),
            Tier::Yearly => {
                let predictions = self.yearly.predict(req.count, &mut req.rng);
                let first = predictions
                    .first()
                    .map(|p| p.numbers)
                    .ok_or_else(|| OracleError::subsystem("yearly", "aucune grille annuelle"))?;
                req.yearly = predictions;
                Ok(first)
            }
            Tier::MlBoosted => {
                let base = self.ml_ticket()?;
                Ok(boost_with_patterns(&base, &self.yearly.pattern_weights()))
            }
            Tier::Ensemble => {
                if req.ensemble_inputs.is_empty() {
                    return Err(OracleError::subsystem("ensemble", "aucune stratégie à combiner"));
                }
                Ok(super::ensemble_vote(&req.ensemble_inputs))
            }
            Tier::Frequency => Ok(frequency_ticket(self.dataset.draws())),
            Tier::Default => check_candidate(&self.config.default_ticket),
        }
    }

    fn ml_ticket(&self) -> Result<Numbers> {
        let probs = self
            .ml_distribution
            .as_deref()
            .ok_or_else(|| OracleError::subsystem("ml", "classifieur non entraîné"))?;
        Ok(diverse_top_five(probs))
    }

    fn genetic_ticket(&self, summary: &PatternSummary, rng: &mut StdRng) -> Result<Numbers> {
        let probs = genetic_distribution(
            recent(self.dataset.draws(), self.config.genetic.distribution_window),
            summary,
        );
        let constraints = Constraints {
            target_sum_range: Some(summary.sum_range),
            even_odd_target: Some(vec![2, 3]),
            high_low_target: Some(vec![2, 3]),
        };
        self.genetic.evolve(&probs, &constraints, rng)
    }

    /// Moteur intelligence construit sur l'historique aligné gagnants/machine.
    pub(super) fn intelligence_engine(
        &self,
        machine: Option<&[Numbers]>,
        seed: u64,
    ) -> Result<Box<dyn IntelligenceEngine>> {
        let machine = machine.filter(|m| !m.is_empty()).ok_or(OracleError::MissingMachineData)?;
        if machine.len() != self.dataset.len() {
            return Err(OracleError::subsystem(
                "intelligence",
                format!("numéros machine non alignés : {} pour {} tirages", machine.len(), self.dataset.len()),
            ));
        }
        let provider = self
            .intelligence
            .as_ref()
            .ok_or_else(|| OracleError::subsystem("intelligence", "aucun moteur configuré"))?;
        provider.build(self.dataset.draws(), machine, seed)
    }

    fn intelligence_ticket(&self, machine: Option<&[Numbers]>, seed: u64) -> Result<Numbers> {
        let engine = self.intelligence_engine(machine, seed)?;
        let mut tickets = Vec::new();
        for persona in PERSONAS {
            match engine.generate_persona_tickets(persona) {
                Ok(generated) => tickets.extend(generated.iter().filter_map(|t| check_candidate(t).ok())),
                Err(e) => warn!(persona, error = %e, "Profil intelligence en échec"),
            }
        }
        debug!(tickets = tickets.len(), "Grilles intelligence générées");
        Ok(best_ticket(engine.as_ref(), &tickets).unwrap_or_else(|| unified_top_five(engine.as_ref())))
    }

    /// Grille du profil de base, alignée sur les numéros de consensus des
    /// autres stratégies.
    pub(super) fn aligned_intelligence(
        &self,
        machine: Option<&[Numbers]>,
        seed: u64,
        consensus: &[u8],
    ) -> Result<Numbers> {
        let engine = self.intelligence_engine(machine, seed)?;
        let tickets: Vec<Numbers> = engine
            .generate_persona_tickets(BASE_PERSONA)?
            .iter()
            .filter_map(|t| check_candidate(t).ok())
            .collect();
        let base = best_ticket(engine.as_ref(), &tickets).unwrap_or_else(|| unified_top_five(engine.as_ref()));
        check_candidate(&align_with_consensus(&base, consensus, &unified_scores(engine.as_ref())))
    }
}

/// Distribution de la stratégie génétique : fréquence récente plus bonus
/// chaud, froid en retard et retard moyen.
pub(super) fn genetic_distribution(window: &[Numbers], summary: &PatternSummary) -> Vec<f64> {
    let freq = frequencies(window);
    let max_freq = freq.iter().copied().max().unwrap_or(0).max(1) as f64;
    let avg_skip = summary.average_skip();
    let hot: Vec<u8> = summary.hot_numbers.iter().copied().take(10).collect();
    let cold: Vec<u8> = summary.cold_numbers.iter().copied().take(5).collect();

    let mut scores: Vec<f64> = (1..=POOL_SIZE as u8)
        .map(|n| {
            let skip = summary.skip(n) as f64;
            let mut score = 0.01;
            if hot.contains(&n) {
                score += 0.4;
            }
            if cold.contains(&n) && skip > 20.0 {
                score += 0.3 * skip / 30.0;
            }
            if skip >= avg_skip * 0.8 && skip <= avg_skip * 1.2 {
                score += 0.2;
            }
            score + 0.1 * freq[(n - 1) as usize] as f64 / max_freq
        })
        .collect();
    normalize(&mut scores);
    scores
}

/// Note d'une grille partielle ou complète selon les motifs récents.
fn pattern_score(numbers: &[u8], summary: &PatternSummary) -> f64 {
    let mut score = 0.0;
    for &n in numbers {
        if summary.hot_numbers.iter().take(10).any(|&h| h == n) {
            score += 2.0;
        }
        if summary.skip(n) > 20 && summary.cold_numbers.iter().take(5).any(|&c| c == n) {
            score += 3.0;
        }
    }

    let total: u32 = numbers.iter().map(|&n| n as u32).sum();
    let (low, high) = summary.sum_range;
    if (low..=high).contains(&total) {
        score += 5.0;
    }
    let evens = numbers.iter().filter(|&&n| is_even(n)).count();
    if (2..=3).contains(&evens) {
        score += 3.0;
    }
    let highs = numbers.iter().filter(|&&n| is_high(n)).count();
    if (2..=3).contains(&highs) {
        score += 3.0;
    }

    let mut sorted = numbers.to_vec();
    sorted.sort_unstable();
    let consecutive = sorted.windows(2).filter(|w| w[1] == w[0] + 1).count();
    score - 2.0 * consecutive as f64
}

fn by_single_score(numbers: &mut [u8], summary: &PatternSummary) {
    numbers.sort_by(|&a, &b| {
        pattern_score(&[b], summary).total_cmp(&pattern_score(&[a], summary)).then(a.cmp(&b))
    });
}

/// Vivier des numéros chauds, froids en retard et dus, complété jusqu'à 15,
/// puis les 5 meilleurs par note individuelle.
pub(super) fn pattern_ticket(summary: &PatternSummary) -> Numbers {
    let mut pool: BTreeSet<u8> = summary.hot_numbers.iter().copied().take(10).collect();
    pool.extend(summary.cold_numbers.iter().copied().filter(|&n| summary.skip(n) > 15).take(10));
    pool.extend(summary.due_numbers().into_iter().take(10));

    let mut pool: Vec<u8> = pool.into_iter().collect();
    if pool.len() < PATTERN_POOL {
        let mut extra: Vec<u8> = (1..=POOL_SIZE as u8).filter(|n| !pool.contains(n)).take(20).collect();
        by_single_score(&mut extra, summary);
        let missing = PATTERN_POOL - pool.len();
        pool.extend(extra.into_iter().take(missing));
    }

    by_single_score(&mut pool, summary);
    let mut picked: Vec<u8> = pool.into_iter().take(5).collect();
    if picked.len() < 5 {
        let mut rest: Vec<u8> = (1..=POOL_SIZE as u8).filter(|n| !picked.contains(n)).collect();
        by_single_score(&mut rest, summary);
        let missing = 5 - picked.len();
        picked.extend(rest.into_iter().take(missing));
    }

    let mut ticket = [0u8; 5];
    ticket.copy_from_slice(&picked);
    ticket.sort_unstable();
    ticket
}

/// Remplace au plus deux numéros de la grille ML, ceux de plus faible poids
/// de motif, par les meilleurs numéros des motifs annuels absents.
pub(super) fn boost_with_patterns(base: &Numbers, weights: &[f64]) -> Numbers {
    let mut boosted = *base;
    let top: Vec<u8> = rank_numbers(weights)
        .into_iter()
        .filter(|&n| weights[(n - 1) as usize] > 0.0)
        .take(10)
        .collect();

    let weight = |n: u8| weights[(n - 1) as usize];
    let mut swaps = 0;
    for n in top {
        if swaps >= MAX_BOOST_SWAPS {
            break;
        }
        if boosted.contains(&n) {
            continue;
        }
        let weakest = (1..boosted.len()).fold(0, |best, i| if weight(boosted[i]) < weight(boosted[best]) { i } else { best });
        boosted[weakest] = n;
        swaps += 1;
    }
    boosted.sort_unstable();
    boosted
}

/// Les numéros de consensus absents prennent la place des numéros de plus
/// faible score unifié.
pub(super) fn align_with_consensus(base: &Numbers, consensus: &[u8], scores: &[f64]) -> Numbers {
    let missing: Vec<u8> = consensus.iter().copied().filter(|n| !base.contains(n)).collect();
    let mut weakest = base.to_vec();
    weakest.sort_by(|&a, &b| scores[(a - 1) as usize].total_cmp(&scores[(b - 1) as usize]).then(a.cmp(&b)));

    let mut aligned = *base;
    for (victim, replacement) in weakest.into_iter().zip(missing) {
        if let Some(slot) = aligned.iter_mut().find(|n| **n == victim) {
            *slot = replacement;
        }
    }
    aligned.sort_unstable();
    aligned
}
