//! Point d'entrée d'un moteur « intelligence » externe, qui exploite les
//! numéros machine en plus des numéros gagnants. Le moteur de prédiction ne
//! le connaît qu'à travers ces deux traits.

use lotoracle_db::models::Numbers;

use crate::dataset::{rank_numbers, POOL_SIZE};
use crate::error::Result;

/// Profils de jeu interrogés, dans cet ordre.
pub const PERSONAS: [&str; 5] = [
    "balanced",
    "structural_anchor",
    "machine_memory_hunter",
    "cluster_rider",
    "breakout_speculator",
];

/// Profil utilisé comme base lors de l'alignement sur le consensus.
pub const BASE_PERSONA: &str = "balanced";

pub trait IntelligenceEngine {
    fn generate_persona_tickets(&self, persona: &str) -> Result<Vec<Numbers>>;
    fn score_ticket(&self, ticket: &Numbers) -> f64;
    fn unified_score(&self, number: u8) -> f64;
}

/// Construit un moteur à partir des historiques alignés gagnants/machine.
pub trait IntelligenceProvider: Send + Sync {
    fn build(&self, winning: &[Numbers], machine: &[Numbers], seed: u64) -> Result<Box<dyn IntelligenceEngine>>;
}

/// Score unifié des 90 numéros (index = numéro - 1).
pub fn unified_scores(engine: &dyn IntelligenceEngine) -> Vec<f64> {
    (1..=POOL_SIZE as u8).map(|n| engine.unified_score(n)).collect()
}

/// Les 5 meilleurs numéros selon le score unifié.
pub fn unified_top_five(engine: &dyn IntelligenceEngine) -> Numbers {
    let ranked = rank_numbers(&unified_scores(engine));
    let mut ticket = [0u8; 5];
    ticket.copy_from_slice(&ranked[..5]);
    ticket.sort_unstable();
    ticket
}

/// Meilleure grille parmi `tickets` selon `score_ticket` ; la première
/// l'emporte en cas d'égalité.
pub fn best_ticket(engine: &dyn IntelligenceEngine, tickets: &[Numbers]) -> Option<Numbers> {
    let mut best: Option<(Numbers, f64)> = None;
    for ticket in tickets {
        let score = engine.score_ticket(ticket);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((*ticket, score));
        }
    }
    best.map(|(t, _)| t)
}
