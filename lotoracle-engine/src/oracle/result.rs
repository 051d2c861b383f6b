use std::collections::BTreeMap;

use lotoracle_db::models::Numbers;
use serde::Serialize;

use super::{Strategy, Tier};
use crate::confidence::ConfidenceReport;
use crate::yearly::YearlyPrediction;

/// Grilles d'une stratégie et palier qui les a produites.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyOutput {
    pub candidates: Vec<Numbers>,
    pub tier: Tier,
    /// Tours de réparation anti-motifs consommés (0 si la grille était saine).
    pub repair_rounds: usize,
}

impl StrategyOutput {
    pub fn new(candidate: Numbers, tier: Tier) -> Self {
        Self { candidates: vec![candidate], tier, repair_rounds: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub strategy: Strategy,
    pub seed: u64,
    pub outputs: BTreeMap<Strategy, StrategyOutput>,
    /// Les 2 numéros les plus partagés entre stratégies.
    pub two_sure: Vec<u8>,
    /// Les 3 numéros les plus partagés entre stratégies.
    pub three_direct: Vec<u8>,
    pub confidence: BTreeMap<Strategy, ConfidenceReport>,
    /// Détail de l'analyse annuelle quand la stratégie `yearly` l'a utilisée.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub yearly: Vec<YearlyPrediction>,
}

impl PredictionResult {
    pub fn candidates(&self, strategy: Strategy) -> &[Numbers] {
        self.outputs.get(&strategy).map(|o| o.candidates.as_slice()).unwrap_or_default()
    }

    /// Première grille de la stratégie demandée.
    pub fn primary(&self) -> Option<Numbers> {
        self.candidates(self.strategy).first().copied()
    }

    pub fn candidate_map(&self) -> BTreeMap<Strategy, Vec<Numbers>> {
        self.outputs.iter().map(|(&s, o)| (s, o.candidates.clone())).collect()
    }

    /// Toutes les grilles produites, dans l'ordre des stratégies.
    pub fn all_candidates(&self) -> impl Iterator<Item = (Strategy, &Numbers)> + '_ {
        self.outputs.iter().flat_map(|(&s, o)| o.candidates.iter().map(move |c| (s, c)))
    }
}
