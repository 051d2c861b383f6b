pub mod compute;

use lotoracle_db::models::Numbers;

pub const FEATURE_NAMES: &[&str] = &[
    "recent_freq",
    "skips",
    "position_tendency",
    "delta_compat",
    "is_odd",
    "is_high",
    "trend_score",
];

#[derive(Debug, Clone)]
pub struct FeatureRow {
    pub number: u8,
    pub features: Vec<f64>,
    pub label: f64,
}

/// Lignes d'apprentissage : pour chaque cible `t ≥ lookback`, les 90 numéros
/// décrits par la fenêtre `draws[t - lookback..t]`, label = présence dans `draws[t]`.
pub fn training_rows(draws: &[Numbers], lookback: usize) -> Vec<FeatureRow> {
    compute::training_rows(draws, lookback)
}

/// Lignes d'inférence décrivant l'état courant (label nul).
pub fn current_rows(draws: &[Numbers], lookback: usize) -> Vec<FeatureRow> {
    compute::current_rows(draws, lookback)
}
